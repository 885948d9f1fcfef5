use std::path::Path;

use super::records::{Category, FileType};

const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp", "heic", "heif"];
const VIDEO_EXTS: &[&str] = &["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm", "m4v"];
const AUDIO_EXTS: &[&str] = &["mp3", "wav", "flac", "aac", "ogg", "m4a"];
const DOCUMENT_EXTS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "rtf", "odt", "md",
];
const ARCHIVE_EXTS: &[&str] = &["zip", "rar", "7z", "tar", "gz", "bz2", "xz", "tgz", "dmg", "iso"];
const CACHE_EXTS: &[&str] = &["cache", "tmp", "temp"];

/// Map an extension (any case, without the dot) to a file type
pub fn file_type_for_extension(ext: &str) -> FileType {
    let ext = ext.to_ascii_lowercase();
    let ext = ext.as_str();
    if ext == "log" {
        FileType::Log
    } else if CACHE_EXTS.contains(&ext) {
        FileType::Cache
    } else if IMAGE_EXTS.contains(&ext) {
        FileType::Image
    } else if VIDEO_EXTS.contains(&ext) {
        FileType::Video
    } else if AUDIO_EXTS.contains(&ext) {
        FileType::Audio
    } else if DOCUMENT_EXTS.contains(&ext) {
        FileType::Document
    } else if ARCHIVE_EXTS.contains(&ext) {
        FileType::Archive
    } else {
        FileType::Other
    }
}

/// True for `*.log` and rotated `*.log.*` names
pub fn is_log_name(path: &Path) -> bool {
    let name = match path.file_name() {
        Some(n) => n.to_string_lossy().to_ascii_lowercase(),
        None => return false,
    };
    name.ends_with(".log") || name.contains(".log.")
}

/// Classify a file found under a root of the given category.
///
/// The category is decided by the traversal unit and passes through unchanged;
/// only the file type is derived here.
pub fn classify(path: &Path, category: Category) -> (FileType, Category) {
    let file_type = if is_log_name(path) {
        FileType::Log
    } else {
        path.extension()
            .map(|e| file_type_for_extension(&e.to_string_lossy()))
            .unwrap_or(FileType::Other)
    };
    (file_type, category)
}
