use std::path::Path;

/// macOS locations that stay unreadable without Full Disk Access
const FDA_PATHS: &[&str] = &[
    "Library/Mail",
    "Library/Messages",
    "Library/Safari",
    "Library/Cookies",
    "Library/Containers/com.apple.",
];

/// Roots under OS integrity protection
const SYSTEM_PREFIXES: &[&str] = &["/System", "/usr", "/bin", "/sbin", "C:\\Windows"];

/// Check if a path likely requires Full Disk Access
pub fn requires_full_disk_access(path: &Path) -> bool {
    let path_str = path.to_string_lossy();
    FDA_PATHS.iter().any(|p| path_str.contains(p))
}

/// Short explanation appended to permission-denied scan errors
pub fn permission_hint(path: &Path) -> &'static str {
    let path_str = path.to_string_lossy();
    if SYSTEM_PREFIXES.iter().any(|p| path_str.starts_with(p)) {
        "system-protected location"
    } else if requires_full_disk_access(path) {
        "grant Full Disk Access to read this location"
    } else {
        "check file permissions or run with elevated privileges"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hints() {
        assert_eq!(permission_hint(Path::new("/System/Library/x")), "system-protected location");
        assert!(permission_hint(Path::new("/Users/a/Library/Mail/V10")).contains("Full Disk Access"));
        assert!(permission_hint(Path::new("/tmp/x")).contains("permissions"));
    }
}
