use colored::*;
use std::path::Path;

use crate::scanner::records::{Refusal, RiskLevel};

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Binary-prefixed size, one decimal above a kilobyte
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Size colored by how much it would free: red from 1 GB, yellow from 100 MB
pub fn format_size_colored(bytes: u64) -> ColoredString {
    let text = format_size(bytes);
    match bytes >> 20 {
        mb if mb >= 1024 => text.red().bold(),
        mb if mb >= 100 => text.yellow(),
        _ => text.normal(),
    }
}

/// `1 file`, `3 files`, `2 groups`
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// Path with the home directory shown as `~`
pub fn display_path(path: &Path) -> String {
    match dirs::home_dir().and_then(|home| path.strip_prefix(home).ok().map(Path::to_path_buf)) {
        Some(rest) => format!("~/{}", rest.display()),
        None => path.display().to_string(),
    }
}

/// Like `display_path`, but keeps at most `width` characters by cutting
/// from the front so the file name stays visible
pub fn short_path(path: &Path, width: usize) -> String {
    let full = display_path(path);
    let len = full.chars().count();
    if len <= width {
        return full;
    }
    if width <= 3 {
        return ".".repeat(width);
    }
    let tail: String = full.chars().skip(len - (width - 3)).collect();
    format!("...{}", tail)
}

/// `850 ms`, `3.7 s`, `2 min 5 s`
pub fn format_elapsed(secs: f64) -> String {
    if secs < 1.0 {
        format!("{:.0} ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1} s", secs)
    } else {
        let whole = secs.round() as u64;
        format!("{} min {} s", whole / 60, whole % 60)
    }
}

/// Bar showing which share of a category's bytes is deletable
pub fn share_bar(part: u64, whole: u64, width: usize) -> String {
    let filled = if whole == 0 {
        0
    } else {
        ((part as u128 * width as u128 + whole as u128 / 2) / whole as u128) as usize
    }
    .min(width);
    format!(
        "{}{}",
        "█".repeat(filled).green(),
        "░".repeat(width - filled).dimmed()
    )
}

/// One line of the savings breakdown
pub fn print_savings(label: &str, bytes: u64) {
    println!("  {} {:>10}", format!("{:<24}", label).dimmed(), format_size(bytes));
}

/// Colorize a risk level
pub fn format_risk(risk: RiskLevel) -> ColoredString {
    match risk {
        RiskLevel::Low => "Low".green(),
        RiskLevel::Medium => "Medium".yellow(),
        RiskLevel::High => "High".red().bold(),
    }
}

/// Green check for deletable records, dimmed reason otherwise
pub fn format_verdict(safe: bool, refusal: Option<Refusal>) -> ColoredString {
    match (safe, refusal) {
        (true, _) => "safe".green(),
        (false, Some(r)) => r.to_string().dimmed(),
        (false, None) => "kept".dimmed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(5 * 1024), "5.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024 / 2), "1.5 MB");
        assert_eq!(format_size(1 << 40), "1.0 TB");
        // Nothing above terabytes
        assert_eq!(format_size(2048 << 40), "2048.0 TB");
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "file"), "1 file");
        assert_eq!(plural(0, "group"), "0 groups");
    }

    #[test]
    fn test_elapsed() {
        assert_eq!(format_elapsed(0.02), "20 ms");
        assert_eq!(format_elapsed(3.74), "3.7 s");
        assert_eq!(format_elapsed(125.2), "2 min 5 s");
    }

    #[test]
    fn test_short_path_keeps_file_name() {
        let p = Path::new("/var/cache/some-app/deeply/nested/blob.bin");
        assert_eq!(short_path(p, 100), "/var/cache/some-app/deeply/nested/blob.bin");
        let cut = short_path(p, 15);
        assert_eq!(cut.chars().count(), 15);
        assert!(cut.starts_with("...") && cut.ends_with("blob.bin"));
        assert_eq!(short_path(Path::new("/ünïcödé/päth"), 8), ".../päth");
    }

    #[test]
    fn test_share_bar_width() {
        colored::control::set_override(false);
        assert_eq!(share_bar(1, 4, 8), "██░░░░░░");
        assert_eq!(share_bar(0, 0, 4), "░░░░");
        assert_eq!(share_bar(9, 4, 4), "████");
    }

    #[test]
    fn test_format_risk_text() {
        colored::control::set_override(false);
        assert_eq!(format_risk(RiskLevel::High).to_string(), "High");
        assert_eq!(
            format_verdict(false, Some(Refusal::TooYoung)).to_string(),
            "modified too recently"
        );
        assert_eq!(format_verdict(true, None).to_string(), "safe");
    }
}
