//! Terminal output helpers.

/// ANSI color codes using true color (24-bit)
pub mod colors {
    pub const HEADER: &str = "\x1b[38;2;255;210;120m";
    pub const OK: &str = "\x1b[38;2;120;255;120m";
    pub const ERR: &str = "\x1b[38;2;255;100;100m";
    pub const WARN: &str = "\x1b[38;2;255;200;100m";
    pub const DIM: &str = "\x1b[38;2;140;140;140m";
    pub const CYAN: &str = "\x1b[38;2;100;200;255m";
    pub const BOLD: &str = "\x1b[1m";
    pub const RESET: &str = "\x1b[0m";
}

/// Horizontal rule
pub const HR: &str = "────────────────────────────────────────────────────────────";

/// Print a styled header with version
pub fn print_header(name: &str, version: &str) {
    println!();
    println!("{}{} v{}{}", colors::HEADER, name, version, colors::RESET);
    println!("{}{}{}", colors::DIM, HR, colors::RESET);
}

/// Print a footer with horizontal rule
pub fn print_footer() {
    println!("{}{}{}", colors::DIM, HR, colors::RESET);
}

/// Print key-value pair
pub fn print_kv(key: &str, value: &str, width: usize) {
    println!("  {:width$} {}", key, value, width = width);
}

/// Progress bar, e.g. `[=====-----]`.
/// `percent` is clamped to 0-100; `width` excludes the brackets.
pub fn progress_bar(percent: f64, width: usize) -> String {
    let pct = percent.clamp(0.0, 100.0);
    let filled = ((pct / 100.0) * width as f64).floor() as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "=".repeat(filled), "-".repeat(empty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0, 10), "[----------]");
        assert_eq!(progress_bar(50.0, 10), "[=====-----]");
        assert_eq!(progress_bar(100.0, 10), "[==========]");
        assert_eq!(progress_bar(57.1, 10), "[=====-----]");
    }

    #[test]
    fn test_progress_bar_clamps() {
        assert_eq!(progress_bar(-5.0, 4), "[----]");
        assert_eq!(progress_bar(250.0, 4), "[====]");
    }
}
