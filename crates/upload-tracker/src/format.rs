//! Display helpers for presentation layers.

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Formats a byte count with base-1024 units, rounded to two decimals.
///
/// `0` → `0 Bytes`, `1536` → `1.5 KB`, `10485760` → `10 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut exponent = 0;
    let mut threshold = 1024_u64;
    while exponent < UNITS.len() - 1 && bytes >= threshold {
        exponent += 1;
        threshold = threshold.saturating_mul(1024);
    }

    let scaled = bytes as f64 / 1024_f64.powi(exponent as i32);
    let rounded = (scaled * 100.0).round() / 100.0;

    format!("{} {}", rounded, UNITS[exponent])
}
