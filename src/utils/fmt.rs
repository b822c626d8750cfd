//! Human-readable counts and sizes.

/// Return "s" suffix for plural counts
///
/// - `plural_s(0)` -> `"s"` (0 files)
/// - `plural_s(1)` -> `""` (1 file)
/// - `plural_s(5)` -> `"s"` (5 files)
#[inline]
pub fn plural_s(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Format count with noun, handling pluralization
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, plural_s(count))
}

/// Format a byte count as KiB with two decimals (`1536` -> `"1.50 KiB"`).
#[allow(clippy::cast_precision_loss)]
pub fn format_kib(bytes: u64) -> String {
    format!("{:.2} KiB", bytes as f64 / 1024.0)
}
