//! Human-readable byte counts

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Format a byte count using base-1024 units, e.g. `1536` as `"1.5 KB"`.
///
/// The value is rounded half-up to two decimals and trailing zeros are
/// dropped. Sizes beyond the gigabyte range are still expressed in GB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    while unit + 1 < UNITS.len() && bytes >= 1u64 << (10 * (unit + 1)) {
        unit += 1;
    }

    // Hundredths of the unit, computed exactly so that ties round up
    let div = 1u128 << (10 * unit);
    let hundredths = (u128::from(bytes) * 100 + div / 2) / div;
    let rounded = format!("{}.{:02}", hundredths / 100, hundredths % 100);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
