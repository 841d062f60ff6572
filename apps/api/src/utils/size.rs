const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
const STEP: u64 = 1024;

/// Formats a byte count for humans: `1536` → `"1.5 KB"`.
///
/// The unit is the largest power of 1024 not exceeding the value (capped at TB),
/// and the scaled value keeps at most two decimals with trailing zeros removed.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let index = (bytes.ilog(STEP) as usize).min(UNITS.len() - 1);
    let scaled = bytes as f64 / (STEP as f64).powi(index as i32);

    format!("{} {}", trim_decimals(&format!("{scaled:.2}")), UNITS[index])
}

fn trim_decimals(fixed: &str) -> &str {
    if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed
    }
}
