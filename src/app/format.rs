/// Two decimals below 100 seconds, one decimal from 100.0 on (inclusive).
/// The narrower format keeps the display width stable once the count grows.
pub fn format_elapsed(elapsed_seconds: f64) -> String {
    if elapsed_seconds < 100.0 {
        format!("{elapsed_seconds:.2}")
    } else {
        format!("{elapsed_seconds:.1}")
    }
}
