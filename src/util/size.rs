/// Convert a df-style size string ("10G", "512M", "3.2T") to megabytes.
///
/// df prints sizes with a single uppercase unit suffix. Anything without a
/// recognized K/M/G/T suffix normalizes to 0.0 — a defined fallback, not an
/// error, so one odd row never sinks a whole report.
pub fn size_to_mb(raw: &str) -> f64 {
    let Some(unit) = raw.chars().last() else { return 0.0 };
    if !matches!(unit, 'K' | 'M' | 'G' | 'T') {
        return 0.0;
    }
    // Suffix is a single ASCII byte, so the slice is safe.
    let val: f64 = raw[..raw.len() - 1].parse().unwrap_or(0.0);
    match unit {
        'K' => val / 1000.0,
        'M' => val,
        'G' => val * 1000.0,
        _   => val * 1_000_000.0,
    }
}
