use serde::Serialize;

/// One filesystem row parsed from `df -h` output, with derived metrics.
#[derive(Debug, Clone)]
pub struct UsageRow {
    /// Device / export name, with any NFS `…amazonaws.com:` prefix stripped.
    pub filesystem: String,
    /// Size normalized to megabytes.
    pub size_mb: f64,
    /// Used space normalized to megabytes.
    pub used_mb: f64,
    /// Raw "Avail" column, passed through untouched.
    pub avail: String,
    /// Raw "Use%" column, passed through untouched.
    pub use_pct: String,
    pub mount: String,
    /// This row's used space as a share of the total size of ALL rows.
    pub usage_percent: f64,
}

/// One pie-chart slice: rows above the visibility threshold.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartSlice {
    pub filesystem: String,
    pub usage_percent: f64,
}

/// One presentation-table row, sorted by usage share descending.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TableRow {
    pub filesystem: String,
    pub usage_percent: f64,
    pub mount: String,
}
