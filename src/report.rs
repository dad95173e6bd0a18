//! The df-output pipeline: raw `df -h` text in, chart slices and a sorted
//! presentation table out.

use std::cmp::Ordering;

use thiserror::Error;

use crate::models::usage::{ChartSlice, TableRow, UsageRow};
use crate::util::size::size_to_mb;

/// Rows below this share of total size are dropped from the pie chart
/// (they would render as invisible slivers). The presentation table keeps
/// every row.
const CHART_MIN_PCT: f64 = 0.1;

const AWS_SUFFIX: &str = "amazonaws.com:";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("empty report: no header line")]
    Empty,
    #[error("unexpected header line: {0:?}")]
    BadHeader(String),
    #[error("line {line}: expected 6 whitespace-separated fields, found {found}")]
    BadFieldCount { line: usize, found: usize },
}

/// Strip any leading `<host>amazonaws.com:` prefix from an NFS export name,
/// leaving only the export path. Matches the token case-insensitively and
/// trims through its *last* occurrence; names without the token pass through.
fn strip_aws_prefix(name: &str) -> &str {
    let lower = name.to_ascii_lowercase();
    match lower.rfind(AWS_SUFFIX) {
        Some(idx) => &name[idx + AWS_SUFFIX.len()..],
        None => name,
    }
}

/// Parse raw `df -h` output into usage rows with normalized sizes and the
/// derived usage share. The share denominator is the size total over the
/// FULL row set, never a filtered subset; a zero total (degenerate report)
/// yields 0.0 shares rather than a division error.
pub fn parse_rows(raw: &str) -> Result<Vec<UsageRow>, ParseError> {
    let mut lines = raw
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    let (_, header) = lines.next().ok_or(ParseError::Empty)?;
    if header.split_whitespace().next() != Some("Filesystem") {
        return Err(ParseError::BadHeader(header.trim().to_string()));
    }

    let mut rows = Vec::new();
    for (idx, line) in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(ParseError::BadFieldCount { line: idx + 1, found: fields.len() });
        }
        rows.push(UsageRow {
            filesystem: strip_aws_prefix(fields[0]).to_string(),
            size_mb:    size_to_mb(fields[1]),
            used_mb:    size_to_mb(fields[2]),
            avail:      fields[3].to_string(),
            use_pct:    fields[4].to_string(),
            mount:      fields[5].to_string(),
            usage_percent: 0.0,
        });
    }

    let total: f64 = rows.iter().map(|r| r.size_mb).sum();
    if total > 0.0 {
        for row in &mut rows {
            row.usage_percent = row.used_mb / total * 100.0;
        }
    }
    Ok(rows)
}

/// Build the two views served to clients: the thresholded pie-chart input
/// (original row order) and the full presentation table, stable-sorted by
/// usage share descending so ties keep their df order.
pub fn build_tables(raw: &str) -> Result<(Vec<ChartSlice>, Vec<TableRow>), ParseError> {
    let rows = parse_rows(raw)?;

    let chart: Vec<ChartSlice> = rows
        .iter()
        .filter(|r| r.usage_percent >= CHART_MIN_PCT)
        .map(|r| ChartSlice {
            filesystem: r.filesystem.clone(),
            usage_percent: r.usage_percent,
        })
        .collect();

    let mut table: Vec<TableRow> = rows
        .iter()
        .map(|r| TableRow {
            filesystem: r.filesystem.clone(),
            usage_percent: r.usage_percent,
            mount: r.mount.clone(),
        })
        .collect();
    table.sort_by(|a, b| {
        b.usage_percent
            .partial_cmp(&a.usage_percent)
            .unwrap_or(Ordering::Equal)
    });

    Ok((chart, table))
}
