// Copyright 2026 Chanweek Contributors
// SPDX-License-Identifier: Apache-2.0

//! Aggregation engine — raw channel export in, one ledger row out.

pub mod bucket;
pub mod numeric;
pub mod summary;

use crate::error::Error;
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::path::Path;

/// One record of the raw channel-performance export.
///
/// Duplicate rows are fine; aggregation is additive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub referring_platform: String,
    pub channel: String,
    pub channel_type: String,
    pub sales: String,
    pub cost: String,
}

/// Positions of the columns we care about within the export header.
struct ColumnMap {
    referring_platform: usize,
    channel: usize,
    channel_type: usize,
    sales: usize,
    cost: Option<usize>,
}

impl ColumnMap {
    /// Resolve required columns by case-insensitive header match.
    ///
    /// Extra columns are ignored; a missing required column is a hard
    /// failure for the week, not a silent default.
    fn resolve(headers: &csv::StringRecord) -> Result<Self, Error> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        match (
            find("referring platform"),
            find("channel"),
            find("type"),
            find("sales"),
        ) {
            (Some(referring_platform), Some(channel), Some(channel_type), Some(sales)) => {
                Ok(ColumnMap {
                    referring_platform,
                    channel,
                    channel_type,
                    sales,
                    cost: find("cost"),
                })
            }
            _ => Err(Error::MissingColumns {
                found: headers.iter().map(str::to_string).collect(),
            }),
        }
    }
}

/// Read a raw channel export CSV into rows, discarding fully-blank records.
pub fn read_raw_rows(path: &Path) -> Result<Vec<RawRow>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open raw export: {}", path.display()))?;

    let headers = reader
        .headers()
        .context("raw export has no header row")?
        .clone();
    let columns = ColumnMap::resolve(&headers)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("malformed raw export record")?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let field = |i: usize| record.get(i).unwrap_or("").to_string();
        rows.push(RawRow {
            referring_platform: field(columns.referring_platform),
            channel: field(columns.channel),
            channel_type: field(columns.channel_type),
            sales: field(columns.sales),
            cost: columns.cost.map(field).unwrap_or_default(),
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn test_read_raw_rows_matches_headers_case_insensitively() {
        let f = write_csv(
            "REFERRING PLATFORM,Channel,type,SALES,Cost,Sessions\n\
             google,google,paid,\"$1,200.00\",$300.00,42\n",
        );
        let rows = read_raw_rows(f.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sales, "$1,200.00");
        assert_eq!(rows[0].cost, "$300.00");
    }

    #[test]
    fn test_read_raw_rows_discards_fully_blank_rows() {
        let f = write_csv(
            "Referring Platform,Channel,Type,Sales\n\
             ,,,\n\
             direct,direct,,25\n\
             \" \",\"\",\"  \",\"\"\n",
        );
        let rows = read_raw_rows(f.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].channel, "direct");
    }

    #[test]
    fn test_read_raw_rows_cost_optional() {
        let f = write_csv(
            "Referring Platform,Channel,Type,Sales\n\
             ,google,organic,50\n",
        );
        let rows = read_raw_rows(f.path()).unwrap();
        assert_eq!(rows[0].cost, "");
    }

    #[test]
    fn test_read_raw_rows_missing_required_column() {
        let f = write_csv("Channel,Type,Sales\ngoogle,paid,10\n");
        let err = read_raw_rows(f.path()).unwrap_err();
        let err = err.downcast_ref::<Error>().expect("taxonomy error");
        assert!(matches!(err, Error::MissingColumns { .. }));
    }
}
