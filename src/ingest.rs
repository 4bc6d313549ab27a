use anyhow::bail;
use serde::Serialize;

use crate::model::Record;

/// Upper bound on the week index a record may carry. Auto-extension fills
/// every index up to the highest one seen, so a single mistyped week number
/// must not be able to allocate an unbounded run of empty weeks.
pub const MAX_WEEK_INDEX: usize = 511;

pub const REASON_FIELD_COUNT: &str = "field_count_mismatch";
pub const REASON_EMPTY_NAME: &str = "empty_name";
pub const REASON_INVALID_WEEK: &str = "invalid_week";
pub const REASON_WEEK_RANGE: &str = "week_out_of_range";
pub const REASON_INVALID_SCORE: &str = "invalid_score";

/// One rejected input row. Line numbers are 1-based with the header on
/// line 1, matching what an editor shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    pub line: usize,
    pub reason: &'static str,
}

#[derive(Debug)]
pub struct ParseReport {
    pub sectioned: bool,
    pub records: Vec<Record>,
    pub skipped: Vec<SkippedRow>,
}

/// Parses delimited text into flat records, order-preserving and without
/// deduplication (merging duplicates is the store's job).
///
/// The header row decides the shape: 4 fields (`Name,Week,Quiz,Lab`) or 5
/// (`Section,Name,Week,Quiz,Lab`); fields are positional, the header is only
/// used for arity. Rows with a different field count are skipped, as are
/// rows whose week or scores fail to parse as integers; every skip is
/// reported rather than swallowed. Score values are not range-checked.
pub fn parse_delimited(text: &str) -> anyhow::Result<ParseReport> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let expected = reader.headers()?.len();
    let sectioned = match expected {
        4 => false,
        5 => true,
        n => bail!("header must have 4 or 5 fields, found {}", n),
    };

    let mut records = Vec::new();
    let mut skipped = Vec::new();
    for (i, row) in reader.records().enumerate() {
        // Fallback line guess for rows the reader could not position.
        let fallback_line = i + 2;
        let row = match row {
            Ok(r) => r,
            Err(e) => {
                let line = e
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(fallback_line);
                skipped.push(SkippedRow {
                    line,
                    reason: REASON_FIELD_COUNT,
                });
                continue;
            }
        };
        let line = row
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(fallback_line);
        let mut skip = |reason| {
            skipped.push(SkippedRow { line, reason });
        };

        if row.len() != expected {
            skip(REASON_FIELD_COUNT);
            continue;
        }

        let base = if sectioned { 1 } else { 0 };
        let section = if sectioned {
            Some(row[0].to_string())
        } else {
            None
        };
        let name = row[base].to_string();
        if name.is_empty() {
            skip(REASON_EMPTY_NAME);
            continue;
        }
        let week = match row[base + 1].parse::<i64>() {
            Ok(w) if w >= 0 => w as usize,
            _ => {
                skip(REASON_INVALID_WEEK);
                continue;
            }
        };
        if week > MAX_WEEK_INDEX {
            skip(REASON_WEEK_RANGE);
            continue;
        }
        let Ok(quiz) = row[base + 2].parse::<i64>() else {
            skip(REASON_INVALID_SCORE);
            continue;
        };
        let Ok(lab) = row[base + 3].parse::<i64>() else {
            skip(REASON_INVALID_SCORE);
            continue;
        };

        records.push(Record {
            section,
            name,
            week,
            quiz,
            lab,
        });
    }

    Ok(ParseReport {
        sectioned,
        records,
        skipped,
    })
}
