//! CSV export for rollout step records.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::StepRecord;

/// Column header for CSV telemetry export.
const HEADER: &str = "timestep,generation_state,net_generation,action,reward,\
                       penalty,accepted,terminated,truncated,charges";

/// Joins a per-battery vector into one `;`-separated cell.
fn join_cell<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

/// Exports step records to a CSV file at the given path.
///
/// Writes a header row followed by one data row per step. Per-battery
/// vectors (action, charges) are joined with `;` inside a single cell.
/// Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(records: &[StepRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(records, buf)
}

/// Writes step records as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(records: &[StepRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in records {
        wtr.write_record(&[
            r.timestep.to_string(),
            r.generation_state.to_string(),
            r.net_generation.to_string(),
            join_cell(&r.action),
            format!("{:.6}", r.reward),
            format!("{:.1}", r.penalty),
            r.accepted.to_string(),
            r.terminated.to_string(),
            r.truncated.to_string(),
            join_cell(&r.charges),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(t: usize) -> StepRecord {
        StepRecord {
            timestep: t,
            generation_state: 0,
            net_generation: -4,
            action: vec![-2, -1, -1],
            reward: -1.25,
            penalty: 0.0,
            accepted: true,
            terminated: false,
            truncated: false,
            charges: vec![3, 4, 4],
        }
    }

    #[test]
    fn header_matches_schema() {
        let mut buf = Vec::new();
        write_csv(&[make_record(0)], &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let first_line = output.as_deref().unwrap_or("").lines().next().unwrap_or("");
        assert_eq!(
            first_line,
            "timestep,generation_state,net_generation,action,reward,\
             penalty,accepted,terminated,truncated,charges"
        );
    }

    #[test]
    fn row_count_matches_step_count() {
        let records: Vec<StepRecord> = (0..24).map(make_record).collect();
        let mut buf = Vec::new();
        write_csv(&records, &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let lines: Vec<&str> = output.as_deref().unwrap_or("").lines().collect();
        // 1 header + 24 data rows
        assert_eq!(lines.len(), 25);
    }

    #[test]
    fn vectors_are_joined_in_one_cell() {
        let mut buf = Vec::new();
        write_csv(&[make_record(7)], &mut buf).ok();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let headers = rdr.headers().cloned().ok();
        assert_eq!(headers.as_ref().map(csv::StringRecord::len), Some(10));

        let rec = rdr.records().next().and_then(Result::ok);
        assert!(rec.is_some(), "data row should parse");
        let rec = rec.as_ref();
        assert_eq!(rec.map(|r| &r[0]), Some("7"));
        assert_eq!(rec.map(|r| &r[3]), Some("-2;-1;-1"));
        assert_eq!(rec.map(|r| &r[9]), Some("3;4;4"));
        let reward: Option<f64> = rec.and_then(|r| r[4].parse().ok());
        assert_eq!(reward, Some(-1.25));
    }

    #[test]
    fn deterministic_output() {
        let records: Vec<StepRecord> = (0..5).map(make_record).collect();
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_csv(&records, &mut buf1).ok();
        write_csv(&records, &mut buf2).ok();
        assert_eq!(buf1, buf2);
    }
}
