use crate::signal::Sample;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::Path;

/// Load paired readings from a CSV with an `ir` column and a `red` (or
/// `redir`) column. Other columns are ignored.
pub fn read_samples_csv(path: &Path) -> Result<Vec<Sample>> {
    let file =
        std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_samples_csv_from(file).with_context(|| format!("reading {}", path.display()))
}

pub fn read_samples_csv_from<R: Read>(input: R) -> Result<Vec<Sample>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(input);
    let headers = reader.headers().context("reading header")?.clone();
    let ir_idx = locate_column(&headers, &["ir"])?;
    let red_idx = locate_column(&headers, &["red", "redir"])?;

    let mut samples = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading record {}", row + 1))?;
        let ir = parse_field(&record, ir_idx, "ir", row)?;
        let red = parse_field(&record, red_idx, "red", row)?;
        samples.push(Sample { ir, red });
    }
    if samples.is_empty() {
        anyhow::bail!("no samples found");
    }
    Ok(samples)
}

fn locate_column(headers: &StringRecord, names: &[&str]) -> Result<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
        .with_context(|| format!("missing column '{}'", names.join("' or '")))
}

fn parse_field(record: &StringRecord, idx: usize, name: &str, row: usize) -> Result<f64> {
    let value = record
        .get(idx)
        .ok_or_else(|| anyhow::anyhow!("record {} missing {} column", row + 1, name))?;
    value
        .parse::<f64>()
        .with_context(|| format!("record {} {} is not f64: {}", row + 1, name, value))
}
