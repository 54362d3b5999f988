use crate::signal::Sample;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse newline-delimited `ir red` pairs (whitespace or comma separated),
/// ignoring blank/comment lines.
pub fn parse_samples(text: &str) -> Result<Vec<Sample>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();
        if fields.len() != 2 {
            anyhow::bail!(
                "line {} should hold an ir and a red reading: {}",
                idx + 1,
                trimmed
            );
        }
        let ir: f64 = fields[0]
            .parse()
            .with_context(|| format!("line {} ir is not f64: {}", idx + 1, fields[0]))?;
        let red: f64 = fields[1]
            .parse()
            .with_context(|| format!("line {} red is not f64: {}", idx + 1, fields[1]))?;
        out.push(Sample { ir, red });
    }
    if out.is_empty() {
        anyhow::bail!("no samples found");
    }
    Ok(out)
}

/// Read `ir red` pairs from disk.
pub fn read_samples(path: &Path) -> Result<Vec<Sample>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_samples(&text)
}
