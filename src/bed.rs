use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Error;

/// One target locus from the BED-like input list.
///
/// Coordinates are 0-based half-open as in BED. The name doubles as the
/// namespace of the locus index (`<dataDir>/<name>.shx`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locus {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub name: String,
}

impl Locus {
    /// Region string for logs and BAM queries, 1-based inclusive.
    pub fn region_string(&self) -> String {
        format!("{}:{}-{}", self.chrom, self.start + 1, self.end)
    }
}

/// Parse a BED-like locus list: chrom, start, end, name (extra columns
/// ignored). Blank lines and `#`/`track`/`browser` lines are skipped.
pub fn parse_bed(path: &Path) -> Result<Vec<Locus>, Error> {
    let file = File::open(path).map_err(|e| Error::io(e, path))?;
    let reader = BufReader::new(file);

    let mut loci = Vec::new();
    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|e| Error::io(e, path))?;
        let line = line.trim();

        if line.is_empty()
            || line.starts_with('#')
            || line.starts_with("track")
            || line.starts_with("browser")
        {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(Error::Locus(format!(
                "expected at least 4 fields at {}:{}, got {}",
                path.display(),
                line_num + 1,
                fields.len()
            )));
        }

        let start: u64 = fields[1].parse().map_err(|_| {
            Error::Locus(format!(
                "invalid start '{}' at {}:{}",
                fields[1],
                path.display(),
                line_num + 1
            ))
        })?;
        let end: u64 = fields[2].parse().map_err(|_| {
            Error::Locus(format!(
                "invalid end '{}' at {}:{}",
                fields[2],
                path.display(),
                line_num + 1
            ))
        })?;
        if end <= start {
            return Err(Error::Locus(format!(
                "empty interval {}-{} at {}:{}",
                start,
                end,
                path.display(),
                line_num + 1
            )));
        }

        loci.push(Locus {
            chrom: fields[0].to_string(),
            start,
            end,
            name: fields[3].to_string(),
        });
    }

    if loci.is_empty() {
        return Err(Error::Locus(format!(
            "no loci found in {}",
            path.display()
        )));
    }

    Ok(loci)
}
