use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Error;

/// A single reference sequence from a FASTA file.
#[derive(Debug, Clone)]
pub struct Chromosome {
    pub name: String,
    pub sequence: Vec<u8>,
}

/// Parse FASTA files and extract chromosomes.
///
/// - Bases are stored as uppercase ASCII; anything other than A/C/G/T
///   becomes `N`
/// - Control characters (ASCII < 32) are skipped
/// - Case-insensitive (a == A)
pub fn parse_fasta_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Chromosome>, Error> {
    let mut chromosomes = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(e, path))?;
        let reader = BufReader::new(file);

        let mut current_name: Option<String> = None;
        let mut current_seq: Vec<u8> = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result.map_err(|e| Error::io(e, path))?;

            if line.is_empty() {
                continue;
            }

            if let Some(stripped) = line.strip_prefix('>') {
                // New chromosome header
                if let Some(name) = current_name.take() {
                    chromosomes.push(Chromosome {
                        name,
                        sequence: current_seq,
                    });
                    current_seq = Vec::new();
                }

                // Chromosome name is everything after '>' up to first whitespace
                let name = stripped
                    .split_whitespace()
                    .next()
                    .ok_or_else(|| {
                        Error::Fasta(format!(
                            "empty chromosome name at {}:{}",
                            path.display(),
                            line_num + 1
                        ))
                    })?
                    .to_string();

                current_name = Some(name);
            } else {
                if current_name.is_none() {
                    return Err(Error::Fasta(format!(
                        "sequence data before first header at {}:{}",
                        path.display(),
                        line_num + 1
                    )));
                }

                for &byte in line.as_bytes() {
                    if byte < 32 {
                        // Control character — skip
                        continue;
                    }

                    let base = match byte {
                        b'A' | b'a' => b'A',
                        b'C' | b'c' => b'C',
                        b'G' | b'g' => b'G',
                        b'T' | b't' => b'T',
                        _ => b'N',
                    };

                    current_seq.push(base);
                }
            }
        }

        if let Some(name) = current_name {
            chromosomes.push(Chromosome {
                name,
                sequence: current_seq,
            });
        }
    }

    if chromosomes.is_empty() {
        return Err(Error::Fasta(
            "no chromosomes found in FASTA files".to_string(),
        ));
    }

    Ok(chromosomes)
}
