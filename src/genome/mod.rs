pub mod fasta;

use std::collections::HashMap;
use std::path::Path;

use crate::error::Error;
use fasta::Chromosome;

/// In-memory reference genome, the source of locus windows.
pub struct Genome {
    chromosomes: Vec<Chromosome>,
    by_name: HashMap<String, usize>,
}

impl Genome {
    /// Load reference sequences from one or more FASTA files.
    pub fn from_fasta<P: AsRef<Path>>(paths: &[P]) -> Result<Self, Error> {
        let chromosomes = fasta::parse_fasta_files(paths)?;

        let mut by_name = HashMap::with_capacity(chromosomes.len());
        for (i, chrom) in chromosomes.iter().enumerate() {
            by_name.insert(chrom.name.clone(), i);
        }

        Ok(Self {
            chromosomes,
            by_name,
        })
    }

    pub fn n_chromosomes(&self) -> usize {
        self.chromosomes.len()
    }

    /// Extract the window `[start, end)` (0-based half-open) from the named
    /// chromosome.
    pub fn query_region(&self, chrom: &str, start: u64, end: u64) -> Result<&[u8], Error> {
        let &idx = self.by_name.get(chrom).ok_or_else(|| {
            Error::Region(format!("unknown chromosome '{chrom}'"))
        })?;

        let sequence = &self.chromosomes[idx].sequence;
        let (start, end) = (start as usize, end as usize);
        if end > sequence.len() || start >= end {
            return Err(Error::Region(format!(
                "interval {}:{}-{} outside chromosome bounds (length {})",
                chrom,
                start,
                end,
                sequence.len()
            )));
        }

        Ok(&sequence[start..end])
    }
}
