pub mod io;

use std::collections::HashMap;
use std::path::Path;

use crate::error::Error;

/// Seed length for the k-mer lookup table.
pub const KMER_LEN: usize = 15;

/// Per-locus alignment index: the named reference window plus a k-mer
/// position table over it.
///
/// Built once per locus (or loaded from disk) and read-only afterwards;
/// identical windows always produce identical indexes.
#[derive(Debug)]
pub struct LocusIndex {
    pub name: String,
    pub sequence: Vec<u8>,
    kmers: HashMap<u64, Vec<u32>>,
}

impl LocusIndex {
    /// Build an index from a locus name and its extracted window sequence.
    pub fn build(name: &str, window: &[u8]) -> Result<Self, Error> {
        if window.is_empty() {
            return Err(Error::Region(format!(
                "empty reference window for locus {name}"
            )));
        }

        let sequence: Vec<u8> = window.iter().map(|b| b.to_ascii_uppercase()).collect();
        let kmers = index_kmers(&sequence);

        Ok(Self {
            name: name.to_string(),
            sequence,
            kmers,
        })
    }

    /// Window positions where the packed k-mer occurs, ascending.
    pub fn lookup(&self, kmer: u64) -> Option<&[u32]> {
        self.kmers.get(&kmer).map(Vec::as_slice)
    }
}

/// Build the k-mer position table. Windows containing non-ACGT bases are
/// left out, so `N` runs never seed an alignment.
fn index_kmers(sequence: &[u8]) -> HashMap<u64, Vec<u32>> {
    let mut kmers: HashMap<u64, Vec<u32>> = HashMap::new();
    if sequence.len() < KMER_LEN {
        return kmers;
    }

    for pos in 0..=sequence.len() - KMER_LEN {
        if let Some(key) = pack_kmer(&sequence[pos..pos + KMER_LEN]) {
            kmers.entry(key).or_default().push(pos as u32);
        }
    }

    kmers
}

/// 2-bit pack a k-mer window; `None` if it contains a non-ACGT base.
pub(crate) fn pack_kmer(window: &[u8]) -> Option<u64> {
    let mut key = 0u64;
    for &base in window {
        let code = match base {
            b'A' => 0,
            b'C' => 1,
            b'G' => 2,
            b'T' => 3,
            _ => return None,
        };
        key = (key << 2) | code;
    }
    Some(key)
}
