use crate::index::{pack_kmer, LocusIndex, KMER_LEN};
use crate::region::{Region, Strand};

pub const MATCH_SCORE: i32 = 1;
pub const MISMATCH_PENALTY: i32 = -4;

/// Candidate diagonals examined per strand; repetitive queries beyond this
/// are truncated (leftmost diagonals kept) to bound the scan.
const MAX_DIAGONALS: usize = 1024;

/// Tuning knobs forwarded to every realignment call.
#[derive(Debug, Clone, Copy)]
pub struct AlignConfig {
    /// Trim secondary hits to their aligned span.
    pub hardclip: bool,
    /// Secondary hits scoring below this fraction of the best are dropped.
    pub secondary_score_cutoff: f32,
    /// Max number of secondary hits returned.
    pub secondary_cap: usize,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            hardclip: false,
            secondary_score_cutoff: 0.9,
            secondary_cap: 0,
        }
    }
}

/// One candidate placement of a query on the locus window.
#[derive(Debug, Clone)]
pub struct Alignment {
    pub query_name: String,
    /// Query as aligned: reverse-complemented for minus-strand placements.
    pub sequence: Vec<u8>,
    pub region: Region,
    /// Aligned span `[query_start, query_end)` within `sequence`.
    pub query_start: usize,
    pub query_end: usize,
    pub score: i32,
}

impl Alignment {
    pub fn length(&self) -> usize {
        self.sequence.len()
    }

    /// Bases outside the aligned span.
    pub fn clip_len(&self) -> usize {
        self.length() - (self.query_end - self.query_start)
    }
}

/// Realignment seam between the pipeline and the engine. The classifier
/// only depends on this trait, so tests can drive it with scripted
/// candidates instead of a real index.
pub trait QueryAligner {
    /// Candidates best-first; may be empty. Candidate order must be
    /// deterministic for identical queries.
    fn align(&self, query: &[u8], query_name: &str, config: &AlignConfig) -> Vec<Alignment>;
}

impl QueryAligner for LocusIndex {
    fn align(&self, query: &[u8], query_name: &str, config: &AlignConfig) -> Vec<Alignment> {
        align_query(self, query, query_name, config)
    }
}

/// Align a query against the locus window on both strands.
///
/// Seeds exact k-mer matches, groups them by diagonal, and keeps the best
/// gapless segment per diagonal. Ranking is (score desc, start asc,
/// forward-before-reverse), making results reproducible run to run.
pub fn align_query(
    index: &LocusIndex,
    query: &[u8],
    query_name: &str,
    config: &AlignConfig,
) -> Vec<Alignment> {
    let forward = query.to_ascii_uppercase();
    let reverse = reverse_complement(&forward);

    let mut candidates = Vec::new();
    for (oriented, strand) in [(&forward, Strand::Forward), (&reverse, Strand::Reverse)] {
        for diag in seed_diagonals(index, oriented) {
            if let Some((query_start, query_end, score)) = best_segment(index, oriented, diag) {
                let region = Region::new(
                    &index.name,
                    diag + query_start as i64,
                    diag + query_end as i64,
                    strand,
                );
                candidates.push(Alignment {
                    query_name: query_name.to_string(),
                    sequence: oriented.clone(),
                    region,
                    query_start,
                    query_end,
                    score,
                });
            }
        }
    }

    rank_and_trim(candidates, config)
}

/// Distinct window diagonals hit by exact k-mer seeds, ascending.
fn seed_diagonals(index: &LocusIndex, oriented: &[u8]) -> Vec<i64> {
    if oriented.len() < KMER_LEN {
        return Vec::new();
    }

    let mut diagonals = Vec::new();
    for query_pos in 0..=oriented.len() - KMER_LEN {
        let Some(key) = pack_kmer(&oriented[query_pos..query_pos + KMER_LEN]) else {
            continue;
        };
        if let Some(positions) = index.lookup(key) {
            for &window_pos in positions {
                diagonals.push(window_pos as i64 - query_pos as i64);
            }
        }
    }

    diagonals.sort_unstable();
    diagonals.dedup();
    diagonals.truncate(MAX_DIAGONALS);
    diagonals
}

/// Best-scoring gapless segment of the query along one diagonal
/// (maximal-sum subsegment over match/mismatch steps).
fn best_segment(index: &LocusIndex, oriented: &[u8], diag: i64) -> Option<(usize, usize, i32)> {
    let window = &index.sequence;
    let query_lo = (-diag).max(0) as usize;
    let query_hi = oriented
        .len()
        .min((window.len() as i64 - diag).max(0) as usize);
    if query_hi <= query_lo {
        return None;
    }

    let mut best = 0i32;
    let mut best_span = (query_lo, query_lo);
    let mut run = 0i32;
    let mut run_start = query_lo;

    for q in query_lo..query_hi {
        let w = (q as i64 + diag) as usize;
        let step = if oriented[q] == window[w] && oriented[q] != b'N' {
            MATCH_SCORE
        } else {
            MISMATCH_PENALTY
        };

        run += step;
        if run > best {
            best = run;
            best_span = (run_start, q + 1);
        }
        if run <= 0 {
            run = 0;
            run_start = q + 1;
        }
    }

    // Anything below a seed's worth of matches is noise
    if best < KMER_LEN as i32 {
        return None;
    }
    Some((best_span.0, best_span.1, best))
}

fn strand_rank(strand: Strand) -> u8 {
    match strand {
        Strand::Forward => 0,
        Strand::Reverse => 1,
    }
}

/// Order candidates best-first and apply the secondary cutoff/cap.
fn rank_and_trim(mut candidates: Vec<Alignment>, config: &AlignConfig) -> Vec<Alignment> {
    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.region.start.cmp(&b.region.start))
            .then(strand_rank(a.region.strand).cmp(&strand_rank(b.region.strand)))
    });

    let Some(best_score) = candidates.first().map(|c| c.score) else {
        return candidates;
    };
    let cutoff = (best_score as f32 * config.secondary_score_cutoff).ceil() as i32;

    let mut out: Vec<Alignment> = Vec::with_capacity(1 + config.secondary_cap);
    for (i, mut candidate) in candidates.into_iter().enumerate() {
        if i > 0 {
            if out.len() > config.secondary_cap || candidate.score < cutoff {
                break;
            }
            if config.hardclip {
                candidate.sequence =
                    candidate.sequence[candidate.query_start..candidate.query_end].to_vec();
                candidate.query_end -= candidate.query_start;
                candidate.query_start = 0;
            }
        }
        out.push(candidate);
    }
    out
}

pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&base| match base {
            b'A' => b'T',
            b'C' => b'G',
            b'G' => b'C',
            b'T' => b'A',
            _ => b'N',
        })
        .collect()
}
