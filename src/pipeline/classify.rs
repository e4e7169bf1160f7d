// Split-read breakpoint classification

use crate::align::{AlignConfig, QueryAligner};
use crate::io::bam::ReadRecord;
use crate::pipeline::entropy::entropy;
use crate::pipeline::Thresholds;
use crate::region::Region;

/// Why a read carries no split-read signal. Rejections are counted
/// outcomes, not errors; the variants mirror the cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Source clip below PAD or above length - PAD.
    ClipOutOfRange,
    /// Full-sequence realignment returned nothing.
    Unaligned,
    /// Top realignment does not itself show a partial clip.
    RealignedClipOutOfRange,
    /// Alignment covers the read too fully to place one breakpoint.
    NoBreakpoint,
    /// One of the two parts failed to realign.
    PartUnaligned,
    /// One part scored below PAD.
    WeakPartScore,
    /// Parts together leave too much of the read unexplained.
    LowTotalScore,
    /// Parts land closer than the INDEL threshold.
    ProximalParts,
    /// One part is too repetitive to trust.
    LowComplexity,
}

/// Evidence emitted for an accepted split read.
#[derive(Debug, Clone)]
pub struct SplitEvidence {
    pub left: Region,
    pub right: Region,
    pub left_score: i32,
    pub right_score: i32,
    pub distance: i64,
}

#[derive(Debug)]
pub enum Classification {
    Accepted(SplitEvidence),
    Rejected(RejectReason),
}

/// Decide whether one read contains a well-supported breakpoint.
///
/// The cascade realigns the full read, localizes a single split point from
/// the top candidate's query bounds, realigns both parts independently, and
/// applies the score, total-score, distance, and complexity conditions in
/// that order. All conditions short-circuit.
pub fn classify(
    read: &ReadRecord,
    aligner: &dyn QueryAligner,
    thresholds: &Thresholds,
    config: &AlignConfig,
) -> Classification {
    use Classification::Rejected;
    use RejectReason::*;

    let pad = thresholds.pad;
    let clip = read.clip_len as i32;
    let len = read.len() as i32;
    if clip < pad || clip > len - pad {
        return Rejected(ClipOutOfRange);
    }

    let hits = aligner.align(&read.sequence, &read.name, config);
    let Some(hit) = hits.first() else {
        return Rejected(Unaligned);
    };

    let read_length = hit.length() as i32;
    let hit_clip = hit.clip_len() as i32;
    if hit_clip < pad || hit_clip > read_length - pad {
        return Rejected(RealignedClipOutOfRange);
    }

    // Bipartite split from the top candidate's query-space bounds; the
    // query-start branch takes precedence when both would apply.
    let query_start = hit.query_start as i32;
    let query_end = hit.query_end as i32;
    let (left, right) = if query_start > pad {
        hit.sequence.split_at(hit.query_start)
    } else if query_end < read_length - pad {
        hit.sequence.split_at(hit.query_end)
    } else {
        return Rejected(NoBreakpoint);
    };

    let left_hits = aligner.align(left, &format!("{}L", read.name), config);
    let right_hits = aligner.align(right, &format!("{}R", read.name), config);
    let (Some(left_hit), Some(right_hit)) = (left_hits.first(), right_hits.first()) else {
        return Rejected(PartUnaligned);
    };

    // Condition 1: each part individually significant
    if left_hit.score < pad || right_hit.score < pad {
        return Rejected(WeakPartScore);
    }

    // Condition 2: the parts together explain nearly the whole read
    let total_score = left_hit.score + right_hit.score;
    if total_score < read_length - pad / 2 {
        return Rejected(LowTotalScore);
    }

    // Condition 3: distinct regions
    let distance = left_hit.region.distance_between_starts(&right_hit.region);
    if distance < thresholds.indel {
        return Rejected(ProximalParts);
    }

    // Condition 4: complexity filter
    if entropy(left) < thresholds.minent || entropy(right) < thresholds.minent {
        return Rejected(LowComplexity);
    }

    Classification::Accepted(SplitEvidence {
        left: left_hit.region.clone(),
        right: right_hit.region.clone(),
        left_score: left_hit.score,
        right_score: right_hit.score,
        distance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::Alignment;
    use crate::region::Strand;
    use std::collections::HashMap;

    /// Scripted aligner: canned candidate lists keyed by query sequence.
    struct ScriptedAligner {
        hits: HashMap<Vec<u8>, Vec<Alignment>>,
    }

    impl ScriptedAligner {
        fn new() -> Self {
            Self {
                hits: HashMap::new(),
            }
        }

        fn script(mut self, query: &[u8], hits: Vec<Alignment>) -> Self {
            self.hits.insert(query.to_vec(), hits);
            self
        }
    }

    impl QueryAligner for ScriptedAligner {
        fn align(&self, query: &[u8], _query_name: &str, _config: &AlignConfig) -> Vec<Alignment> {
            self.hits.get(query).cloned().unwrap_or_default()
        }
    }

    fn thresholds() -> Thresholds {
        Thresholds {
            pad: 30,
            indel: 10_000,
            minent: 50.0,
        }
    }

    /// Deterministic high-complexity sequence of the given length.
    fn diverse_seq(len: usize, seed: u64) -> Vec<u8> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                match (state >> 33) & 3 {
                    0 => b'A',
                    1 => b'C',
                    2 => b'G',
                    _ => b'T',
                }
            })
            .collect()
    }

    fn read(sequence: Vec<u8>, clip_len: usize) -> ReadRecord {
        ReadRecord {
            name: "r1".to_string(),
            region: Region::new("14", 21_700_000, 21_700_000 + sequence.len() as i64, Strand::Forward),
            sequence,
            is_duplicate: false,
            is_paired: true,
            clip_len,
            aligned_len: 0,
        }
    }

    fn candidate(sequence: &[u8], start: i64, query_start: usize, query_end: usize, score: i32) -> Alignment {
        Alignment {
            query_name: "r1".to_string(),
            sequence: sequence.to_vec(),
            region: Region::new(
                "TRA",
                start + query_start as i64,
                start + query_end as i64,
                Strand::Forward,
            ),
            query_start,
            query_end,
            score,
        }
    }

    /// A 100-base read split 40/60 whose parts land 20 kb apart; every
    /// cascade condition passes.
    fn accepting_fixture() -> (ReadRecord, ScriptedAligner) {
        let seq = diverse_seq(100, 3);
        let read = read(seq.clone(), 40);
        let (left, right) = (seq[..40].to_vec(), seq[40..].to_vec());

        let aligner = ScriptedAligner::new()
            // Full read: aligned over [40, 100), 40 clipped
            .script(&seq, vec![candidate(&seq, 30_000 - 40, 40, 100, 60)])
            .script(&left, vec![candidate(&left, 10_000, 0, 40, 40)])
            .script(&right, vec![candidate(&right, 30_000, 0, 60, 60)]);

        (read, aligner)
    }

    fn assert_rejected(c: Classification, reason: RejectReason) {
        match c {
            Classification::Rejected(r) => assert_eq!(r, reason),
            Classification::Accepted(_) => panic!("expected rejection {reason:?}, got acceptance"),
        }
    }

    #[test]
    fn accepts_clean_split() {
        let (read, aligner) = accepting_fixture();
        match classify(&read, &aligner, &thresholds(), &AlignConfig::default()) {
            Classification::Accepted(ev) => {
                assert_eq!(ev.left_score, 40);
                assert_eq!(ev.right_score, 60);
                assert_eq!(ev.distance, 20_000);
                assert_eq!(ev.left.start, 10_000);
                assert_eq!(ev.right.start, 30_000);
            }
            Classification::Rejected(r) => panic!("unexpected rejection: {r:?}"),
        }
    }

    #[test]
    fn rejects_negligible_clip() {
        let (mut read, aligner) = accepting_fixture();
        read.clip_len = 29;
        assert_rejected(
            classify(&read, &aligner, &thresholds(), &AlignConfig::default()),
            RejectReason::ClipOutOfRange,
        );
    }

    #[test]
    fn rejects_near_total_clip() {
        let (mut read, aligner) = accepting_fixture();
        read.clip_len = 71; // > 100 - 30
        assert_rejected(
            classify(&read, &aligner, &thresholds(), &AlignConfig::default()),
            RejectReason::ClipOutOfRange,
        );
    }

    #[test]
    fn clip_bounds_are_inclusive() {
        // clip == PAD and clip == len - PAD both pass the pre-filter
        let (mut read, aligner) = accepting_fixture();
        read.clip_len = 30;
        assert!(matches!(
            classify(&read, &aligner, &thresholds(), &AlignConfig::default()),
            Classification::Accepted(_)
        ));
        read.clip_len = 70;
        assert!(matches!(
            classify(&read, &aligner, &thresholds(), &AlignConfig::default()),
            Classification::Accepted(_)
        ));
    }

    #[test]
    fn rejects_unaligned_read() {
        let seq = diverse_seq(100, 3);
        let read = read(seq, 40);
        let aligner = ScriptedAligner::new();
        assert_rejected(
            classify(&read, &aligner, &thresholds(), &AlignConfig::default()),
            RejectReason::Unaligned,
        );
    }

    #[test]
    fn rejects_clean_full_length_realignment() {
        // The realigned record shows no partial clip: a clean match
        let seq = diverse_seq(100, 3);
        let read = read(seq.clone(), 40);
        let aligner =
            ScriptedAligner::new().script(&seq, vec![candidate(&seq, 10_000, 0, 100, 100)]);
        assert_rejected(
            classify(&read, &aligner, &thresholds(), &AlignConfig::default()),
            RejectReason::RealignedClipOutOfRange,
        );
    }

    #[test]
    fn rejects_unlocalizable_breakpoint() {
        // Clip sits inside the realignment but both query bounds hug the
        // read edges: query_start <= PAD and query_end >= len - PAD
        let seq = diverse_seq(100, 3);
        let read = read(seq.clone(), 40);
        let aligner =
            ScriptedAligner::new().script(&seq, vec![candidate(&seq, 10_000, 20, 90, 40)]);
        assert_rejected(
            classify(&read, &aligner, &thresholds(), &AlignConfig::default()),
            RejectReason::NoBreakpoint,
        );
    }

    #[test]
    fn splits_at_query_start_when_both_would_apply() {
        // query_start > PAD and query_end < len - PAD: the start wins
        let seq = diverse_seq(100, 3);
        let read = read(seq.clone(), 40);
        let left = seq[..35].to_vec();
        let right = seq[35..].to_vec();
        let aligner = ScriptedAligner::new()
            .script(&seq, vec![candidate(&seq, 30_000 - 35, 35, 68, 33)])
            .script(&left, vec![candidate(&left, 10_000, 0, 35, 35)])
            .script(&right, vec![candidate(&right, 30_000, 0, 65, 65)]);

        match classify(&read, &aligner, &thresholds(), &AlignConfig::default()) {
            Classification::Accepted(ev) => {
                assert_eq!(ev.left_score, 35);
                assert_eq!(ev.right_score, 65);
            }
            Classification::Rejected(r) => panic!("unexpected rejection: {r:?}"),
        }
    }

    #[test]
    fn rejects_when_part_fails_to_realign() {
        let seq = diverse_seq(100, 3);
        let read = read(seq.clone(), 40);
        let left = seq[..40].to_vec();
        // Right part deliberately unscripted
        let aligner = ScriptedAligner::new()
            .script(&seq, vec![candidate(&seq, 30_000 - 40, 40, 100, 60)])
            .script(&left, vec![candidate(&left, 10_000, 0, 40, 40)]);
        assert_rejected(
            classify(&read, &aligner, &thresholds(), &AlignConfig::default()),
            RejectReason::PartUnaligned,
        );
    }

    #[test]
    fn rejects_weak_part_score() {
        let (read, _) = accepting_fixture();
        let seq = read.sequence.clone();
        let (left, right) = (seq[..40].to_vec(), seq[40..].to_vec());
        let aligner = ScriptedAligner::new()
            .script(&seq, vec![candidate(&seq, 30_000 - 40, 40, 100, 60)])
            .script(&left, vec![candidate(&left, 10_000, 0, 40, 29)])
            .script(&right, vec![candidate(&right, 30_000, 0, 60, 60)]);
        assert_rejected(
            classify(&read, &aligner, &thresholds(), &AlignConfig::default()),
            RejectReason::WeakPartScore,
        );
    }

    #[test]
    fn total_score_boundary_is_non_strict() {
        // len - PAD/2 = 100 - 15 = 85; a total of exactly 85 is accepted
        let (read, _) = accepting_fixture();
        let seq = read.sequence.clone();
        let (left, right) = (seq[..40].to_vec(), seq[40..].to_vec());
        let aligner = ScriptedAligner::new()
            .script(&seq, vec![candidate(&seq, 30_000 - 40, 40, 100, 60)])
            .script(&left, vec![candidate(&left, 10_000, 0, 40, 35)])
            .script(&right, vec![candidate(&right, 30_000, 0, 60, 50)]);
        assert!(matches!(
            classify(&read, &aligner, &thresholds(), &AlignConfig::default()),
            Classification::Accepted(_)
        ));

        // 84 is rejected
        let seq2 = read.sequence.clone();
        let aligner = ScriptedAligner::new()
            .script(&seq2, vec![candidate(&seq2, 30_000 - 40, 40, 100, 60)])
            .script(&left, vec![candidate(&left, 10_000, 0, 40, 34)])
            .script(&right, vec![candidate(&right, 30_000, 0, 60, 50)]);
        assert_rejected(
            classify(&read, &aligner, &thresholds(), &AlignConfig::default()),
            RejectReason::LowTotalScore,
        );
    }

    #[test]
    fn rejects_proximal_parts() {
        let (read, _) = accepting_fixture();
        let seq = read.sequence.clone();
        let (left, right) = (seq[..40].to_vec(), seq[40..].to_vec());
        // 9,999 apart: an indel-scale event, not a breakpoint
        let aligner = ScriptedAligner::new()
            .script(&seq, vec![candidate(&seq, 19_999 - 40, 40, 100, 60)])
            .script(&left, vec![candidate(&left, 10_000, 0, 40, 40)])
            .script(&right, vec![candidate(&right, 19_999, 0, 60, 60)]);
        assert_rejected(
            classify(&read, &aligner, &thresholds(), &AlignConfig::default()),
            RejectReason::ProximalParts,
        );
    }

    #[test]
    fn parts_on_different_sequences_are_distinct() {
        let (read, _) = accepting_fixture();
        let seq = read.sequence.clone();
        let (left, right) = (seq[..40].to_vec(), seq[40..].to_vec());
        let mut right_hit = candidate(&right, 100, 0, 60, 60);
        right_hit.region.name = "TRB".to_string();
        let aligner = ScriptedAligner::new()
            .script(&seq, vec![candidate(&seq, 30_000 - 40, 40, 100, 60)])
            .script(&left, vec![candidate(&left, 10_000, 0, 40, 40)])
            .script(&right, vec![right_hit]);

        match classify(&read, &aligner, &thresholds(), &AlignConfig::default()) {
            Classification::Accepted(ev) => assert_eq!(ev.distance, i64::MAX),
            Classification::Rejected(r) => panic!("unexpected rejection: {r:?}"),
        }
    }

    #[test]
    fn rejects_low_complexity_part() {
        let mut seq = diverse_seq(100, 3);
        // Left 40 bases become a homopolymer run
        seq[..40].fill(b'A');
        let read = read(seq.clone(), 40);
        let (left, right) = (seq[..40].to_vec(), seq[40..].to_vec());
        let aligner = ScriptedAligner::new()
            .script(&seq, vec![candidate(&seq, 30_000 - 40, 40, 100, 60)])
            .script(&left, vec![candidate(&left, 10_000, 0, 40, 40)])
            .script(&right, vec![candidate(&right, 30_000, 0, 60, 60)]);
        assert_rejected(
            classify(&read, &aligner, &thresholds(), &AlignConfig::default()),
            RejectReason::LowComplexity,
        );
    }
}
