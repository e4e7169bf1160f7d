// Split-pair aggregation over one locus pass

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::io::bam::ReadRecord;
use crate::pipeline::entropy::entropy;
use crate::pipeline::Thresholds;
use crate::region::Region;

/// Caches near-fully-mapped mates by template name during the locus pass,
/// then calls discordant pairs once the stream is exhausted. One aggregator
/// per locus; dropped with the pass.
#[derive(Default)]
pub struct PairAggregator {
    cache: HashMap<String, Vec<CachedMate>>,
}

struct CachedMate {
    region: Region,
    sequence: Vec<u8>,
}

/// Drain result for one locus.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PairSummary {
    pub total: u32,
    pub valid: u32,
    pub details: String,
}

impl PairAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream-pass step: cache the read if it is paired and its reported
    /// alignment already covers nearly the whole read (no realignment
    /// needed to trust its placement).
    pub fn observe(&mut self, read: &ReadRecord, pad: i32) {
        if !read.is_paired {
            return;
        }
        if (read.aligned_len as i32) < read.len() as i32 - pad {
            return;
        }

        self.cache
            .entry(read.name.clone())
            .or_default()
            .push(CachedMate {
                region: read.region.clone(),
                sequence: read.sequence.clone(),
            });
    }

    /// Post-stream drain. Only buckets holding exactly two mates count
    /// toward the total; more or fewer means incomplete or ambiguous
    /// evidence and the template is excluded entirely. Buckets drain in
    /// name order so identical inputs yield identical detail strings.
    pub fn evaluate(&self, thresholds: &Thresholds) -> PairSummary {
        let mut names: Vec<&String> = self.cache.keys().collect();
        names.sort();

        let mut summary = PairSummary::default();
        for name in names {
            let mates = &self.cache[name];
            if mates.len() != 2 {
                continue;
            }
            summary.total += 1;

            // Distinct regions
            let distance = mates[0].region.distance_between_starts(&mates[1].region);
            if distance < thresholds.indel {
                continue;
            }

            // Sequence complexity
            if entropy(&mates[0].sequence) < thresholds.minent
                || entropy(&mates[1].sequence) < thresholds.minent
            {
                continue;
            }

            summary.valid += 1;
            let _ = write!(
                summary.details,
                "{}|{};",
                mates[0].region, mates[1].region
            );
        }

        summary
    }

    #[cfg(test)]
    fn bucket_len(&self, name: &str) -> usize {
        self.cache.get(name).map_or(0, Vec::len)
    }
}
