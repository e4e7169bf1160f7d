pub mod classify;
pub mod entropy;
pub mod pairs;
pub mod report;

use std::fmt::Write as _;

use log::{debug, info};

use crate::align::{AlignConfig, QueryAligner};
use crate::io::bam::ReadRecord;
use classify::{classify, Classification};
use pairs::PairAggregator;
use report::LocusReport;

/// Filter-cascade thresholds, fixed at startup and passed into every
/// component; there is no mutable global configuration.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    /// Minimum clip length and per-part score for a significant but
    /// partial match.
    pub pad: i32,
    /// Minimum start-to-start distance separating two distinct regions.
    pub indel: i64,
    /// Minimum trinucleotide entropy for a non-repetitive fragment.
    pub minent: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            pad: 30,
            indel: 10_000,
            minent: 50.0,
        }
    }
}

/// Single-pass scan state for one locus: running split-read tallies plus
/// the pair cache. Owned by the locus pass and discarded with it.
pub struct LocusScan<'a> {
    aligner: &'a dyn QueryAligner,
    thresholds: Thresholds,
    config: AlignConfig,
    pairs: PairAggregator,
    report: LocusReport,
}

impl<'a> LocusScan<'a> {
    pub fn new(
        locus_name: &str,
        aligner: &'a dyn QueryAligner,
        thresholds: Thresholds,
        config: AlignConfig,
    ) -> Self {
        Self {
            aligner,
            thresholds,
            config,
            pairs: PairAggregator::new(),
            report: LocusReport::new(locus_name),
        }
    }

    /// Push one stream record through the classifier and the pair cache.
    /// Duplicates are ignored entirely; every other read counts toward the
    /// split-read total whatever its outcome.
    pub fn observe(&mut self, read: &ReadRecord) {
        if read.is_duplicate {
            return;
        }

        self.report.sr_total += 1;
        self.pairs.observe(read, self.thresholds.pad);

        match classify(read, self.aligner, &self.thresholds, &self.config) {
            Classification::Accepted(evidence) => {
                self.report.sr_valid += 1;
                let _ = write!(
                    self.report.sr_details,
                    "{}|{};",
                    evidence.left, evidence.right
                );
                debug!(
                    "SR {}: score {} + {} at {} | {} (distance {})",
                    read.name,
                    evidence.left_score,
                    evidence.right_score,
                    evidence.left,
                    evidence.right,
                    evidence.distance
                );
            }
            Classification::Rejected(reason) => {
                debug!("SR {}: rejected {:?}", read.name, reason);
            }
        }
    }

    /// Drain the pair cache and finish this locus's report.
    pub fn finish(mut self) -> LocusReport {
        let pair_summary = self.pairs.evaluate(&self.thresholds);
        self.report.sp_total = pair_summary.total;
        self.report.sp_valid = pair_summary.valid;
        self.report.sp_details = pair_summary.details;

        info!(
            "SR ratio: {} / {} = {} ppm",
            self.report.sr_valid,
            self.report.sr_total,
            self.report.sr_ppm()
        );
        info!(
            "SP ratio: {} / {} = {} ppm",
            self.report.sp_valid,
            self.report.sp_total,
            self.report.sp_ppm()
        );

        self.report
    }
}
