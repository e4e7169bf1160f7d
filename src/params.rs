use std::path::PathBuf;

use clap::Parser;

use crate::align::AlignConfig;
use crate::pipeline::Thresholds;

// ---------------------------------------------------------------------------
// Run mode enum
// ---------------------------------------------------------------------------

/// `--runMode` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Scan a BAM for split-read/split-pair evidence at each locus.
    Scan,
    /// Build and persist per-locus indexes from a reference FASTA.
    BuildIndex,
    /// Compile per-sample JSON reports into one TSV.
    Report,
}

impl std::str::FromStr for RunMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scan" => Ok(Self::Scan),
            "buildIndex" => Ok(Self::BuildIndex),
            "report" => Ok(Self::Report),
            _ => Err(format!(
                "unknown runMode '{s}'; expected 'scan', 'buildIndex' or 'report'"
            )),
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scan => write!(f, "scan"),
            Self::BuildIndex => write!(f, "buildIndex"),
            Self::Report => write!(f, "report"),
        }
    }
}

// ---------------------------------------------------------------------------
// Parameters struct
// ---------------------------------------------------------------------------

/// splithunter command-line parameters.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "splithunter",
    about = "Split-read and split-pair breakpoint evidence caller for targeted loci",
    version
)]
pub struct Parameters {
    // ── Run ─────────────────────────────────────────────────────────────
    /// Run mode: scan, buildIndex or report
    #[arg(long = "runMode", default_value = "scan")]
    pub run_mode: RunMode,

    // ── Inputs ──────────────────────────────────────────────────────────
    /// Input BAM with a .bai index next to it
    #[arg(long = "bam")]
    pub bam: Option<PathBuf>,

    /// BED file listing the target loci (chrom, start, end, name)
    #[arg(long = "bedFile")]
    pub bed_file: Option<PathBuf>,

    /// Restrict processing to a single named locus from the BED file
    #[arg(long = "locus")]
    pub locus: Option<String>,

    /// Reference FASTA file(s); enables on-the-fly index construction
    #[arg(long = "referenceFasta", num_args = 1..)]
    pub reference_fasta: Vec<PathBuf>,

    /// Directory holding per-locus indexes (buildIndex writes here,
    /// scan loads from here unless --referenceFasta is given)
    #[arg(long = "dataDir", default_value = "data")]
    pub data_dir: PathBuf,

    // ── Output ──────────────────────────────────────────────────────────
    /// Sample key; when set, the run report is also written to
    /// `<sampleKey>.json`
    #[arg(long = "sampleKey")]
    pub sample_key: Option<String>,

    /// JSON reports to compile (report mode)
    #[arg(long = "jsonFiles", num_args = 1..)]
    pub json_files: Vec<PathBuf>,

    /// Output TSV path (report mode)
    #[arg(long = "tsv", default_value = "out.tsv")]
    pub tsv: PathBuf,

    // ── Filter cascade ──────────────────────────────────────────────────
    /// Min clip length and per-part alignment score for a significant
    /// partial match
    #[arg(long = "pad", default_value_t = 30)]
    pub pad: i32,

    /// Min start-to-start distance separating the two parts of a split
    #[arg(long = "indel", default_value_t = 10_000)]
    pub indel: i64,

    /// Min trinucleotide entropy for a part to count as non-repetitive
    #[arg(long = "minEntropy", default_value_t = 50.0)]
    pub min_entropy: f64,

    // ── Realignment tuning ──────────────────────────────────────────────
    /// Drop secondary hits scoring below this fraction of the best hit
    #[arg(long = "secondaryCutoff", default_value_t = 0.9)]
    pub secondary_cutoff: f32,

    /// Max secondary hits returned per realignment
    #[arg(long = "secondaryCap", default_value_t = 0)]
    pub secondary_cap: usize,

    /// Hard-clip secondary hits to their aligned span
    #[arg(long = "hardClip")]
    pub hard_clip: bool,

    // ── Logging ─────────────────────────────────────────────────────────
    /// Log per-read classification outcomes
    #[arg(long = "verbose", short = 'v')]
    pub verbose: bool,
}

impl Parameters {
    /// Validate parameter combinations that clap alone cannot enforce.
    pub fn validate(&self) -> Result<(), crate::error::Error> {
        use crate::error::Error;

        match self.run_mode {
            RunMode::Scan => {
                if self.bam.is_none() {
                    return Err(Error::Parameter(
                        "--bam is required when --runMode scan".into(),
                    ));
                }
                if self.bed_file.is_none() {
                    return Err(Error::Parameter(
                        "--bedFile is required when --runMode scan".into(),
                    ));
                }
            }
            RunMode::BuildIndex => {
                if self.bed_file.is_none() {
                    return Err(Error::Parameter(
                        "--bedFile is required when --runMode buildIndex".into(),
                    ));
                }
                if self.reference_fasta.is_empty() {
                    return Err(Error::Parameter(
                        "--referenceFasta is required when --runMode buildIndex".into(),
                    ));
                }
            }
            RunMode::Report => {
                if self.json_files.is_empty() {
                    return Err(Error::Parameter(
                        "--jsonFiles is required when --runMode report".into(),
                    ));
                }
            }
        }

        if self.pad < 1 {
            return Err(Error::Parameter("--pad must be >= 1".into()));
        }
        if self.indel < 1 {
            return Err(Error::Parameter("--indel must be >= 1".into()));
        }
        if !(0.0..=1.0).contains(&self.secondary_cutoff) {
            return Err(Error::Parameter(
                "--secondaryCutoff must be within [0, 1]".into(),
            ));
        }

        Ok(())
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            pad: self.pad,
            indel: self.indel,
            minent: self.min_entropy,
        }
    }

    pub fn align_config(&self) -> AlignConfig {
        AlignConfig {
            hardclip: self.hard_clip,
            secondary_score_cutoff: self.secondary_cutoff,
            secondary_cap: self.secondary_cap,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
