pub mod error;
pub mod params;

pub mod align;
pub mod bed;
pub mod genome;
pub mod index;
pub mod io;
pub mod pipeline;
pub mod region;

use std::fs;

use log::{error, info};

use crate::bed::Locus;
use crate::genome::Genome;
use crate::index::LocusIndex;
use crate::io::bam::BamScanner;
use crate::params::{Parameters, RunMode};
use crate::pipeline::report::{compile_reports, LocusReport, RunReport};
use crate::pipeline::LocusScan;

/// Top-level dispatcher. Called from `main()` after CLI parsing.
pub fn run(params: &Parameters) -> anyhow::Result<()> {
    params.validate()?;

    info!("splithunter v{}", env!("CARGO_PKG_VERSION"));
    info!("runMode: {}", params.run_mode);

    match params.run_mode {
        RunMode::Scan => scan(params),
        RunMode::BuildIndex => build_indexes(params),
        RunMode::Report => report(params),
    }
}

/// Load the target loci, honoring the optional `--locus` filter.
fn target_loci(params: &Parameters) -> anyhow::Result<Vec<Locus>> {
    let bed_file = match &params.bed_file {
        Some(path) => path,
        None => anyhow::bail!("--bedFile is required"),
    };

    let mut loci = bed::parse_bed(bed_file)?;
    if let Some(wanted) = &params.locus {
        loci.retain(|l| &l.name == wanted);
        if loci.is_empty() {
            anyhow::bail!("locus '{wanted}' not found in {}", bed_file.display());
        }
    }
    Ok(loci)
}

fn build_indexes(params: &Parameters) -> anyhow::Result<()> {
    let loci = target_loci(params)?;

    info!("loading reference from {:?}...", params.reference_fasta);
    let genome = Genome::from_fasta(&params.reference_fasta)?;
    info!("loaded {} chromosomes", genome.n_chromosomes());

    fs::create_dir_all(&params.data_dir)?;
    for locus in &loci {
        info!("target: {} ({})", locus.name, locus.region_string());
        let window = genome.query_region(&locus.chrom, locus.start, locus.end)?;
        let index = LocusIndex::build(&locus.name, window)?;
        let path = index.write(&params.data_dir)?;
        info!("index written to {}", path.display());
    }

    info!("built {} locus indexes", loci.len());
    Ok(())
}

fn scan(params: &Parameters) -> anyhow::Result<()> {
    let bam = match &params.bam {
        Some(path) => path,
        None => anyhow::bail!("--bam is required"),
    };
    let loci = target_loci(params)?;

    // On-the-fly index construction when a reference is supplied;
    // otherwise prebuilt indexes are loaded from the data directory
    let genome = if params.reference_fasta.is_empty() {
        None
    } else {
        info!("loading reference from {:?}...", params.reference_fasta);
        Some(Genome::from_fasta(&params.reference_fasta)?)
    };

    let scanner = BamScanner::new(bam);
    let sample_key = params.sample_key.as_deref().unwrap_or("");
    let mut run_report = RunReport::new(&bam.display().to_string(), sample_key);

    if let Some(bed_file) = &params.bed_file {
        info!("BED input: {}", bed_file.display());
    }
    info!("BAM input: {}", bam.display());

    for locus in &loci {
        info!("target: {} ({})", locus.name, locus.region_string());

        // A failing locus is skipped with a zeroed entry; the run continues
        match scan_locus(params, locus, genome.as_ref(), &scanner) {
            Ok(locus_report) => run_report.add(&locus_report),
            Err(e) => {
                error!("skipping locus {}: {e}", locus.name);
                run_report.add(&LocusReport::new(&locus.name));
            }
        }
    }

    if let Some(key) = &params.sample_key {
        let path = run_report.write_sample_file(std::path::Path::new("."), key)?;
        info!("report written to {}", path.display());
    }
    println!("{}", run_report.to_json_string());

    Ok(())
}

/// One pass over one locus: prepare the index, stream the region, drain.
fn scan_locus(
    params: &Parameters,
    locus: &Locus,
    genome: Option<&Genome>,
    scanner: &BamScanner,
) -> Result<LocusReport, error::Error> {
    let index = match genome {
        Some(genome) => {
            let window = genome.query_region(&locus.chrom, locus.start, locus.end)?;
            LocusIndex::build(&locus.name, window)?
        }
        None => LocusIndex::load(&params.data_dir, &locus.name)?,
    };

    let mut scan = LocusScan::new(
        &locus.name,
        &index,
        params.thresholds(),
        params.align_config(),
    );
    scanner.scan(locus, |read| scan.observe(&read))?;

    Ok(scan.finish())
}

fn report(params: &Parameters) -> anyhow::Result<()> {
    info!("compiling {} reports into {}", params.json_files.len(), params.tsv.display());
    compile_reports(&params.json_files, &params.tsv)?;
    info!("TSV output written to {}", params.tsv.display());
    Ok(())
}
