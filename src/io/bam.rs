/// Region-restricted BAM read stream with noodles.
use std::path::PathBuf;

use noodles::bam;
use noodles::core::Region as QueryRegion;
use noodles::sam;
use noodles::sam::alignment::record::cigar::op::{Kind, Op};

use crate::bed::Locus;
use crate::error::Error;
use crate::region::{Region, Strand};

/// The per-read fields the scan pipeline consumes, decoded once per record.
#[derive(Debug, Clone)]
pub struct ReadRecord {
    pub name: String,
    pub sequence: Vec<u8>,
    pub is_duplicate: bool,
    pub is_paired: bool,
    /// Soft- plus hard-clipped bases in the source alignment.
    pub clip_len: usize,
    /// Query bases covered by the source alignment (clips excluded).
    pub aligned_len: usize,
    /// Genomic placement as reported by the source BAM.
    pub region: Region,
}

impl ReadRecord {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Region-restricted read stream over an indexed BAM.
///
/// The reader is reopened for every locus (one pass per locus); within a
/// pass the stream is forward-only and never restarted.
pub struct BamScanner {
    path: PathBuf,
}

impl BamScanner {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Visit every mapped record overlapping the locus region, in stream
    /// order.
    pub fn scan<F>(&self, locus: &Locus, mut visit: F) -> Result<(), Error>
    where
        F: FnMut(ReadRecord),
    {
        let mut reader = bam::io::indexed_reader::Builder::default()
            .build_from_path(&self.path)
            .map_err(|e| {
                Error::Stream(format!("cannot open {}: {e}", self.path.display()))
            })?;
        let header = reader.read_header().map_err(|e| {
            Error::Stream(format!("cannot read header of {}: {e}", self.path.display()))
        })?;

        let region: QueryRegion = locus.region_string().parse().map_err(|e| {
            Error::Stream(format!("bad region {}: {e}", locus.region_string()))
        })?;

        let query = reader.query(&header, &region).map_err(|e| {
            Error::Stream(format!("query failed for {}: {e}", locus.region_string()))
        })?;

        for result in query {
            let record = result.map_err(|e| {
                Error::Stream(format!("read failed in {}: {e}", locus.region_string()))
            })?;
            if let Some(read) = decode_record(&record, &header)? {
                visit(read);
            }
        }

        Ok(())
    }
}

/// Decode one BAM record into a `ReadRecord`; `None` for records without a
/// placement. Placed-but-unmapped mates are kept: they carry no clip or
/// aligned bases and still count toward the stream totals.
fn decode_record(record: &bam::Record, header: &sam::Header) -> Result<Option<ReadRecord>, Error> {
    let flags = record.flags();

    let Some(reference_sequence_id) = record
        .reference_sequence_id()
        .transpose()
        .map_err(|e| Error::Stream(format!("bad reference id: {e}")))?
    else {
        return Ok(None);
    };
    let Some(start) = record
        .alignment_start()
        .transpose()
        .map_err(|e| Error::Stream(format!("bad alignment start: {e}")))?
    else {
        return Ok(None);
    };

    let chrom = header
        .reference_sequences()
        .get_index(reference_sequence_id)
        .map(|(name, _)| name.to_string())
        .ok_or_else(|| {
            Error::Stream(format!(
                "reference id {reference_sequence_id} missing from header"
            ))
        })?;

    let stats = cigar_stats(record.cigar().iter())?;

    let start = usize::from(start) as i64 - 1;
    let strand = if flags.is_reverse_complemented() {
        Strand::Reverse
    } else {
        Strand::Forward
    };

    Ok(Some(ReadRecord {
        name: record.name().map(|n| n.to_string()).unwrap_or_default(),
        sequence: record.sequence().iter().collect(),
        is_duplicate: flags.is_duplicate(),
        is_paired: flags.is_segmented(),
        clip_len: stats.clipped,
        aligned_len: stats.aligned,
        region: Region {
            name: chrom,
            start,
            end: start + stats.reference_span as i64,
            strand,
        },
    }))
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CigarStats {
    pub clipped: usize,
    pub aligned: usize,
    pub reference_span: usize,
}

/// Tally clip, aligned-base, and reference-span lengths from CIGAR ops.
pub fn cigar_stats<I>(ops: I) -> Result<CigarStats, Error>
where
    I: Iterator<Item = std::io::Result<Op>>,
{
    let mut stats = CigarStats::default();
    for op in ops {
        let op = op.map_err(|e| Error::Stream(format!("bad CIGAR: {e}")))?;
        match op.kind() {
            Kind::SoftClip | Kind::HardClip => stats.clipped += op.len(),
            Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch => {
                stats.aligned += op.len();
                stats.reference_span += op.len();
            }
            Kind::Insertion => stats.aligned += op.len(),
            Kind::Deletion | Kind::Skip => stats.reference_span += op.len(),
            Kind::Pad => {}
        }
    }
    Ok(stats)
}
