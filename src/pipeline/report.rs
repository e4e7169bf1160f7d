// Per-locus tallies and whole-run report assembly

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::Error;

/// Split-read and split-pair tallies for one locus.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LocusReport {
    pub locus: String,
    pub sr_total: u32,
    pub sr_valid: u32,
    pub sr_details: String,
    pub sp_total: u32,
    pub sp_valid: u32,
    pub sp_details: String,
}

impl LocusReport {
    /// A zeroed report; also the entry emitted for a skipped locus.
    pub fn new(locus: &str) -> Self {
        Self {
            locus: locus.to_string(),
            ..Self::default()
        }
    }

    /// Valid-to-total ratio in parts per million; 0 when nothing was seen.
    pub fn sr_ppm(&self) -> f64 {
        ppm(self.sr_valid, self.sr_total)
    }

    pub fn sp_ppm(&self) -> f64 {
        ppm(self.sp_valid, self.sp_total)
    }

    /// Insert this locus's eight fields into the run document.
    pub fn write_into(&self, root: &mut Map<String, Value>) {
        let key = |suffix: &str| format!("{}.{suffix}", self.locus);
        root.insert(key("SR-SIGNAL"), Value::from(self.sr_valid));
        root.insert(key("SR-TOTAL"), Value::from(self.sr_total));
        root.insert(key("SR-PPM"), Value::from(self.sr_ppm()));
        root.insert(key("SR-DETAILS"), Value::from(self.sr_details.clone()));
        root.insert(key("SP-SIGNAL"), Value::from(self.sp_valid));
        root.insert(key("SP-TOTAL"), Value::from(self.sp_total));
        root.insert(key("SP-PPM"), Value::from(self.sp_ppm()));
        root.insert(key("SP-DETAILS"), Value::from(self.sp_details.clone()));
    }
}

fn ppm(valid: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        valid as f64 * 1e6 / total as f64
    }
}

/// Whole-run report: run metadata plus every locus's fields, keyed by
/// locus-qualified names.
pub struct RunReport {
    root: Map<String, Value>,
}

impl RunReport {
    pub fn new(bam: &str, sample_key: &str) -> Self {
        let mut root = Map::new();
        root.insert("bam".to_string(), Value::from(bam));
        root.insert("SampleKey".to_string(), Value::from(sample_key));
        Self { root }
    }

    pub fn add(&mut self, report: &LocusReport) {
        report.write_into(&mut self.root);
    }

    pub fn to_json_string(&self) -> String {
        // Keys render sorted, grouping each locus's fields together
        serde_json::to_string_pretty(&Value::Object(self.root.clone()))
            .unwrap_or_else(|_| "{}".to_string())
    }

    /// Write the report as `<sample_key>.json` in `dir`.
    pub fn write_sample_file(&self, dir: &Path, sample_key: &str) -> Result<PathBuf, Error> {
        let path = dir.join(format!("{sample_key}.json"));
        fs::write(&path, self.to_json_string()).map_err(|e| Error::io(e, &path))?;
        Ok(path)
    }
}

/// Compile per-sample JSON reports into one TSV: `SampleKey` first, the
/// remaining columns sorted by name, one row per input file.
pub fn compile_reports(json_files: &[PathBuf], tsv_path: &Path) -> Result<(), Error> {
    let mut documents = Vec::with_capacity(json_files.len());
    for path in json_files {
        let text = fs::read_to_string(path).map_err(|e| Error::io(e, path))?;
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| Error::Parameter(format!("bad JSON in {}: {e}", path.display())))?;
        let Value::Object(map) = value else {
            return Err(Error::Parameter(format!(
                "expected a JSON object in {}",
                path.display()
            )));
        };
        documents.push(map);
    }

    let mut columns: Vec<String> = documents
        .iter()
        .flat_map(|doc| doc.keys().cloned())
        .filter(|k| k != "SampleKey")
        .collect();
    columns.sort();
    columns.dedup();
    columns.insert(0, "SampleKey".to_string());

    let mut out = columns.join("\t");
    out.push('\n');
    for doc in &documents {
        let row: Vec<String> = columns
            .iter()
            .map(|col| doc.get(col).map(render_cell).unwrap_or_default())
            .collect();
        out.push_str(&row.join("\t"));
        out.push('\n');
    }

    fs::write(tsv_path, out).map_err(|e| Error::io(e, tsv_path))?;
    Ok(())
}

/// Render a JSON value as a bare TSV cell (strings unquoted).
fn render_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ppm_is_zero_on_empty_locus() {
        let report = LocusReport::new("TRA");
        assert_eq!(report.sr_ppm(), 0.0);
        assert_eq!(report.sp_ppm(), 0.0);
    }

    #[test]
    fn ppm_ratio() {
        let report = LocusReport {
            locus: "TRA".to_string(),
            sr_total: 2_000_000,
            sr_valid: 3,
            sp_total: 4,
            sp_valid: 1,
            ..LocusReport::default()
        };
        assert!((report.sr_ppm() - 1.5).abs() < 1e-9);
        assert!((report.sp_ppm() - 250_000.0).abs() < 1e-9);
    }

    #[test]
    fn write_into_emits_locus_qualified_keys() {
        let report = LocusReport {
            locus: "TRA".to_string(),
            sr_total: 10,
            sr_valid: 2,
            sr_details: "TRA:1-2(+)|TRA:30,001-30,002(+);".to_string(),
            sp_total: 5,
            sp_valid: 1,
            sp_details: "14:1-2(+)|14:50,001-50,002(-);".to_string(),
        };

        let mut root = Map::new();
        report.write_into(&mut root);

        assert_eq!(root["TRA.SR-SIGNAL"], Value::from(2u32));
        assert_eq!(root["TRA.SR-TOTAL"], Value::from(10u32));
        assert_eq!(root["TRA.SR-PPM"], Value::from(200_000.0));
        assert_eq!(
            root["TRA.SR-DETAILS"],
            Value::from("TRA:1-2(+)|TRA:30,001-30,002(+);")
        );
        assert_eq!(root["TRA.SP-SIGNAL"], Value::from(1u32));
        assert_eq!(root["TRA.SP-TOTAL"], Value::from(5u32));
        assert_eq!(root["TRA.SP-PPM"], Value::from(200_000.0));
        assert_eq!(root.len(), 8);
    }

    #[test]
    fn run_report_carries_metadata_and_loci() {
        let mut run = RunReport::new("sample.bam", "NA12878");
        run.add(&LocusReport::new("TRA"));
        run.add(&LocusReport::new("TRB"));

        let json: Value = serde_json::from_str(&run.to_json_string()).unwrap();
        assert_eq!(json["bam"], "sample.bam");
        assert_eq!(json["SampleKey"], "NA12878");
        assert_eq!(json["TRA.SR-TOTAL"], 0);
        assert_eq!(json["TRB.SP-PPM"], 0.0);
    }

    #[test]
    fn sample_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut run = RunReport::new("sample.bam", "NA12878");
        run.add(&LocusReport::new("TRA"));

        let path = run.write_sample_file(dir.path(), "NA12878").unwrap();
        assert_eq!(path, dir.path().join("NA12878.json"));

        let json: Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["SampleKey"], "NA12878");
    }

    #[test]
    fn compile_reports_to_tsv() {
        let dir = tempfile::tempdir().unwrap();

        let mut a = RunReport::new("a.bam", "A");
        a.add(&LocusReport {
            locus: "TRA".to_string(),
            sr_total: 4,
            sr_valid: 1,
            ..LocusReport::default()
        });
        let a_path = a.write_sample_file(dir.path(), "A").unwrap();

        let mut b = RunReport::new("b.bam", "B");
        b.add(&LocusReport::new("TRB"));
        let b_path = b.write_sample_file(dir.path(), "B").unwrap();

        let tsv_path = dir.path().join("out.tsv");
        compile_reports(&[a_path, b_path], &tsv_path).unwrap();

        let tsv = fs::read_to_string(&tsv_path).unwrap();
        let mut lines = tsv.lines();
        let header: Vec<&str> = lines.next().unwrap().split('\t').collect();

        assert_eq!(header[0], "SampleKey");
        // Remaining columns sorted
        let rest: Vec<&str> = header[1..].to_vec();
        let mut sorted = rest.clone();
        sorted.sort();
        assert_eq!(rest, sorted);
        assert!(header.contains(&"TRA.SR-PPM"));
        assert!(header.contains(&"TRB.SP-TOTAL"));

        let row_a: Vec<&str> = lines.next().unwrap().split('\t').collect();
        assert_eq!(row_a[0], "A");
        // Column absent from sample A's report renders empty
        let trb_idx = header.iter().position(|&h| h == "TRB.SR-TOTAL").unwrap();
        assert_eq!(row_a[trb_idx], "");

        let row_b: Vec<&str> = lines.next().unwrap().split('\t').collect();
        assert_eq!(row_b[0], "B");
    }
}
