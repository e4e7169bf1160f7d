use std::collections::HashMap;

/// Trinucleotide Shannon entropy of a nucleotide sequence, scaled to
/// roughly 0–100.
///
/// Counts the `n - 2` overlapping 3-mers and accumulates
/// `f * ln(f) / ln(k)` over their frequencies, with the log base capped at
/// `k = min(n - 2, 64)`; the result is negated and scaled by 100. Near 0
/// means a repetitive fragment, near 100 a maximally diverse one. The
/// formula follows the PRINSEQ low-complexity filter (Schmieder & Edwards,
/// Bioinformatics 2011) and must not be altered: the MINENT threshold is
/// calibrated against it.
///
/// Fragments shorter than 4 bases carry no usable 3-mer signal and score 0.
pub fn entropy(seq: &[u8]) -> f64 {
    let n = seq.len() as i64;
    let windows = n - 2;
    if windows <= 1 {
        return 0.0;
    }
    let windows = windows as usize;

    let mut counts: HashMap<&[u8], u32> = HashMap::new();
    for i in 0..windows {
        *counts.entry(&seq[i..i + 3]).or_insert(0) += 1;
    }

    let k = windows.min(64);
    let log_k = (k as f64).ln();

    let mut sum = 0.0;
    for &count in counts.values() {
        let f = count as f64 / windows as f64;
        sum += f * f.ln() / log_k;
    }

    -100.0 * sum
}
