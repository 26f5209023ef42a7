//! Streaming k-anonymity evaluation.
//!
//! The tester classifies each redacted row into an equivalence class and
//! counts class frequencies incrementally, so the export never buffers the
//! result set. Classification interns every column value to a small integer
//! code and fingerprints the row by its positional code sequence; the
//! rendering is injective over string sequences, so `["a", "b"]` and
//! `["ab", ""]` land in different classes.

use std::collections::HashMap;

/// Per-column value interner. The empty string maps to the reserved code 0.
#[derive(Debug, Default)]
struct FieldEncoder {
    codes: HashMap<String, u32>,
}

impl FieldEncoder {
    fn add(&mut self, value: &str) -> u32 {
        if value.is_empty() {
            return 0;
        }
        let next = self.codes.len() as u32 + 1;
        *self.codes.entry(value.to_string()).or_insert(next)
    }
}

/// Incremental k-anonymity tester over redacted rows.
#[derive(Debug)]
pub struct AnonymityTester {
    encoders: Vec<FieldEncoder>,
    classes: HashMap<String, u64>,
    eval_fields: Vec<bool>,
    k_target: u64,
}

impl AnonymityTester {
    /// Creates a tester for rows of `width` columns against target `k`.
    pub fn new(width: usize, k_target: u64) -> Self {
        Self {
            encoders: (0..width).map(|_| FieldEncoder::default()).collect(),
            classes: HashMap::new(),
            eval_fields: vec![true; width],
            k_target,
        }
    }

    /// Excludes columns from classification. Masked-out columns are
    /// replaced with the empty string before fingerprinting, preserving
    /// the positional shape of the row.
    pub fn set_eval_fields(&mut self, fields: &[bool]) {
        for (i, enabled) in fields.iter().enumerate() {
            if i < self.eval_fields.len() {
                self.eval_fields[i] = *enabled;
            }
        }
    }

    /// Classifies one redacted row and bumps its class frequency.
    pub fn add_row(&mut self, row: &[String]) {
        let mut encoded = Vec::with_capacity(self.encoders.len());
        for (i, encoder) in self.encoders.iter_mut().enumerate() {
            let value = match row.get(i) {
                Some(v) if self.eval_fields[i] => v.as_str(),
                _ => "",
            };
            encoded.push(encoder.add(value));
        }
        *self.classes.entry(format!("{:?}", encoded)).or_insert(0) += 1;
    }

    /// Number of rows classified so far.
    pub fn row_count(&self) -> u64 {
        self.classes.values().sum()
    }

    /// Finishes the evaluation: scans the registry once for the smallest
    /// class frequency and compares it against the target. An empty stream
    /// reports frequency 0.
    pub fn eval(&self) -> (bool, u64) {
        let min_freq = self.classes.values().copied().min().unwrap_or(0);
        (min_freq >= self.k_target, min_freq)
    }
}
