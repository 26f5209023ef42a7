//! CSV writer and in-line k-anonymity evaluation.
//!
//! Stage D of the pipeline. Applies the response framing, writes the header
//! row exactly once, then drains the redacted-row queue: each row is fed to
//! the evaluator (when enabled) before its bytes reach the sink, so the
//! evaluator sees every emitted row exactly once and never sees the header.

use tokio::sync::mpsc;

use privgate_core::{Evaluation, Result};

use crate::csv::encode_record;
use crate::kanon::AnonymityTester;
use crate::sink::{ExportSink, apply_export_headers};

/// Drains the redacted-row queue into the sink and finalizes the
/// evaluation.
///
/// Returns as soon as a sink write fails; rows already written stay
/// written (the semantics of chunked transport).
#[tracing::instrument(name = "write_export", level = "debug", skip_all)]
pub async fn write_exported(
    sink: &mut dyn ExportSink,
    request_name: &str,
    header: &[String],
    evaluate: bool,
    k_target: u64,
    mut redacted_rx: mpsc::Receiver<Vec<String>>,
) -> Result<Evaluation> {
    apply_export_headers(sink, request_name);

    let mut tester = evaluate.then(|| AnonymityTester::new(header.len(), k_target));

    sink.write(&encode_record(header))?;
    while let Some(row) = redacted_rx.recv().await {
        if let Some(tester) = tester.as_mut() {
            tester.add_row(&row);
        }
        sink.write(&encode_record(&row))?;
    }

    let mut evaluation = Evaluation::none(request_name);
    if let Some(tester) = tester {
        let (passed, min_freq) = tester.eval();
        tracing::debug!(
            "k-anonymity evaluation for '{}': min class {} over {} rows",
            request_name,
            min_freq,
            tester.row_count()
        );
        evaluation.result = passed.to_string();
        evaluation.value = min_freq as i64;
    }
    Ok(evaluation)
}
