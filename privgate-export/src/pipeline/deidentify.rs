//! De-identifier: canonical rows through the compiled function table.
//!
//! Stage C of the pipeline. N identical workers share the immutable
//! function table and apply it positionally; each emits one completion
//! token when the canonical-row queue closes.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::anonymize::FieldFn;

use super::SharedReceiver;

/// Applies the column-indexed function table to one canonical row.
pub fn redact_row(funcs: &[FieldFn], row: &[String]) -> Vec<String> {
    row.iter()
        .zip(funcs.iter())
        .map(|(value, func)| func(value))
        .collect()
}

/// One de-identifier worker: drains the canonical-row queue until it
/// closes, then emits a completion token and exits.
#[tracing::instrument(name = "deidentify", level = "debug", skip_all)]
pub async fn run_deidentifier(
    funcs: Arc<Vec<FieldFn>>,
    canon_rx: SharedReceiver<Vec<String>>,
    redacted_tx: mpsc::Sender<Vec<String>>,
    done_tx: mpsc::Sender<()>,
) {
    loop {
        let next = { canon_rx.lock().await.recv().await };
        match next {
            Some(row) => {
                if redacted_tx.send(redact_row(&funcs, &row)).await.is_err() {
                    break;
                }
            }
            None => break,
        }
    }
    drop(redacted_tx);
    let _ = done_tx.send(()).await;
}
