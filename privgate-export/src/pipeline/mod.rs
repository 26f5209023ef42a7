//! The concurrent export pipeline.
//!
//! Four stages separated by bounded queues, each stage group running as
//! spawned tasks while the writer drains in the caller's task:
//!
//! ```text
//! producer ──raw──▶ normalizer ×N ──canonical──▶ de-identifier ×N ──redacted──▶ writer ──▶ sink
//!                                                                                  │
//!                                                                          k-anonymity tester
//! ```
//!
//! Queue closure is carried by sender ownership: the producer holds the
//! only raw-queue sender, and each middle-stage worker holds one clone of
//! its output sender, so a queue closes exactly when its producing stage
//! finishes. The bounded capacity gives end-to-end backpressure: a slow
//! sink suspends the database cursor instead of buffering the result set.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use privgate_core::{
    ColumnPolicy, Evaluation, ExportConfig, PrivGateError, RawRow, Result,
    policy::evaluation_enabled,
};

use crate::anonymize::compile_function_table;
use crate::sink::ExportSink;
use crate::sources::SourceAdapter;

pub mod deidentify;
pub mod normalize;
pub mod writer;

/// A queue receiver shared by the workers of one stage group.
pub(crate) type SharedReceiver<T> = Arc<Mutex<mpsc::Receiver<T>>>;

/// Runs one streaming export end to end.
///
/// Executes the query through `adapter`, normalizes and de-identifies each
/// row with `worker_count` workers per middle stage, writes the redacted
/// CSV to `sink`, and returns the k-anonymity evaluation. Cancelling
/// `cancel` stops the producer at the next cursor advance and surfaces as
/// a query failure.
///
/// The header row and any rows written before a mid-stream failure remain
/// in the sink; chunked transport cannot unsend them.
///
/// # Errors
/// - Configuration error when `worker_count` is zero
/// - Query error when execution, scanning, or cancellation interrupts the
///   producer
/// - Sink error when the response writer fails
#[tracing::instrument(name = "export_stream", skip_all, fields(request = request_name))]
pub async fn export_stream(
    cancel: CancellationToken,
    sink: &mut dyn ExportSink,
    worker_count: usize,
    request_name: &str,
    adapter: Arc<dyn SourceAdapter>,
    sql: &str,
    params: &[String],
    policy: &HashMap<String, ColumnPolicy>,
    config: &ExportConfig,
) -> Result<Evaluation> {
    if worker_count == 0 {
        return Err(PrivGateError::configuration("Invalid routine count"));
    }

    // Column schema comes from the prepared statement before the first
    // row; a malformed query fails here, before any response byte.
    let schema = adapter.describe_columns(sql).await?;
    let header: Vec<String> = schema.iter().map(|c| c.name.clone()).collect();

    let funcs = Arc::new(compile_function_table(&header, policy));
    let evaluate = evaluation_enabled(policy);

    let capacity = config.queue_capacity.max(1);
    let (raw_tx, raw_rx) = mpsc::channel::<RawRow>(capacity);
    let (canon_tx, canon_rx) = mpsc::channel::<Vec<String>>(capacity);
    let (redacted_tx, redacted_rx) = mpsc::channel::<Vec<String>>(capacity);
    let raw_rx: SharedReceiver<RawRow> = Arc::new(Mutex::new(raw_rx));
    let canon_rx: SharedReceiver<Vec<String>> = Arc::new(Mutex::new(canon_rx));

    let (query_done_tx, query_done_rx) = oneshot::channel::<Result<u64>>();
    let (norm_done_tx, mut norm_done_rx) = mpsc::channel::<()>(worker_count);
    let (deid_done_tx, mut deid_done_rx) = mpsc::channel::<()>(worker_count);

    // Stage A: query producer. Owns the only raw-queue sender; dropping it
    // on exit closes the queue for the normalizer group.
    {
        let adapter = Arc::clone(&adapter);
        let sql = sql.to_string();
        let params = params.to_vec();
        let schema = schema.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let result = adapter
                .stream_rows(&sql, &params, &schema, raw_tx, cancel)
                .await;
            let _ = query_done_tx.send(result);
        });
    }

    // Stage B: normalizer group.
    for _ in 0..worker_count {
        tokio::spawn(normalize::run_normalizer(
            Arc::clone(&raw_rx),
            canon_tx.clone(),
            norm_done_tx.clone(),
        ));
    }
    drop(canon_tx);
    drop(norm_done_tx);

    // Stage C: de-identifier group.
    for _ in 0..worker_count {
        tokio::spawn(deidentify::run_deidentifier(
            Arc::clone(&funcs),
            Arc::clone(&canon_rx),
            redacted_tx.clone(),
            deid_done_tx.clone(),
        ));
    }
    drop(redacted_tx);
    drop(deid_done_tx);

    // Stage D runs on this task and finishes once the redacted queue
    // closes behind the last de-identifier.
    let evaluation = writer::write_exported(
        sink,
        request_name,
        &header,
        evaluate,
        config.k_target,
        redacted_rx,
    )
    .await?;

    // The writer saw the end of the stream, so the producer has finished
    // and its completion is waiting.
    match query_done_rx.await {
        Ok(Ok(count)) => {
            tracing::debug!("Export '{}' streamed {} rows", request_name, count);
        }
        Ok(Err(e)) => return Err(e),
        Err(_) => return Err(PrivGateError::query_error("query producer vanished")),
    }

    // Collect both worker groups' completion tokens.
    let mut remaining = worker_count;
    while remaining > 0 && norm_done_rx.recv().await.is_some() {
        remaining -= 1;
    }
    let mut remaining = worker_count;
    while remaining > 0 && deid_done_rx.recv().await.is_some() {
        remaining -= 1;
    }

    Ok(evaluation)
}
