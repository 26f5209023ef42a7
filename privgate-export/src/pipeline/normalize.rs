//! Row normalizer: typed scalar holders to canonical strings.
//!
//! Stage B of the pipeline. N identical workers consume raw tuples from the
//! shared raw-tuple queue and emit one canonical row each, preserving the
//! positional shape. The value-to-string rules are fixed wire behavior:
//! downstream policies and stored exports depend on these exact forms.

use tokio::sync::mpsc;

use privgate_core::{RawRow, RawValue};

use super::SharedReceiver;

/// Canonical string form of one scalar holder.
///
/// Integers render base-10, floats in shortest decimal form without an
/// exponent, booleans as `true`/`false`, timestamps as
/// `YYYY-MM-DDTHH:MM:SS` with no timezone suffix, and byte sequences as
/// UTF-8 text. Absent values become the empty string; holders without a
/// string form become the `-/-` marker.
pub fn canonicalize_value(value: &RawValue) -> String {
    match value {
        RawValue::Int(v) => v.to_string(),
        RawValue::Uint(v) => v.to_string(),
        RawValue::Float(v) => v.to_string(),
        RawValue::Bool(v) => v.to_string(),
        RawValue::Text(v) => v.clone(),
        RawValue::Timestamp(v) => v.format("%Y-%m-%dT%H:%M:%S").to_string(),
        RawValue::Bytes(v) => String::from_utf8_lossy(v).into_owned(),
        RawValue::Null => String::new(),
        RawValue::Other => "-/-".to_string(),
    }
}

/// Converts one raw tuple into its canonical row.
pub fn canonicalize_row(row: &RawRow) -> Vec<String> {
    row.iter().map(canonicalize_value).collect()
}

/// One normalizer worker: drains the raw-tuple queue until it closes, then
/// emits a completion token and exits. A failed send means the pipeline is
/// tearing down; the worker stops without draining further.
#[tracing::instrument(name = "normalize", level = "debug", skip_all)]
pub async fn run_normalizer(
    raw_rx: SharedReceiver<RawRow>,
    canon_tx: mpsc::Sender<Vec<String>>,
    done_tx: mpsc::Sender<()>,
) {
    loop {
        let next = { raw_rx.lock().await.recv().await };
        match next {
            Some(raw) => {
                if canon_tx.send(canonicalize_row(&raw)).await.is_err() {
                    break;
                }
            }
            None => break,
        }
    }
    drop(canon_tx);
    let _ = done_tx.send(()).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_integer_forms() {
        assert_eq!(canonicalize_value(&RawValue::Int(-42)), "-42");
        assert_eq!(canonicalize_value(&RawValue::Uint(42)), "42");
    }

    #[test]
    fn test_float_shortest_form() {
        assert_eq!(canonicalize_value(&RawValue::Float(1000.0)), "1000");
        assert_eq!(canonicalize_value(&RawValue::Float(3.5)), "3.5");
        assert_eq!(canonicalize_value(&RawValue::Float(-0.25)), "-0.25");
    }

    #[test]
    fn test_bool_forms() {
        assert_eq!(canonicalize_value(&RawValue::Bool(true)), "true");
        assert_eq!(canonicalize_value(&RawValue::Bool(false)), "false");
    }

    #[test]
    fn test_timestamp_has_no_zone_suffix() {
        let ts = NaiveDate::from_ymd_opt(2021, 3, 14)
            .unwrap()
            .and_hms_opt(9, 26, 53)
            .unwrap();
        assert_eq!(
            canonicalize_value(&RawValue::Timestamp(ts)),
            "2021-03-14T09:26:53"
        );
    }

    #[test]
    fn test_bytes_as_utf8() {
        assert_eq!(
            canonicalize_value(&RawValue::Bytes(b"hello".to_vec())),
            "hello"
        );
    }

    #[test]
    fn test_null_and_opaque() {
        assert_eq!(canonicalize_value(&RawValue::Null), "");
        assert_eq!(canonicalize_value(&RawValue::Other), "-/-");
    }

    #[test]
    fn test_row_shape_is_preserved() {
        let row: RawRow = vec![RawValue::Int(1), RawValue::Null, RawValue::Other];
        assert_eq!(canonicalize_row(&row), vec!["1", "", "-/-"]);
    }
}
