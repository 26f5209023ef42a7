//! CSV encoding for exported rows.
//!
//! The wire format is fixed: comma delimiter, CRLF record terminator, and a
//! field is quote-wrapped if and only if it contains a comma (embedded
//! quotes are not escaped). Consumers of existing exports depend on these
//! exact bytes, so this module does not delegate to a general CSV writer.

/// Encodes one record, header or data row, into its exact wire bytes.
pub fn encode_record(fields: &[String]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(fields.iter().map(|f| f.len() + 1).sum::<usize>() + 2);
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            buf.push(b',');
        }
        if field.contains(',') {
            buf.push(b'"');
            buf.extend_from_slice(field.as_bytes());
            buf.push(b'"');
        } else {
            buf.extend_from_slice(field.as_bytes());
        }
    }
    buf.extend_from_slice(b"\r\n");
    buf
}
