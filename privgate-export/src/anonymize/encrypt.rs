//! Encryptor: keyed and unkeyed digest functions.
//!
//! Digest state is never shared between invocations; each call constructs a
//! fresh Mac or hasher, so the returned closure is a pure function safe to
//! invoke concurrently from every de-identifier worker.

use hmac::{Hmac, Mac};
use md5::Md5;
use sha2::{Digest, Sha256};

use privgate_core::policy::AnonymizeOptions;

use super::{FieldFn, constant};
use std::sync::Arc;

fn hmac_sha256(key: &[u8], input: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(input.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn hmac_md5(key: &[u8], input: &str) -> String {
    let mut mac = Hmac::<Md5>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(input.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Builds the encrypting function for one column.
///
/// `algorithm = "hmac"` selects a keyed digest chosen by `digest`
/// (`sha256` or `md5`, defaulting to SHA-256); `"hash(sha256)"` and
/// `"hash(md5)"` are the unkeyed forms. Output is the lowercase hex of the
/// digest. Unknown algorithms yield an in-band error constant.
pub fn build_encrypting_fn(options: &AnonymizeOptions) -> FieldFn {
    match options.algorithm.as_str() {
        "hmac" => {
            let key = options.key.clone().into_bytes();
            match options.digest.as_str() {
                "md5" => Arc::new(move |input: &str| hmac_md5(&key, input)),
                // sha256, and the documented default for a missing or
                // unknown digest selector
                _ => Arc::new(move |input: &str| hmac_sha256(&key, input)),
            }
        }
        "hash(sha256)" => Arc::new(|input: &str| hex::encode(Sha256::digest(input.as_bytes()))),
        "hash(md5)" => Arc::new(|input: &str| hex::encode(Md5::digest(input.as_bytes()))),
        _ => constant("unknown encryption algorithm"),
    }
}
