//! key-value-list-with-message codec.
//!
//! commit and tag payloads share one text format: a run of `key value`
//! header lines, a blank line, then free-form message text. A value may
//! span several lines; every continuation line carries exactly one
//! leading space, which is a marker, not content. Keys may repeat (a
//! merge commit has several `parent` lines) and both field order and
//! value order are significant, so parsing must preserve them exactly.

use indexmap::IndexMap;

use crate::object::find_byte;
use crate::storage::error::{StoreError, StoreResult};

/// parsed form of a commit or tag payload.
///
/// fields keep insertion order and duplicate keys keep their values in
/// append order. The trailing message lives in its own slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Kvlm {
    fields: IndexMap<Vec<u8>, Vec<Vec<u8>>>,
    message: Vec<u8>,
}

impl Kvlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// first value recorded for `key`, if any.
    pub fn first(&self, key: &[u8]) -> Option<&[u8]> {
        self.fields
            .get(key)
            .and_then(|values| values.first())
            .map(|value| value.as_slice())
    }

    /// every value recorded for `key`, in append order.
    pub fn values<'a>(&'a self, key: &[u8]) -> impl Iterator<Item = &'a [u8]> {
        self.fields
            .get(key)
            .into_iter()
            .flatten()
            .map(|value| value.as_slice())
    }

    /// append a value under `key`, creating the key if needed.
    pub fn push(&mut self, key: &[u8], value: Vec<u8>) {
        self.fields.entry(key.to_vec()).or_default().push(value);
    }

    pub fn message(&self) -> &[u8] {
        &self.message
    }

    pub fn set_message(&mut self, message: Vec<u8>) {
        self.message = message;
    }

    /// decode a raw commit/tag payload.
    ///
    /// runs an explicit cursor over the buffer instead of recursing per
    /// header line, so arbitrarily long header blocks cannot blow the
    /// stack.
    pub fn parse(raw: &[u8]) -> StoreResult<Kvlm> {
        let mut kvlm = Kvlm::new();
        let mut cursor = 0;

        loop {
            let spc = find_byte(raw, b' ', cursor);
            let nl = find_byte(raw, b'\n', cursor);

            let spc = match (spc, nl) {
                // no space left, or the newline comes first: the header
                // block is over and everything past that newline is the
                // message
                (None, Some(n)) => {
                    kvlm.message = raw[n + 1..].to_vec();
                    return Ok(kvlm);
                }
                (Some(s), Some(n)) if n < s => {
                    kvlm.message = raw[n + 1..].to_vec();
                    return Ok(kvlm);
                }
                (Some(s), _) => s,
                (None, None) => {
                    return Err(StoreError::Format(
                        "kvlm: header block ends without a message separator".to_string(),
                    ));
                }
            };

            let key = raw[cursor..spc].to_vec();

            // the value runs until the first newline not followed by a
            // continuation space
            let mut scan = spc;
            let value_end = loop {
                match find_byte(raw, b'\n', scan + 1) {
                    Some(n) if raw.get(n + 1) == Some(&b' ') => scan = n,
                    Some(n) => break n,
                    None => {
                        return Err(StoreError::Format(format!(
                            "kvlm: unterminated value for key {:?}",
                            String::from_utf8_lossy(&key)
                        )));
                    }
                }
            };

            let value = replace_all(&raw[spc + 1..value_end], b"\n ", b"\n");
            kvlm.fields.entry(key).or_default().push(value);
            cursor = value_end + 1;
        }
    }

    /// re-encode to the exact on-disk form.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (key, values) in &self.fields {
            for value in values {
                out.extend_from_slice(key);
                out.push(b' ');
                out.extend_from_slice(&replace_all(value, b"\n", b"\n "));
                out.push(b'\n');
            }
        }
        out.push(b'\n');
        out.extend_from_slice(&self.message);
        out
    }
}

fn replace_all(haystack: &[u8], needle: &[u8], with: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(haystack.len());
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i..].starts_with(needle) {
            out.extend_from_slice(with);
            i += needle.len();
        } else {
            out.push(haystack[i]);
            i += 1;
        }
    }
    out
}
