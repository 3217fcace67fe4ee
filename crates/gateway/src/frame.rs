// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC
//! OpenWebNet ASCII frame grammar (spec §4.1):
//!
//! ```text
//! frame     = '*' field ( '*' field )* '##'
//! field     = parameter ( '#' parameter )*
//! parameter = [0-9]*
//! ```
//!
//! A [`Frame`] stores the parsed fields verbatim (as parameter strings, not
//! numbers) so that `serialize(parse(b)) == b` for every well-formed `b` —
//! leading zeros and empty parameters round-trip exactly.

use std::fmt;

use crate::error::FrameError;

/// A parsed OpenWebNet frame: an ordered list of fields, each an ordered
/// list of (possibly empty) digit-string parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    fields: Vec<Vec<String>>,
}

impl Frame {
    /// Build a frame directly from fields. Callers are responsible for
    /// ensuring every parameter matches `[0-9]*`; this is not re-validated
    /// here since frames built in-process (outgoing commands) are assembled
    /// from already-validated components (addresses, WHO/WHAT codes).
    pub fn new(fields: Vec<Vec<String>>) -> Self {
        Self { fields }
    }

    /// Parse one complete frame from a byte buffer. `bytes` must contain
    /// exactly one frame: a leading `*`, the field/parameter body, and a
    /// trailing `##` with nothing after it.
    pub fn parse(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.first() != Some(&b'*') {
            return Err(FrameError::MissingStart);
        }

        let end = bytes
            .windows(2)
            .position(|w| w == b"##")
            .ok_or(FrameError::MissingEnd)?;

        let trailing = bytes.len() - (end + 2);
        if trailing > 0 {
            return Err(FrameError::TrailingBytes(trailing));
        }

        let body = &bytes[1..end];
        for &b in body {
            if !matches!(b, b'0'..=b'9' | b'*' | b'#') {
                return Err(FrameError::IllegalCharacter(b));
            }
        }

        // body is known ASCII ('0'-'9', '*', '#') at this point, so this never fails;
        // fall back to an empty frame rather than unwrap if it somehow did.
        let Ok(body_str) = std::str::from_utf8(body) else {
            return Ok(Frame { fields: Vec::new() });
        };
        let fields = body_str
            .split('*')
            .map(|field| field.split('#').map(str::to_owned).collect())
            .collect();

        Ok(Frame { fields })
    }

    /// Parse a frame from a `&str` literal such as `"*1*1*21##"`.
    pub fn from_str_lossless(s: &str) -> Result<Self, FrameError> {
        Self::parse(s.as_bytes())
    }

    /// Serialize back to the exact wire byte sequence `*<f0>*<f1>*…*<fn>##`.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.estimated_len());
        out.push(b'*');
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                out.push(b'*');
            }
            out.extend_from_slice(field.join("#").as_bytes());
        }
        out.extend_from_slice(b"##");
        out
    }

    fn estimated_len(&self) -> usize {
        3 + self.fields.iter().map(|f| f.iter().map(String::len).sum::<usize>() + f.len()).sum::<usize>()
    }

    pub fn fields(&self) -> &[Vec<String>] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&[String]> {
        self.fields.get(index).map(Vec::as_slice)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The serialized form is always ASCII, so this never loses data.
        f.write_str(&String::from_utf8_lossy(&self.serialize()))
    }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
