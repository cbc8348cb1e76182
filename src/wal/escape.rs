//! Percent-escaping for log fields
//!
//! Every byte outside `[A-Za-z0-9-_.~]` becomes `%XX`, so escaped text never
//! contains whitespace, TABs, or newlines and can sit between the record
//! delimiters safely. Encoding and decoding go through `urlencoding`; decoding
//! additionally rejects malformed `%` sequences instead of passing them through.

use std::string::FromUtf8Error;

use thiserror::Error;

/// Failure to decode an escaped field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscapeError {
    #[error("truncated escape sequence at byte {0}")]
    Truncated(usize),

    #[error("invalid escape sequence at byte {0}")]
    InvalidHex(usize),

    #[error("decoded bytes are not valid UTF-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),
}

/// Escape `input` for storage in a log record
pub fn escape(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

/// Reverse [`escape`]
pub fn unescape(input: &str) -> Result<String, EscapeError> {
    check_sequences(input)?;
    Ok(urlencoding::decode(input)?.into_owned())
}

/// Every `%` must introduce exactly two hex digits
fn check_sequences(input: &str) -> Result<(), EscapeError> {
    let bytes = input.as_bytes();
    for (i, _) in input.match_indices('%') {
        if i + 2 >= bytes.len() {
            return Err(EscapeError::Truncated(i));
        }
        if !(bytes[i + 1].is_ascii_hexdigit() && bytes[i + 2].is_ascii_hexdigit()) {
            return Err(EscapeError::InvalidHex(i));
        }
    }
    Ok(())
}
