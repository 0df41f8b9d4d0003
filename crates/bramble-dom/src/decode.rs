//! Decoding stored bytes into text.
//!
//! The tree keeps names and character data exactly as the parser produced
//! them. Every read that turns them into `str` goes through a
//! [`DecodePolicy`] fixed when the owning document was built.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// How invalid UTF-8 is handled when decoding stored bytes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DecodePolicy {
    /// Fail on the first invalid byte sequence.
    Strict,
    /// Substitute U+FFFD for each invalid sequence.
    Replace,
    /// Drop invalid sequences.
    #[default]
    Ignore,
}

/// Stored bytes were not valid UTF-8 under [`DecodePolicy::Strict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Invalid sequence found after `valid_up_to` valid bytes.
    #[error("invalid UTF-8 sequence after {valid_up_to} valid bytes")]
    InvalidUtf8 {
        /// Length of the valid prefix.
        valid_up_to: usize,
        /// Length of the invalid sequence, or `None` if the input ended mid-sequence.
        error_len: Option<usize>,
    },
}

impl From<std::str::Utf8Error> for DecodeError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::InvalidUtf8 {
            valid_up_to: err.valid_up_to(),
            error_len: err.error_len(),
        }
    }
}

impl DecodePolicy {
    /// Decode `bytes` under this policy.
    ///
    /// Valid input is always borrowed. A `Cow::Owned` result means the
    /// policy rewrote the input.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] only under [`DecodePolicy::Strict`].
    pub fn decode(self, bytes: &[u8]) -> Result<Cow<'_, str>, DecodeError> {
        match std::str::from_utf8(bytes) {
            Ok(text) => Ok(Cow::Borrowed(text)),
            Err(err) => match self {
                Self::Strict => Err(err.into()),
                Self::Replace => Ok(String::from_utf8_lossy(bytes)),
                Self::Ignore => Ok(Cow::Owned(
                    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect(),
                )),
            },
        }
    }
}
