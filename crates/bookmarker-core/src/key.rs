//! Deterministic key derivation for bookmark URLs.
//!
//! A URL is hashed with SHA-256, encoded with the standard base64 alphabet,
//! and the URL-unsafe characters `/` and `+` are stripped (not replaced).
//! The candidate ladder is the sequence of prefixes of that string, shortest
//! first. A longer candidate is only used when every shorter one is already
//! held by a different URL.

use crate::bookmark::BookmarkId;
use crate::error::CoreError;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

pub const DEFAULT_MIN_WIDTH: usize = 3;
pub const DEFAULT_MAX_WIDTH: usize = 14;

/// Produces the candidate key ladder for a URL.
///
/// The ladder is a pure function of the URL string: no clock, no randomness,
/// stable across restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDeriver {
    min_width: usize,
    max_width: usize,
}

impl Default for KeyDeriver {
    fn default() -> Self {
        Self {
            min_width: DEFAULT_MIN_WIDTH,
            max_width: DEFAULT_MAX_WIDTH,
        }
    }
}

impl KeyDeriver {
    /// Creates a deriver with a custom ladder of widths `min_width..=max_width`.
    ///
    /// Both bounds must describe valid bookmark id lengths (3-32).
    pub fn new(min_width: usize, max_width: usize) -> Result<Self, CoreError> {
        if min_width < 3 || max_width > 32 || min_width > max_width {
            return Err(CoreError::InvalidKeyWidths(format!(
                "expected 3 <= min <= max <= 32, got {min_width}..={max_width}"
            )));
        }

        Ok(Self {
            min_width,
            max_width,
        })
    }

    pub fn min_width(&self) -> usize {
        self.min_width
    }

    pub fn max_width(&self) -> usize {
        self.max_width
    }

    /// Returns the ordered candidate keys for `url`, shortest first.
    ///
    /// The ladder is finite and strictly increasing in length. It stops early
    /// if the cleaned digest is shorter than `max_width`.
    pub fn candidates(&self, url: &str) -> Vec<BookmarkId> {
        let cleaned = cleaned_digest(url);
        let max_width = self.max_width.min(cleaned.len());

        (self.min_width..=max_width)
            .map(|width| BookmarkId::new_unchecked(&cleaned[..width]))
            .collect()
    }
}

/// Returns the candidate ladder for `url` using the default widths.
pub fn candidates(url: &str) -> Vec<BookmarkId> {
    KeyDeriver::default().candidates(url)
}

fn cleaned_digest(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    STANDARD_NO_PAD
        .encode(digest)
        .chars()
        .filter(|c| *c != '/' && *c != '+')
        .collect()
}
