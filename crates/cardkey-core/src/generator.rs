//! Card key generation.
//!
//! Suffixes are drawn from the thread-local CSPRNG. With the default length of
//! 16 characters over a 36 symbol alphabet each suffix carries about 82 bits of
//! entropy, so collisions inside a batch of thousands are not expected; the
//! generator still re-draws when one happens.

use std::collections::HashSet;

use rand::Rng;

use crate::error::{CardKeyError, Result};
use crate::request::BatchSpec;
use crate::CardKey;

/// Prefix used when the administrator leaves it blank.
pub const DEFAULT_PREFIX: &str = "VIP";

/// Default number of random characters after the dash.
pub const SUFFIX_LEN: usize = 16;

/// Characters a suffix is drawn from.
pub const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Upper bound on draws for a single key before giving up.
const MAX_DRAWS_PER_KEY: usize = 1024;

/// Generator for card keys.
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    suffix_len: usize,
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyGenerator {
    /// Create a generator with the default suffix length.
    #[must_use]
    pub fn new() -> Self {
        Self {
            suffix_len: SUFFIX_LEN,
        }
    }

    /// Set the suffix length (at least 1).
    #[must_use]
    pub fn with_suffix_len(mut self, len: usize) -> Self {
        self.suffix_len = len.max(1);
        self
    }

    /// The configured suffix length.
    #[must_use]
    pub fn suffix_len(&self) -> usize {
        self.suffix_len
    }

    /// Draw one key with the given prefix. No uniqueness check.
    #[must_use]
    pub fn draw(&self, prefix: &str) -> CardKey {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..self.suffix_len)
            .map(|_| char::from(SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())]))
            .collect();
        CardKey::from_parts(prefix, &suffix)
    }

    /// Draw `spec.count` distinct keys that `is_taken` reports as free.
    ///
    /// Keys are unique within the batch. A candidate that collides with the
    /// batch or with the store is re-drawn.
    ///
    /// # Errors
    ///
    /// Returns `CardKeyError::GenerationFailure` if no free key turns up after
    /// a bounded number of draws, or whatever `is_taken` returns.
    pub fn draw_batch<F>(&self, spec: &BatchSpec, mut is_taken: F) -> Result<Vec<CardKey>>
    where
        F: FnMut(&CardKey) -> Result<bool>,
    {
        let capacity = spec.count.min(1024);
        let mut seen = HashSet::with_capacity(capacity);
        let mut keys = Vec::with_capacity(capacity);

        while keys.len() < spec.count {
            let mut draws = 0;
            let key = loop {
                draws += 1;
                let candidate = self.draw(&spec.prefix);
                if !seen.contains(&candidate) && !is_taken(&candidate)? {
                    break candidate;
                }
                if draws >= MAX_DRAWS_PER_KEY {
                    return Err(CardKeyError::GenerationFailure(format!(
                        "no free key with prefix {} after {draws} draws",
                        spec.prefix
                    )));
                }
            };
            seen.insert(key.clone());
            keys.push(key);
        }

        Ok(keys)
    }
}
