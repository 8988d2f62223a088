use log::{debug, info};
use rand::Rng;
use sha2::{Digest, Sha256};

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Hex prefix a proof digest must start with
///
/// Two hex characters, so roughly one candidate in 256 is accepted.
pub const DIFFICULTY_PREFIX: &str = "00";

/// Checks a candidate proof against the previous block's proof
///
/// The digest is SHA-256 over `"{last_proof}{proof}"` with no separator.
pub fn valid_proof(last_proof: u64, proof: u64) -> bool {
    let guess = format!("{}{}", last_proof, proof);
    let digest = hex::encode(Sha256::digest(guess.as_bytes()));

    digest.starts_with(DIFFICULTY_PREFIX)
}

/// Cooperative abort signal for a running proof search
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks every search observing this token to stop
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Why a search stopped without finding a proof
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchAbort {
    /// The attempt bound was reached
    Exhausted { attempts: u64 },

    /// The cancel token fired
    Cancelled { attempts: u64 },
}

impl SearchAbort {
    pub fn attempts(&self) -> u64 {
        match self {
            SearchAbort::Exhausted { attempts } | SearchAbort::Cancelled { attempts } => *attempts,
        }
    }
}

/// Randomised proof-of-work search
///
/// Candidates are drawn uniformly from `range` until one satisfies
/// [`valid_proof`]. Without an attempt bound or cancel token the search
/// only ends on success.
#[derive(Debug, Clone)]
pub struct ProofSearch<'a> {
    range: RangeInclusive<u64>,
    max_attempts: Option<u64>,
    cancel: Option<&'a CancelToken>,
}

impl<'a> ProofSearch<'a> {
    /// Creates an unbounded search over `range`
    pub fn new(range: RangeInclusive<u64>) -> Self {
        ProofSearch {
            range,
            max_attempts: None,
            cancel: None,
        }
    }

    /// Stops the search after `max_attempts` rejected candidates
    pub fn with_max_attempts(mut self, max_attempts: Option<u64>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Stops the search once `token` is cancelled
    pub fn with_cancel(mut self, token: &'a CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Runs the search seeded by the previous block's proof
    ///
    /// # Arguments
    ///
    /// * `last_proof` - The proof of the block being extended
    ///
    /// # Returns
    ///
    /// The accepted proof, or the reason the search gave up
    pub fn run(&self, last_proof: u64) -> Result<u64, SearchAbort> {
        self.run_with(last_proof, &mut rand::thread_rng())
    }

    /// Same as [`ProofSearch::run`] with a caller-supplied random source
    pub fn run_with<R: Rng>(&self, last_proof: u64, rng: &mut R) -> Result<u64, SearchAbort> {
        info!("Starting proof of work...");
        let mut attempts: u64 = 0;

        loop {
            if let Some(token) = self.cancel {
                if token.is_cancelled() {
                    debug!("Proof search cancelled after {} attempts", attempts);
                    return Err(SearchAbort::Cancelled { attempts });
                }
            }

            if let Some(max) = self.max_attempts {
                if attempts >= max {
                    debug!("Proof search gave up after {} attempts", attempts);
                    return Err(SearchAbort::Exhausted { attempts });
                }
            }

            let proof = rng.gen_range(self.range.clone());
            attempts += 1;

            if valid_proof(last_proof, proof) {
                info!("Proof of work found: {} ({} attempts)", proof, attempts);
                return Ok(proof);
            }
        }
    }
}
