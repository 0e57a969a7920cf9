use std::rc::Rc;

use log::{debug, warn};

use super::{ConsensusEngine, ConsensusError};
use crate::blockchain::validate::meets_difficulty;
use crate::blockchain::{Block, DEFAULT_DIFFICULTY, DEFAULT_MAX_ATTEMPTS, INITIAL_NONCE};

/// Brute-force nonce search against a leading-zeros target.
///
/// Each attempt has a ~16^-difficulty chance of qualifying, so difficulty
/// 3 needs about 4096 attempts on average. The search is bounded: running
/// out of attempts is a legitimate, reportable outcome, never a hang.
#[derive(Debug, Clone)]
pub struct ProofOfWork {
    pub difficulty: u32,
    pub max_attempts: u64,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ProofOfWork {
    pub fn new(difficulty: u32, max_attempts: u64) -> Self {
        Self {
            difficulty,
            max_attempts,
        }
    }

    /// Search for the next block on top of `tail`.
    ///
    /// Candidates are immutable values rebuilt per attempt with the nonce
    /// counting up from its fixed starting point; the first candidate
    /// whose digest meets the difficulty prefix wins. The engine only
    /// produces the block; appending and broadcasting are the caller's
    /// job.
    pub fn mine(
        &self,
        tail: &Rc<Block>,
        payload: &str,
        timestamp: f64,
    ) -> Result<Block, ConsensusError> {
        for nonce in INITIAL_NONCE..INITIAL_NONCE + self.max_attempts {
            let candidate = Block::new(timestamp, payload, Some(Rc::clone(tail)), nonce);
            if meets_difficulty(&candidate.hash(), self.difficulty) {
                debug!(
                    "nonce {} qualified at difficulty {}",
                    nonce, self.difficulty
                );
                return Ok(candidate);
            }
        }
        warn!(
            "search exhausted {} attempts at difficulty {}",
            self.max_attempts, self.difficulty
        );
        Err(ConsensusError::MiningExhausted {
            attempts: self.max_attempts,
        })
    }
}

impl ConsensusEngine for ProofOfWork {
    fn propose(
        &self,
        tail: &Rc<Block>,
        payload: &str,
        timestamp: f64,
    ) -> Result<Option<Block>, ConsensusError> {
        self.mine(tail, payload, timestamp).map(Some)
    }

    /// Mined blocks are judged purely by their difficulty prefix,
    /// whichever participant produced them.
    fn admits(&self, _ledger_tail: Option<&Rc<Block>>, candidate: &Block) -> bool {
        meets_difficulty(&candidate.hash(), self.difficulty)
    }
}
