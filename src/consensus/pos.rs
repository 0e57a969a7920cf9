use std::collections::BTreeSet;
use std::rc::Rc;

use log::{debug, info};

use super::{ConsensusEngine, ConsensusError};
use crate::blockchain::validate::extends;
use crate::blockchain::{Block, NEUTRAL_NONCE};

/// How many trailing hex characters of the tail digest feed the lottery
/// draw, giving a draw in [0, 4095].
pub const LOTTERY_SUFFIX_LEN: usize = 3;

/// Deterministic lottery over a fixed ticket supply.
///
/// Every participant holding the same tail computes the same winning
/// ticket, so only the holder of that ticket may produce the next block.
/// The supply is the externally agreed total across all participants;
/// each engine must be constructed with the same value or the "one
/// winner system-wide" guarantee does not hold.
#[derive(Debug, Clone)]
pub struct ProofOfStake {
    /// Tickets held locally. Ordered and duplicate-free.
    pub tickets: BTreeSet<u64>,
    /// Total number of tickets in circulation across all participants.
    pub ticket_supply: u64,
}

impl ProofOfStake {
    /// # Panics
    /// Panics if `ticket_supply` is zero: a lottery with no tickets has
    /// no winner to draw.
    pub fn new(tickets: impl IntoIterator<Item = u64>, ticket_supply: u64) -> Self {
        assert!(ticket_supply > 0, "ticket supply must be non-zero");
        Self {
            tickets: tickets.into_iter().collect(),
            ticket_supply,
        }
    }

    /// Derive the winning ticket from a tail digest: the last three hex
    /// characters, parsed as an integer, reduced modulo the supply.
    /// Purely deterministic: two participants observing the same tail
    /// and the same supply always agree on the winner. A non-hex suffix
    /// draws 0.
    pub fn select_winner(tail_hash: &str, ticket_supply: u64) -> u64 {
        let start = tail_hash.len().saturating_sub(LOTTERY_SUFFIX_LEN);
        let suffix = tail_hash.get(start..).unwrap_or_default();
        let draw = u64::from_str_radix(suffix, 16).unwrap_or_default();
        draw % ticket_supply
    }

    pub fn holds(&self, ticket: u64) -> bool {
        self.tickets.contains(&ticket)
    }

    /// Run one lottery round against `tail`. Returns the next block only
    /// if the winning ticket is held locally; losing is a normal, silent
    /// non-event. Lottery blocks carry the neutral nonce; no search is
    /// performed.
    pub fn try_propose(&self, tail: &Rc<Block>, payload: &str, timestamp: f64) -> Option<Block> {
        let winner = Self::select_winner(&tail.hash(), self.ticket_supply);
        if !self.holds(winner) {
            debug!("ticket {winner} won the draw, not held here");
            return None;
        }
        info!("ticket {winner} won the draw and is held here");
        Some(Block::new(
            timestamp,
            payload,
            Some(Rc::clone(tail)),
            NEUTRAL_NONCE,
        ))
    }
}

impl ConsensusEngine for ProofOfStake {
    fn propose(
        &self,
        tail: &Rc<Block>,
        payload: &str,
        timestamp: f64,
    ) -> Result<Option<Block>, ConsensusError> {
        Ok(self.try_propose(tail, payload, timestamp))
    }

    /// Lottery blocks are never searched for a qualifying digest, so the
    /// difficulty prefix does not apply. A candidate is admitted when it
    /// carries the neutral nonce and extends the local tail; the draw it
    /// claims to have won is re-derivable from that same tail.
    fn admits(&self, ledger_tail: Option<&Rc<Block>>, candidate: &Block) -> bool {
        candidate.nonce == NEUTRAL_NONCE
            && ledger_tail.is_some_and(|tail| extends(candidate, tail))
    }
}
