use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info, warn};

use crate::blockchain::{Block, Ledger};
use crate::consensus::{ConsensusEngine, ConsensusError};

/// Result of offering a candidate block to a participant. Rejection is
/// silent and local: the ledger is untouched and nothing travels back to
/// whoever sent the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    Rejected,
}

/// Shared handle through which peers reach each other. The simulation is
/// strictly single-threaded, so `Rc<RefCell<_>>` stands in for a network
/// connection.
pub type NodeHandle<E> = Rc<RefCell<Node<E>>>;

/// One participant: a name for display, its own ledger, a single pending
/// payload slot, the peers it broadcasts to, and one consensus engine.
pub struct Node<E> {
    /// Display only; never part of hashing or validation.
    pub name: String,
    pub ledger: Ledger,
    /// Content for the next produced block; overwritten by each
    /// `add_data` call and kept until replaced.
    pub pending_payload: String,
    pub engine: E,
    peers: Vec<NodeHandle<E>>,
}

impl<E: ConsensusEngine> Node<E> {
    pub fn new(name: impl Into<String>, engine: E) -> Self {
        Self {
            name: name.into(),
            ledger: Ledger::new(),
            pending_payload: String::new(),
            engine,
            peers: Vec::new(),
        }
    }

    /// Convenience for the common case: a participant everyone else will
    /// hold a handle to.
    pub fn shared(name: impl Into<String>, engine: E) -> NodeHandle<E> {
        Rc::new(RefCell::new(Self::new(name, engine)))
    }

    /// Add peers to the known set. Registration is one-directional:
    /// making the relation mutual is the caller's responsibility, and a
    /// participant must not be registered as its own peer.
    pub fn register(&mut self, peers: &[NodeHandle<E>]) {
        self.peers.extend(peers.iter().map(Rc::clone));
    }

    /// Names of the known peers, in registration order. Display only.
    pub fn known_peers(&self) -> Vec<String> {
        self.peers.iter().map(|p| p.borrow().name.clone()).collect()
    }

    /// Install an externally supplied history. Seeded blocks represent a
    /// bootstrapped past and are not required to meet any difficulty
    /// target.
    pub fn seed_ledger(&mut self, blocks: Vec<Rc<Block>>) {
        self.ledger.seed(blocks);
    }

    /// Set the payload for the next produced block, replacing whatever
    /// was pending.
    pub fn add_data(&mut self, payload: impl Into<String>) {
        self.pending_payload = payload.into();
    }

    /// Offer a candidate block. The participant re-validates it through
    /// its own engine before trusting it. This is the only gate between a peer's
    /// claim and the local ledger. On rejection the ledger is left
    /// untouched; rejecting the same candidate again has the same null
    /// effect.
    pub fn add_block(&mut self, candidate: &Rc<Block>) -> AppendOutcome {
        if self.engine.admits(self.ledger.tail(), candidate) {
            self.ledger.push(Rc::clone(candidate));
            AppendOutcome::Appended
        } else {
            debug!("{}: rejected candidate {}", self.name, candidate.hash());
            AppendOutcome::Rejected
        }
    }

    /// Run one full consensus round: invoke the engine against the local
    /// tail and pending payload; on success append locally through the
    /// same validation gate, then push the block reference into every
    /// registered peer. Broadcast is fire-and-forget: peer outcomes are
    /// observed only for logging, never signaled back.
    ///
    /// `Ok(None)` means the round produced nothing (a lost lottery);
    /// `Err` carries a reportable failure. In both cases no ledger
    /// changed.
    pub fn propose_and_broadcast(&mut self) -> Result<Option<Rc<Block>>, ConsensusError> {
        let timestamp = Utc::now().timestamp_micros() as f64 / 1_000_000.0;
        let Some(tail) = self.ledger.tail() else {
            return Err(ConsensusError::EmptyLedger);
        };
        let tail = Rc::clone(tail);

        let Some(block) = self
            .engine
            .propose(&tail, &self.pending_payload, timestamp)?
        else {
            return Ok(None);
        };
        let block = Rc::new(block);
        info!(
            "I am {} and I found a new block with hash {}",
            self.name,
            block.hash()
        );

        if self.add_block(&block) == AppendOutcome::Rejected {
            warn!("{}: own block failed admission, dropping it", self.name);
            return Ok(None);
        }
        for peer in &self.peers {
            if peer.borrow_mut().add_block(&block) == AppendOutcome::Rejected {
                debug!(
                    "{}: peer {} rejected block {}",
                    self.name,
                    peer.borrow().name,
                    block.hash()
                );
            }
        }
        Ok(Some(block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::validate::meets_difficulty;
    use crate::consensus::{ProofOfStake, ProofOfWork};
    use crate::node::{PosNode, PowNode};

    fn seeded_history() -> Vec<Rc<Block>> {
        let b0 = Rc::new(Block::genesis(1.0, "block0"));
        let b1 = Rc::new(Block::new(2.0, "block1", Some(Rc::clone(&b0)), 0));
        let b2 = Rc::new(Block::new(3.0, "block2", Some(Rc::clone(&b1)), 0));
        vec![b0, b1, b2]
    }

    #[test]
    fn registration_is_one_directional() {
        let bob = PowNode::shared("bob", ProofOfWork::default());
        let alice = PowNode::shared("alice", ProofOfWork::default());

        bob.borrow_mut().register(&[Rc::clone(&alice)]);

        assert_eq!(bob.borrow().known_peers(), vec!["alice".to_string()]);
        assert!(alice.borrow().known_peers().is_empty());
    }

    #[test]
    fn pending_payload_is_a_single_overwritten_slot() {
        let mut bob = PowNode::new("bob", ProofOfWork::default());
        bob.add_data("first");
        bob.add_data("second");
        assert_eq!(bob.pending_payload, "second");
    }

    #[test]
    fn rejection_leaves_the_ledger_unchanged_and_is_idempotent() {
        let mut bob = PowNode::new("bob", ProofOfWork::default());
        bob.seed_ledger(seeded_history());
        let before = bob.ledger.len();

        let tail = Rc::clone(bob.ledger.tail().unwrap());
        // First nonce whose digest misses the difficulty target.
        let bad = (0..)
            .map(|n| Rc::new(Block::new(9.0, "bad", Some(Rc::clone(&tail)), n)))
            .find(|b| !meets_difficulty(&b.hash(), bob.engine.difficulty))
            .unwrap();

        assert_eq!(bob.add_block(&bad), AppendOutcome::Rejected);
        assert_eq!(bob.ledger.len(), before);
        assert_eq!(bob.add_block(&bad), AppendOutcome::Rejected);
        assert_eq!(bob.ledger.len(), before);
    }

    #[test]
    fn round_on_an_unseeded_ledger_surfaces_an_error() {
        let mut bob = PowNode::new("bob", ProofOfWork::default());
        bob.add_data("data");
        assert_eq!(
            bob.propose_and_broadcast().unwrap_err(),
            ConsensusError::EmptyLedger
        );
        assert!(bob.ledger.is_empty());
    }

    #[test]
    fn exhausted_search_leaves_every_ledger_unchanged() {
        let bob = PowNode::shared("bob", ProofOfWork::new(12, 25));
        let alice = PowNode::shared("alice", ProofOfWork::new(12, 25));
        bob.borrow_mut().seed_ledger(seeded_history());
        alice.borrow_mut().seed_ledger(seeded_history());
        bob.borrow_mut().register(&[Rc::clone(&alice)]);
        bob.borrow_mut().add_data("data");

        let err = bob.borrow_mut().propose_and_broadcast().unwrap_err();
        assert_eq!(err, ConsensusError::MiningExhausted { attempts: 25 });
        assert_eq!(bob.borrow().ledger.len(), 3);
        assert_eq!(alice.borrow().ledger.len(), 3);
    }

    #[test]
    fn successful_round_lands_the_same_block_on_every_peer() {
        let engine = || ProofOfWork::new(1, 1_000_000);
        let bob = PowNode::shared("bob", engine());
        let alice = PowNode::shared("alice", engine());
        bob.borrow_mut().seed_ledger(seeded_history());
        alice.borrow_mut().seed_ledger(seeded_history());
        bob.borrow_mut().register(&[Rc::clone(&alice)]);
        bob.borrow_mut().add_data("payload");

        let block = bob.borrow_mut().propose_and_broadcast().unwrap().unwrap();

        assert_eq!(bob.borrow().ledger.len(), 4);
        assert_eq!(alice.borrow().ledger.len(), 4);
        assert!(Rc::ptr_eq(bob.borrow().ledger.tail().unwrap(), &block));
        assert!(Rc::ptr_eq(alice.borrow().ledger.tail().unwrap(), &block));
    }

    #[test]
    fn lost_lottery_is_a_quiet_non_event() {
        let tail_chain = seeded_history();
        let winner =
            ProofOfStake::select_winner(&tail_chain.last().unwrap().hash(), 7);
        let losers = (0..7).filter(|t| *t != winner);

        let mut jack = PosNode::new("jack", ProofOfStake::new(losers, 7));
        jack.seed_ledger(tail_chain);
        jack.add_data("data");

        assert!(jack.propose_and_broadcast().unwrap().is_none());
        assert_eq!(jack.ledger.len(), 3);
    }
}
