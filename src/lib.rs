//! Single-process simulation of two consensus mechanisms, Proof-of-Work
//! and Proof-of-Stake, over an append-only, hash-chained ledger.
//!
//! Participants exchange blocks through direct in-process references
//! standing in for a network: a participant produces a block with its
//! engine, appends it through its own validation gate, then pushes the
//! same reference into every registered peer, each of which re-validates
//! independently. There is no transport, persistence, or transaction
//! model; payloads are opaque strings.
//!
//! - `blockchain/`: the immutable [`blockchain::Block`], the per-participant
//!   [`blockchain::Ledger`], and pure validation helpers.
//! - `consensus/`: the [`consensus::ConsensusEngine`] seam with its two
//!   implementations, [`consensus::ProofOfWork`] and
//!   [`consensus::ProofOfStake`].
//! - `node/`: the participant shell and peer registry, [`node::Node`].

pub mod blockchain;
pub mod consensus;
pub mod node;

pub use blockchain::{Block, Ledger};
pub use consensus::{ConsensusEngine, ConsensusError, ProofOfStake, ProofOfWork};
pub use node::{AppendOutcome, Node, NodeHandle, PosNode, PowNode};
