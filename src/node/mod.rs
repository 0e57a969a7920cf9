pub mod model;

pub use model::{AppendOutcome, Node, NodeHandle};

use crate::consensus::{ProofOfStake, ProofOfWork};

/// The two participant flavors, one per consensus mechanism.
pub type PowNode = Node<ProofOfWork>;
pub type PosNode = Node<ProofOfStake>;
