use std::rc::Rc;

use sha2::{Digest, Sha256};

use super::NEUTRAL_NONCE;

/// A single immutable block in the hash chain.
///
/// A block never stores its own digest: `hash()` recomputes it from the
/// block's content on every call, so no holder of a reference can observe
/// a stale or tampered value. History is shared structure: many ledgers
/// point at the same `Rc<Block>`. A block can only reference a block that
/// existed strictly before it, so the chain is acyclic by construction.
#[derive(Debug, Clone)]
pub struct Block {
    /// Creation time marker, supplied at construction and never re-derived.
    pub timestamp: f64,
    /// Opaque content; the chain never interprets it.
    pub payload: String,
    /// Exactly one earlier block, or `None` for a genesis block.
    pub predecessor: Option<Rc<Block>>,
    /// Proof-of-Work counter; stays at the neutral value for genesis and
    /// lottery-produced blocks.
    pub nonce: u64,
}

impl Block {
    /// Build a block. No validation happens here; whether the resulting
    /// hash satisfies any difficulty target is a property checked by
    /// consumers, not an invariant of construction.
    pub fn new(
        timestamp: f64,
        payload: impl Into<String>,
        predecessor: Option<Rc<Block>>,
        nonce: u64,
    ) -> Self {
        Self {
            timestamp,
            payload: payload.into(),
            predecessor,
            nonce,
        }
    }

    /// A block with no predecessor, carrying the neutral nonce.
    pub fn genesis(timestamp: f64, payload: impl Into<String>) -> Self {
        Self::new(timestamp, payload, None, NEUTRAL_NONCE)
    }

    /// Compute the SHA-256 digest of this block as a lowercase hex string.
    ///
    /// The preimage is the UTF-8 rendering of timestamp, payload,
    /// predecessor digest (when present) and nonce, fed to the hasher in
    /// that fixed order. Because the predecessor's digest is part of the
    /// preimage, the hash binds the whole chain behind this block.
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.timestamp.to_string().as_bytes());
        hasher.update(self.payload.as_bytes());
        if let Some(prev) = &self.predecessor {
            hasher.update(prev.hash().as_bytes());
        }
        hasher.update(self.nonce.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}
