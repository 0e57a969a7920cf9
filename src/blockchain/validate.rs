//! Pure helpers deciding whether a candidate block may extend a chain.
//! Both consensus engines and the ledger audit build on these.

use super::Block;

/// Check that the first `difficulty` hex characters of `hash` are all '0'.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let prefix = difficulty as usize;
    hash.len() >= prefix && hash.chars().take(prefix).all(|c| c == '0')
}

/// Check that `candidate` references `tail` as its predecessor, compared
/// by digest.
pub fn extends(candidate: &Block, tail: &Block) -> bool {
    candidate
        .predecessor
        .as_deref()
        .is_some_and(|prev| prev.hash() == tail.hash())
}
