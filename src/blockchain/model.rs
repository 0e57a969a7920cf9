use std::rc::Rc;

use super::Block;
use super::validate;

/// A participant's view of the chain: an ordered, append-only sequence of
/// shared block references. Each participant owns its own `Ledger`; the
/// blocks inside are shared with everyone the blocks were broadcast to.
#[derive(Debug, Default)]
pub struct Ledger {
    blocks: Vec<Rc<Block>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Replace the whole sequence with an externally supplied history.
    /// Intended to run once at initialization; seeded blocks represent a
    /// bootstrapped past and are not required to satisfy any difficulty
    /// target.
    pub fn seed(&mut self, blocks: Vec<Rc<Block>>) {
        self.blocks = blocks;
    }

    /// Append one block. Callers are expected to have validated it; the
    /// ledger itself never removes or reorders entries.
    pub fn push(&mut self, block: Rc<Block>) {
        self.blocks.push(block);
    }

    /// The newest block, if the ledger has been seeded or grown.
    pub fn tail(&self) -> Option<&Rc<Block>> {
        self.blocks.last()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Read-only walk over the sequence, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<Block>> {
        self.blocks.iter()
    }

    /// Audit the whole sequence: every entry after the first must
    /// reference its predecessor in the ledger by digest. Seeded history
    /// is exempt from difficulty rules, so only linkage is checked.
    pub fn is_consistent(&self) -> bool {
        self.blocks
            .windows(2)
            .all(|pair| validate::extends(&pair[1], &pair[0]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_of_three() -> Vec<Rc<Block>> {
        let b0 = Rc::new(Block::genesis(1.0, "block0"));
        let b1 = Rc::new(Block::new(2.0, "block1", Some(Rc::clone(&b0)), 0));
        let b2 = Rc::new(Block::new(3.0, "block2", Some(Rc::clone(&b1)), 0));
        vec![b0, b1, b2]
    }

    #[test]
    fn starts_empty() {
        let ledger = Ledger::new();
        assert!(ledger.is_empty());
        assert!(ledger.tail().is_none());
    }

    #[test]
    fn seed_replaces_the_sequence() {
        let mut ledger = Ledger::new();
        ledger.seed(chain_of_three());
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.tail().unwrap().payload, "block2");
    }

    #[test]
    fn push_grows_the_tail() {
        let mut ledger = Ledger::new();
        ledger.seed(chain_of_three());
        let tail = Rc::clone(ledger.tail().unwrap());

        let next = Rc::new(Block::new(4.0, "block3", Some(tail), 9));
        ledger.push(Rc::clone(&next));

        assert_eq!(ledger.len(), 4);
        assert!(Rc::ptr_eq(ledger.tail().unwrap(), &next));
    }

    #[test]
    fn linked_history_is_consistent() {
        let mut ledger = Ledger::new();
        ledger.seed(chain_of_three());
        assert!(ledger.is_consistent());
    }

    #[test]
    fn unlinked_entry_breaks_consistency() {
        let mut chain = chain_of_three();
        // An entry whose predecessor is not the block before it.
        chain.push(Rc::new(Block::genesis(4.0, "stray")));

        let mut ledger = Ledger::new();
        ledger.seed(chain);
        assert!(!ledger.is_consistent());
    }

    #[test]
    fn empty_and_single_entry_ledgers_are_consistent() {
        let mut ledger = Ledger::new();
        assert!(ledger.is_consistent());
        ledger.push(Rc::new(Block::genesis(1.0, "only")));
        assert!(ledger.is_consistent());
    }
}
