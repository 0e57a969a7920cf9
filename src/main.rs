use std::env;
use std::rc::Rc;

use chrono::Utc;
use dotenvy::dotenv;
use log::info;
use serde::Serialize;

use consensus_sim::blockchain::{DEFAULT_DIFFICULTY, DEFAULT_MAX_ATTEMPTS, NEUTRAL_NONCE};
use consensus_sim::{Block, ConsensusError, Node, PosNode, PowNode, ProofOfStake, ProofOfWork};

/* ---------- Report models ---------- */

#[derive(Serialize)]
struct BlockReport {
    height: usize,
    timestamp: f64,
    payload: String,
    nonce: u64,
    hash: String,
    predecessor: Option<String>,
}

#[derive(Serialize)]
struct LedgerReport {
    owner: String,
    length: usize,
    consistent: bool,
    blocks: Vec<BlockReport>,
}

fn ledger_report<E>(node: &Node<E>) -> LedgerReport {
    let blocks = node
        .ledger
        .iter()
        .enumerate()
        .map(|(height, block)| BlockReport {
            height,
            timestamp: block.timestamp,
            payload: block.payload.clone(),
            nonce: block.nonce,
            hash: block.hash(),
            predecessor: block.predecessor.as_ref().map(|p| p.hash()),
        })
        .collect();
    LedgerReport {
        owner: node.name.clone(),
        length: node.ledger.len(),
        consistent: node.ledger.is_consistent(),
        blocks,
    }
}

fn print_report<E>(node: &Node<E>) {
    let json = serde_json::to_string_pretty(&ledger_report(node)).expect("serialize report");
    println!("{json}");
}

/* ---------- Scenarios ---------- */

fn unix_time() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// A bootstrapped three-block history. These blocks were never mined, so
/// they do not follow the difficulty rule.
fn seeded_history() -> Vec<Rc<Block>> {
    let b0 = Rc::new(Block::genesis(unix_time(), "block0"));
    let b1 = Rc::new(Block::new(
        unix_time(),
        "block1",
        Some(Rc::clone(&b0)),
        NEUTRAL_NONCE,
    ));
    let b2 = Rc::new(Block::new(
        unix_time(),
        "block2",
        Some(Rc::clone(&b1)),
        NEUTRAL_NONCE,
    ));
    vec![b0, b1, b2]
}

fn run_proof_of_work(difficulty: u32, max_attempts: u64) {
    println!("\n=== Proof of Work ===");
    let engine = || ProofOfWork::new(difficulty, max_attempts);
    let bob = PowNode::shared("bob", engine());
    let alice = PowNode::shared("alice", engine());
    let jack = PowNode::shared("jack", engine());

    bob.borrow_mut()
        .register(&[Rc::clone(&alice), Rc::clone(&jack)]);
    alice
        .borrow_mut()
        .register(&[Rc::clone(&bob), Rc::clone(&jack)]);
    jack.borrow_mut()
        .register(&[Rc::clone(&bob), Rc::clone(&alice)]);

    for node in [&bob, &alice, &jack] {
        let node = node.borrow();
        info!(
            "I am {} and I know: {}",
            node.name,
            node.known_peers().join(", ")
        );
    }

    for node in [&bob, &alice, &jack] {
        node.borrow_mut().seed_ledger(seeded_history());
    }
    bob.borrow_mut().add_data("data for the next mined block");

    let outcome = bob.borrow_mut().propose_and_broadcast();
    match outcome {
        Ok(Some(block)) => {
            println!("bob mined block {} (nonce {})", block.hash(), block.nonce);
            for node in [&bob, &alice, &jack] {
                print_report(&node.borrow());
            }
        }
        Ok(None) => println!("bob produced no block this round"),
        Err(err @ ConsensusError::MiningExhausted { .. }) => {
            println!("bob gave up: {err}");
        }
        Err(err) => println!("round failed: {err}"),
    }
}

fn run_proof_of_stake(ticket_supply: u64) {
    println!("\n=== Proof of Stake ===");
    // Bob is very rich: tickets are assigned exclusively at setup and
    // every engine carries the same externally agreed supply.
    let bob = PosNode::shared("bob", ProofOfStake::new(0..=3, ticket_supply));
    let alice = PosNode::shared("alice", ProofOfStake::new(4..=5, ticket_supply));
    let jack = PosNode::shared("jack", ProofOfStake::new([6], ticket_supply));

    bob.borrow_mut()
        .register(&[Rc::clone(&alice), Rc::clone(&jack)]);
    alice
        .borrow_mut()
        .register(&[Rc::clone(&bob), Rc::clone(&jack)]);
    jack.borrow_mut()
        .register(&[Rc::clone(&bob), Rc::clone(&alice)]);

    for node in [&bob, &alice, &jack] {
        node.borrow_mut().seed_ledger(seeded_history());
    }
    bob.borrow_mut().add_data("data staked by bob");
    alice.borrow_mut().add_data("data staked by alice");
    jack.borrow_mut().add_data("data staked by jack");

    // Everyone takes a turn; each draw runs against the then-current
    // tail, so a broadcast win changes the next participant's draw.
    for node in [&bob, &alice, &jack] {
        let outcome = node.borrow_mut().propose_and_broadcast();
        let name = node.borrow().name.clone();
        match outcome {
            Ok(Some(block)) => println!("{name} won the lottery: {}", block.hash()),
            Ok(None) => println!("{name} lost the lottery this round"),
            Err(err) => println!("{name}: round failed: {err}"),
        }
    }

    for node in [&bob, &alice, &jack] {
        print_report(&node.borrow());
    }
}

fn main() {
    let _ = dotenv();
    env_logger::init();

    let difficulty: u32 = env::var("SIM_DIFFICULTY")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_DIFFICULTY);
    let max_attempts: u64 = env::var("SIM_MAX_ATTEMPTS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_ATTEMPTS);
    let ticket_supply: u64 = env::var("SIM_TICKET_SUPPLY")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(7);

    println!(
        "⛓️ Consensus simulation (difficulty={difficulty}, max_attempts={max_attempts}, ticket_supply={ticket_supply})"
    );

    run_proof_of_work(difficulty, max_attempts);
    run_proof_of_stake(ticket_supply);
}
