//! Memoized Pipelines
//!
//! Run with: cargo run --example memo_pipeline
//! (set RUST_LOG=debug to see memo hits and misses)
//!
//! This example demonstrates:
//! - Wrapping plain functions as memoizing compositions
//! - Chaining them with `*` across different types
//! - Tracing calls to see which results came from the memo

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use composable_core::laws::check_round_trip;
use composable_core::{Callable, CallableExt, Composition};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Memoized Pipelines ===\n");

    // -------------------------------------------------------------------------
    // Memoization
    // -------------------------------------------------------------------------
    println!("1. Memoization");
    println!("--------------");

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let fib = Composition::new(move |n: u32| {
        counter.fetch_add(1, Ordering::SeqCst);
        let (mut a, mut b) = (0u64, 1u64);
        for _ in 0..n {
            (a, b) = (b, a + b);
        }
        a
    });

    for _ in 0..3 {
        println!("fib(80) = {}", fib.invoke(80));
    }
    println!("evaluations: {}", calls.load(Ordering::SeqCst));
    println!();

    // -------------------------------------------------------------------------
    // Typed chains
    // -------------------------------------------------------------------------
    println!("2. Typed chains");
    println!("---------------");

    // i64 -> u32 -> bool; u32 converts into u64
    let magnitude = Composition::new(|n: i64| n.unsigned_abs() as u32);
    let is_large = Composition::new(|n: u64| n > 10_000);
    let check = &is_large * &magnitude;

    for n in [-10_001, -10_000, 0, 10_000, 10_001] {
        println!("is_large(|{}|) = {}", n, check.invoke(n));
    }
    println!();

    // -------------------------------------------------------------------------
    // Laws
    // -------------------------------------------------------------------------
    println!("3. Round trip");
    println!("-------------");

    let f = Composition::new(|n: i64| n + 1);
    let g = Composition::new(|n: i64| n * 2);
    let h = Composition::new(|n: i64| (n - 1) / 2);
    let chain = &h * &(&f * &g);

    match check_round_trip(&chain, -100..=100) {
        Ok(()) => println!("h ∘ (f ∘ g) is the identity on [-100, 100]"),
        Err(err) => println!("unexpected: {}", err),
    }
    println!();

    // -------------------------------------------------------------------------
    // Tracing
    // -------------------------------------------------------------------------
    println!("4. Tracing");
    println!("----------");

    let traced = chain.traced();
    let (_, cold) = traced.call(1_000);
    let (_, warm) = traced.call(1_000);
    print!("{}", cold);
    print!("{}", warm);
}
