//! Shared Futures
//!
//! Run with: cargo run --example shared_futures
//! (set RUST_LOG=debug to see task triggers)
//!
//! This example demonstrates:
//! - Handing out futures before a task runs
//! - Rejected second triggers and captured panics
//! - Publishing a result only when the worker thread exits
//! - Uniform and unchecked compositions

use std::time::Duration;

use composable_core::{Callable, CallableExt};
use composable_task::{SemisafeComposition, TaskComposition, UncheckedComposition};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Shared Futures ===\n");

    // -------------------------------------------------------------------------
    // Fan-out
    // -------------------------------------------------------------------------
    println!("1. Fan-out");
    println!("----------");

    let report = TaskComposition::new(|n: u32| format!("{} squared is {}", n, n * n));
    std::thread::scope(|scope| {
        for id in 0..3 {
            let observer = report.get_future();
            scope.spawn(move || match observer.wait() {
                Ok(text) => println!("observer {}: {}", id, text),
                Err(err) => println!("observer {}: {}", id, err),
            });
        }
        std::thread::sleep(Duration::from_millis(20));
        if let Err(err) = report.invoke(12) {
            println!("unexpected: {}", err);
        }
    });

    match report.invoke(13) {
        Ok(_) => println!("second trigger ran?"),
        Err(err) => println!("second trigger: {}", err),
    }
    println!();

    // -------------------------------------------------------------------------
    // Failures
    // -------------------------------------------------------------------------
    println!("2. Failures");
    println!("-----------");

    let divide = TaskComposition::new(|(a, b): (i32, i32)| {
        if b == 0 {
            panic!("division by zero");
        }
        a / b
    });
    match divide.invoke((1, 0)).map(|future| future.wait()) {
        Ok(outcome) => println!("1 / 0 -> {:?}", outcome),
        Err(err) => println!("trigger failed: {}", err),
    }
    println!();

    // -------------------------------------------------------------------------
    // Thread exit
    // -------------------------------------------------------------------------
    println!("3. Thread exit");
    println!("--------------");

    let cube = TaskComposition::new(|n: u64| n * n * n);
    let observer = cube.get_future();
    std::thread::scope(|scope| {
        scope.spawn(|| {
            if let Ok(future) = cube.invoke_at_thread_exit(7) {
                println!("ready before the worker exits: {}", future.is_ready());
            }
        });
    });
    println!("after the worker exits: {:?}", observer.wait());
    println!();

    // -------------------------------------------------------------------------
    // Relaxed variants
    // -------------------------------------------------------------------------
    println!("4. Relaxed variants");
    println!("-------------------");

    let halve = SemisafeComposition::new(|n: i64| (n / 2) as i32);
    let uniform = halve.uniform();
    let eighth = &uniform * &(&uniform * &uniform);
    let traced = eighth.traced();
    let (result, trace) = traced.call(800);
    println!("800 / 8 -> {:?}", result.map(|future| future.wait()));
    print!("{}", trace);

    let add = UncheckedComposition::new(|(a, b): (i32, i32)| a + b);
    let shout = UncheckedComposition::new(|(s,): (String,)| s.to_uppercase());
    match shout.compose(&add) {
        Ok(_) => println!("composed a mismatched chain?"),
        Err(err) => println!("rejected: {}", err),
    }
}
