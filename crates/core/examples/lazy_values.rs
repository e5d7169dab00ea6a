//! Lazy Values
//!
//! Run with: cargo run --example lazy_values
//!
//! This example demonstrates:
//! - `delay`: suspending a value that already exists
//! - `suspend`: deferring construction until the first `force`
//! - Adapting a suspension into a constant function

use composable_core::suspension::{delay, force, suspend, suspend_with};
use composable_core::Composition;

#[derive(Clone, Debug)]
struct Config {
    name: String,
}

impl From<&'static str> for Config {
    fn from(name: &'static str) -> Self {
        println!("  (building Config {:?})", name);
        Config {
            name: name.to_string(),
        }
    }
}

fn main() {
    println!("=== Lazy Values ===\n");

    println!("1. delay + compose");
    let double = Composition::new(|n: i32| n * 2);
    let lazy = double.compose(&delay(21));
    println!("force(double ∘ delay(21)) = {}", force(&lazy));
    println!();

    println!("2. suspend");
    let config = suspend::<Config, _>("production");
    println!("suspended, nothing built yet");
    println!("first force:  {:?}", force(&config).name);
    println!("second force: {:?}", force(&config).name);
    println!();

    println!("3. constant adapter");
    let banner = suspend_with(|| "=".repeat(12));
    let always = banner.constant::<u8>();
    println!("always(1) = {}", always.invoke(1));
    println!("always(2) = {}", always.invoke(2));
}
