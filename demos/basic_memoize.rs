//! Example demonstrating cached, forced and raw calls.
//!
//! Run with: cargo run --example basic_memoize
//! Set `RUST_LOG=memokit=trace` to see cache events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use memokit::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct LookupFailed(String);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Memoizer Examples ===\n");

    // Example 1: cached / forced / raw
    println!("1. Call modes");
    let counter = AtomicU64::new(0);
    let bar = Memoizer::new(|_: &()| {
        Ok::<_, std::convert::Infallible>(counter.fetch_add(1, Ordering::SeqCst) + 1)
    });
    println!("   cached -> {:?}", bar.cached(&()).ok());
    println!("   cached -> {:?} (recorded)", bar.cached(&()).ok());
    println!("   forced -> {:?} (recomputed)", bar.forced(&()).ok());
    println!("   raw    -> {:?} (cache untouched)", bar.raw(&()).ok());
    println!("   cached -> {:?}", bar.cached(&()).ok());
    bar.cache().save_value(&bar.key_for(&()), 999);
    println!("   cached -> {:?} (written directly)", bar.cached(&()).ok());
    #[cfg(feature = "metrics")]
    println!("   {:?}", bar.metrics());
    println!();

    // Example 2: memoized failures
    println!("2. Failures are memoized by default");
    let lookup = Memoizer::new(|(host,): &(String,)| Err::<u32, _>(LookupFailed(host.clone())));
    for _ in 0..2 {
        match lookup.cached(&("example.invalid".to_string(),)) {
            Err(CacheError::Call(e)) => println!("   fresh failure: {e:?}"),
            Err(CacheError::Cached(e)) => println!("   replayed failure: {e:?}"),
            other => println!("   unexpected: {other:?}"),
        }
    }
    println!();

    // Example 3: expiration on a whole-table lock
    println!("3. Expiring entries");
    let clock = AtomicU64::new(0);
    let opts = MemoizeOptions::new()
        .backend(Backend::Locked)
        .expire_after(Duration::from_millis(50));
    let stamp = match Memoizer::with_options(
        |_: &()| Ok::<_, std::convert::Infallible>(clock.fetch_add(1, Ordering::SeqCst)),
        &opts,
    ) {
        Ok(memo) => memo,
        Err(e) => {
            eprintln!("   bad options: {e}");
            return;
        },
    };
    println!("   first  -> {:?}", stamp.cached(&()).ok());
    println!("   again  -> {:?}", stamp.cached(&()).ok());
    std::thread::sleep(Duration::from_millis(120));
    println!("   later  -> {:?} (expired, recomputed)", stamp.cached(&()).ok());
}
