//! Example demonstrating memoized methods bound to receivers.
//!
//! Run with: cargo run --example bound_method

use std::convert::Infallible;
use std::sync::Arc;

use memokit::prelude::*;

struct Portfolio {
    name: &'static str,
    holdings: Vec<(&'static str, u64)>,
}

fn main() {
    println!("=== Bound Method Example ===\n");

    let value_of = MethodMemoizer::new(|p: &Portfolio, args: &Args| {
        let price = args.kw("price").and_then(Frozen::as_int).unwrap_or(1);
        let total: u64 = p.holdings.iter().map(|(_, qty)| qty).sum();
        println!("   computing {} at price {price}", p.name);
        Ok::<_, Infallible>(i128::from(total) * price)
    });

    let growth = Arc::new(Portfolio {
        name: "growth",
        holdings: vec![("abc", 10), ("xyz", 5)],
    });
    let income = Arc::new(Portfolio {
        name: "income",
        holdings: vec![("bnd", 40)],
    });

    let at_three = Args::new().kwarg("price", 3);
    for portfolio in [&growth, &income, &growth, &income] {
        let bound = value_of.bind(portfolio);
        println!("   {} -> {:?}", portfolio.name, bound.cached(&at_three).ok());
    }

    println!();
    #[cfg(feature = "metrics")]
    println!("   both receivers share one cache: {:?}", value_of.metrics());
}
