//! Times a product-of-range reduction under the configured strategy and
//! prints a few rows of Pascal's triangle computed the same way.
//!
//! Configure with `PACC_THREADS`, `PACC_FORK_THRESHOLD` and `PACC_STRATEGY`,
//! from the environment or a `.env` file.

use std::time::Instant;

use log::info;

use paccumulate::{sequential, Monoid, ReduceConfig, Reducer};

fn binomial(reducer: &Reducer<u128>, n: u128, k: u128) -> anyhow::Result<u128> {
    let k = k.max(n - k);
    let numerator = reducer.reduce(k + 1..=n, 1)?;
    let denominator = reducer.reduce(1..=n - k, 1)?;
    Ok(numerator / denominator)
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    let config = ReduceConfig::from_env()?;
    info!("{:?}", config);

    let sum = Reducer::from_config(&config, Monoid::<u64>::sum())?;
    let start = Instant::now();
    let parallel = sum.reduce(1..=10_000_000u64, 0)?;
    let forked = start.elapsed();
    let start = Instant::now();
    let expected = sequential(1..=10_000_000u64, 0, sum.monoid());
    let plain = start.elapsed();
    anyhow::ensure!(parallel == expected, "{} != {}", parallel, expected);
    println!(
        "sum 1..=1e7 = {} ({}: {:?}, sequential: {:?})",
        parallel,
        sum.strategy(),
        forked,
        plain
    );

    let product = Reducer::from_config(&config, Monoid::<u128>::product())?;
    for n in 1..=12u128 {
        let row = (0..=n)
            .map(|k| binomial(&product, n, k).map(|c| c.to_string()))
            .collect::<anyhow::Result<Vec<_>>>()?;
        println!("{:>width$}{}", "", row.join(" "), width = (12 - n as usize) * 2);
    }
    Ok(())
}
