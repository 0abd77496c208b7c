//! Measure reception overhead of the uniform-degree fountain stream.
//!
//! For each trial seed, counts how many packets the decoder consumes
//! before the payload completes and prints the overhead spread relative
//! to the chunk count K. Uniform degree selection trades overhead for
//! simplicity, so expect a multiple of K rather than the near-1.05x of
//! a soliton distribution.
//!
//! Usage:
//!   cargo run --example overhead -- --size 16384 --trials 200

use anyhow::{ensure, Context, Result};
use clap::Parser;
use rand::Rng;
use tracing::{info, Level};

use ltfec::{transform, Decoder};

#[derive(Parser, Debug)]
#[command(about = "Packets-per-payload statistics for the fountain stream")]
struct Args {
    /// Payload size in bytes
    #[arg(long, default_value_t = 16384)]
    size: usize,

    /// Chunk size in bytes
    #[arg(long, default_value_t = 1024)]
    chunk_size: u32,

    /// Number of independent trials
    #[arg(long, default_value_t = 100)]
    trials: u32,

    /// Per-trial packet budget
    #[arg(long, default_value_t = 65536)]
    budget: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();
    ensure!(args.trials > 0, "need at least one trial");
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let mut rng = rand::thread_rng();
    let payload: Vec<u8> = (0..args.size).map(|_| rng.gen()).collect();

    let mut consumed = Vec::with_capacity(args.trials as usize);
    let mut k = 0;

    for trial in 0..args.trials {
        let seed: u32 = rng.gen();
        let mut encoder =
            transform(&payload, seed, args.chunk_size).context("bad encoder config")?;
        k = encoder.params().chunk_count();

        let mut destination = vec![0u8; payload.len()];
        let mut decoder = Decoder::new(&mut destination, payload.len() as u64, args.chunk_size)
            .context("bad decoder config")?;
        let report = decoder.run(&mut encoder.by_ref().take(args.budget));
        drop(decoder);

        ensure!(
            report.complete,
            "trial {trial} (seed {seed}) did not complete within {} packets",
            args.budget
        );
        ensure!(destination == payload, "trial {trial} reconstructed wrong bytes");
        consumed.push(report.packets_consumed);
    }

    consumed.sort_unstable();
    let min = consumed[0];
    let max = consumed[consumed.len() - 1];
    let median = consumed[consumed.len() / 2];
    let mean = consumed.iter().sum::<u64>() as f64 / consumed.len() as f64;

    info!(k, trials = args.trials, "all payloads reconstructed");
    info!(min, median, max, mean, "packets consumed per payload");
    info!(
        min = min as f64 / k as f64,
        median = median as f64 / k as f64,
        max = max as f64 / k as f64,
        "overhead relative to K"
    );
    Ok(())
}
