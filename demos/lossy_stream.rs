//! Fountain decode over a lossy, reordered packet stream.
//!
//! Encodes a random payload, drops and shuffles a slice of the packet
//! stream the way a hostile network would, then feeds the survivors to
//! the peeling decoder through an in-memory channel.
//!
//! Usage:
//!   cargo run --example lossy_stream -- --size 65536 --loss 30

use anyhow::{ensure, Context, Result};
use clap::Parser;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, Level};

use ltfec::{Decoder, Encoder, PacketChannel, Params};

#[derive(Parser, Debug)]
#[command(about = "Decode a payload from a lossy, reordered fountain stream")]
struct Args {
    /// Payload size in bytes
    #[arg(long, default_value_t = 65536)]
    size: usize,

    /// Chunk size in bytes
    #[arg(long, default_value_t = Params::DEFAULT_CHUNK_SIZE)]
    chunk_size: u32,

    /// Encoder seed (random if omitted)
    #[arg(long)]
    seed: Option<u32>,

    /// Percentage of packets the network drops (0-99)
    #[arg(long, default_value_t = 30)]
    loss: u8,

    /// Packets to emit before giving up
    #[arg(long, default_value_t = 4096)]
    budget: usize,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    ensure!(args.loss < 100, "loss must be below 100 percent");

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let mut rng = rand::thread_rng();
    let payload: Vec<u8> = (0..args.size).map(|_| rng.gen()).collect();
    let seed = args.seed.unwrap_or_else(|| rng.gen());

    let encoder = Encoder::new(&payload, seed, args.chunk_size).context("bad encoder config")?;
    let k = encoder.params().chunk_count();
    info!(seed, k, chunk_size = args.chunk_size, "encoding");

    // Emulate the network: drop a fraction, deliver the rest out of order.
    let mut survivors: Vec<_> = encoder
        .take(args.budget)
        .filter(|_| rng.gen_range(0..100) >= args.loss)
        .collect();
    survivors.shuffle(&mut rng);
    info!(
        delivered = survivors.len(),
        dropped = args.budget - survivors.len(),
        "network pass done"
    );

    let (tx, mut rx) = PacketChannel::pair();
    for packet in survivors {
        debug!(seed = packet.seed, len = packet.data.len(), "deliver");
        tx.send(packet).ok();
    }
    drop(tx);

    let mut destination = vec![0u8; payload.len()];
    let mut decoder =
        Decoder::new(&mut destination, payload.len() as u64, args.chunk_size)
            .context("bad decoder config")?;
    let report = decoder.run(&mut rx);
    drop(decoder);

    info!(
        consumed = report.packets_consumed,
        redundant = report.redundant,
        resolved = report.resolved,
        complete = report.complete,
        "decode finished"
    );

    ensure!(report.complete, "stream exhausted before the payload completed");
    ensure!(destination == payload, "reconstructed payload differs");
    info!(
        overhead = report.packets_consumed as f64 / k.max(1) as f64,
        "payload reconstructed bit-for-bit"
    );
    Ok(())
}
