//! Populate an in-memory Dht with random peers and values, then print which
//! random lookups found their value.
//!
//! Run: `cargo run --example simulation -- --seed 42 --dump`

use clap::Parser;
use kbucket_dht::{
    simulation::{Simulation, SimulationConfig},
    Config, KeyValidation,
};
use tracing::Level;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of peers
    #[arg(long, default_value_t = 100)]
    peers: usize,
    /// Number of random values to put
    #[arg(long, default_value_t = 200)]
    keys: usize,
    /// Number of random lookups
    #[arg(long, default_value_t = 100)]
    lookups: usize,
    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
    /// Maximum number of nodes per k-bucket
    #[arg(long, default_value_t = kbucket_dht::DEFAULT_BUCKET_SIZE)]
    bucket_size: usize,
    /// Maximum forwarding depth of a put or get, 0 disables the limit
    #[arg(long, default_value_t = kbucket_dht::DEFAULT_MAX_HOPS)]
    max_hops: usize,
    /// Compare keys against the whole hash instead of its first 8 bytes
    #[arg(long)]
    full_key: bool,
    /// Leave routing tables empty
    #[arg(long)]
    disconnected: bool,
    /// Print the routing table of the first peer
    #[arg(long)]
    dump: bool,
    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), kbucket_dht::Error> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();

    let mut dht = Config::default()
        .with_bucket_size(cli.bucket_size)
        .with_max_hops(Some(cli.max_hops).filter(|hops| *hops > 0));
    if cli.full_key {
        dht = dht.with_key_validation(KeyValidation::Full);
    }

    let mut simulation = Simulation::new(SimulationConfig {
        peers: cli.peers,
        keys: cli.keys,
        lookups: cli.lookups,
        seed: cli.seed,
        connect: !cli.disconnected,
        dht,
    })?;

    if cli.dump {
        if let Some(peer) = simulation
            .peers()
            .first()
            .and_then(|id| simulation.dht().peer(id))
        {
            println!("{}", peer.routing_table());
        }
    }

    let report = simulation.run()?;

    println!("{report}");

    Ok(())
}
