//! Seedable driver that populates a [Dht] with random peers and values, then
//! measures how many random lookups find their value.

use std::fmt::{self, Display, Formatter};

use bytes::Bytes;
use rand::{distributions::Alphanumeric, rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info};

use crate::{common::hash_immutable, Config, Dht, Error, Id, Result};

/// Longest random value generated by a [Simulation].
pub const MAX_VALUE_LENGTH: usize = 30;

#[derive(Debug, Clone)]
/// Simulation Configurations
pub struct SimulationConfig {
    /// Number of peers to create.
    ///
    /// Defaults to 100
    pub peers: usize,
    /// Number of random values to put.
    ///
    /// Defaults to 200
    pub keys: usize,
    /// Number of random lookups to run after all puts.
    ///
    /// Defaults to 100
    pub lookups: usize,
    /// Seed of the random generator, `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Let every peer try to insert every other peer into its routing table
    /// before any put.
    ///
    /// Defaults to true
    pub connect: bool,
    /// Configuration of every peer.
    pub dht: Config,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            peers: 100,
            keys: 200,
            lookups: 100,
            seed: None,
            connect: true,
            dht: Config::default(),
        }
    }
}

#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    rng: StdRng,
    dht: Dht,
    peers: Vec<Id>,
}

impl Simulation {
    /// Create the peers, and connect them if configured to.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        if config.peers == 0 {
            return Err(Error::InvalidArgument("simulation needs at least one peer"));
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut dht = Dht::new(config.dht.clone());
        let mut peers = Vec::with_capacity(config.peers);

        // Small id sizes collide, give up once the id space is likely exhausted.
        let mut attempts = config.peers * 8;
        while peers.len() < config.peers && attempts > 0 {
            attempts -= 1;

            let id = Id::random_from(&mut rng, config.dht.id_size);
            match dht.add_peer(id.clone()) {
                Ok(_) => peers.push(id),
                Err(Error::DuplicatePeer(_)) => continue,
                Err(error) => return Err(error),
            }
        }

        if config.connect {
            dht.connect_all();
        }

        debug!(peers = peers.len(), "Created simulation peers");

        Ok(Simulation {
            config,
            rng,
            dht,
            peers,
        })
    }

    // === Getters ===

    pub fn dht(&self) -> &Dht {
        &self.dht
    }

    pub fn peers(&self) -> &[Id] {
        &self.peers
    }

    // === Public Methods ===

    /// Put `keys` random values at random peers, then look up `lookups` random
    /// keys from random peers.
    pub fn run(&mut self) -> Result<Report> {
        let mut report = Report::default();
        let mut keys = Vec::with_capacity(self.config.keys);

        for _ in 0..self.config.keys {
            let value = random_value(&mut self.rng);
            let hash = hash_immutable(&value);
            let origin = self.random_peer();

            if self.dht.put(&origin, &hash, value)? {
                report.stored += 1;
            }

            keys.push(Id::from_digest(&hash, self.config.dht.id_size));
        }

        if !keys.is_empty() {
            for _ in 0..self.config.lookups {
                let key = keys[self.rng.gen_range(0..keys.len())].clone();
                let peer = self.rng.gen_range(0..self.peers.len());

                let value = self.dht.get(&self.peers[peer], &key)?;

                report.lookups.push(Lookup { peer, key, value });
            }
        }

        info!(
            stored = report.stored,
            hits = report.hits(),
            misses = report.misses(),
            "Simulation done"
        );

        Ok(report)
    }

    // === Private Methods ===

    fn random_peer(&mut self) -> Id {
        self.peers[self.rng.gen_range(0..self.peers.len())].clone()
    }
}

/// Random alphanumeric value between 1 and [MAX_VALUE_LENGTH] bytes long.
pub fn random_value<R: Rng>(rng: &mut R) -> Bytes {
    let len = rng.gen_range(1..=MAX_VALUE_LENGTH);

    rng.sample_iter(Alphanumeric).take(len).collect::<Vec<u8>>().into()
}

#[derive(Debug, Clone)]
/// A single lookup issued by a [Simulation].
pub struct Lookup {
    /// Index of the peer the lookup was issued at.
    pub peer: usize,
    pub key: Id,
    pub value: Option<Bytes>,
}

impl Display for Lookup {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(
                f,
                "true: peer {:>2} found key {} with value {}",
                self.peer,
                self.key,
                String::from_utf8_lossy(value)
            ),
            None => write!(
                f,
                "false: peer {:>2} could not find key {}",
                self.peer, self.key
            ),
        }
    }
}

#[derive(Debug, Clone, Default)]
/// Outcome of [Simulation::run].
pub struct Report {
    /// Number of puts accepted by their origin peer.
    pub stored: usize,
    pub lookups: Vec<Lookup>,
}

impl Report {
    pub fn hits(&self) -> usize {
        self.lookups.iter().filter(|l| l.value.is_some()).count()
    }

    pub fn misses(&self) -> usize {
        self.lookups.len() - self.hits()
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for lookup in &self.lookups {
            writeln!(f, "{lookup}")?;
        }

        write!(
            f,
            "stored: {}, found: {}/{}",
            self.stored,
            self.hits(),
            self.lookups.len()
        )
    }
}
