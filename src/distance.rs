//! Travel-time matrix acquisition.
//!
//! Resolution order per batch: fully cached pairs short-circuit to the
//! cache, missing pairs go to the live lookup service, and any lookup
//! failure degrades the whole batch to synthetic estimates. A matrix is
//! always fully populated; network trouble never surfaces as an error.

use std::path::{Path, PathBuf};

use rand::Rng;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::cache::DistanceCache;

/// Synthetic fallback range in whole minutes.
const SYNTHETIC_MIN_MINUTES: u32 = 5;
const SYNTHETIC_MAX_MINUTES: u32 = 30;

/// Where the durations in a matrix came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixSource {
    /// Every pair was served from the persistent cache; no network access.
    Cache,
    /// At least one pair came from the live lookup service.
    Lookup,
    /// Uniform estimates after a lookup failure; degraded mode.
    Synthetic,
}

/// Square, zero-diagonal table of directed travel durations in seconds,
/// indexed by address order. Index 0 is always the facility.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    addresses: Vec<String>,
    durations: Vec<Vec<u32>>,
    source: MatrixSource,
}

impl DistanceMatrix {
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn seconds(&self, from: usize, to: usize) -> u32 {
        self.durations[from][to]
    }

    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    pub fn source(&self) -> MatrixSource {
        self.source
    }
}

#[derive(Debug)]
pub enum LookupError {
    Http(reqwest::Error),
    /// The service answered but did not report an OK status.
    Status(String),
    /// No usable duration in the response, or no live service configured.
    Unavailable,
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        LookupError::Http(err)
    }
}

/// Directed travel-time query against an external service.
pub trait TravelTimeLookup {
    /// Travel duration in seconds from `origin` to `destination`.
    fn duration_between(&self, origin: &str, destination: &str) -> Result<u32, LookupError>;
}

impl<T: TravelTimeLookup + ?Sized> TravelTimeLookup for Box<T> {
    fn duration_between(&self, origin: &str, destination: &str) -> Result<u32, LookupError> {
        (**self).duration_between(origin, destination)
    }
}

impl<T: TravelTimeLookup + ?Sized> TravelTimeLookup for &T {
    fn duration_between(&self, origin: &str, destination: &str) -> Result<u32, LookupError> {
        (**self).duration_between(origin, destination)
    }
}

/// Lookup used when no API credential is configured. Always fails, so
/// every batch takes the synthetic path.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineLookup;

impl TravelTimeLookup for OfflineLookup {
    fn duration_between(&self, _origin: &str, _destination: &str) -> Result<u32, LookupError> {
        Err(LookupError::Unavailable)
    }
}

#[derive(Debug, Clone)]
pub struct GoogleMatrixConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl GoogleMatrixConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: "https://maps.googleapis.com/maps/api/distancematrix/json".to_string(),
            api_key: api_key.into(),
            timeout_secs: 10,
        }
    }
}

/// Google Distance Matrix HTTP adapter, one origin/destination pair per
/// request.
#[derive(Debug, Clone)]
pub struct GoogleMatrixClient {
    config: GoogleMatrixConfig,
    client: reqwest::blocking::Client,
}

impl GoogleMatrixClient {
    pub fn new(config: GoogleMatrixConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl TravelTimeLookup for GoogleMatrixClient {
    fn duration_between(&self, origin: &str, destination: &str) -> Result<u32, LookupError> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("origins", origin),
                ("destinations", destination),
                ("key", self.config.api_key.as_str()),
            ])
            .send()?
            .error_for_status()?;

        let body: MatrixResponse = response.json()?;
        if body.status != "OK" {
            return Err(LookupError::Status(body.status));
        }

        body.rows
            .first()
            .and_then(|row| row.elements.first())
            .and_then(|element| element.duration.as_ref())
            .map(|duration| duration.value)
            .ok_or(LookupError::Unavailable)
    }
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    duration: Option<DurationValue>,
}

#[derive(Debug, Deserialize)]
struct DurationValue {
    value: u32,
}

/// Resolves the full travel-time matrix for one optimization batch,
/// mediating all access to the cache handle it owns.
pub struct DistanceProvider<L> {
    lookup: L,
    cache: DistanceCache,
    cache_path: Option<PathBuf>,
}

impl<L: TravelTimeLookup> DistanceProvider<L> {
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            cache: DistanceCache::new(),
            cache_path: None,
        }
    }

    /// Uses an injected cache without disk persistence.
    pub fn with_cache(lookup: L, cache: DistanceCache) -> Self {
        Self {
            lookup,
            cache,
            cache_path: None,
        }
    }

    /// Loads the cache from `path` and persists back after each
    /// successfully looked-up batch.
    pub fn with_cache_file(lookup: L, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            lookup,
            cache: DistanceCache::load(&path),
            cache_path: Some(path),
        }
    }

    pub fn cache(&self) -> &DistanceCache {
        &self.cache
    }

    /// Drops all cached durations so the next batch re-queries the service.
    pub fn refresh_cache(&mut self) {
        self.cache.clear();
    }

    /// Builds the matrix for the facility plus `rider_addresses` in input
    /// order. Always returns a fully populated matrix; lookup failure
    /// degrades the batch to synthetic values instead of erroring.
    pub fn matrix_for(&mut self, facility: &str, rider_addresses: &[String]) -> DistanceMatrix {
        let mut addresses = Vec::with_capacity(rider_addresses.len() + 1);
        addresses.push(facility.to_string());
        addresses.extend(rider_addresses.iter().cloned());
        let n = addresses.len();

        if self.cache.covers(&addresses) {
            debug!(addresses = n, "distance matrix served from cache");
            let durations = matrix_from(&addresses, |from, to| {
                self.cache.get(from, to).unwrap_or(0)
            });
            return DistanceMatrix {
                addresses,
                durations,
                source: MatrixSource::Cache,
            };
        }

        match self.lookup_batch(&addresses) {
            Ok(durations) => {
                if let Some(path) = &self.cache_path {
                    if let Err(err) = self.cache.persist(path) {
                        warn!(path = %path.display(), ?err, "failed to persist distance cache");
                    }
                }
                DistanceMatrix {
                    addresses,
                    durations,
                    source: MatrixSource::Lookup,
                }
            }
            Err(err) => {
                warn!(?err, "distance lookup failed, using synthetic travel times");
                let durations = synthetic_durations(n, &mut rand::thread_rng());
                DistanceMatrix {
                    addresses,
                    durations,
                    source: MatrixSource::Synthetic,
                }
            }
        }
    }

    /// Fills every ordered pair, reusing cached entries and caching new
    /// ones as they arrive. The first lookup error aborts the batch.
    fn lookup_batch(&mut self, addresses: &[String]) -> Result<Vec<Vec<u32>>, LookupError> {
        let n = addresses.len();
        let mut durations = vec![vec![0u32; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let (from, to) = (&addresses[i], &addresses[j]);
                let seconds = match self.cache.get(from, to) {
                    Some(seconds) => seconds,
                    None => {
                        let seconds = self.lookup.duration_between(from, to)?;
                        self.cache.insert(from, to, seconds);
                        seconds
                    }
                };
                durations[i][j] = seconds;
            }
        }
        Ok(durations)
    }
}

fn matrix_from(addresses: &[String], mut seconds: impl FnMut(&str, &str) -> u32) -> Vec<Vec<u32>> {
    let n = addresses.len();
    let mut durations = vec![vec![0u32; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i != j {
                durations[i][j] = seconds(&addresses[i], &addresses[j]);
            }
        }
    }
    durations
}

fn synthetic_durations(n: usize, rng: &mut impl Rng) -> Vec<Vec<u32>> {
    let mut durations = vec![vec![0u32; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i != j {
                durations[i][j] = rng.gen_range(SYNTHETIC_MIN_MINUTES..=SYNTHETIC_MAX_MINUTES) * 60;
            }
        }
    }
    durations
}
