//! Run configuration.

use std::net::IpAddr;

use crate::domain::normalize;

/// Tunables for a pipeline run. `resolvers` must be non-empty; everything
/// else has a documented default.
#[derive(Debug, Clone)]
pub struct Config {
    pub job_domain: String,
    pub resolvers: Vec<IpAddr>,
    pub workers: usize,
    pub probes_per_ancestor: usize,
    pub probe_retry_multiplier: usize,
}

impl Config {
    pub fn new(job_domain: impl Into<String>, resolvers: Vec<IpAddr>) -> Self {
        Config {
            job_domain: normalize(&job_domain.into()),
            resolvers,
            workers: DEFAULT_WORKERS,
            probes_per_ancestor: DEFAULT_PROBES_PER_ANCESTOR,
            probe_retry_multiplier: DEFAULT_PROBE_RETRY_MULTIPLIER,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_probes_per_ancestor(mut self, probes_per_ancestor: usize) -> Self {
        self.probes_per_ancestor = probes_per_ancestor;
        self
    }

    pub fn with_probe_retry_multiplier(mut self, probe_retry_multiplier: usize) -> Self {
        self.probe_retry_multiplier = probe_retry_multiplier;
        self
    }
}

const DEFAULT_WORKERS: usize = 6;
const DEFAULT_PROBES_PER_ANCESTOR: usize = 10;
const DEFAULT_PROBE_RETRY_MULTIPLIER: usize = 2;
