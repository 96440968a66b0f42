//! Per-ancestor wildcard sampling.
//!
//! Lazily probes random non-existent children of an ancestor and memoizes
//! the result for every later caller. Single-flight is a property of an
//! async read/write lock whose write-guard *is* the barrier: the first
//! caller to win the write lock drives the whole probe loop while holding
//! the guard, so every other caller's lock acquisition simply blocks
//! instead of polling.

use std::net::IpAddr;

use rand::Rng;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::domain::RecordSet;
use crate::error::ResolveError;
use crate::resolver::DnsResolver;

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Default)]
struct ProbeState {
    results: Vec<RecordSet>,
    last_error: Option<String>,
    done: bool,
}

/// Lazily-probed, memoized sample of an ancestor's answers for random
/// non-existent children.
#[derive(Debug)]
pub struct Probe {
    ancestor: String,
    probes_per_ancestor: usize,
    retry_budget: usize,
    state: RwLock<ProbeState>,
}

impl Probe {
    pub fn new(ancestor: impl Into<String>, probes_per_ancestor: usize, retry_multiplier: usize) -> Self {
        Probe {
            ancestor: ancestor.into(),
            probes_per_ancestor,
            retry_budget: probes_per_ancestor * retry_multiplier,
            state: RwLock::new(ProbeState::default()),
        }
    }

    /// Returns the memoized sample, driving the probe loop on first call.
    /// Concurrent callers across any number of tasks only ever trigger one
    /// probe loop per `Probe`: single-flight is a property of the
    /// `RwLock`, not of extra bookkeeping.
    #[instrument(skip(self, resolver, resolvers), fields(ancestor = %self.ancestor))]
    pub async fn get_results(
        &self,
        resolver: &dyn DnsResolver,
        resolvers: &[IpAddr],
    ) -> (Vec<RecordSet>, Option<String>) {
        {
            let guard = self.state.read().await;
            if guard.done {
                return (guard.results.clone(), guard.last_error.clone());
            }
        }

        let mut guard = self.state.write().await;
        if !guard.done {
            self.drive_probe_loop(&mut guard, resolver, resolvers).await;
        }
        (guard.results.clone(), guard.last_error.clone())
    }

    async fn drive_probe_loop(
        &self,
        guard: &mut ProbeState,
        resolver: &dyn DnsResolver,
        resolvers: &[IpAddr],
    ) {
        let mut need = self.probes_per_ancestor;
        let mut budget = self.retry_budget;

        while need > 0 && budget > 0 {
            let child = random_child(&self.ancestor);
            match resolver.resolve(resolvers, &child).await {
                Ok(records) => {
                    guard.results.push(records);
                    need -= 1;
                }
                Err(err) => {
                    guard.last_error = Some(err.to_string());
                    budget -= 1;
                }
            }
        }
        guard.done = true;
    }
}

fn random_child(ancestor: &str) -> String {
    let label_len = 63.min(253usize.saturating_sub(ancestor.len()).max(1));
    let mut rng = rand::thread_rng();
    let label: String = (0..label_len).map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char).collect();
    format!("{label}.{ancestor}")
}
