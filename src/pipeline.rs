//! Bounded worker pool: consumes resolved subdomains from an input channel,
//! asks the decision engine whether each is wildcard-explained, and forwards
//! survivors (non-wildcard domains) downstream.
//!
//! N workers pull from a shared queue until it closes; a supervisor waits
//! for all of them, then drops the output sender so downstream consumers
//! see end-of-stream rather than having to poll a done flag.

use std::net::IpAddr;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cache::ProbeCache;
use crate::config::Config;
use crate::domain::DomainRecords;
use crate::engine::DecisionEngine;
use crate::resolver::DnsResolver;

/// Runs `config.workers` concurrent tasks over `input`, writing every
/// domain the decision engine does *not* attribute to a wildcard onto
/// `output`. Returns once every worker has finished and `output` has been
/// dropped (signalling end-of-stream to the receiver).
pub async fn run<R>(
    config: Arc<Config>,
    resolver: Arc<R>,
    cache: Arc<ProbeCache>,
    mut input: mpsc::Receiver<DomainRecords>,
    output: mpsc::Sender<DomainRecords>,
) where
    R: DnsResolver + 'static,
{
    let (work_tx, work_rx) = async_channel(input_buffer_hint(config.workers));

    let feeder = tokio::spawn(async move {
        let mut forwarded = 0usize;
        while let Some(domain) = input.recv().await {
            if work_tx.send(domain).await.is_err() {
                break;
            }
            forwarded += 1;
        }
        forwarded
    });

    let mut workers = Vec::with_capacity(config.workers);
    for id in 0..config.workers {
        let work_rx = work_rx.clone();
        let output = output.clone();
        let resolver = Arc::clone(&resolver);
        let cache = Arc::clone(&cache);
        let config = Arc::clone(&config);
        workers.push(tokio::spawn(async move {
            worker_loop(id, config, resolver, cache, work_rx, output).await
        }));
    }
    drop(work_rx);
    drop(output);

    let forwarded = feeder.await.unwrap_or(0);
    let mut survivors = 0usize;
    for worker in workers {
        survivors += worker.await.unwrap_or(0);
    }
    info!(forwarded, survivors, "pipeline run complete");
}

async fn worker_loop<R>(
    id: usize,
    config: Arc<Config>,
    resolver: Arc<R>,
    cache: Arc<ProbeCache>,
    work_rx: async_channel::Receiver<DomainRecords>,
    output: mpsc::Sender<DomainRecords>,
) -> usize
where
    R: DnsResolver + 'static,
{
    let mut survivors = 0usize;
    while let Ok(domain) = work_rx.recv().await {
        let engine = DecisionEngine::new(&config.job_domain, &config.resolvers, resolver.as_ref(), cache.as_ref());
        match engine.is_wildcard(&domain).await {
            Ok(true) => {}
            Ok(false) => {
                survivors += 1;
                if output.send(domain).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                warn!(worker = id, domain = %domain.domain_name, %err, "skipping domain out of scope");
            }
        }
    }
    survivors
}

/// A generous, fixed buffer so the feeder task rarely blocks on slow
/// workers; not user-tunable since it's an implementation detail of the
/// in-process queue, not a resource limit like `workers` is.
fn input_buffer_hint(workers: usize) -> usize {
    (workers * 4).max(16)
}

mod async_channel {
    //! Thin bounded MPMC wrapper over `tokio::sync::mpsc` so an arbitrary
    //! number of worker tasks can share a single receiver, which
    //! `tokio::sync::mpsc::Receiver` alone does not support.
    use std::sync::Arc;
    use tokio::sync::Mutex;

    pub fn channel<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
        let (tx, rx) = tokio::sync::mpsc::channel(capacity);
        (Sender(tx), Receiver(Arc::new(Mutex::new(rx))))
    }

    pub struct Sender<T>(tokio::sync::mpsc::Sender<T>);

    impl<T> Sender<T> {
        pub async fn send(&self, value: T) -> Result<(), ()> {
            self.0.send(value).await.map_err(|_| ())
        }
    }

    impl<T> Clone for Sender<T> {
        fn clone(&self) -> Self {
            Sender(self.0.clone())
        }
    }

    pub struct Receiver<T>(Arc<Mutex<tokio::sync::mpsc::Receiver<T>>>);

    impl<T> Receiver<T> {
        pub async fn recv(&self) -> Result<T, ()> {
            self.0.lock().await.recv().await.ok_or(())
        }
    }

    impl<T> Clone for Receiver<T> {
        fn clone(&self) -> Self {
            Receiver(Arc::clone(&self.0))
        }
    }
}

use async_channel::channel as async_channel;
