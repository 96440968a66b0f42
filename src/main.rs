use std::net::IpAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use wildcard_sieve::domain::DomainRecords;
use wildcard_sieve::{Config, DnsRecord, ProbeCache, RecordKind, RecordSet, UdpResolver};

mod pipeline_runner {
    pub use wildcard_sieve::pipeline::run;
}

/// Reads newline-delimited `name,type,value[;type,value...]` rows from
/// stdin, filters out subdomains whose answer is explained by a wildcard
/// configured higher up the tree, and writes survivors to stdout.
#[derive(Parser, Debug)]
struct Cli {
    /// Apex domain this run is scoped to; ancestors are never walked past it.
    #[arg(long)]
    job_domain: String,

    /// Recursive resolvers to query, e.g. `--resolver 1.1.1.1 --resolver 8.8.8.8`.
    #[arg(long = "resolver", required = true)]
    resolvers: Vec<IpAddr>,

    #[arg(long, default_value_t = 6)]
    workers: usize,

    #[arg(long, default_value_t = 10)]
    probes_per_ancestor: usize,

    #[arg(long, default_value_t = 2)]
    probe_retry_multiplier: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing()?;
    let args = Cli::parse();

    let config = Arc::new(
        Config::new(args.job_domain, args.resolvers)
            .with_workers(args.workers)
            .with_probes_per_ancestor(args.probes_per_ancestor)
            .with_probe_retry_multiplier(args.probe_retry_multiplier),
    );
    let resolver = Arc::new(UdpResolver::new());
    let cache = Arc::new(ProbeCache::new(config.probes_per_ancestor, config.probe_retry_multiplier));

    let (input_tx, input_rx) = mpsc::channel(256);
    let (output_tx, mut output_rx) = mpsc::channel(256);

    let pipeline = tokio::spawn(pipeline_runner::run(Arc::clone(&config), resolver, cache, input_rx, output_tx));

    let reader_config = Arc::clone(&config);
    let reader = tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        let mut submitted = 0usize;
        while let Some(line) = lines.next_line().await.transpose() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    info!(%err, "skipping unreadable line");
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(&line) {
                Ok(domain) => {
                    if input_tx.send(domain).await.is_err() {
                        break;
                    }
                    submitted += 1;
                }
                Err(err) => info!(%err, %line, "skipping unparseable line"),
            }
        }
        let _ = reader_config;
        submitted
    });

    let mut printed = 0usize;
    while let Some(domain) = output_rx.recv().await {
        println!("{}", domain.domain_name);
        printed += 1;
    }

    let submitted = reader.await.context("reader task panicked")?;
    pipeline.await.context("pipeline task panicked")?;
    info!(submitted, printed, "run complete");

    Ok(())
}

/// Parses one input row: `name,kind,value[;kind,value...]`, e.g.
/// `x.example.com.,A,1.2.3.4;A,1.2.3.5`.
fn parse_line(line: &str) -> Result<DomainRecords> {
    let mut fields = line.splitn(2, ',');
    let name = fields.next().context("missing domain name")?;
    let rest = fields.next().context("missing record list")?;

    let mut records = Vec::new();
    for record in rest.split(';') {
        let mut parts = record.splitn(2, ',');
        let kind = parts.next().context("missing record type")?;
        let value = parts.next().context("missing record value")?;
        let kind = match kind {
            "A" => RecordKind::A,
            "CNAME" => RecordKind::Cname,
            "NS" => RecordKind::Ns,
            other => anyhow::bail!("unsupported record type {other}"),
        };
        records.push(DnsRecord::new(name, kind, value));
    }

    Ok(DomainRecords::new(name, RecordSet::from(records)))
}

fn setup_tracing() -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
