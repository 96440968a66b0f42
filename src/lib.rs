pub mod ancestors;
pub mod cache;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod probe;
pub mod resolver;

pub use cache::ProbeCache;
pub use config::Config;
pub use domain::{DnsRecord, DomainRecords, RecordKind, RecordSet};
pub use engine::DecisionEngine;
pub use error::{AncestorError, DecisionError, ResolveError};
pub use resolver::{DnsResolver, UdpResolver};
