//! Decision engine: is a subdomain's answer explained by a wildcard
//! configured somewhere above it?

use std::net::IpAddr;

use tracing::debug;

use crate::ancestors::ancestors;
use crate::cache::ProbeCache;
use crate::domain::{DomainRecords, RecordSet};
use crate::error::DecisionError;
use crate::resolver::DnsResolver;

pub struct DecisionEngine<'a> {
    job_domain: &'a str,
    resolvers: &'a [IpAddr],
    resolver: &'a dyn DnsResolver,
    cache: &'a ProbeCache,
}

impl<'a> DecisionEngine<'a> {
    pub fn new(
        job_domain: &'a str,
        resolvers: &'a [IpAddr],
        resolver: &'a dyn DnsResolver,
        cache: &'a ProbeCache,
    ) -> Self {
        DecisionEngine { job_domain, resolvers, resolver, cache }
    }

    /// Is `subdomain`'s answer explained by a wildcard configured at any
    /// ancestor between the job domain and the subdomain's parent?
    ///
    /// `subdomain.records` must be non-empty: an NX leaf is the upstream
    /// parser's responsibility to drop before it ever reaches the engine,
    /// not a condition this function can recover from.
    pub async fn is_wildcard(&self, subdomain: &DomainRecords) -> Result<bool, DecisionError> {
        debug_assert!(!subdomain.records.is_empty(), "empty record set reached the decision engine");

        let chain = ancestors(&subdomain.domain_name, self.job_domain)?;

        for ancestor in chain {
            let (probe, _created) = self.cache.get_or_create(&ancestor);
            // Probe errors are intentionally ignored: a flaky probe must
            // not flip the verdict either way.
            let (samples, _err) = probe.get_results(self.resolver, self.resolvers).await;

            if wildcard_covers(&subdomain.records, &samples) {
                debug!(domain = %subdomain.domain_name, %ancestor, "wildcard match");
                return Ok(true);
            }
        }

        Ok(false)
    }
}

/// False if every sample is NX (a purely-NX ancestor is definitively not a
/// wildcard), otherwise true iff the subdomain's signature is a subset of
/// the union of the samples' signatures.
fn wildcard_covers(sub: &RecordSet, ancestor_samples: &[RecordSet]) -> bool {
    if ancestor_samples.iter().all(RecordSet::is_empty) {
        return false;
    }

    let sub_sig = sub.signature();
    let ancestor_sig: std::collections::HashSet<String> =
        ancestor_samples.iter().flat_map(RecordSet::signature).collect();

    sub_sig.is_subset(&ancestor_sig)
}
