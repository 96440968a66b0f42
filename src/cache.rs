//! Process-wide map from ancestor name to its `Probe`. Entries never
//! evict: once an ancestor has been sampled, it stays sampled for the
//! life of the process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::domain::normalize;
use crate::probe::Probe;

/// Process-wide, monotonically-growing map from normalized ancestor name
/// to its (possibly still-unprobed) `Probe`.
pub struct ProbeCache {
    probes: Mutex<HashMap<String, Arc<Probe>>>,
    probes_per_ancestor: usize,
    probe_retry_multiplier: usize,
}

impl ProbeCache {
    pub fn new(probes_per_ancestor: usize, probe_retry_multiplier: usize) -> Self {
        ProbeCache { probes: Mutex::new(HashMap::new()), probes_per_ancestor, probe_retry_multiplier }
    }

    /// Atomic lookup-or-insert. The mutex only ever covers the map
    /// mutation, never the (much longer) probing itself, which lives
    /// behind the `Probe`'s own lock.
    pub fn get_or_create(&self, ancestor: &str) -> (Arc<Probe>, bool) {
        let name = normalize(ancestor);
        let mut probes = self.probes.lock().unwrap();
        if let Some(existing) = probes.get(&name) {
            return (Arc::clone(existing), false);
        }
        debug!(ancestor = %name, "creating new probe");
        let probe = Arc::new(Probe::new(name.clone(), self.probes_per_ancestor, self.probe_retry_multiplier));
        probes.insert(name, Arc::clone(&probe));
        (probe, true)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.probes.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_is_monotone() {
        let cache = ProbeCache::new(10, 2);
        let (first, created_first) = cache.get_or_create("example.com.");
        assert!(created_first);
        let (second, created_second) = cache.get_or_create("Example.COM");
        assert!(!created_second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_ancestors_get_distinct_probes() {
        let cache = ProbeCache::new(10, 2);
        let (a, _) = cache.get_or_create("a.example.");
        let (b, _) = cache.get_or_create("b.example.");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }
}
