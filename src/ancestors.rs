//! Ancestor enumeration: the chain of domains between a job's apex and a
//! subdomain's immediate parent.

use crate::domain::{label_count, normalize};
use crate::error::AncestorError;

/// Returns the chain of ancestors from the job domain (apex) down to the
/// immediate parent of `leaf`, both normalized first.
pub fn ancestors(leaf: &str, job_domain: &str) -> Result<Vec<String>, AncestorError> {
    let leaf = normalize(leaf);
    let job_domain = normalize(job_domain);

    let leaf_labels: Vec<&str> = leaf.trim_end_matches('.').split('.').collect();
    let l = label_count(&leaf);
    let j = label_count(&job_domain);

    if l < j {
        return Err(AncestorError::OutOfScope { leaf, job_domain });
    }
    if l == j {
        return Ok(vec![job_domain]);
    }

    // Suffixes of the leaf containing k labels, for k = j, j+1, ..., l-1,
    // i.e. from the apex down to the leaf's immediate parent.
    let mut result = Vec::with_capacity(l - j);
    for k in j..l {
        let suffix = leaf_labels[l - k..].join(".");
        result.push(format!("{suffix}."));
    }
    Ok(result)
}
