use thiserror::Error;

/// Errors from a single resolver race.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("all resolvers failed for {0}")]
    AllResolversFailed(String),
    #[error("unknown record type in answer for {0}")]
    UnknownRecordType(String),
    #[error("io error talking to resolver")]
    Io(#[from] std::io::Error),
    #[error("protocol error decoding DNS message")]
    Protocol(#[from] hickory_proto::error::ProtoError),
}

/// Ancestor enumeration failure: the leaf has fewer labels than the job
/// domain it's supposedly under.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AncestorError {
    #[error("{leaf} has fewer labels than job domain {job_domain}: out of scope")]
    OutOfScope { leaf: String, job_domain: String },
}

/// Errors surfaced by the decision engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecisionError {
    #[error(transparent)]
    OutOfScope(#[from] AncestorError),
}
