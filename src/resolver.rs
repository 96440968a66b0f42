//! DNS resolution: one-shot A-query racing a set of resolvers.
//!
//! Queries every resolver in parallel and takes the first success; a
//! losing future is simply dropped rather than explicitly cancelled, since
//! a dropped future is fully cancelled in Rust.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::select_ok;
use hickory_proto::op::{Message, Query, ResponseCode};
use hickory_proto::rr::{Name, RData, RecordType};
use hickory_proto::serialize::binary::BinDecodable;
use tokio::net::UdpSocket;
use tracing::{debug, instrument};

use crate::domain::{normalize, DnsRecord, RecordKind, RecordSet};
use crate::error::ResolveError;

/// Max size for the UDP receive buffer, per RFC6891 §6.2.5.
const MAX_RECEIVE_BUFFER_SIZE: usize = 4096;
const DEFAULT_TARGET_PORT: u16 = 53;
const RACE_TIMEOUT: Duration = Duration::from_secs(5);

/// One-shot A-query resolution against a fixed set of recursive resolvers.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    async fn resolve(&self, resolvers: &[IpAddr], name: &str) -> Result<RecordSet, ResolveError>;
}

/// Production resolver: races a UDP A-query against every resolver in
/// parallel and returns the first successful answer.
#[derive(Debug, Default)]
pub struct UdpResolver {
    target_port: u16,
}

impl UdpResolver {
    pub fn new() -> Self {
        UdpResolver { target_port: DEFAULT_TARGET_PORT }
    }
}

#[async_trait]
impl DnsResolver for UdpResolver {
    #[instrument(skip(self, resolvers), fields(%name))]
    async fn resolve(&self, resolvers: &[IpAddr], name: &str) -> Result<RecordSet, ResolveError> {
        let query_name = normalize(name);

        let queries = resolvers
            .iter()
            .map(|&resolver| Box::pin(query_one(resolver, self.target_port, query_name.clone())))
            .collect::<Vec<_>>();

        let race = select_ok(queries);
        let message = match tokio::time::timeout(RACE_TIMEOUT, race).await {
            Ok(Ok((message, _remaining))) => message,
            Ok(Err(_)) | Err(_) => return Err(ResolveError::AllResolversFailed(query_name)),
        };

        if message.response_code() == ResponseCode::NXDomain {
            return Ok(RecordSet::empty());
        }
        message_to_record_set(&message, &query_name)
    }
}

async fn query_one(target: IpAddr, port: u16, name: String) -> Result<Message, ResolveError> {
    let socket = connect(target, port).await?;
    let request = make_query(&name)?;
    socket.send(request.to_vec()?.as_slice()).await?;

    let mut buf = vec![0u8; MAX_RECEIVE_BUFFER_SIZE];
    let read_count = socket.recv(&mut buf).await?;
    debug!(%target, "received answer");
    Ok(Message::from_bytes(&buf[..read_count])?)
}

async fn connect(target: IpAddr, port: u16) -> Result<UdpSocket, ResolveError> {
    let local = SocketAddr::new(
        match target {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        },
        0,
    );
    let socket = UdpSocket::bind(local).await?;
    socket.connect(SocketAddr::new(target, port)).await?;
    Ok(socket)
}

fn make_query(name: &str) -> Result<Message, ResolveError> {
    let parsed: Name = Name::parse(name, None)?;
    let mut query = Query::new();
    query.set_name(parsed).set_query_type(RecordType::A);
    let mut message = Message::new();
    message.add_query(query);
    message.set_recursion_desired(true);
    message.set_id(rand::random());
    Ok(message)
}

/// Builds the final `RecordSet` from a resolver's Answer section,
/// normalizing owner/target names and rejecting record types outside
/// `{A, CNAME, NS}`.
fn message_to_record_set(message: &Message, queried: &str) -> Result<RecordSet, ResolveError> {
    let mut records = Vec::with_capacity(message.answer_count() as usize);
    for answer in message.answers() {
        let owner = normalize(&answer.name().to_string());
        let (kind, value) = match answer.data() {
            Some(RData::A(addr)) => (RecordKind::A, addr.0.to_string()),
            Some(RData::CNAME(target)) => (RecordKind::Cname, normalize(&target.0.to_string())),
            Some(RData::NS(ns)) => (RecordKind::Ns, ns.0.to_string()),
            _ => return Err(ResolveError::UnknownRecordType(queried.to_string())),
        };
        records.push(DnsRecord::new(owner, kind, value));
    }
    Ok(RecordSet::from(records))
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// A scripted resolver keyed by name, with one recorded answer per
    /// name — enough to drive the decision-engine test scenarios.
    #[derive(Default)]
    pub struct FakeResolver {
        answers: Mutex<HashMap<String, RecordSet>>,
        pub(crate) calls: Mutex<Vec<String>>,
    }

    impl FakeResolver {
        pub fn new() -> Self {
            FakeResolver::default()
        }

        pub fn set(&self, name: &str, records: RecordSet) {
            self.answers.lock().unwrap().insert(normalize(name), records);
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl DnsResolver for FakeResolver {
        async fn resolve(&self, _resolvers: &[IpAddr], name: &str) -> Result<RecordSet, ResolveError> {
            let normalized = normalize(name);
            self.calls.lock().unwrap().push(normalized.clone());
            Ok(self.answers.lock().unwrap().get(&normalized).cloned().unwrap_or_else(RecordSet::empty))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::rr::rdata;
    use std::net::Ipv4Addr as V4;
    use std::str::FromStr;
    use tokio::task::JoinHandle;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    #[ctor::ctor]
    fn init() {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("could not set global default tracing subscriber");
    }

    fn a_answer(name: &str, ip: &str) -> Message {
        let mut message = Message::new();
        message.set_response_code(ResponseCode::NoError);
        message.add_answer(hickory_proto::rr::Record::from_rdata(
            Name::from_str(name).unwrap(),
            60,
            RData::A(rdata::A(V4::from_str(ip).unwrap())),
        ));
        message
    }

    async fn spawn_fake_server(response: Message) -> (u16, JoinHandle<()>) {
        let socket = UdpSocket::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)).await.unwrap();
        let port = socket.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let mut buf = vec![0u8; MAX_RECEIVE_BUFFER_SIZE];
            let (n, peer) = socket.recv_from(&mut buf).await.unwrap();
            let req = Message::from_bytes(&buf[..n]).unwrap();
            let mut resp = response.clone();
            resp.set_id(req.id());
            resp.add_query(req.query().unwrap().clone());
            socket.send_to(resp.to_vec().unwrap().as_slice(), peer).await.unwrap();
        });
        (port, handle)
    }

    #[tokio::test]
    async fn test_resolve_picks_first_success() {
        let (port, handle) = spawn_fake_server(a_answer("a.example.", "10.0.0.1")).await;
        let resolver = UdpResolver { target_port: port };
        let result = resolver.resolve(&[IpAddr::V4(V4::LOCALHOST)], "a.example.").await.unwrap();
        assert_eq!(result.0.len(), 1);
        assert_eq!(result.0[0].value, "10.0.0.1");
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_resolve_nxdomain_is_empty_not_error() {
        let mut nx = Message::new();
        nx.set_response_code(ResponseCode::NXDomain);
        let (port, handle) = spawn_fake_server(nx).await;
        let resolver = UdpResolver { target_port: port };
        let result = resolver.resolve(&[IpAddr::V4(V4::LOCALHOST)], "missing.example.").await.unwrap();
        assert!(result.is_empty());
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_resolve_all_resolvers_down() {
        // Nothing listens on this port, so every racer's recv() stalls; the
        // race-level timeout must still return rather than hang the caller.
        let resolver = UdpResolver { target_port: 1 };
        let result = tokio::time::timeout(
            Duration::from_millis(200),
            resolver.resolve(&[IpAddr::V4(V4::LOCALHOST)], "a.example."),
        )
        .await;
        assert!(result.is_err() || result.unwrap().is_err());
    }
}
