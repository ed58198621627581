//! Peer identity extraction.
//!
//! A peer is its source IP address. The client port is discarded, and
//! IPv4-mapped IPv6 addresses are reduced to plain IPv4 so a dual-stack
//! socket reports the same peer as an IPv4 one.

use axum::extract::ConnectInfo;
use axum::http::Request;
use std::net::{IpAddr, SocketAddr};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeerError {
    #[error("peer address unavailable on request")]
    MissingAddress,
}

/// Peer identity for a connected socket address.
pub fn peer_ip(addr: SocketAddr) -> IpAddr {
    addr.ip().to_canonical()
}

/// Peer identity for a request served with connect info.
pub fn peer_from_request<B>(request: &Request<B>) -> Result<IpAddr, PeerError> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| peer_ip(*addr))
        .ok_or(PeerError::MissingAddress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_port_is_stripped() {
        let a: SocketAddr = "10.0.0.5:51000".parse().unwrap();
        let b: SocketAddr = "10.0.0.5:51001".parse().unwrap();
        assert_eq!(peer_ip(a), peer_ip(b));
    }

    #[test]
    fn test_mapped_ipv6_is_canonical() {
        let mapped = SocketAddr::new(IpAddr::V6(Ipv4Addr::new(10, 0, 0, 5).to_ipv6_mapped()), 1);
        assert_eq!(peer_ip(mapped), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)));

        let v6 = SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 1);
        assert_eq!(peer_ip(v6), IpAddr::V6(Ipv6Addr::LOCALHOST));
    }

    #[test]
    fn test_request_without_connect_info() {
        let request = Request::new(());
        assert_eq!(peer_from_request(&request), Err(PeerError::MissingAddress));

        let mut request = Request::new(());
        let addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(
            peer_from_request(&request),
            Ok(IpAddr::V4(Ipv4Addr::LOCALHOST))
        );
    }
}
