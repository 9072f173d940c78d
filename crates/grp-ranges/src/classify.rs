//! CIDR membership test for caller addresses.

use grp_types::IpClass;
use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use std::net::IpAddr;

/// Parse a range entry: a CIDR prefix, or a bare address taken as a host prefix.
/// Prefixes with host bits set (`10.0.0.1/24`) are rejected rather than widened.
pub fn parse_network(range: &str) -> Option<IpNet> {
    if let Ok(net) = range.parse::<IpNet>() {
        return (net == net.trunc()).then_some(net);
    }
    match range.parse::<IpAddr>().ok()? {
        IpAddr::V4(a) => Ipv4Net::new(a, 32).ok().map(IpNet::V4),
        IpAddr::V6(a) => Ipv6Net::new(a, 128).ok().map(IpNet::V6),
    }
}

/// Classify `address` against `ranges`, first match wins.
///
/// An unparseable address is `InvalidAddress`. Malformed range entries are skipped so
/// one bad entry cannot hide the valid ones after it.
pub fn classify<S: AsRef<str>>(address: &str, ranges: &[S]) -> IpClass {
    let ip: IpAddr = match address.parse() {
        Ok(ip) => ip,
        Err(_) => {
            tracing::warn!(address, "invalid ip address format");
            return IpClass::InvalidAddress;
        }
    };
    for range in ranges {
        let range = range.as_ref();
        match parse_network(range) {
            Some(net) if net.contains(&ip) => {
                tracing::info!(address, range, "found okta ip in range");
                return IpClass::Trusted {
                    range: range.to_string(),
                };
            }
            Some(_) => {}
            None => tracing::warn!(range, "skipping malformed trusted range"),
        }
    }
    tracing::info!(address, "non-okta ip");
    IpClass::Untrusted
}

/// True only when `address` parses and lies inside one of `ranges`.
pub fn is_trusted<S: AsRef<str>>(address: &str, ranges: &[S]) -> bool {
    classify(address, ranges).is_trusted()
}
