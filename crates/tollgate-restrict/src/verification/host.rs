//! Remote host restrictions.
//!
//! A restriction is a list of IPv4/IPv6 addresses or CIDR subnets separated
//! by `;` or `,`. Host names are not resolved; such entries are skipped.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use tracing::warn;

use crate::error::ParseError;

/// A single address or subnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRestriction {
    Address(IpAddr),
    /// Network address (host bits cleared) and prefix length.
    Subnet { network: IpAddr, prefix: u8 },
}

impl HostRestriction {
    /// Returns whether the given address is covered by this restriction.
    ///
    /// IPv4-mapped IPv6 addresses are compared as IPv4.
    pub fn matches(&self, address: IpAddr) -> bool {
        let address = address.to_canonical();
        match *self {
            HostRestriction::Address(expected) => expected.to_canonical() == address,
            HostRestriction::Subnet { network, prefix } => match (network, address) {
                (IpAddr::V4(network), IpAddr::V4(address)) => {
                    mask_v4(u32::from(address), prefix) == u32::from(network)
                }
                (IpAddr::V6(network), IpAddr::V6(address)) => {
                    mask_v6(u128::from(address), prefix) == u128::from(network)
                }
                _ => false,
            },
        }
    }
}

// Prefixes longer than the address width are treated as a full-width mask.
fn mask_v4(bits: u32, prefix: u8) -> u32 {
    let host_bits = 32 - u32::from(prefix).min(32);
    bits & u32::MAX.checked_shl(host_bits).unwrap_or(0)
}

fn mask_v6(bits: u128, prefix: u8) -> u128 {
    let host_bits = 128 - u32::from(prefix).min(128);
    bits & u128::MAX.checked_shl(host_bits).unwrap_or(0)
}

impl FromStr for HostRestriction {
    type Err = ParseError;

    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        let entry = entry.trim();
        let invalid = || ParseError::HostEntry(entry.to_string());

        let Some((address, prefix)) = entry.split_once('/') else {
            return match parse_address(entry) {
                Some(address) => Ok(HostRestriction::Address(address)),
                None if looks_like_hostname(entry) => Err(ParseError::HostName(entry.to_string())),
                None => Err(invalid()),
            };
        };

        let address = parse_address(address.trim()).ok_or_else(invalid)?;
        let prefix: u8 = prefix.trim().parse().map_err(|_| invalid())?;

        // `::ffff:a.b.c.d/n` covers the same addresses as `a.b.c.d/(n - 96)`.
        let (address, prefix) = match address {
            IpAddr::V6(v6) if (96..=128).contains(&prefix) => match v6.to_ipv4_mapped() {
                Some(v4) => (IpAddr::V4(v4), prefix - 96),
                None => (address, prefix),
            },
            _ => (address, prefix),
        };

        let network = match address {
            IpAddr::V4(v4) if prefix <= 32 => {
                IpAddr::V4(Ipv4Addr::from(mask_v4(u32::from(v4), prefix)))
            }
            IpAddr::V6(v6) if prefix <= 128 => {
                IpAddr::V6(Ipv6Addr::from(mask_v6(u128::from(v6), prefix)))
            }
            _ => return Err(invalid()),
        };

        Ok(HostRestriction::Subnet { network, prefix })
    }
}

impl fmt::Display for HostRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostRestriction::Address(address) => write!(f, "{address}"),
            HostRestriction::Subnet { network, prefix } => write!(f, "{network}/{prefix}"),
        }
    }
}

/// Parses an address, accepting the bracketed IPv6 form `[::1]`.
pub fn parse_address(text: &str) -> Option<IpAddr> {
    let text = text.trim();
    let text = text
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(text);
    text.parse().ok()
}

fn looks_like_hostname(entry: &str) -> bool {
    !entry.is_empty()
        && entry.chars().any(|c| c.is_ascii_alphabetic())
        && entry
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}

/// Parses a restriction list, skipping (and logging) entries that cannot be used.
pub fn parse_host_restrictions(text: &str) -> Vec<HostRestriction> {
    text.split([';', ','])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse() {
            Ok(restriction) => Some(restriction),
            Err(err) => {
                warn!(error = %err, "Ignoring unusable host restriction");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn ip(text: &str) -> IpAddr {
        text.parse().unwrap()
    }

    #[test_case("10.0.0.0/8", "10.200.3.4", true; "inside v4 subnet")]
    #[test_case("10.0.0.0/8", "11.0.0.1", false; "outside v4 subnet")]
    #[test_case("192.168.1.77/24", "192.168.1.3", true; "host bits ignored")]
    #[test_case("0.0.0.0/0", "203.0.113.9", true; "v4 default route")]
    #[test_case("2001:db8::/32", "2001:db8:ffff::1", true; "inside v6 subnet")]
    #[test_case("2001:db8::/32", "2001:db9::1", false; "outside v6 subnet")]
    #[test_case("10.0.0.0/8", "::ffff:10.1.2.3", true; "v4 mapped v6")]
    #[test_case("10.0.0.0/8", "2001:db8::1", false; "family mismatch")]
    #[test_case("192.0.2.10", "192.0.2.10", true; "exact address")]
    #[test_case("192.0.2.10", "192.0.2.11", false; "different address")]
    #[test_case("[::1]", "::1", true; "bracketed v6")]
    #[test_case("::ffff:10.0.0.0/104", "10.9.9.9", true; "mapped subnet matches v4")]
    #[test_case("::ffff:10.0.0.0/104", "::ffff:10.9.9.9", true; "mapped subnet matches mapped")]
    #[test_case("::ffff:10.0.0.0/104", "11.0.0.1", false; "mapped subnet excludes other v4")]
    fn restriction_matching(restriction: &str, address: &str, expected: bool) {
        let restriction: HostRestriction = restriction.parse().unwrap();
        assert_eq!(restriction.matches(ip(address)), expected);
    }

    #[test_case("10.0.0.0/33"; "v4 prefix too long")]
    #[test_case("2001:db8::/129"; "v6 prefix too long")]
    #[test_case("10.0.0.0/x"; "non numeric prefix")]
    #[test_case("300.1.1.1"; "octet out of range")]
    #[test_case("10.0.0.1/"; "empty prefix")]
    fn rejects_invalid_entries(entry: &str) {
        assert_eq!(
            entry.parse::<HostRestriction>(),
            Err(ParseError::HostEntry(entry.to_string()))
        );
    }

    #[test]
    fn mapped_subnets_are_stored_as_v4() {
        let restriction: HostRestriction = "::ffff:192.168.0.0/112".parse().unwrap();
        assert_eq!(restriction.to_string(), "192.168.0.0/16");
    }

    #[test_case(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 0)), 40, "10.0.0.0", true; "oversized v4 prefix")]
    #[test_case(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 0)), 40, "10.0.0.1", false; "oversized v4 prefix is exact")]
    #[test_case(IpAddr::V6(Ipv6Addr::LOCALHOST), 200, "::1", true; "oversized v6 prefix")]
    #[test_case(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0, "198.51.100.7", true; "zero prefix")]
    fn hand_built_subnets_never_panic(network: IpAddr, prefix: u8, address: &str, expected: bool) {
        let restriction = HostRestriction::Subnet { network, prefix };
        assert_eq!(restriction.matches(ip(address)), expected);
    }

    #[test]
    fn rejects_host_names() {
        assert_eq!(
            "gateway.example.com".parse::<HostRestriction>(),
            Err(ParseError::HostName("gateway.example.com".to_string()))
        );
    }

    #[test]
    fn subnet_display_uses_network_address() {
        let restriction: HostRestriction = "172.16.5.4/12".parse().unwrap();
        assert_eq!(restriction.to_string(), "172.16.0.0/12");
    }

    #[test]
    fn list_parsing_accepts_both_separators() {
        let parsed = parse_host_restrictions("10.0.0.0/8; 192.0.2.1,host.example ,, ::1");
        assert_eq!(parsed.len(), 3);
        assert!(parsed.iter().any(|r| r.matches(ip("::1"))));
    }
}
