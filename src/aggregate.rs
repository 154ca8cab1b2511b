//! Attached-network aggregation.
//!
//! This module reduces the set of subnets attached to a router's interfaces
//! to the minimal set of `network` statements for its routing-protocol
//! stanzas. The same aggregation function is shared by the BGP, OSPF and RIP
//! renderers so all three advertise an identical view of the router's
//! connected networks.

use ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use log::debug;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Parse interface CIDRs into normalized networks, dropping host bits.
///
/// Unparsable entries are skipped rather than failing the call: partial
/// aggregation is preferred over blocking the whole router.
fn parse_networks(cidrs: &[String]) -> (Vec<Ipv4Network>, Vec<Ipv6Network>) {
    let mut v4 = Vec::new();
    let mut v6 = Vec::new();
    for entry in cidrs {
        match IpNetwork::from_str(entry.trim()) {
            Ok(IpNetwork::V4(net)) => {
                if let Ok(normalized) = Ipv4Network::new(net.network(), net.prefix()) {
                    v4.push(normalized);
                }
            }
            Ok(IpNetwork::V6(net)) => {
                if let Ok(normalized) = Ipv6Network::new(net.network(), net.prefix()) {
                    v6.push(normalized);
                }
            }
            Err(_) => {
                debug!("Skipping unparsable network entry '{}'", entry);
            }
        }
    }
    (v4, v6)
}

/// Merge sorted address ranges that overlap or are directly adjacent.
fn merge_ranges_v4(mut ranges: Vec<(u32, u32)>) -> Vec<(u32, u32)> {
    ranges.sort_unstable();
    let mut merged: Vec<(u32, u32)> = Vec::new();
    for (start, end) in ranges {
        match merged.last_mut() {
            Some((_, last_end)) if start <= *last_end || (*last_end < u32::MAX && start == *last_end + 1) => {
                *last_end = (*last_end).max(end);
            }
            _ => merged.push((start, end)),
        }
    }
    merged
}

fn merge_ranges_v6(mut ranges: Vec<(u128, u128)>) -> Vec<(u128, u128)> {
    ranges.sort_unstable();
    let mut merged: Vec<(u128, u128)> = Vec::new();
    for (start, end) in ranges {
        match merged.last_mut() {
            Some((_, last_end)) if start <= *last_end || (*last_end < u128::MAX && start == *last_end + 1) => {
                *last_end = (*last_end).max(end);
            }
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Decompose a contiguous address range into the minimal list of CIDR blocks.
fn range_to_cidrs_v4(mut start: u32, end: u32) -> Vec<Ipv4Network> {
    let mut blocks = Vec::new();
    loop {
        let span = (end - start) as u64 + 1;
        // largest block allowed by the alignment of `start` and by the span
        let align_bits = start.trailing_zeros();
        let span_bits = 63 - span.leading_zeros();
        let bits = align_bits.min(span_bits).min(32);
        if let Ok(net) = Ipv4Network::new(Ipv4Addr::from(start), (32 - bits) as u8) {
            blocks.push(net);
        }
        let next = start as u64 + (1u64 << bits);
        if next > end as u64 {
            break;
        }
        start = next as u32;
    }
    blocks
}

fn range_to_cidrs_v6(mut start: u128, end: u128) -> Vec<Ipv6Network> {
    let mut blocks = Vec::new();
    loop {
        let remaining = end - start;
        let align_bits = start.trailing_zeros();
        let span_bits = if remaining == u128::MAX {
            128
        } else {
            127 - (remaining + 1).leading_zeros()
        };
        let bits = align_bits.min(span_bits).min(128);
        if let Ok(net) = Ipv6Network::new(Ipv6Addr::from(start), (128 - bits) as u8) {
            blocks.push(net);
        }
        if bits == 128 {
            break;
        }
        match start.checked_add(1u128 << bits) {
            Some(next) if next <= end => start = next,
            _ => break,
        }
    }
    blocks
}

fn collapse_v4(nets: &[Ipv4Network]) -> Vec<Ipv4Network> {
    let ranges = nets
        .iter()
        .map(|n| (u32::from(n.network()), u32::from(n.broadcast())))
        .collect();
    merge_ranges_v4(ranges)
        .into_iter()
        .flat_map(|(start, end)| range_to_cidrs_v4(start, end))
        .collect()
}

fn collapse_v6(nets: &[Ipv6Network]) -> Vec<Ipv6Network> {
    let ranges = nets
        .iter()
        .map(|n| {
            let base = u128::from(n.network());
            let host_bits = 128 - n.prefix() as u32;
            let end = if host_bits == 128 {
                u128::MAX
            } else {
                base | ((1u128 << host_bits) - 1)
            };
            (base, end)
        })
        .collect();
    merge_ranges_v6(ranges)
        .into_iter()
        .flat_map(|(start, end)| range_to_cidrs_v6(start, end))
        .collect()
}

/// Collapse interface networks into their minimal disjoint cover.
///
/// Adjacent and overlapping networks are merged; the union of the result is
/// exactly the union of the parsable inputs. No supernetting beyond the
/// natural merge is performed here.
pub fn collapse_networks(cidrs: &[String]) -> Vec<String> {
    let (v4, v6) = parse_networks(cidrs);
    let mut result: Vec<String> = collapse_v4(&v4).iter().map(ToString::to_string).collect();
    result.extend(collapse_v6(&v6).iter().map(ToString::to_string));
    result
}

/// Summarize a router's IPv4 networks using the two-tier supernetting policy.
///
/// Tier one looks for a byte-aligned supernet (/24, /16, /8, most specific
/// first) covering the full address range of the original networks. Tier two
/// falls back to the exact-cover prefix for that range. Either tier is used
/// only when it is strictly wider than the narrowest original prefix and no
/// wider than /8; otherwise the collapsed list is returned as-is.
fn summarize_v4(nets: &[Ipv4Network]) -> Vec<Ipv4Network> {
    let mut unique = nets.to_vec();
    unique.sort_unstable_by_key(|n| (u32::from(n.network()), n.prefix()));
    unique.dedup();
    if unique.len() == 1 {
        // A single attached network is advertised unchanged, whatever its
        // prefix length.
        return unique;
    }

    let collapsed = collapse_v4(&unique);
    // Range over the original networks, not the collapsed result, so two
    // adjacent /24s can still pick a wider aligned supernet.
    let min = unique.iter().map(|n| u32::from(n.network())).min().unwrap_or(0);
    let max = unique.iter().map(|n| u32::from(n.broadcast())).max().unwrap_or(0);
    let narrowest = unique.iter().map(|n| n.prefix()).min().unwrap_or(32);

    let mut aligned_candidate = None;
    for prefix in [24u8, 16, 8] {
        let mask = u32::MAX << (32 - prefix as u32);
        if let Ok(candidate) = Ipv4Network::new(Ipv4Addr::from(min & mask), prefix) {
            if u32::from(candidate.broadcast()) >= max {
                aligned_candidate = Some(candidate);
                break;
            }
        }
    }
    if let Some(candidate) = aligned_candidate {
        if candidate.prefix() < narrowest && candidate.prefix() >= 8 {
            return vec![candidate];
        }
    }

    // Exact-cover prefix for [min, max]. With distinct networks min != max,
    // but mirror the single-network convention anyway.
    let exact_prefix = if min == max {
        narrowest
    } else {
        (min ^ max).leading_zeros() as u8
    };
    if exact_prefix < narrowest && exact_prefix >= 8 {
        let mask = u32::MAX << (32 - exact_prefix as u32);
        if let Ok(supernet) = Ipv4Network::new(Ipv4Addr::from(min & mask), exact_prefix) {
            return vec![supernet];
        }
    }

    collapsed
}

/// Aggregate a router's attached networks into protocol `network` statements.
///
/// IPv4 networks go through the two-tier summarization policy; IPv6 networks
/// are only collapsed, never supernetted past their natural prefixes. Empty
/// input yields an empty result.
pub fn aggregate_networks(cidrs: &[String]) -> Vec<String> {
    let (v4, v6) = parse_networks(cidrs);
    let mut result = Vec::new();
    if !v4.is_empty() {
        result.extend(summarize_v4(&v4).iter().map(ToString::to_string));
    }
    result.extend(collapse_v6(&v6).iter().map(ToString::to_string));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_networks(&[]).is_empty());
        assert!(collapse_networks(&[]).is_empty());
    }

    #[test]
    fn test_unparsable_entries_skipped() {
        let input = strings(&["bogus", "10.0.1.1/24", "300.1.1.1/24"]);
        assert_eq!(aggregate_networks(&input), vec!["10.0.1.0/24"]);
    }

    #[test]
    fn test_single_network_identity() {
        // Identity holds regardless of prefix length, including prefixes
        // narrower than any byte-aligned candidate.
        assert_eq!(aggregate_networks(&strings(&["10.0.1.1/24"])), vec!["10.0.1.0/24"]);
        assert_eq!(aggregate_networks(&strings(&["10.0.1.5/30"])), vec!["10.0.1.4/30"]);
        assert_eq!(aggregate_networks(&strings(&["172.16.0.1/12"])), vec!["172.16.0.0/12"]);
    }

    #[test]
    fn test_duplicate_addresses_collapse_once() {
        let input = strings(&["10.0.1.1/24", "10.0.1.2/24", "10.0.1.254/24"]);
        assert_eq!(aggregate_networks(&input), vec!["10.0.1.0/24"]);
    }

    #[test]
    fn test_disjoint_pair_stays_unsummarized_under_collapse() {
        // 1.2.0.0/24 and 1.3.0.0/24 are not mergeable, so the minimal
        // disjoint cover is the pair itself, not a wider supernet.
        let input = strings(&["1.2.0.0/24", "1.3.0.0/24"]);
        assert_eq!(collapse_networks(&input), vec!["1.2.0.0/24", "1.3.0.0/24"]);
    }

    #[test]
    fn test_adjacent_pair_collapses_naturally() {
        let input = strings(&["10.0.2.1/24", "10.0.3.1/24"]);
        assert_eq!(collapse_networks(&input), vec!["10.0.2.0/23"]);
    }

    #[test]
    fn test_three_subnets_pick_byte_aligned_supernet() {
        // /24 does not cover the range, /16 does and is narrower than /8,
        // so the byte-aligned tier wins with exactly 10.0.0.0/16.
        let input = strings(&["10.0.1.1/24", "10.0.2.1/24", "10.0.3.1/24"]);
        assert_eq!(aggregate_networks(&input), vec!["10.0.0.0/16"]);
    }

    #[test]
    fn test_never_summarize_wider_than_slash_8() {
        // The range spans two /8s: no byte-aligned candidate covers it and
        // the exact cover would be wider than /8, so the collapsed list is
        // returned instead.
        let input = strings(&["9.0.0.1/24", "10.0.0.1/24"]);
        assert_eq!(aggregate_networks(&input), vec!["9.0.0.0/24", "10.0.0.0/24"]);
    }

    #[test]
    fn test_collapse_preserves_exact_union() {
        let input = strings(&[
            "192.168.0.1/24",
            "192.168.1.1/24",
            "192.168.2.1/25",
            "192.168.0.77/26",
        ]);
        let collapsed = collapse_networks(&input);

        let to_range = |cidr: &str| {
            let net: Ipv4Network = cidr.parse().unwrap();
            (u32::from(net.network()), u32::from(net.broadcast()))
        };
        let mut input_ranges: Vec<(u32, u32)> =
            input.iter().map(|c| to_range(c)).collect();
        let output_ranges: Vec<(u32, u32)> =
            collapsed.iter().map(|c| to_range(c)).collect();

        // Outputs are pairwise disjoint and sorted.
        for pair in output_ranges.windows(2) {
            assert!(pair[0].1 < pair[1].0, "overlapping outputs: {:?}", pair);
        }

        // The merged input union equals the merged output union.
        input_ranges.sort_unstable();
        assert_eq!(merge_ranges_v4(input_ranges), merge_ranges_v4(output_ranges.clone()));
    }

    #[test]
    fn test_ipv6_collapsed_but_not_summarized() {
        // Adjacent /64s merge into their natural /63.
        let adjacent = strings(&["2001:db8::/64", "2001:db8:0:1::/64"]);
        assert_eq!(aggregate_networks(&adjacent), vec!["2001:db8::/63"]);

        // Disjoint /64s are left alone even though a wider prefix exists.
        let disjoint = strings(&["2001:db8::/64", "2001:db8:0:5::/64"]);
        assert_eq!(
            aggregate_networks(&disjoint),
            vec!["2001:db8::/64", "2001:db8:0:5::/64"]
        );
    }

    #[test]
    fn test_mixed_families_keep_ipv4_first() {
        let input = strings(&["2001:db8::1/64", "10.0.1.1/24"]);
        assert_eq!(
            aggregate_networks(&input),
            vec!["10.0.1.0/24", "2001:db8::/64"]
        );
    }

    #[test]
    fn test_byte_aligned_tier_consulted_before_exact_cover() {
        // 10.0.0.0/10 and 10.64.0.0/10 have exact cover 10.0.0.0/9, but the
        // byte-aligned tier is consulted first and /8 covers the range while
        // being strictly wider than the narrowest original /10.
        let input = strings(&["10.0.0.1/10", "10.64.0.1/10"]);
        assert_eq!(aggregate_networks(&input), vec!["10.0.0.0/8"]);
    }
}
