//! BGP neighbor reconciliation.
//!
//! Adjacency is derived from shared LAN membership, not from manually
//! declared links: every pair of BGP routers with interfaces on the same LAN
//! label becomes a neighbor pair, inserted on both sides, yielding a full
//! mesh per LAN. Insertions go through the stanza editor after a
//! (neighbor IP, remote-as) dedup check, so re-running reconciliation is
//! idempotent per pair. The model itself is never mutated; only the on-disk
//! artifacts are.

use crate::model::{Protocol, TopologyModel};
use crate::stanza;
use crate::store::{ArtifactStore, StoreError};
use crate::synth::frr_conf_path;
use clap::ValueEnum;
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Relation kinds for the manual single-relation path
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RelationKind {
    Peer,
    Provider,
    Customer,
}

impl RelationKind {
    /// Fixed local-preference applied by the relation's route-map
    pub fn local_preference(self) -> u32 {
        match self {
            RelationKind::Peer => 100,
            RelationKind::Provider => 80,
            RelationKind::Customer => 120,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RelationKind::Peer => "peer",
            RelationKind::Provider => "provider",
            RelationKind::Customer => "customer",
        }
    }
}

/// Manual-relation errors; LAN-derived reconciliation only warns and skips
#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    #[error("unknown router '{0}'")]
    UnknownRouter(String),
    #[error("router '{0}' does not have BGP enabled")]
    BgpNotEnabled(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

struct LanMember<'a> {
    router: &'a str,
    ip: &'a str,
    asn: u32,
}

/// Derive and insert full-mesh BGP neighbors for every shared LAN.
///
/// Pair-processing order is deterministic here (LAN label, then router
/// name) but not part of the contract; only per-pair idempotency is.
/// Returns the number of neighbor insertions actually performed.
pub fn derive_lan_neighbors<S: ArtifactStore + ?Sized>(
    model: &TopologyModel,
    store: &mut S,
) -> Result<usize, StoreError> {
    let mut lan_map: BTreeMap<&str, Vec<LanMember>> = BTreeMap::new();
    for (name, router) in &model.routers {
        if !router.has_protocol(Protocol::Bgp) {
            continue;
        }
        let Some(asn) = router.asn else {
            continue;
        };
        for iface in &router.interfaces {
            if iface.lan.is_empty() {
                continue;
            }
            lan_map.entry(&iface.lan).or_default().push(LanMember {
                router: name,
                ip: &iface.ip,
                asn,
            });
        }
    }

    let mut inserted = 0;
    for (lan, members) in &lan_map {
        if members.len() < 2 {
            continue;
        }
        debug!("LAN '{}' has {} BGP members", lan, members.len());
        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                let (a, b) = (&members[i], &members[j]);
                if a.router == b.router {
                    continue;
                }
                let desc_b = format!("Router {}{}", b.asn, b.router);
                if add_neighbor_if_missing(store, a.router, b.ip, b.asn, Some(&desc_b))? {
                    inserted += 1;
                }
                let desc_a = format!("Router {}{}", a.asn, a.router);
                if add_neighbor_if_missing(store, b.router, a.ip, a.asn, Some(&desc_a))? {
                    inserted += 1;
                }
            }
        }
    }

    info!("LAN reconciliation inserted {} neighbor entries", inserted);
    Ok(inserted)
}

/// Insert a neighbor into a router's BGP block unless the exact
/// (neighbor IP, remote-as) pair is already present.
///
/// A missing frr.conf aborts only this document: it is logged and skipped so
/// reconciliation can continue with other routers.
pub fn add_neighbor_if_missing<S: ArtifactStore + ?Sized>(
    store: &mut S,
    router: &str,
    neighbor_ip: &str,
    remote_as: u32,
    description: Option<&str>,
) -> Result<bool, StoreError> {
    let path = frr_conf_path(router);
    let content = match store.read(&path) {
        Ok(content) => content,
        Err(StoreError::NotFound(_)) => {
            warn!(
                "frr.conf missing for router '{}'; skipping neighbor {}",
                router, neighbor_ip
            );
            return Ok(false);
        }
        Err(error) => return Err(error),
    };

    let ip = neighbor_ip.split('/').next().unwrap_or(neighbor_ip);
    let neighbor_line = format!("neighbor {} remote-as {}", ip, remote_as);
    if content.lines().any(|line| line.trim() == neighbor_line) {
        debug!("Router '{}' already has neighbor {} (AS {})", router, ip, remote_as);
        return Ok(false);
    }

    let mut lines = vec![neighbor_line];
    if let Some(desc) = description {
        lines.push(format!("neighbor {} description {}", ip, desc));
    }
    let updated = stanza::splice_into_block(&content, "router bgp", &lines);
    store.write(&path, &updated)?;
    info!("Added neighbor {} (AS {}) to router '{}'", ip, remote_as, router);
    Ok(true)
}

/// Apply a manually declared relation from `source` towards `dest`.
///
/// Inserts the neighbor pair line and a `<kind>_<dest>` description into the
/// source's BGP block; with `with_policy` the prefix-list and route-map
/// bindings join them in the block and the matching policy definitions are
/// appended at document end, setting the relation kind's local-preference.
pub fn apply_relation<S: ArtifactStore + ?Sized>(
    model: &TopologyModel,
    store: &mut S,
    source: &str,
    dest: &str,
    kind: RelationKind,
    neighbor_ip: &str,
    with_policy: bool,
) -> Result<(), RelationError> {
    let source_router = model
        .routers
        .get(source)
        .ok_or_else(|| RelationError::UnknownRouter(source.to_string()))?;
    let dest_router = model
        .routers
        .get(dest)
        .ok_or_else(|| RelationError::UnknownRouter(dest.to_string()))?;
    if !source_router.has_protocol(Protocol::Bgp) {
        return Err(RelationError::BgpNotEnabled(source.to_string()));
    }
    if !dest_router.has_protocol(Protocol::Bgp) {
        return Err(RelationError::BgpNotEnabled(dest.to_string()));
    }
    let remote_as = dest_router.asn.unwrap_or_default();

    let path = frr_conf_path(source);
    let content = store.read(&path)?;

    let ip = neighbor_ip.split('/').next().unwrap_or(neighbor_ip);
    let neighbor_line = format!("neighbor {} remote-as {}", ip, remote_as);
    if content.lines().any(|line| line.trim() == neighbor_line) {
        warn!(
            "Router '{}' already has neighbor {} (AS {}); relation not re-applied",
            source, ip, remote_as
        );
        return Ok(());
    }

    let relation_tag = format!("{}_{}", kind.label(), dest);
    let mut lines = vec![
        neighbor_line,
        format!("neighbor {} description {}", ip, relation_tag),
    ];
    if with_policy {
        lines.push(format!("neighbor {} prefix-list {}_in in", ip, relation_tag));
        lines.push(format!("neighbor {} prefix-list {}_out out", ip, relation_tag));
        lines.push(format!("neighbor {} route-map pref_{}_in in", ip, dest));
    }

    let mut updated = stanza::splice_into_block(&content, "router bgp", &lines);
    if with_policy {
        updated.push_str(&format!(
            "\nip prefix-list {tag}_in permit any\nip prefix-list {tag}_out permit any\n\nroute-map pref_{dest}_in permit 10\n    set local-preference {pref}\n",
            tag = relation_tag,
            dest = dest,
            pref = kind.local_preference(),
        ));
    }
    store.write(&path, &updated)?;

    info!(
        "Applied {} relation from '{}' towards '{}' (neighbor {})",
        kind.label(),
        source,
        dest,
        ip
    );
    Ok(())
}
