//! Artifact tree reconstruction.
//!
//! Best-effort inverse of synthesis: rebuilds a `TopologyModel` from a lab's
//! on-disk state so externally edited labs can be re-exported. Recovery works
//! from the manifest, literal line patterns in startup scripts and the
//! rendered stanza headers in frr.conf. Any field that cannot be recovered is
//! left at its zero-value; reconstruction never fails as a whole because one
//! node is incomplete.

use crate::manifest::{self, ManifestNode};
use crate::model::{Host, Interface, Protocol, Router, TopologyModel, WebServer};
use crate::store::{ArtifactStore, StoreError};
use crate::synth;
use log::debug;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static BGP_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^router bgp\s+(\d+)").unwrap());

/// Addresses and default gateway recovered from one startup script
#[derive(Debug, Default)]
struct StartupFacts {
    /// device name → CIDR from `ip address add <cidr> dev <dev>` lines
    addresses: BTreeMap<String, String>,
    /// gateway IP from the `ip route add default via <gw>` line
    gateway: Option<String>,
}

/// Reconstruct a topology model from a lab artifact tree.
///
/// The manifest is the only mandatory artifact; everything else degrades to
/// zero-values when missing or unrecognizable.
pub fn reconstruct_model<S: ArtifactStore + ?Sized>(
    store: &S,
    lab_name: &str,
) -> Result<TopologyModel, StoreError> {
    let manifest_text = store.read(Path::new("lab.conf"))?;
    let nodes = manifest::parse_manifest(&manifest_text);

    let mut model = TopologyModel {
        name: lab_name.to_string(),
        ..Default::default()
    };

    for (name, meta) in nodes {
        let facts = match store.read(&PathBuf::from(format!("{}.startup", name))) {
            Ok(content) => scan_startup(&content),
            Err(_) => {
                debug!("No startup script for node '{}'", name);
                StartupFacts::default()
            }
        };

        if meta.image.to_lowercase().contains("frr") {
            model.routers.insert(name.clone(), recover_router(store, &name, &meta, &facts));
        } else {
            let lan = meta.interfaces.get(&0).cloned().unwrap_or_default();
            let ip = facts.addresses.get("eth0").cloned().unwrap_or_default();
            let gateway = facts.gateway.clone().unwrap_or_default();
            if store.exists(&synth::www_index_path(&name)) {
                model.web_servers.push(WebServer { name, ip, gateway, lan });
            } else {
                model.hosts.push(Host { name, ip, gateway, lan });
            }
        }
    }

    Ok(model)
}

fn recover_router(
    store: &(impl ArtifactStore + ?Sized),
    name: &str,
    meta: &ManifestNode,
    facts: &StartupFacts,
) -> Router {
    let interfaces: Vec<Interface> = meta
        .interfaces
        .iter()
        .map(|(idx, lan)| {
            let device = format!("eth{}", idx);
            Interface {
                ip: facts.addresses.get(&device).cloned().unwrap_or_default(),
                name: device,
                lan: lan.clone(),
            }
        })
        .collect();

    let (protocols, asn) = match store.read(&synth::frr_conf_path(name)) {
        Ok(content) => scan_frr_conf(&content),
        Err(_) => {
            debug!("No frr.conf for router '{}'", name);
            (Vec::new(), None)
        }
    };

    Router {
        protocols,
        asn,
        interfaces,
    }
}

/// Scan a startup script with literal line-pattern matching.
fn scan_startup(content: &str) -> StartupFacts {
    let mut facts = StartupFacts::default();
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.starts_with(&["ip", "address", "add"])
            && fields.get(4) == Some(&"dev")
            && fields.len() >= 6
        {
            facts.addresses.insert(fields[5].to_string(), fields[3].to_string());
        }
        if fields.starts_with(&["ip", "route", "add", "default", "via"]) && fields.len() >= 6 {
            facts.gateway = Some(fields[5].to_string());
        }
    }
    facts
}

/// Recover the protocol set and ASN from rendered stanza headers.
fn scan_frr_conf(content: &str) -> (Vec<Protocol>, Option<u32>) {
    let mut protocols = Vec::new();
    let mut asn = None;

    if let Some(captures) = BGP_HEADER.captures(content) {
        protocols.push(Protocol::Bgp);
        asn = captures[1].parse().ok();
    }
    if content.lines().any(|line| line.starts_with("router ospf")) {
        protocols.push(Protocol::Ospf);
    }
    if content.lines().any(|line| line.starts_with("router rip")) {
        protocols.push(Protocol::Rip);
    }

    (protocols, asn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    #[test]
    fn test_scan_startup_lines() {
        let content = "\
ip address add 10.0.1.1/24 dev eth0
ip address add 10.0.2.1/24 dev eth1

ip route add default via 10.0.1.254 dev eth0
systemctl start frr
";
        let facts = scan_startup(content);
        assert_eq!(facts.addresses["eth0"], "10.0.1.1/24");
        assert_eq!(facts.addresses["eth1"], "10.0.2.1/24");
        assert_eq!(facts.gateway.as_deref(), Some("10.0.1.254"));
    }

    #[test]
    fn test_scan_frr_conf_headers() {
        let content = "\
password zebra

router bgp 4200
    network 10.0.0.0/16

router rip
    network 10.0.0.0/16
";
        let (protocols, asn) = scan_frr_conf(content);
        assert_eq!(protocols, vec![Protocol::Bgp, Protocol::Rip]);
        assert_eq!(asn, Some(4200));
    }

    #[test]
    fn test_partial_reconstruction_missing_artifacts() {
        let mut store = MemStore::new();
        // Manifest declares a router and a host, but only the manifest exists.
        store
            .write(
                Path::new("lab.conf"),
                "r1[0]=A\nr1[image]=\"kathara/frr\"\n\npc1[0]=A\npc1[image]=\"kathara/base\"\n",
            )
            .unwrap();

        let model = reconstruct_model(&store, "partial").unwrap();
        let r1 = &model.routers["r1"];
        assert!(r1.protocols.is_empty());
        assert_eq!(r1.asn, None);
        assert_eq!(r1.interfaces.len(), 1);
        assert_eq!(r1.interfaces[0].lan, "A");
        assert_eq!(r1.interfaces[0].ip, "");

        assert_eq!(model.hosts.len(), 1);
        assert_eq!(model.hosts[0].name, "pc1");
        assert_eq!(model.hosts[0].gateway, "");
    }

    #[test]
    fn test_missing_manifest_is_an_error() {
        let store = MemStore::new();
        assert!(matches!(
            reconstruct_model(&store, "empty"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_web_server_classified_by_document_probe() {
        let mut store = MemStore::new();
        store
            .write(
                Path::new("lab.conf"),
                "www1[0]=Z\nwww1[image]=\"kathara/base\"\n",
            )
            .unwrap();
        store
            .write(
                Path::new("www1.startup"),
                "ip address add 10.10.1.1/24 dev eth0\nip route add default via 10.10.1.254 dev eth0\nservice apache2 start\n",
            )
            .unwrap();
        store
            .write(Path::new("www1/var/www/html/index.html"), "<html></html>")
            .unwrap();

        let model = reconstruct_model(&store, "lab").unwrap();
        assert!(model.hosts.is_empty());
        assert_eq!(model.web_servers.len(), 1);
        assert_eq!(model.web_servers[0].ip, "10.10.1.1/24");
        assert_eq!(model.web_servers[0].gateway, "10.10.1.254");
        assert_eq!(model.web_servers[0].lan, "Z");
    }
}
