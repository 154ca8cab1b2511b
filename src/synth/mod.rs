//! Artifact synthesis.
//!
//! Renders a `TopologyModel` into the complete lab artifact tree: per-router
//! FRR configuration (daemons, vtysh.conf, frr.conf with protocol stanzas),
//! startup scripts for every node kind, web-server document roots and the
//! `lab.conf` manifest. Synthesis is a pure function of the model; writing
//! the tree through an `ArtifactStore` is a separate step so tests can
//! inspect the rendered artifacts without touching the filesystem.

pub mod templates;

use crate::aggregate;
use crate::manifest;
use crate::model::{gateway_address, Host, Protocol, Router, TopologyModel, WebServer};
use crate::store::{ArtifactStore, StoreError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A rendered artifact: its content plus an executable marker for scripts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub content: String,
    pub executable: bool,
}

impl Artifact {
    fn text(content: String) -> Self {
        Artifact {
            content,
            executable: false,
        }
    }

    fn script(content: String) -> Self {
        Artifact {
            content,
            executable: true,
        }
    }
}

/// Ordered map from lab-relative path to rendered artifact
pub type ArtifactTree = BTreeMap<PathBuf, Artifact>;

/// Path of a router's frr.conf inside the lab tree.
pub fn frr_conf_path(router_name: &str) -> PathBuf {
    Path::new(router_name).join("etc/frr/frr.conf")
}

/// Path of a web server's placeholder document.
pub fn www_index_path(server_name: &str) -> PathBuf {
    Path::new(server_name).join("var/www/html/index.html")
}

/// Render the full artifact tree for a model.
///
/// Deterministic for a fixed model and aggregation policy: routers are
/// emitted in name order and every artifact is a pure function of its node.
pub fn synthesize(model: &TopologyModel) -> ArtifactTree {
    let mut tree = ArtifactTree::new();

    for (name, router) in &model.routers {
        synthesize_router(name, router, &mut tree);
    }
    for host in &model.hosts {
        synthesize_host(host, &mut tree);
    }
    for server in &model.web_servers {
        synthesize_web_server(server, &mut tree);
    }

    tree.insert(
        PathBuf::from("lab.conf"),
        Artifact::text(manifest::render_manifest(model)),
    );

    tree
}

/// Write a rendered tree through an artifact store.
pub fn write_tree<S: ArtifactStore + ?Sized>(
    tree: &ArtifactTree,
    store: &mut S,
) -> Result<(), StoreError> {
    for (path, artifact) in tree {
        store.write(path, &artifact.content)?;
        if artifact.executable {
            store.mark_executable(path)?;
        }
    }
    Ok(())
}

fn synthesize_router(name: &str, router: &Router, tree: &mut ArtifactTree) {
    let bgp = router.has_protocol(Protocol::Bgp);
    let ospf = router.has_protocol(Protocol::Ospf);
    let rip = router.has_protocol(Protocol::Rip);

    let frr_dir = Path::new(name).join("etc/frr");
    tree.insert(
        frr_dir.join("daemons"),
        Artifact::text(templates::daemons_file(bgp, ospf, rip)),
    );
    tree.insert(
        frr_dir.join("vtysh.conf"),
        Artifact::text(templates::vtysh_conf(name)),
    );
    tree.insert(
        frr_conf_path(name),
        Artifact::text(render_frr_conf(router)),
    );

    let address_lines: Vec<String> = router
        .interfaces
        .iter()
        .map(|iface| format!("ip address add {} dev {}", iface.ip, iface.name))
        .collect();
    let startup = format!("{}\n\nsystemctl start frr\n", address_lines.join("\n"));
    tree.insert(PathBuf::from(format!("{}.startup", name)), Artifact::script(startup));
}

fn synthesize_host(host: &Host, tree: &mut ArtifactTree) {
    let startup = format!(
        "ip address add {} dev eth0\nip route add default via {} dev eth0\n",
        host.ip,
        gateway_address(&host.gateway)
    );
    tree.insert(
        PathBuf::from(format!("{}.startup", host.name)),
        Artifact::script(startup),
    );
}

fn synthesize_web_server(server: &WebServer, tree: &mut ArtifactTree) {
    let startup = format!(
        "ip address add {} dev eth0\nip route add default via {} dev eth0\nservice apache2 start\n",
        server.ip,
        gateway_address(&server.gateway)
    );
    tree.insert(
        PathBuf::from(format!("{}.startup", server.name)),
        Artifact::script(startup),
    );
    tree.insert(
        www_index_path(&server.name),
        Artifact::text(templates::WWW_INDEX.to_string()),
    );
}

/// Render a router's frr.conf: preamble, optional debug lines, then one
/// stanza per enabled protocol, all fed from the shared network aggregation.
fn render_frr_conf(router: &Router) -> String {
    let mut parts: Vec<String> = vec![templates::FRR_PREAMBLE.to_string()];

    let bgp = router.has_protocol(Protocol::Bgp);
    if bgp {
        parts.push(templates::BGP_DEBUG.to_string());
    }

    let networks = aggregate::aggregate_networks(&router.interface_cidrs());

    if bgp {
        if let Some(asn) = router.asn {
            parts.push(bgp_stanza(asn, &networks));
        }
    }
    if router.has_protocol(Protocol::Ospf) {
        parts.push(ospf_stanza(&networks));
    }
    if router.has_protocol(Protocol::Rip) {
        parts.push(rip_stanza(&networks));
    }

    parts.join("\n")
}

fn bgp_stanza(asn: u32, networks: &[String]) -> String {
    let mut lines = vec![
        format!("router bgp {}", asn),
        "    no bgp ebgp-requires-policy".to_string(),
        "    no bgp network import-check".to_string(),
    ];
    for network in networks {
        lines.push(format!("    network {}", network));
    }
    lines.join("\n") + "\n"
}

fn ospf_stanza(networks: &[String]) -> String {
    let mut lines = vec!["router ospf".to_string()];
    for network in networks {
        lines.push(format!("    network {} area 0.0.0.0", network));
    }
    lines.join("\n") + "\n"
}

fn rip_stanza(networks: &[String]) -> String {
    let mut lines = vec!["router rip".to_string()];
    for network in networks {
        lines.push(format!("    network {}", network));
    }
    lines.join("\n") + "\n"
}
