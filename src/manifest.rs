//! Structured lab manifest (`lab.conf`).
//!
//! The manifest is the durable declaration of LAN membership and node role:
//! one `<node>[<iface-index>]=<LAN-label>` line per interface plus a
//! `<node>[image]="<tag>"` line, blank-line separated per node. Rendering and
//! parsing live together here so the format has a single owner.

use crate::model::TopologyModel;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Image tag assigned to router nodes
pub const ROUTER_IMAGE: &str = "kathara/frr";
/// Image tag assigned to hosts and web servers
pub const BASE_IMAGE: &str = "kathara/base";

static MANIFEST_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?P<name>[^\[]+)\[(?P<idx>[^\]]+)\]=(?:"(?P<qval>.*)"|(?P<val>.*))$"#).unwrap()
});

/// A node's manifest entry: interface-index → LAN label, plus its image tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestNode {
    pub interfaces: BTreeMap<u32, String>,
    pub image: String,
}

/// Render the manifest for a model, routers first, then hosts and servers.
pub fn render_manifest(model: &TopologyModel) -> String {
    let mut lines: Vec<String> = Vec::new();

    for (name, router) in &model.routers {
        for (idx, iface) in router.interfaces.iter().enumerate() {
            lines.push(format!("{}[{}]={}", name, idx, iface.lan));
        }
        lines.push(format!("{}[image]=\"{}\"", name, ROUTER_IMAGE));
        lines.push(String::new());
    }
    for host in &model.hosts {
        lines.push(format!("{}[0]={}", host.name, host.lan));
        lines.push(format!("{}[image]=\"{}\"", host.name, BASE_IMAGE));
        lines.push(String::new());
    }
    for server in &model.web_servers {
        lines.push(format!("{}[0]={}", server.name, server.lan));
        lines.push(format!("{}[image]=\"{}\"", server.name, BASE_IMAGE));
        lines.push(String::new());
    }

    let mut rendered = lines.join("\n");
    while rendered.ends_with('\n') {
        rendered.pop();
    }
    rendered.push('\n');
    rendered
}

/// Parse a manifest back into per-node entries.
///
/// Lines that do not match the `<node>[<idx>]=<value>` shape are skipped;
/// reconstruction is best-effort by design.
pub fn parse_manifest(content: &str) -> BTreeMap<String, ManifestNode> {
    let mut nodes: BTreeMap<String, ManifestNode> = BTreeMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(captures) = MANIFEST_LINE.captures(line) else {
            continue;
        };
        let name = captures["name"].to_string();
        let idx = &captures["idx"];
        let value = captures
            .name("qval")
            .or_else(|| captures.name("val"))
            .map(|m| m.as_str().trim().trim_matches('"').to_string())
            .unwrap_or_default();

        let node = nodes.entry(name).or_default();
        if idx == "image" {
            node.image = value;
        } else if let Ok(index) = idx.parse::<u32>() {
            node.interfaces.insert(index, value);
        }
    }

    nodes
}
