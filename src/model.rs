//! Lab topology model.
//!
//! This module defines the declarative entities a lab is built from: routers
//! with protocol sets and interfaces, plain hosts, and web servers. The model
//! is the single source of truth for synthesis and the target of artifact
//! reconstruction.

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

/// Routing protocols a router can enable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Bgp,
    Ospf,
    Rip,
}

/// A router interface attached to a named LAN segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    /// Stable device name, e.g. `eth0`
    pub name: String,
    /// Operator-chosen LAN label identifying the shared segment
    pub lan: String,
    /// Interface address with prefix length, e.g. `10.0.1.1/24`
    pub ip: String,
}

/// A router node: enabled protocols, optional ASN and ordered interfaces
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Router {
    #[serde(default)]
    pub protocols: Vec<Protocol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asn: Option<u32>,
    #[serde(default)]
    pub interfaces: Vec<Interface>,
}

impl Router {
    pub fn has_protocol(&self, protocol: Protocol) -> bool {
        self.protocols.contains(&protocol)
    }

    /// All interface CIDRs in declaration order
    pub fn interface_cidrs(&self) -> Vec<String> {
        self.interfaces.iter().map(|iface| iface.ip.clone()).collect()
    }
}

/// A plain host with a single interface and a default gateway
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub name: String,
    pub ip: String,
    pub gateway: String,
    pub lan: String,
}

/// A web server node; same shape as a host plus an Apache document root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebServer {
    pub name: String,
    pub ip: String,
    pub gateway: String,
    pub lan: String,
}

/// The full declarative lab topology
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyModel {
    /// Lab name; becomes the artifact tree's directory name
    pub name: String,
    #[serde(default)]
    pub routers: BTreeMap<String, Router>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<Host>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub web_servers: Vec<WebServer>,
}

/// Model validation errors raised at the input boundary
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("lab name cannot be empty")]
    EmptyLabName,
    #[error("node name '{0}' is used more than once")]
    DuplicateName(String),
    #[error("node name '{0}' must not contain whitespace")]
    InvalidName(String),
    #[error("router '{0}' enables BGP but declares no ASN")]
    MissingAsn(String),
    #[error("invalid CIDR '{cidr}' on node '{node}'")]
    InvalidCidr { node: String, cidr: String },
    #[error("invalid gateway '{gateway}' on node '{node}'")]
    InvalidGateway { node: String, gateway: String },
}

impl TopologyModel {
    /// Validate the model before any artifact is synthesized.
    ///
    /// Checks name uniqueness across all node kinds, the BGP/ASN pairing
    /// rule, and that every declared address parses. Aggregation itself is
    /// tolerant of bad entries, but a declared model should not carry any.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.name.trim().is_empty() {
            return Err(ModelError::EmptyLabName);
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let all_names = self
            .routers
            .keys()
            .map(String::as_str)
            .chain(self.hosts.iter().map(|h| h.name.as_str()))
            .chain(self.web_servers.iter().map(|w| w.name.as_str()));
        for name in all_names {
            if name.contains(char::is_whitespace) || name.is_empty() {
                return Err(ModelError::InvalidName(name.to_string()));
            }
            if !seen.insert(name) {
                return Err(ModelError::DuplicateName(name.to_string()));
            }
        }

        for (name, router) in &self.routers {
            if router.has_protocol(Protocol::Bgp) && router.asn.is_none() {
                return Err(ModelError::MissingAsn(name.clone()));
            }
            for iface in &router.interfaces {
                validate_cidr(name, &iface.ip)?;
            }
        }
        for host in &self.hosts {
            validate_cidr(&host.name, &host.ip)?;
            validate_gateway(&host.name, &host.gateway)?;
        }
        for server in &self.web_servers {
            validate_cidr(&server.name, &server.ip)?;
            validate_gateway(&server.name, &server.gateway)?;
        }

        Ok(())
    }
}

fn validate_cidr(node: &str, cidr: &str) -> Result<(), ModelError> {
    IpNetwork::from_str(cidr).map(|_| ()).map_err(|_| ModelError::InvalidCidr {
        node: node.to_string(),
        cidr: cidr.to_string(),
    })
}

/// Gateways may be declared bare (`10.0.0.1`) or with a mask (`10.0.0.1/24`);
/// the mask is ignored when the default route is rendered.
fn validate_gateway(node: &str, gateway: &str) -> Result<(), ModelError> {
    let bare = gateway.split('/').next().unwrap_or(gateway);
    if bare.parse::<std::net::IpAddr>().is_ok() {
        return Ok(());
    }
    Err(ModelError::InvalidGateway {
        node: node.to_string(),
        gateway: gateway.to_string(),
    })
}

/// Strip an optional prefix length from a gateway declaration.
pub fn gateway_address(gateway: &str) -> &str {
    gateway.split('/').next().unwrap_or(gateway)
}
