//! # Labforge - Configuration synthesizer for Kathara network emulation labs
//!
//! This library generates the complete artifact tree of a Kathara-style
//! virtual network lab (FRR router configurations, startup scripts, the
//! `lab.conf` manifest) from a declarative topology model, and can
//! reverse-parse an existing lab back into that model.
//!
//! ## Overview
//!
//! A lab is declared as a `TopologyModel`: routers with protocol sets
//! (BGP/OSPF/RIP), interfaces attached to named LANs, plain hosts and web
//! servers. Synthesis renders that model into configuration artifacts;
//! reconciliation then derives BGP adjacency from shared-LAN membership and
//! splices neighbor lines into the generated router configurations without
//! disturbing any existing content.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `model`: topology entities, validation and the interchange schema
//! - `interchange`: YAML/JSON model import and export
//! - `aggregate`: attached-network collapsing and two-tier summarization
//! - `stanza`: indentation-scoped structural editing of config documents
//! - `store`: the artifact-store abstraction (filesystem or in-memory)
//! - `manifest`: `lab.conf` rendering and parsing
//! - `synth`: model → artifact tree rendering
//! - `parse`: artifact tree → model reconstruction
//! - `neighbors`: shared-LAN BGP adjacency and manual relations
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use labforge::{interchange, neighbors, synth};
//! use labforge::store::FsStore;
//! use std::path::Path;
//!
//! let model = interchange::load_model(Path::new("lab.yaml"))?;
//! let mut store = FsStore::new(format!("labs/{}", model.name));
//!
//! synth::write_tree(&synth::synthesize(&model), &mut store)?;
//! neighbors::derive_lan_neighbors(&model, &mut store)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Domain failures carry typed errors (`ModelError`, `StoreError`,
//! `RelationError`); the CLI layer wraps them with `color_eyre` context.
//! Aggregation and reconstruction are deliberately tolerant: unparsable
//! network entries are skipped and unrecoverable fields are left at their
//! zero-values rather than failing a whole lab.

pub mod aggregate;
pub mod interchange;
pub mod manifest;
pub mod model;
pub mod neighbors;
pub mod parse;
pub mod stanza;
pub mod store;
pub mod synth;
