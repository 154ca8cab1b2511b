use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use env_logger::Env;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use labforge::interchange;
use labforge::neighbors::{self, RelationKind};
use labforge::parse;
use labforge::store::FsStore;
use labforge::synth;

/// Configuration synthesizer for Kathara network emulation labs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a lab artifact tree from a declarative topology model
    Generate {
        /// Path to the lab model file (YAML, or JSON by extension)
        #[arg(short, long)]
        config: PathBuf,

        /// Directory the lab directory is created under
        #[arg(short, long, default_value = "labs")]
        output: PathBuf,
    },

    /// Reconstruct the topology model from an existing lab directory
    Rebuild {
        /// Lab directory to scan
        #[arg(short, long)]
        lab: PathBuf,

        /// Output path for the exported model (default: <lab>/<name>.yaml)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add a manual BGP relation between two routers of an existing lab
    AddRelation {
        /// Lab directory containing the routers
        #[arg(short, long)]
        lab: PathBuf,

        /// Source router receiving the neighbor line
        #[arg(long)]
        source: String,

        /// Destination router the relation points at
        #[arg(long)]
        dest: String,

        /// Relation kind, determining the route-map local-preference
        #[arg(long, value_enum)]
        kind: RelationKind,

        /// Neighbor IP on the destination side
        #[arg(long)]
        neighbor_ip: String,

        /// Also emit prefix-list / route-map policy blocks
        #[arg(long)]
        policy: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match args.command {
        Command::Generate { config, output } => cmd_generate(&config, &output),
        Command::Rebuild { lab, output } => cmd_rebuild(&lab, output.as_deref()),
        Command::AddRelation {
            lab,
            source,
            dest,
            kind,
            neighbor_ip,
            policy,
        } => cmd_add_relation(&lab, &source, &dest, kind, &neighbor_ip, policy),
    }
}

fn cmd_generate(config: &Path, output: &Path) -> Result<()> {
    let model = interchange::load_model(config)?;
    let lab_dir = output.join(&model.name);
    info!("Generating lab '{}' in {:?}", model.name, lab_dir);

    if lab_dir.exists() {
        warn!("Lab directory {:?} already exists; replacing it", lab_dir);
        fs::remove_dir_all(&lab_dir)
            .wrap_err_with(|| format!("Failed to remove existing lab '{}'", lab_dir.display()))?;
    }
    fs::create_dir_all(&lab_dir)
        .wrap_err_with(|| format!("Failed to create lab directory '{}'", lab_dir.display()))?;

    let mut store = FsStore::new(&lab_dir);
    let tree = synth::synthesize(&model);
    synth::write_tree(&tree, &mut store)?;
    info!("Wrote {} artifacts", tree.len());

    let inserted = neighbors::derive_lan_neighbors(&model, &mut store)?;
    info!("Derived {} shared-LAN BGP neighbor entries", inserted);

    // keep a portable export of the model beside the artifacts
    interchange::save_model(&model, &lab_dir.join(format!("{}.yaml", model.name)))?;

    info!("Lab '{}' ready in {:?}", model.name, lab_dir);
    Ok(())
}

fn cmd_rebuild(lab: &Path, output: Option<&Path>) -> Result<()> {
    let lab_name = lab
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| eyre!("Cannot derive a lab name from {:?}", lab))?;

    let store = FsStore::new(lab);
    let model = parse::reconstruct_model(&store, lab_name)
        .wrap_err_with(|| format!("Failed to reconstruct lab from '{}'", lab.display()))?;
    info!(
        "Reconstructed {} routers, {} hosts, {} web servers",
        model.routers.len(),
        model.hosts.len(),
        model.web_servers.len()
    );

    let export_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| lab.join(format!("{}.yaml", lab_name)));
    interchange::save_model(&model, &export_path)?;
    Ok(())
}

fn cmd_add_relation(
    lab: &Path,
    source: &str,
    dest: &str,
    kind: RelationKind,
    neighbor_ip: &str,
    policy: bool,
) -> Result<()> {
    let lab_name = lab
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| eyre!("Cannot derive a lab name from {:?}", lab))?;

    let mut store = FsStore::new(lab);
    // the on-disk lab itself is the source of truth for ASNs and protocols
    let model = parse::reconstruct_model(&store, lab_name)
        .wrap_err_with(|| format!("Failed to reconstruct lab from '{}'", lab.display()))?;

    neighbors::apply_relation(&model, &mut store, source, dest, kind, neighbor_ip, policy)
        .wrap_err_with(|| format!("Failed to apply {} relation", kind.label()))?;
    Ok(())
}
