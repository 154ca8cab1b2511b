//! Portable model interchange.
//!
//! Loads and saves the declarative topology model as a hierarchical document.
//! YAML is the canonical format; JSON exports are accepted on import by file
//! extension. Export followed by import is an exact inverse for every field
//! the model carries.

use crate::model::TopologyModel;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load and validate a topology model from a YAML (or JSON) file.
pub fn load_model(path: &Path) -> Result<TopologyModel> {
    info!("Loading lab model from: {:?}", path);

    let file = File::open(path)
        .wrap_err_with(|| format!("Failed to open model file '{}'", path.display()))?;

    let model: TopologyModel = if path.extension().map_or(false, |ext| ext == "json") {
        serde_json::from_reader(file)
            .wrap_err_with(|| format!("Failed to parse JSON model '{}'", path.display()))?
    } else {
        serde_yaml::from_reader(file)
            .wrap_err_with(|| format!("Failed to parse YAML model '{}'", path.display()))?
    };

    model.validate()?;
    Ok(model)
}

/// Export a topology model as YAML.
pub fn save_model(model: &TopologyModel, path: &Path) -> Result<()> {
    let rendered = serde_yaml::to_string(model).wrap_err("Failed to serialize model")?;
    std::fs::write(path, rendered)
        .wrap_err_with(|| format!("Failed to write model file '{}'", path.display()))?;
    info!("Exported lab model to: {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Interface, Protocol, Router};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample_model() -> TopologyModel {
        let mut model = TopologyModel {
            name: "lab1".to_string(),
            ..Default::default()
        };
        model.routers.insert(
            "r1".to_string(),
            Router {
                protocols: vec![Protocol::Bgp, Protocol::Rip],
                asn: Some(65001),
                interfaces: vec![Interface {
                    name: "eth0".to_string(),
                    lan: "A".to_string(),
                    ip: "10.0.1.1/24".to_string(),
                }],
            },
        );
        model
    }

    #[test]
    fn test_save_then_load_is_exact_inverse() {
        let model = sample_model();
        let temp = NamedTempFile::new().unwrap();

        save_model(&model, temp.path()).unwrap();
        let reloaded = load_model(temp.path()).unwrap();
        assert_eq!(model, reloaded);
    }

    #[test]
    fn test_load_json_by_extension() {
        let model = sample_model();
        let json = serde_json::to_string_pretty(&model).unwrap();

        let mut temp = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(temp, "{}", json).unwrap();

        let reloaded = load_model(temp.path()).unwrap();
        assert_eq!(model, reloaded);
    }

    #[test]
    fn test_invalid_model_rejected_on_load() {
        let yaml = "\
name: lab1
routers:
  r1:
    protocols: [bgp]
    interfaces: []
";
        let mut temp = NamedTempFile::new().unwrap();
        write!(temp, "{}", yaml).unwrap();

        // BGP without an ASN fails validation at the boundary
        assert!(load_model(temp.path()).is_err());
    }
}
