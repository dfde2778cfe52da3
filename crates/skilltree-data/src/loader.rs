//! Reads tree and config files, detects their format, and builds engine
//! types from them.
//!
//! Format is chosen by extension (`.json`, `.ron`, `.toml`). All three carry
//! the same document shape.

use crate::schema::TreeData;
use serde::de::DeserializeOwned;
use skilltree_core::config::EngineConfig;
use skilltree_core::engine::SkillTreeEngine;
use skilltree_core::graph::{DefinitionError, SkillGraph, TreeDefinition};
use std::path::{Path, PathBuf};
use tracing::info;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The document parsed but does not describe a valid tree.
    #[error("invalid tree in {file}: {source}")]
    Definition {
        file: PathBuf,
        #[source]
        source: DefinitionError,
    },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Deserialize `content` in the given format. `file` is only used for error
/// context.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    file: &Path,
) -> Result<T, DataLoadError> {
    let parse_error = |detail: String| DataLoadError::Parse {
        file: file.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

// ===========================================================================
// Loading
// ===========================================================================

/// Read a tree document without validating it.
pub fn load_definition(path: &Path) -> Result<TreeDefinition, DataLoadError> {
    let data: TreeData = deserialize_file(path)?;
    Ok(data.into())
}

/// Read and build a tree.
pub fn load_graph(path: &Path) -> Result<SkillGraph, DataLoadError> {
    let definition = load_definition(path)?;
    let graph = SkillGraph::build(definition).map_err(|source| DataLoadError::Definition {
        file: path.to_path_buf(),
        source,
    })?;
    info!(
        file = %path.display(),
        tiers = graph.tier_count(),
        nodes = graph.node_count(),
        "loaded skill tree"
    );
    Ok(graph)
}

/// Build a tree from an in-memory JSON document.
pub fn parse_tree_json(content: &str) -> Result<SkillGraph, DataLoadError> {
    let file = Path::new("<inline>");
    let data: TreeData = deserialize_str(content, Format::Json, file)?;
    SkillGraph::build(data.into()).map_err(|source| DataLoadError::Definition {
        file: file.to_path_buf(),
        source,
    })
}

/// Read an engine config file. Missing keys take their defaults.
pub fn load_config(path: &Path) -> Result<EngineConfig, DataLoadError> {
    let config: EngineConfig = deserialize_file(path)?;
    info!(file = %path.display(), ?config, "loaded engine config");
    Ok(config)
}

/// Load a tree and wrap it in an engine with `config`.
pub fn load_engine(path: &Path, config: &EngineConfig) -> Result<SkillTreeEngine, DataLoadError> {
    Ok(SkillTreeEngine::new(load_graph(path)?, config))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "skilltree_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    const TREE_JSON: &str = r#"{ "tiers": [
        { "id": "Verdo", "name": "Verdant", "origin": { "gx": 0, "gy": 0 },
          "nodes": [ { "id": "v1", "cost": 1, "gx": 0, "gy": 0, "children": ["v2"] },
                     { "id": "v2", "cost": 2, "gx": 1, "gy": 0 } ] },
        { "id": "Smite", "origin": { "gx": 5, "gy": 0 },
          "nodes": [ { "id": "Smite01", "cost": 1, "gx": 0, "gy": 0 } ] }
    ] }"#;

    const TREE_RON: &str = r#"(tiers: [
        (id: "Verdo", nodes: [
            (id: "v1", cost: 1, children: ["v2"]),
            (id: "v2", cost: 2, gx: 1.0),
        ]),
        (id: "Smite", origin: (gx: 5.0, gy: 0.0), nodes: [(id: "Smite01", cost: 1)]),
    ])"#;

    const TREE_TOML: &str = r#"
[[tiers]]
id = "Verdo"

[[tiers.nodes]]
id = "v1"
cost = 1
children = ["v2"]

[[tiers.nodes]]
id = "v2"
cost = 2
gx = 1.0

[[tiers]]
id = "Smite"
origin = { gx = 5.0, gy = 0.0 }

[[tiers.nodes]]
id = "Smite01"
cost = 1
"#;

    // -----------------------------------------------------------------------
    // detect_format
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("tree.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("tree.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("tree.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_format_unsupported() {
        for name in ["tree.yaml", "tree"] {
            assert!(matches!(
                detect_format(Path::new(name)),
                Err(DataLoadError::UnsupportedFormat { .. })
            ));
        }
    }

    // -----------------------------------------------------------------------
    // Tree loading
    // -----------------------------------------------------------------------

    #[test]
    fn all_formats_build_same_graph() {
        let dir = make_test_dir("formats");
        let mut shapes = Vec::new();
        for (name, content) in [
            ("tree.json", TREE_JSON),
            ("tree.ron", TREE_RON),
            ("tree.toml", TREE_TOML),
        ] {
            let path = dir.join(name);
            fs::write(&path, content).unwrap();
            let graph = load_graph(&path).unwrap();
            let smite = graph.tier_key("Smite").unwrap();
            shapes.push((
                graph.node_count(),
                graph.edges().count(),
                graph.root_of(smite).map(|root| graph[root].id.clone()),
                graph[smite].origin,
            ));
        }
        assert_eq!(shapes[0], shapes[1]);
        assert_eq!(shapes[1], shapes[2]);
        assert_eq!(shapes[0].2.as_deref(), Some("Smite01"));

        cleanup(&dir);
    }

    #[test]
    fn parse_error_names_file() {
        let dir = make_test_dir("parse_error");
        let path = dir.join("tree.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_graph(&path).unwrap_err();
        match err {
            DataLoadError::Parse { file, .. } => assert_eq!(file, path),
            other => panic!("expected Parse, got {other:?}"),
        }

        cleanup(&dir);
    }

    #[test]
    fn invalid_tree_reports_definition_error() {
        let err = parse_tree_json(
            r#"{ "tiers": [ { "id": "Verdo", "nodes": [ { "id": "a", "children": ["ghost"] } ] } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::Definition {
                source: DefinitionError::DanglingChild { .. },
                ..
            }
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_graph(Path::new("/nonexistent/skilltree/tree.json")).unwrap_err();
        assert!(matches!(err, DataLoadError::Io(_)));
    }

    // -----------------------------------------------------------------------
    // Config loading
    // -----------------------------------------------------------------------

    #[test]
    fn config_from_toml_keeps_defaults() {
        let dir = make_test_dir("config");
        let path = dir.join("engine.toml");
        fs::write(&path, "points_cap = 30\nbase_completion_threshold = 12\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.points_cap, 30);
        assert_eq!(config.seal_cap, u32::MAX);
        assert_eq!(config.base_completion_threshold, Some(12));

        cleanup(&dir);
    }

    #[test]
    fn load_engine_applies_config() {
        let dir = make_test_dir("engine");
        let path = dir.join("tree.json");
        fs::write(&path, TREE_JSON).unwrap();

        let mut engine = load_engine(&path, &EngineConfig::new().with_caps(1, 0)).unwrap();
        assert!(engine.unlock("v1").is_unlocked());
        assert!(!engine.unlock("v2").is_unlocked());

        cleanup(&dir);
    }
}
