//! Errors raised while loading, saving, building or capturing graph files.

use std::path::PathBuf;

use thiserror::Error;
use tonegraph_core::{GraphError, NodeKind};

/// Everything that can go wrong between a graph file and a live [`tonegraph_core::SignalGraph`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Graph file could not be read
    #[error("cannot read graph file {path:?}: {source}")]
    ReadFile {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Graph file could not be written
    #[error("cannot write graph file {path:?}: {source}")]
    WriteFile {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Parent directory of a graph file could not be created
    #[error("cannot create directory {path:?}: {source}")]
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// File extension is neither `.toml` nor `.json`
    #[error("unsupported config format {0:?} (expected .toml or .json)")]
    UnsupportedFormat(PathBuf),

    /// Malformed TOML graph
    #[error("invalid TOML graph: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Graph could not be rendered as TOML
    #[error("cannot encode graph as TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Malformed JSON graph
    #[error("invalid JSON graph: {0}")]
    JsonParse(#[source] serde_json::Error),

    /// Graph could not be rendered as JSON
    #[error("cannot encode graph as JSON: {0}")]
    JsonSerialize(#[source] serde_json::Error),

    /// Node type not known to the registry
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    /// Node kind that has no configuration representation
    #[error("node '{node}' of kind {kind} cannot be captured")]
    UnsupportedNode {
        /// Id of the node.
        node: String,
        /// Its kind.
        kind: NodeKind,
    },

    /// Parameter value out of range, malformed, or not understood by the node
    #[error("invalid parameter '{param}' for node '{node}': {reason}")]
    InvalidParameter {
        /// Node id.
        node: String,
        /// Parameter key as written in the file.
        param: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Graph rejected a node, connection or designation
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
}

impl ConfigError {
    /// [`ConfigError::ReadFile`] for `path`.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// [`ConfigError::WriteFile`] for `path`.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// [`ConfigError::CreateDir`] for `path`.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// [`ConfigError::InvalidParameter`].
    pub fn invalid_param(
        node: impl Into<String>,
        param: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::InvalidParameter {
            node: node.into(),
            param: param.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io;
    use std::path::Path;

    #[test]
    fn test_io_variants_keep_path_and_source() {
        let denied = || io::Error::new(io::ErrorKind::PermissionDenied, "denied");

        let err = ConfigError::read_file("graphs/pad.toml", denied());
        assert!(err.to_string().starts_with("cannot read graph file"));
        assert!(err.to_string().contains("pad.toml"));
        assert!(err.source().is_some());

        let err = ConfigError::write_file("graphs/pad.json", denied());
        assert!(matches!(
            &err,
            ConfigError::WriteFile { path, .. } if path == Path::new("graphs/pad.json")
        ));

        let err = ConfigError::create_dir("graphs", denied());
        assert!(matches!(err, ConfigError::CreateDir { .. }));
    }

    #[test]
    fn test_invalid_param_message() {
        let err = ConfigError::invalid_param("lp", "cutoff", "not a number");
        assert_eq!(
            err.to_string(),
            "invalid parameter 'cutoff' for node 'lp': not a number"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn test_graph_error_wraps_with_source() {
        let err: ConfigError = GraphError::DuplicateId("osc".to_string()).into();
        assert!(matches!(err, ConfigError::Graph(GraphError::DuplicateId(_))));
        assert_eq!(err.to_string(), "graph error: node 'osc' already exists");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_node_type_messages() {
        let err = ConfigError::UnknownNodeType("reverb".to_string());
        assert_eq!(err.to_string(), "unknown node type: reverb");

        let err = ConfigError::UnsupportedNode {
            node: "sub".to_string(),
            kind: NodeKind::Graph,
        };
        assert_eq!(err.to_string(), "node 'sub' of kind Graph cannot be captured");
    }
}
