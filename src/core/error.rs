use thiserror::Error;

use crate::core::stream::Capability;

/// Everything that can go wrong while building or running a process graph.
///
/// None of these are transient, so nothing in the crate retries; errors bubble
/// up to whoever issued the request.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("unknown type: '{0}' is not registered")]
    UnknownType(String),

    #[error("unknown process type '{name}': {source}")]
    UnknownProcessType {
        name: String,
        #[source]
        source: Box<GraphError>,
    },

    #[error("duplicate name: '{0}' is already registered")]
    DuplicateName(String),

    #[error("registry entry '{name}' is a {found}, expected a {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("port '{port}' does not support capability {capability} (declared: {declared:?})")]
    CapabilityMismatch {
        port: String,
        capability: Capability,
        declared: Vec<Capability>,
    },

    #[error("port '{port}' is an {found} port, expected an {expected} port")]
    DirectionMismatch {
        port: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("task '{task}' has no port named '{port}'")]
    UnknownPort { task: String, port: String },

    #[error("port '{port}' is not an endpoint of stream {from} -> {to}")]
    EndpointMismatch {
        port: String,
        from: String,
        to: String,
    },

    #[error("port '{0}' is not bound to a live stream")]
    UnboundPort(String),

    #[error("unsupported input kind: '{0}'")]
    UnsupportedIoKind(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("process {id} is {state}, cannot {action}")]
    InvalidState {
        id: uuid::Uuid,
        state: &'static str,
        action: &'static str,
    },

    #[error("process '{process}' failed: {message}")]
    Compute { process: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("worker failed: {0}")]
    Join(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
