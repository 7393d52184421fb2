//! # gaia-graph
//!
//! Builds executable geospatial processing graphs from declarative JSON
//! requests and runs them.
//!
//! A request names a top-level process and a list of data inputs. Each input is
//! either a file (classified as vector or raster by its extension) or another
//! process specification, which is built recursively. The resulting tree is
//! evaluated depth-first: every nested process is computed before the process
//! that consumes its output.
//!
//! Inside a process, work stages are [`Task`]s wired together by one-shot
//! [`Stream`]s bound to typed [`Port`]s.
//!
//! ## Quick Start
//!
//! ```rust
//! use gaia_graph::prelude::*;
//!
//! let registry = Registry::with_builtins().unwrap();
//! let builder = GraphBuilder::new(&registry);
//! let process = parse_request(
//!     &builder,
//!     "passthrough",
//!     r#"{"data_inputs": [{"type": "file", "uri": "roads.shp"}]}"#,
//! )
//! .unwrap();
//!
//! assert_eq!(process.output().and_then(Resource::location), Some("roads.shp"));
//! ```
//!
//! ## Module Organization
//!
//! - [`sync_impl`]: depth-first, single-threaded evaluation
//! - [`async_impl`]: concurrent evaluation of independent subtrees
//! - [`prelude`]: Commonly used types and traits (import with `use gaia_graph::prelude::*`)

// ============================================================================
// Core Module
// ============================================================================

mod core;

// ============================================================================
// Public Re-exports - Granular Imports
// ============================================================================

// Core types
pub use crate::core::error::{GraphError, Result};
pub use crate::core::{Args, AsAny, Payload};

// Streaming primitives
pub use crate::core::port::{Port, PortDescriptor, PortDirection};
pub use crate::core::stream::{
    Capability, Endpoint, SharedStream, Stream, StreamBehaviour, StreamDescriptor,
};
pub use crate::core::task::{Task, TaskDescriptor};

// Graph construction
pub use crate::core::builder::{GraphBuilder, PROCESS_SUFFIX, parse_request, process_type_name};
pub use crate::core::io::{FileIo, FileKind, Io, ProcessIo, VECTOR_EXTENSIONS, classify, resolve};
pub use crate::core::process::{Process, ProcessDescriptor, ProcessLogic, ProcessState, Resource};
pub use crate::core::registry::{Registry, RegistryEntry};
pub use crate::core::request::{InputDescriptor, ProcessSpec, load_request};

// Built-ins, telemetry and validation
pub use crate::core::builtins;
pub use crate::core::registry;
pub use crate::core::telemetry::{MemoryTelemetry, Telemetry, TraceEntry};
pub use crate::core::validation::{ValidationIssue, ValidationResult, validate};

// Execution
pub use crate::core::async_impl;
pub use crate::core::sync_impl;

// ============================================================================
// Prelude Module - Convenient Bulk Imports
// ============================================================================

/// The main prelude: imports everything needed to build and run requests.
///
/// # Example
/// ```rust
/// use gaia_graph::prelude::*;
/// ```
pub mod prelude {
    pub use super::{
        Args, Capability, FileIo, FileKind, GraphBuilder, GraphError, Io, Payload, Port,
        PortDescriptor, Process, ProcessDescriptor, ProcessLogic, ProcessSpec, ProcessState,
        Registry, Resource, Stream, StreamBehaviour, Task, TaskDescriptor, parse_request, validate,
    };
}

// ============================================================================
// Library Metadata
// ============================================================================

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of this crate.
pub const NAME: &str = env!("CARGO_PKG_NAME");
