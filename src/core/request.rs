//! Request documents: the declarative description of a process tree.
//!
//! ```json
//! {
//!   "data_inputs": [
//!     {"type": "file", "uri": "roads.shp"},
//!     {"type": "process", "process": {"name": "within", "data_inputs": [...]}}
//!   ],
//!   "args": {"buffer": 10}
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{GraphError, Result};
use crate::core::{Args, Payload};

/// Specification of one process: its inputs, in order, and optional args.
///
/// `name` is only read for nested processes; the root's name is supplied by
/// the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub data_inputs: Vec<InputDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Args>,
}

impl ProcessSpec {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: Payload) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Raw description of one data input.
///
/// The `type` tag decides how it is resolved; every other field is kept as-is
/// and forwarded to the resolved input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub fields: Args,
}

impl InputDescriptor {
    /// The `uri` field of a file input.
    pub fn uri(&self) -> Result<&str> {
        self.fields
            .get("uri")
            .and_then(Payload::as_str)
            .ok_or_else(|| {
                GraphError::InvalidRequest("file input is missing a string 'uri'".into())
            })
    }

    /// The nested specification of a process input, and the name it declares.
    pub fn nested_process(&self) -> Result<(String, ProcessSpec)> {
        let value = self.fields.get("process").cloned().ok_or_else(|| {
            GraphError::InvalidRequest("process input is missing the 'process' object".into())
        })?;
        let spec = ProcessSpec::from_value(value)?;
        let name = spec.name.clone().ok_or_else(|| {
            GraphError::InvalidRequest("nested process is missing its 'name'".into())
        })?;
        Ok((name, spec))
    }
}

/// Loads a request from an inline JSON string or a JSON file.
///
/// The inline string wins when both are given. Returns `Ok(None)` when
/// neither is supplied.
pub fn load_request(jsonstr: Option<&str>, jsonfile: Option<&Path>) -> Result<Option<ProcessSpec>> {
    if let Some(json) = jsonstr {
        return ProcessSpec::from_json(json).map(Some);
    }
    if let Some(path) = jsonfile {
        let contents = std::fs::read_to_string(path)?;
        log::debug!("loaded request from {}", path.display());
        return ProcessSpec::from_json(&contents).map(Some);
    }
    Ok(None)
}
