//! Resolution of raw input descriptors into process inputs.

use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::Args;
use crate::core::builder::GraphBuilder;
use crate::core::error::{GraphError, Result};
use crate::core::process::{Process, Resource};
use crate::core::request::InputDescriptor;

/// File extensions treated as vector data. Anything else is raster.
pub const VECTOR_EXTENSIONS: &[&str] = &["shp", "geojson", "json", "kml", "gml", "gpkg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Vector,
    Raster,
}

/// Classifies `uri` by its extension.
///
/// Matching is case-sensitive. A missing or unrecognised extension is
/// raster, not an error.
pub fn classify(uri: &str) -> FileKind {
    let extension = Path::new(uri).extension().and_then(|ext| ext.to_str());
    if extension.is_none() {
        log::warn!("'{}' has no extension, treating it as raster", uri);
    }
    let is_vector = extension.is_some_and(|ext| VECTOR_EXTENSIONS.contains(&ext));
    if is_vector {
        FileKind::Vector
    } else {
        FileKind::Raster
    }
}

/// A file-backed input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileIo {
    pub kind: FileKind,
    pub uri: String,
    /// Descriptor fields other than `type` and `uri`, passed through untouched.
    #[serde(default, skip_serializing_if = "Args::is_empty")]
    pub options: Args,
}

impl FileIo {
    pub fn new(uri: impl Into<String>, options: Args) -> Self {
        let uri = uri.into();
        FileIo {
            kind: classify(&uri),
            uri,
            options,
        }
    }

    pub fn is_vector(&self) -> bool {
        self.kind == FileKind::Vector
    }
}

/// A nested process used as a data source by its parent.
#[derive(Debug, Clone)]
pub struct ProcessIo {
    process: Box<Process>,
}

impl ProcessIo {
    pub fn new(process: Process) -> Self {
        ProcessIo {
            process: Box::new(process),
        }
    }

    pub fn process(&self) -> &Process {
        &self.process
    }

    pub(crate) fn process_mut(&mut self) -> &mut Process {
        &mut self.process
    }

    pub(crate) fn into_process(self) -> Process {
        *self.process
    }
}

/// One resolved input of a process.
#[derive(Debug, Clone)]
pub enum Io {
    File(FileIo),
    Process(ProcessIo),
}

impl Io {
    /// The data this input provides: the file itself, or the nested
    /// process's output once it has been computed.
    pub fn data(&self) -> Option<Resource> {
        match self {
            Io::File(file) => Some(Resource::File(file.clone())),
            Io::Process(nested) => nested.process().output().cloned(),
        }
    }

    /// Where the input's data lives, if it is backed by a location.
    pub fn location(&self) -> Option<String> {
        self.data()
            .and_then(|resource| resource.location().map(str::to_string))
    }

    pub fn as_file(&self) -> Option<&FileIo> {
        match self {
            Io::File(file) => Some(file),
            Io::Process(_) => None,
        }
    }

    pub fn as_process(&self) -> Option<&Process> {
        match self {
            Io::Process(nested) => Some(nested.process()),
            Io::File(_) => None,
        }
    }
}

/// Resolves one descriptor of the process identified by `parent`.
///
/// `file` descriptors become a [`FileIo`]; `process` descriptors are built
/// recursively with `parent` recorded on the child.
pub fn resolve(
    builder: &GraphBuilder<'_>,
    parent: Uuid,
    descriptor: &InputDescriptor,
) -> Result<Io> {
    match descriptor.kind.as_str() {
        "file" => {
            let uri = descriptor.uri()?;
            let mut options = descriptor.fields.clone();
            options.remove("uri");
            let file = FileIo::new(uri, options);
            log::debug!("resolved {:?} file input {}", file.kind, file.uri);
            Ok(Io::File(file))
        }
        "process" => {
            let (name, spec) = descriptor.nested_process()?;
            let child = builder.build(&name, Some(&spec), Some(parent))?;
            Ok(Io::Process(ProcessIo::new(child)))
        }
        other => Err(GraphError::UnsupportedIoKind(other.to_string())),
    }
}
