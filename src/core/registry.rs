use std::collections::HashMap;
use std::sync::OnceLock;

use crate::core::builtins::register_builtins;
use crate::core::error::{GraphError, Result};
use crate::core::port::PortDescriptor;
use crate::core::process::ProcessDescriptor;
use crate::core::stream::{Capability, StreamDescriptor};
use crate::core::task::TaskDescriptor;

/// A constructible type known to the registry.
#[derive(Debug, Clone, Copy)]
pub enum RegistryEntry {
    Capability(Capability),
    Port(&'static PortDescriptor),
    Task(&'static TaskDescriptor),
    Stream(StreamDescriptor),
    Process(ProcessDescriptor),
}

impl RegistryEntry {
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryEntry::Capability(_) => "capability",
            RegistryEntry::Port(_) => "port",
            RegistryEntry::Task(_) => "task",
            RegistryEntry::Stream(_) => "stream",
            RegistryEntry::Process(_) => "process",
        }
    }
}

/// Name to type table used to construct graph pieces from request strings.
///
/// Populated once at startup and only read afterwards. Names must be unique:
/// registering a name twice is an error rather than an overwrite.
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<String, RegistryEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the crate's built-in types.
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        register_builtins(&mut registry)?;
        Ok(registry)
    }

    pub fn register(&mut self, name: impl Into<String>, entry: RegistryEntry) -> Result<()> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(GraphError::DuplicateName(name));
        }
        log::debug!("registered {} '{}'", entry.kind(), name);
        self.entries.insert(name, entry);
        Ok(())
    }

    pub fn register_capability(
        &mut self,
        name: impl Into<String>,
        capability: Capability,
    ) -> Result<()> {
        self.register(name, RegistryEntry::Capability(capability))
    }

    pub fn register_port(
        &mut self,
        name: impl Into<String>,
        port: &'static PortDescriptor,
    ) -> Result<()> {
        self.register(name, RegistryEntry::Port(port))
    }

    pub fn register_task(&mut self, task: &'static TaskDescriptor) -> Result<()> {
        self.register(task.name, RegistryEntry::Task(task))
    }

    pub fn register_stream(&mut self, stream: StreamDescriptor) -> Result<()> {
        self.register(stream.name, RegistryEntry::Stream(stream))
    }

    pub fn register_process(&mut self, process: ProcessDescriptor) -> Result<()> {
        self.register(process.name, RegistryEntry::Process(process))
    }

    pub fn get(&self, name: &str) -> Result<&RegistryEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| GraphError::UnknownType(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn get_capability(&self, name: &str) -> Result<Capability> {
        match self.get(name)? {
            RegistryEntry::Capability(capability) => Ok(*capability),
            other => Err(mismatch(name, "capability", other)),
        }
    }

    pub fn get_port(&self, name: &str) -> Result<&'static PortDescriptor> {
        match self.get(name)? {
            RegistryEntry::Port(port) => Ok(*port),
            other => Err(mismatch(name, "port", other)),
        }
    }

    pub fn get_task(&self, name: &str) -> Result<&'static TaskDescriptor> {
        match self.get(name)? {
            RegistryEntry::Task(task) => Ok(*task),
            other => Err(mismatch(name, "task", other)),
        }
    }

    pub fn get_stream(&self, name: &str) -> Result<StreamDescriptor> {
        match self.get(name)? {
            RegistryEntry::Stream(stream) => Ok(*stream),
            other => Err(mismatch(name, "stream", other)),
        }
    }

    pub fn get_process(&self, name: &str) -> Result<ProcessDescriptor> {
        match self.get(name)? {
            RegistryEntry::Process(process) => Ok(*process),
            other => Err(mismatch(name, "process", other)),
        }
    }
}

fn mismatch(name: &str, expected: &'static str, found: &RegistryEntry) -> GraphError {
    GraphError::TypeMismatch {
        name: name.to_string(),
        expected,
        found: found.kind(),
    }
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// The process-wide registry of built-in types, initialised on first use.
pub fn global() -> Result<&'static Registry> {
    if let Some(registry) = GLOBAL.get() {
        return Ok(registry);
    }
    let registry = Registry::with_builtins()?;
    Ok(GLOBAL.get_or_init(|| registry))
}
