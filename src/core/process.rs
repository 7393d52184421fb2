use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::{GraphError, Result};
use crate::core::io::{FileIo, Io};
use crate::core::{Args, AsAny, Payload};

/// What a computed process produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resource", rename_all = "lowercase")]
pub enum Resource {
    /// A file written (or forwarded) by the process.
    File(FileIo),
    /// An in-memory result.
    Data { value: Payload },
}

impl Resource {
    pub fn location(&self) -> Option<&str> {
        match self {
            Resource::File(file) => Some(&file.uri),
            Resource::Data { .. } => None,
        }
    }
}

/// Lifecycle of a process node. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Created from the registry, inputs not yet resolved.
    Unbuilt,
    /// Args and inputs attached; ready to compute.
    Built,
    /// Output produced; immutable from here on.
    Computed,
}

impl ProcessState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::Unbuilt => "unbuilt",
            ProcessState::Built => "built",
            ProcessState::Computed => "computed",
        }
    }
}

/// The computation a process type performs once its inputs are ready.
pub trait ProcessLogic: AsAny + Send + Sync + 'static {
    /// Produce the process's output from its args and evaluated inputs.
    fn compute(&self, args: Option<&Args>, inputs: &[Io]) -> Result<Resource>;

    /// Fewest inputs this process can work with.
    fn min_inputs(&self) -> usize {
        0
    }

    /// Create a boxed clone of this trait object.
    fn clone_box(&self) -> Box<dyn ProcessLogic>;
}

impl Clone for Box<dyn ProcessLogic> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Registry entry for a process type.
#[derive(Clone, Copy)]
pub struct ProcessDescriptor {
    pub name: &'static str,
    pub factory: fn() -> Box<dyn ProcessLogic>,
}

impl ProcessDescriptor {
    pub fn create(&self) -> Box<dyn ProcessLogic> {
        (self.factory)()
    }
}

impl fmt::Debug for ProcessDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessDescriptor")
            .field("name", &self.name)
            .finish()
    }
}

/// A node of the process tree.
#[derive(Clone)]
pub struct Process {
    id: Uuid,
    parent: Option<Uuid>,
    name: String,
    type_name: &'static str,
    args: Option<Args>,
    inputs: Vec<Io>,
    output: Option<Resource>,
    state: ProcessState,
    behaviour: Box<dyn ProcessLogic>,
}

impl Process {
    pub(crate) fn new(descriptor: &ProcessDescriptor, name: &str, parent: Option<Uuid>) -> Self {
        Process {
            id: Uuid::new_v4(),
            parent,
            name: name.to_string(),
            type_name: descriptor.name,
            args: None,
            inputs: Vec::new(),
            output: None,
            state: ProcessState::Unbuilt,
            behaviour: descriptor.create(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Identity of the process this one feeds, if any.
    pub fn parent(&self) -> Option<Uuid> {
        self.parent
    }

    /// The name the request used, e.g. `within`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The registered type the name resolved to, e.g. `WithinProcess`.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn args(&self) -> Option<&Args> {
        self.args.as_ref()
    }

    pub fn inputs(&self) -> &[Io] {
        &self.inputs
    }

    pub fn output(&self) -> Option<&Resource> {
        self.output.as_ref()
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn logic(&self) -> &dyn ProcessLogic {
        &*self.behaviour
    }

    /// Downcasts the process's logic to its concrete type.
    pub fn logic_as<T: ProcessLogic>(&self) -> Option<&T> {
        self.logic().as_any().downcast_ref::<T>()
    }

    /// Nested processes feeding this one, in input order.
    pub fn children(&self) -> impl Iterator<Item = &Process> {
        self.inputs.iter().filter_map(Io::as_process)
    }

    /// Number of levels in the tree rooted here.
    pub fn depth(&self) -> usize {
        1 + self.children().map(Process::depth).max().unwrap_or(0)
    }

    /// Attaches resolved args and inputs. Only valid once, on an unbuilt node.
    pub(crate) fn attach(&mut self, args: Option<Args>, inputs: Vec<Io>) -> Result<()> {
        self.expect_state(ProcessState::Unbuilt, "parse")?;
        self.args = args;
        self.inputs = inputs;
        self.state = ProcessState::Built;
        Ok(())
    }

    pub(crate) fn inputs_mut(&mut self) -> &mut [Io] {
        &mut self.inputs
    }

    pub(crate) fn take_inputs(&mut self) -> Vec<Io> {
        std::mem::take(&mut self.inputs)
    }

    pub(crate) fn restore_inputs(&mut self, inputs: Vec<Io>) {
        self.inputs = inputs;
    }

    /// Runs the process's own computation. Nested inputs must already be computed.
    pub(crate) fn compute(&mut self) -> Result<&Resource> {
        self.expect_state(ProcessState::Built, "compute")?;
        if let Some(pending) = self.children().find(|c| c.state != ProcessState::Computed) {
            return Err(GraphError::InvalidState {
                id: pending.id,
                state: pending.state.as_str(),
                action: "feed its parent",
            });
        }

        log::debug!("computing {} ({}) {}", self.name, self.type_name, self.id);
        let output = self.behaviour.compute(self.args.as_ref(), &self.inputs)?;
        self.state = ProcessState::Computed;
        Ok(&*self.output.insert(output))
    }

    fn expect_state(&self, expected: ProcessState, action: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(GraphError::InvalidState {
                id: self.id,
                state: self.state.as_str(),
                action,
            })
        }
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("args", &self.args)
            .field("inputs", &self.inputs)
            .field("output", &self.output)
            .field("state", &self.state)
            .finish()
    }
}
