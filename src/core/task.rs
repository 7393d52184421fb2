use std::fmt;

use crate::core::error::{GraphError, Result};
use crate::core::port::{Port, PortDescriptor};
use crate::core::stream::{SharedStream, Stream, StreamBehaviour};

/// Static declaration of a task type: its name and ordered port types.
#[derive(Debug)]
pub struct TaskDescriptor {
    pub name: &'static str,
    pub inputs: &'static [&'static PortDescriptor],
    pub outputs: &'static [&'static PortDescriptor],
}

impl TaskDescriptor {
    pub const fn new(
        name: &'static str,
        inputs: &'static [&'static PortDescriptor],
        outputs: &'static [&'static PortDescriptor],
    ) -> Self {
        Self {
            name,
            inputs,
            outputs,
        }
    }
}

/// A unit of work exposing the ports its descriptor declares.
///
/// Two tasks are wired by binding one stream to an output port of the first
/// and an input port of the second; the first then writes and the second reads.
pub struct Task {
    id: String,
    descriptor: &'static TaskDescriptor,
    inputs: Vec<Port>,
    outputs: Vec<Port>,
}

impl Task {
    /// Instantiates one port per declared port type, in declaration order.
    pub fn new(descriptor: &'static TaskDescriptor) -> Self {
        let id = format!("{}-{}", descriptor.name, uuid::Uuid::new_v4().simple());
        let inputs = descriptor
            .inputs
            .iter()
            .map(|port| Port::new(port, id.clone()))
            .collect();
        let outputs = descriptor
            .outputs
            .iter()
            .map(|port| Port::new(port, id.clone()))
            .collect();
        Task {
            id,
            descriptor,
            inputs,
            outputs,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn inputs(&self) -> &[Port] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Port] {
        &self.outputs
    }

    pub fn get_input(&self, name: &str) -> Result<&Port> {
        self.inputs
            .iter()
            .find(|port| port.name() == name)
            .ok_or_else(|| unknown_port(self.descriptor.name, name))
    }

    pub fn get_output(&self, name: &str) -> Result<&Port> {
        self.outputs
            .iter()
            .find(|port| port.name() == name)
            .ok_or_else(|| unknown_port(self.descriptor.name, name))
    }

    /// Rebinds the named input port to `stream`.
    pub fn set_input(&mut self, name: &str, stream: &SharedStream) -> Result<()> {
        let task = self.descriptor.name;
        let port = self
            .inputs
            .iter_mut()
            .find(|port| port.name() == name)
            .ok_or_else(|| unknown_port(task, name))?;
        port.bind(stream)
    }

    /// Rebinds the named output port to `stream`.
    pub fn set_output(&mut self, name: &str, stream: &SharedStream) -> Result<()> {
        let task = self.descriptor.name;
        let port = self
            .outputs
            .iter_mut()
            .find(|port| port.name() == name)
            .ok_or_else(|| unknown_port(task, name))?;
        port.bind(stream)
    }

    /// Connects `output` on this task to `input` on `target` through a new stream.
    ///
    /// The returned handle owns the stream: the ports only hold weak references,
    /// so dropping the handle closes the connection.
    pub fn connect<B: StreamBehaviour>(
        &mut self,
        output: &str,
        target: &mut Task,
        input: &str,
        behaviour: B,
    ) -> Result<SharedStream> {
        self.connect_boxed(output, target, input, Box::new(behaviour))
    }

    /// Same as [`Task::connect`] for a behaviour produced by a registry factory.
    pub fn connect_boxed(
        &mut self,
        output: &str,
        target: &mut Task,
        input: &str,
        behaviour: Box<dyn StreamBehaviour>,
    ) -> Result<SharedStream> {
        let stream =
            Stream::from_boxed(behaviour, self.get_output(output)?, target.get_input(input)?)?
                .shared();
        self.set_output(output, &stream)?;
        target.set_input(input, &stream)?;
        log::debug!(
            "connected {}:{} -> {}:{}",
            self.id,
            output,
            target.id,
            input
        );
        Ok(stream)
    }
}

fn unknown_port(task: &str, port: &str) -> GraphError {
    GraphError::UnknownPort {
        task: task.to_string(),
        port: port.to_string(),
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish()
    }
}
