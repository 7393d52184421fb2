//! Types every registry starts with.
//!
//! [`register_builtins`] is the only startup registration step; nothing is
//! registered as a side effect of a type merely existing.

use crate::core::Args;
use crate::core::error::{GraphError, Result};
use crate::core::io::{FileKind, Io};
use crate::core::port::PortDescriptor;
use crate::core::process::{ProcessDescriptor, ProcessLogic, Resource};
use crate::core::registry::Registry;
use crate::core::stream::{Capability, StreamBehaviour, StreamDescriptor};
use crate::core::task::{Task, TaskDescriptor};

const RESOURCE_CAPABILITIES: &[Capability] =
    &[Capability::Json, Capability::Vector, Capability::Raster];

pub static RESOURCE_INPUT: PortDescriptor =
    PortDescriptor::input("resource", RESOURCE_CAPABILITIES);
pub static RESOURCE_OUTPUT: PortDescriptor =
    PortDescriptor::output("resource", RESOURCE_CAPABILITIES);

/// Emits one resource.
pub static READ_TASK: TaskDescriptor = TaskDescriptor::new("ReadTask", &[], &[&RESOURCE_OUTPUT]);
/// Consumes one resource.
pub static WRITE_TASK: TaskDescriptor = TaskDescriptor::new("WriteTask", &[&RESOURCE_INPUT], &[]);

/// Carries arbitrary JSON values.
pub struct ValueStream;

impl StreamBehaviour for ValueStream {
    fn capability(&self) -> Capability {
        Capability::Json
    }
}

/// Carries vector features.
pub struct VectorStream;

impl StreamBehaviour for VectorStream {
    fn capability(&self) -> Capability {
        Capability::Vector
    }
}

/// Carries raster data.
pub struct RasterStream;

impl StreamBehaviour for RasterStream {
    fn capability(&self) -> Capability {
        Capability::Raster
    }
}

pub const VALUE_STREAM: StreamDescriptor = StreamDescriptor {
    name: "ValueStream",
    capability: Capability::Json,
    factory: || Box::new(ValueStream),
};

pub const VECTOR_STREAM: StreamDescriptor = StreamDescriptor {
    name: "VectorStream",
    capability: Capability::Vector,
    factory: || Box::new(VectorStream),
};

pub const RASTER_STREAM: StreamDescriptor = StreamDescriptor {
    name: "RasterStream",
    capability: Capability::Raster,
    factory: || Box::new(RasterStream),
};

/// Forwards its first input as its output.
///
/// The resource is handed from a [`READ_TASK`] to a [`WRITE_TASK`] through a
/// stream whose kind matches the resource.
#[derive(Clone, Debug, Default)]
pub struct PassthroughLogic;

impl ProcessLogic for PassthroughLogic {
    fn compute(&self, _args: Option<&Args>, inputs: &[Io]) -> Result<Resource> {
        let resource = inputs
            .first()
            .and_then(Io::data)
            .ok_or_else(|| compute_error("no input data to forward"))?;

        let descriptor = match &resource {
            Resource::File(file) if file.kind == FileKind::Vector => VECTOR_STREAM,
            Resource::File(_) => RASTER_STREAM,
            Resource::Data { .. } => VALUE_STREAM,
        };

        let mut reader = Task::new(&READ_TASK);
        let mut writer = Task::new(&WRITE_TASK);
        let _connection =
            reader.connect_boxed("resource", &mut writer, "resource", descriptor.create())?;

        reader
            .get_output("resource")?
            .write(serde_json::to_value(&resource)?)?;
        let value = writer
            .get_input("resource")?
            .read()?
            .ok_or_else(|| compute_error("stream yielded no value"))?;
        Ok(serde_json::from_value(value)?)
    }

    fn min_inputs(&self) -> usize {
        1
    }

    fn clone_box(&self) -> Box<dyn ProcessLogic> {
        Box::new(self.clone())
    }
}

pub const PASSTHROUGH_PROCESS: ProcessDescriptor = ProcessDescriptor {
    name: "PassthroughProcess",
    factory: || Box::new(PassthroughLogic),
};

fn compute_error(message: &str) -> GraphError {
    GraphError::Compute {
        process: PASSTHROUGH_PROCESS.name.to_string(),
        message: message.to_string(),
    }
}

/// Registers the built-in capabilities, ports, tasks, streams and processes.
pub fn register_builtins(registry: &mut Registry) -> Result<()> {
    registry.register_capability("Json", Capability::Json)?;
    registry.register_capability("Vector", Capability::Vector)?;
    registry.register_capability("Raster", Capability::Raster)?;

    registry.register_port("ResourceInput", &RESOURCE_INPUT)?;
    registry.register_port("ResourceOutput", &RESOURCE_OUTPUT)?;

    registry.register_task(&READ_TASK)?;
    registry.register_task(&WRITE_TASK)?;

    registry.register_stream(VALUE_STREAM)?;
    registry.register_stream(VECTOR_STREAM)?;
    registry.register_stream(RASTER_STREAM)?;

    registry.register_process(PASSTHROUGH_PROCESS)?;
    Ok(())
}
