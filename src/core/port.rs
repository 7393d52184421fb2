//! Typed attachment points on a [`Task`](crate::core::task::Task).
//!
//! A port is described statically by a [`PortDescriptor`] (name, direction and
//! the capabilities it supports) and instantiated once per owning task. The
//! instance keeps a weak back-reference to the stream it is bound to; the
//! stream itself is owned by whoever made the connection.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::core::error::{GraphError, Result};
use crate::core::stream::{Capability, Endpoint, SharedStream, Stream, capability_mismatch};

/// Whether a port is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

impl PortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortDirection::Input => "input",
            PortDirection::Output => "output",
        }
    }
}

/// Static descriptor for a port type.
#[derive(Debug)]
pub struct PortDescriptor {
    pub name: &'static str,
    pub direction: PortDirection,
    pub capabilities: &'static [Capability],
}

impl PortDescriptor {
    pub const fn input(name: &'static str, capabilities: &'static [Capability]) -> Self {
        Self {
            name,
            direction: PortDirection::Input,
            capabilities,
        }
    }

    pub const fn output(name: &'static str, capabilities: &'static [Capability]) -> Self {
        Self {
            name,
            direction: PortDirection::Output,
            capabilities,
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// A port instance owned by exactly one task.
pub struct Port {
    descriptor: &'static PortDescriptor,
    owner: String,
    stream: Option<Weak<RefCell<Stream>>>,
}

impl Port {
    pub(crate) fn new(descriptor: &'static PortDescriptor, owner: String) -> Self {
        Port {
            descriptor,
            owner,
            stream: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn direction(&self) -> PortDirection {
        self.descriptor.direction
    }

    pub fn descriptor(&self) -> &'static PortDescriptor {
        self.descriptor
    }

    /// Identifier of the task that owns this port.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Capabilities an input port accepts. Empty for output ports.
    pub fn accepts(&self) -> HashSet<Capability> {
        match self.direction() {
            PortDirection::Input => self.descriptor.capabilities.iter().copied().collect(),
            PortDirection::Output => HashSet::new(),
        }
    }

    /// Capabilities an output port emits. Empty for input ports.
    pub fn emits(&self) -> HashSet<Capability> {
        match self.direction() {
            PortDirection::Output => self.descriptor.capabilities.iter().copied().collect(),
            PortDirection::Input => HashSet::new(),
        }
    }

    /// Records `stream` as the stream this port reads from or writes to.
    ///
    /// The port must be the stream's source (output ports) or sink (input
    /// ports) as recorded when the stream was created.
    pub fn bind(&mut self, stream: &SharedStream) -> Result<()> {
        {
            let stream = stream.borrow();
            self.check_capability(stream.capability())?;
            let expected = match self.direction() {
                PortDirection::Input => stream.sink(),
                PortDirection::Output => stream.source(),
            };
            if *expected != self.endpoint() {
                return Err(GraphError::EndpointMismatch {
                    port: self.qualified_name(),
                    from: stream.source().to_string(),
                    to: stream.sink().to_string(),
                });
            }
        }
        self.stream = Some(Rc::downgrade(stream));
        Ok(())
    }

    /// The bound stream, if any is bound and still alive.
    pub fn get(&self) -> Option<SharedStream> {
        self.stream.as_ref().and_then(Weak::upgrade)
    }

    /// Writes through the bound stream.
    pub fn write(&self, value: crate::core::Payload) -> Result<bool> {
        self.expect_direction(PortDirection::Output)?;
        let stream = self.live_stream()?;
        let written = stream.borrow_mut().write(value);
        Ok(written)
    }

    /// Reads through the bound stream.
    pub fn read(&self) -> Result<Option<crate::core::Payload>> {
        self.expect_direction(PortDirection::Input)?;
        let stream = self.live_stream()?;
        let value = stream.borrow_mut().read();
        Ok(value)
    }

    fn live_stream(&self) -> Result<SharedStream> {
        self.get()
            .ok_or_else(|| GraphError::UnboundPort(self.qualified_name()))
    }

    pub(crate) fn check_capability(&self, capability: Capability) -> Result<()> {
        if self.descriptor.supports(capability) {
            Ok(())
        } else {
            Err(capability_mismatch(self, capability))
        }
    }

    pub(crate) fn expect_direction(&self, expected: PortDirection) -> Result<()> {
        if self.direction() == expected {
            Ok(())
        } else {
            Err(GraphError::DirectionMismatch {
                port: self.qualified_name(),
                expected: expected.as_str(),
                found: self.direction().as_str(),
            })
        }
    }

    pub(crate) fn endpoint(&self) -> Endpoint {
        Endpoint {
            task: self.owner.clone(),
            port: self.descriptor.name,
        }
    }

    fn qualified_name(&self) -> String {
        format!("{}:{}", self.owner, self.descriptor.name)
    }
}

impl fmt::Debug for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port")
            .field("name", &self.descriptor.name)
            .field("direction", &self.descriptor.direction)
            .field("owner", &self.owner)
            .field("bound", &self.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stream::StreamBehaviour;
    use crate::core::task::{Task, TaskDescriptor};

    static VECTOR_OUT: PortDescriptor =
        PortDescriptor::output("features", &[Capability::Vector, Capability::Json]);
    static VECTOR_IN: PortDescriptor = PortDescriptor::input("features", &[Capability::Vector]);
    static RASTER_IN: PortDescriptor = PortDescriptor::input("tiles", &[Capability::Raster]);
    static SOURCE: TaskDescriptor = TaskDescriptor::new("Source", &[], &[&VECTOR_OUT]);
    static SINK: TaskDescriptor = TaskDescriptor::new("Sink", &[&VECTOR_IN, &RASTER_IN], &[]);

    struct Kind(Capability);

    impl StreamBehaviour for Kind {
        fn capability(&self) -> Capability {
            self.0
        }
    }

    #[test]
    fn test_declared_sets_by_direction() {
        let source = Task::new(&SOURCE);
        let output = source.get_output("features").unwrap();
        assert_eq!(
            output.emits(),
            HashSet::from([Capability::Vector, Capability::Json])
        );
        assert!(output.accepts().is_empty());

        let sink = Task::new(&SINK);
        let input = sink.get_input("tiles").unwrap();
        assert_eq!(input.accepts(), HashSet::from([Capability::Raster]));
        assert!(input.emits().is_empty());
    }

    #[test]
    fn test_bind_accepts_declared_capability() {
        let source = Task::new(&SOURCE);
        let mut sink = Task::new(&SINK);
        let stream = Stream::new(
            Kind(Capability::Vector),
            source.get_output("features").unwrap(),
            sink.get_input("features").unwrap(),
        )
        .unwrap()
        .shared();

        sink.set_input("features", &stream).unwrap();
        let bound = sink.get_input("features").unwrap().get().unwrap();
        assert!(Rc::ptr_eq(&bound, &stream));
    }

    #[test]
    fn test_bind_rejects_foreign_capability() {
        let source = Task::new(&SOURCE);
        let mut sink = Task::new(&SINK);
        let stream = Stream::new(
            Kind(Capability::Vector),
            source.get_output("features").unwrap(),
            sink.get_input("features").unwrap(),
        )
        .unwrap()
        .shared();

        let err = sink.set_input("tiles", &stream).unwrap_err();
        match err {
            GraphError::CapabilityMismatch {
                capability,
                declared,
                ..
            } => {
                assert_eq!(capability, Capability::Vector);
                assert_eq!(declared, vec![Capability::Raster]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(sink.get_input("tiles").unwrap().get().is_none());
    }

    #[test]
    fn test_stream_construction_checks_capability() {
        let source = Task::new(&SOURCE);
        let sink = Task::new(&SINK);
        let err = Stream::new(
            Kind(Capability::Raster),
            source.get_output("features").unwrap(),
            sink.get_input("tiles").unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::CapabilityMismatch { .. }));
    }

    #[test]
    fn test_unbound_port_is_empty() {
        let sink = Task::new(&SINK);
        let input = sink.get_input("features").unwrap();
        assert!(input.get().is_none());
        assert!(matches!(input.read(), Err(GraphError::UnboundPort(_))));
    }

    #[test]
    fn test_binding_does_not_keep_stream_alive() {
        let source = Task::new(&SOURCE);
        let mut sink = Task::new(&SINK);
        let stream = Stream::new(
            Kind(Capability::Vector),
            source.get_output("features").unwrap(),
            sink.get_input("features").unwrap(),
        )
        .unwrap()
        .shared();
        sink.set_input("features", &stream).unwrap();

        drop(stream);
        assert!(sink.get_input("features").unwrap().get().is_none());
    }

    #[test]
    fn test_bind_rejects_port_outside_connection() {
        static EITHER_IN: PortDescriptor = PortDescriptor::input("either", &[Capability::Vector]);
        static WIDE_SINK: TaskDescriptor =
            TaskDescriptor::new("WideSink", &[&VECTOR_IN, &EITHER_IN], &[]);

        let mut source = Task::new(&SOURCE);
        let mut sink = Task::new(&WIDE_SINK);
        let mut intruder = Task::new(&WIDE_SINK);
        let stream = source
            .connect("features", &mut sink, "features", Kind(Capability::Vector))
            .unwrap();

        let err = intruder.set_input("features", &stream).unwrap_err();
        assert!(matches!(err, GraphError::EndpointMismatch { .. }));
        assert!(intruder.get_input("features").unwrap().get().is_none());

        let err = sink.set_input("either", &stream).unwrap_err();
        assert!(matches!(err, GraphError::EndpointMismatch { .. }));

        let mut other_source = Task::new(&SOURCE);
        let err = other_source.set_output("features", &stream).unwrap_err();
        assert!(matches!(err, GraphError::EndpointMismatch { .. }));

        source
            .get_output("features")
            .unwrap()
            .write(serde_json::json!(1))
            .unwrap();
        assert_eq!(
            sink.get_input("features").unwrap().read().unwrap(),
            Some(serde_json::json!(1))
        );
    }
}
