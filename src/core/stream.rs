use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::core::Payload;
use crate::core::error::{GraphError, Result};
use crate::core::port::{Port, PortDirection};

/// Tag identifying the kind of data a stream carries.
///
/// Ports declare the set of capabilities they accept or emit, and a stream can
/// only be bound to a port whose set contains the stream's capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Arbitrary JSON values.
    Json,
    /// Vector features (points, lines, polygons).
    Vector,
    /// Raster tiles or bands.
    Raster,
    /// A user-defined kind, identified by name.
    Custom(&'static str),
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Json => write!(f, "Json"),
            Capability::Vector => write!(f, "Vector"),
            Capability::Raster => write!(f, "Raster"),
            Capability::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Behaviour of a concrete stream kind.
///
/// The [`Stream`] owns the pending value and the lifecycle; implementors only
/// decide what a read yields and what teardown work `flush` performs.
pub trait StreamBehaviour: 'static {
    /// The capability this kind of stream embodies.
    fn capability(&self) -> Capability;

    /// Produce the value for a read, given the pending value taken from the stream.
    fn read(&mut self, pending: Option<Payload>) -> Option<Payload> {
        pending
    }

    /// Teardown hook, invoked exactly once by [`Stream::close`].
    fn flush(&mut self) {}
}

/// Identifies one end of a stream: the owning task and the port name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub task: String,
    pub port: &'static str,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.task, self.port)
    }
}

/// A stream shared between the connection owner and the two bound ports.
pub type SharedStream = Rc<RefCell<Stream>>;

/// One-shot conduit between one output port and one input port.
///
/// Holds at most one pending value. Dropping a stream closes it, so `flush`
/// runs exactly once per instance whether or not `close` was called.
pub struct Stream {
    source: Endpoint,
    sink: Endpoint,
    pending: Option<Payload>,
    closed: bool,
    behaviour: Box<dyn StreamBehaviour>,
}

impl Stream {
    /// Creates a stream from `source` (an output port) to `sink` (an input port).
    ///
    /// Both ports must support the behaviour's capability.
    pub fn new<B: StreamBehaviour>(behaviour: B, source: &Port, sink: &Port) -> Result<Self> {
        Self::from_boxed(Box::new(behaviour), source, sink)
    }

    /// Same as [`Stream::new`] for a behaviour produced by a registry factory.
    pub fn from_boxed(
        behaviour: Box<dyn StreamBehaviour>,
        source: &Port,
        sink: &Port,
    ) -> Result<Self> {
        source.expect_direction(PortDirection::Output)?;
        sink.expect_direction(PortDirection::Input)?;

        let capability = behaviour.capability();
        source.check_capability(capability)?;
        sink.check_capability(capability)?;

        Ok(Stream {
            source: source.endpoint(),
            sink: sink.endpoint(),
            pending: None,
            closed: false,
            behaviour,
        })
    }

    /// Wraps the stream for sharing with the ports it connects.
    pub fn shared(self) -> SharedStream {
        Rc::new(RefCell::new(self))
    }

    pub fn capability(&self) -> Capability {
        self.behaviour.capability()
    }

    pub fn source(&self) -> &Endpoint {
        &self.source
    }

    pub fn sink(&self) -> &Endpoint {
        &self.sink
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Stores `value` as the pending payload.
    ///
    /// A pending value that was never read is overwritten. Returns `false` if
    /// the stream is already closed.
    pub fn write(&mut self, value: Payload) -> bool {
        if self.closed {
            log::warn!(
                "write to closed stream {}:{} -> {}:{} dropped",
                self.source.task,
                self.source.port,
                self.sink.task,
                self.sink.port
            );
            return false;
        }
        if self.pending.is_some() {
            log::warn!(
                "stream {}:{} -> {}:{} overwrote an unread value",
                self.source.task,
                self.source.port,
                self.sink.task,
                self.sink.port
            );
        }
        self.pending = Some(value);
        true
    }

    /// Takes the pending value. Returns `None` once it has been consumed.
    pub fn read(&mut self) -> Option<Payload> {
        if self.closed {
            return None;
        }
        let pending = self.pending.take();
        self.behaviour.read(pending)
    }

    /// Runs the behaviour's teardown hook.
    pub fn flush(&mut self) {
        self.behaviour.flush();
    }

    /// Flushes and marks the stream closed. Later calls do nothing.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.flush();
        self.closed = true;
        log::debug!(
            "closed stream {}:{} -> {}:{}",
            self.source.task,
            self.source.port,
            self.sink.task,
            self.sink.port
        );
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("capability", &self.capability())
            .field("source", &self.source)
            .field("sink", &self.sink)
            .field("pending", &self.pending.is_some())
            .field("closed", &self.closed)
            .finish()
    }
}

/// Descriptor used to construct stream behaviours by registered name.
#[derive(Clone, Copy)]
pub struct StreamDescriptor {
    pub name: &'static str,
    pub capability: Capability,
    pub factory: fn() -> Box<dyn StreamBehaviour>,
}

impl StreamDescriptor {
    pub fn create(&self) -> Box<dyn StreamBehaviour> {
        (self.factory)()
    }
}

impl fmt::Debug for StreamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamDescriptor")
            .field("name", &self.name)
            .field("capability", &self.capability)
            .finish()
    }
}

/// Rejects a capability that a port does not declare.
pub(crate) fn capability_mismatch(port: &Port, capability: Capability) -> GraphError {
    GraphError::CapabilityMismatch {
        port: port.name().to_string(),
        capability,
        declared: port.descriptor().capabilities.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::port::PortDescriptor;
    use crate::core::task::{Task, TaskDescriptor};
    use serde_json::json;
    use std::cell::Cell;

    const ZERO: Capability = Capability::Custom("Zero");

    static OUT: PortDescriptor = PortDescriptor::output("output port", &[ZERO]);
    static IN: PortDescriptor = PortDescriptor::input("input port", &[ZERO]);
    static PRODUCER: TaskDescriptor = TaskDescriptor::new("Producer", &[], &[&OUT]);
    static CONSUMER: TaskDescriptor = TaskDescriptor::new("Consumer", &[&IN], &[]);

    /// Counts flushes into a shared cell.
    struct CountingStream {
        flushes: Rc<Cell<usize>>,
    }

    impl StreamBehaviour for CountingStream {
        fn capability(&self) -> Capability {
            ZERO
        }

        fn flush(&mut self) {
            self.flushes.set(self.flushes.get() + 1);
        }
    }

    struct ZeroStream;

    impl StreamBehaviour for ZeroStream {
        fn capability(&self) -> Capability {
            ZERO
        }

        fn read(&mut self, _pending: Option<Payload>) -> Option<Payload> {
            Some(json!(0))
        }
    }

    fn counting_stream(flushes: &Rc<Cell<usize>>) -> Stream {
        let producer = Task::new(&PRODUCER);
        let consumer = Task::new(&CONSUMER);
        Stream::new(
            CountingStream {
                flushes: flushes.clone(),
            },
            producer.get_output("output port").unwrap(),
            consumer.get_input("input port").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_write_then_read_is_one_shot() {
        let flushes = Rc::new(Cell::new(0));
        let mut stream = counting_stream(&flushes);

        assert!(stream.write(json!({"feature": 1})));
        assert_eq!(stream.read(), Some(json!({"feature": 1})));
        assert_eq!(stream.read(), None);
    }

    #[test]
    fn test_second_write_overwrites_pending() {
        let flushes = Rc::new(Cell::new(0));
        let mut stream = counting_stream(&flushes);

        assert!(stream.write(json!("first")));
        assert!(stream.write(json!("second")));
        assert_eq!(stream.read(), Some(json!("second")));
        assert_eq!(stream.read(), None);
    }

    #[test]
    fn test_close_flushes_exactly_once() {
        let flushes = Rc::new(Cell::new(0));
        let mut stream = counting_stream(&flushes);
        assert_eq!(flushes.get(), 0);

        stream.close();
        assert_eq!(flushes.get(), 1);
        assert!(stream.is_closed());

        stream.close();
        assert_eq!(flushes.get(), 1);

        drop(stream);
        assert_eq!(flushes.get(), 1);
    }

    #[test]
    fn test_drop_closes_stream() {
        let flushes = Rc::new(Cell::new(0));
        let stream = counting_stream(&flushes);
        drop(stream);
        assert_eq!(flushes.get(), 1);

        let second = counting_stream(&flushes);
        assert_eq!(flushes.get(), 1);
        drop(second);
        assert_eq!(flushes.get(), 2);
    }

    #[test]
    fn test_closed_stream_rejects_io() {
        let flushes = Rc::new(Cell::new(0));
        let mut stream = counting_stream(&flushes);
        stream.close();

        assert!(!stream.write(json!(1)));
        assert_eq!(stream.read(), None);
    }

    #[test]
    fn test_behaviour_controls_read() {
        let producer = Task::new(&PRODUCER);
        let consumer = Task::new(&CONSUMER);
        let mut stream = Stream::new(
            ZeroStream,
            producer.get_output("output port").unwrap(),
            consumer.get_input("input port").unwrap(),
        )
        .unwrap();

        assert_eq!(stream.read(), Some(json!(0)));
        assert_eq!(stream.read(), Some(json!(0)));
    }

    #[test]
    fn test_endpoints_must_face_each_other() {
        let producer = Task::new(&PRODUCER);
        let consumer = Task::new(&CONSUMER);
        let input = consumer.get_input("input port").unwrap();
        let output = producer.get_output("output port").unwrap();

        let err = Stream::new(ZeroStream, input, output).unwrap_err();
        assert!(matches!(err, GraphError::DirectionMismatch { .. }));
    }

    #[test]
    fn test_endpoints_recorded() {
        let producer = Task::new(&PRODUCER);
        let consumer = Task::new(&CONSUMER);
        let stream = Stream::new(
            ZeroStream,
            producer.get_output("output port").unwrap(),
            consumer.get_input("input port").unwrap(),
        )
        .unwrap();

        assert_eq!(stream.source().port, "output port");
        assert_eq!(stream.sink().port, "input port");
        assert_eq!(stream.source().task, producer.id());
        assert_eq!(stream.sink().task, consumer.id());
    }
}
