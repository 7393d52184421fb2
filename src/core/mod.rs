pub mod async_impl;
pub mod builder;
pub mod builtins;
pub mod error;
pub mod io;
pub mod port;
pub mod process;
pub mod registry;
pub mod request;
pub mod stream;
pub mod sync_impl;
pub mod task;
pub mod telemetry;
pub mod validation;

use std::any::Any;

/// The Alias for serde_json::Value, the value type moved through streams and args.
pub type Payload = serde_json::Value;

/// Argument mapping attached to a process by its request.
pub type Args = serde_json::Map<String, Payload>;

/// A helper trait that just provides the `as_any` method.
/// Needed for downcasting a process's boxed logic back to its concrete type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: 'static> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
