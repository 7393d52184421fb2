use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::Args;
use crate::core::io::Io;
use crate::core::process::Process;

/// A single entry in the execution trace: one computed process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub timestamp: u64,
    pub process_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub process_type: String,
    pub args: Option<Args>,
    /// Location of each input, in input order.
    pub inputs: Vec<Option<String>>,
    pub output: Option<String>,
}

impl TraceEntry {
    pub fn for_process(process: &Process) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        TraceEntry {
            timestamp,
            process_id: process.id(),
            parent_id: process.parent(),
            name: process.name().to_string(),
            process_type: process.type_name().to_string(),
            args: process.args().cloned(),
            inputs: process.inputs().iter().map(Io::location).collect(),
            output: process
                .output()
                .and_then(|resource| resource.location())
                .map(str::to_string),
        }
    }
}

/// Trait for recording execution traces.
pub trait Telemetry: Send + Sync {
    fn record(&self, entry: TraceEntry);
    fn flush(&self);
}

/// Simple in-memory collector for traces.
#[derive(Debug, Default)]
pub struct MemoryTelemetry {
    traces: Mutex<Vec<TraceEntry>>,
}

impl MemoryTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_traces(&self) -> Vec<TraceEntry> {
        match self.traces.lock() {
            Ok(traces) => traces.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Telemetry for MemoryTelemetry {
    fn record(&self, entry: TraceEntry) {
        match self.traces.lock() {
            Ok(mut traces) => traces.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }

    fn flush(&self) {
        // No-op for memory collector
    }
}
