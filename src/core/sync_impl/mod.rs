//! Synchronous, depth-first evaluation of a built process tree.
//!
//! Nested processes are computed before the process that consumes them, and
//! sibling inputs are computed in declared order. The first failure aborts
//! the whole run.

use crate::core::error::Result;
use crate::core::io::Io;
use crate::core::process::Process;
use crate::core::telemetry::{Telemetry, TraceEntry};

/// Computes `process` and every nested process feeding it.
pub fn run(process: &mut Process) -> Result<()> {
    evaluate(process, None)
}

/// Same as [`run`], recording one trace entry per computed process, children first.
pub fn run_with_telemetry(process: &mut Process, telemetry: &dyn Telemetry) -> Result<()> {
    let result = evaluate(process, Some(telemetry));
    telemetry.flush();
    result
}

fn evaluate(process: &mut Process, telemetry: Option<&dyn Telemetry>) -> Result<()> {
    for input in process.inputs_mut() {
        if let Io::Process(nested) = input {
            evaluate(nested.process_mut(), telemetry)?;
        }
    }

    process.compute()?;

    if let Some(t) = telemetry {
        t.record(TraceEntry::for_process(process));
    }
    Ok(())
}
