//! Asynchronous evaluation of a built process tree.
//!
//! Independent sibling subtrees are evaluated concurrently; each process's own
//! computation runs on tokio's blocking pool. Every subtree owns its process
//! (and whatever tasks, ports and streams its computation creates), so nothing
//! is shared between concurrent evaluations. A child still finishes before its
//! parent computes, and input order is preserved.

use std::sync::Arc;

use futures::future::{BoxFuture, try_join_all};

use crate::core::error::{GraphError, Result};
use crate::core::io::{Io, ProcessIo};
use crate::core::process::Process;
use crate::core::telemetry::{Telemetry, TraceEntry};

/// Computes `process` and every nested process feeding it, returning the computed tree.
pub async fn run(process: Process) -> Result<Process> {
    evaluate(process, None).await
}

/// Same as [`run`], recording one trace entry per computed process.
pub async fn run_with_telemetry(
    process: Process,
    telemetry: Arc<dyn Telemetry>,
) -> Result<Process> {
    let result = evaluate(process, Some(telemetry.clone())).await;
    telemetry.flush();
    result
}

fn evaluate(
    mut process: Process,
    telemetry: Option<Arc<dyn Telemetry>>,
) -> BoxFuture<'static, Result<Process>> {
    Box::pin(async move {
        let inputs = process.take_inputs();
        let resolved = try_join_all(
            inputs
                .into_iter()
                .map(|input| evaluate_input(input, telemetry.clone())),
        )
        .await?;
        process.restore_inputs(resolved);

        tokio::task::spawn_blocking(move || -> Result<Process> {
            process.compute()?;
            if let Some(t) = telemetry {
                t.record(TraceEntry::for_process(&process));
            }
            Ok(process)
        })
        .await
        .map_err(|err| GraphError::Join(err.to_string()))?
    })
}

async fn evaluate_input(input: Io, telemetry: Option<Arc<dyn Telemetry>>) -> Result<Io> {
    match input {
        Io::Process(nested) => {
            let computed = evaluate(nested.into_process(), telemetry).await?;
            Ok(Io::Process(ProcessIo::new(computed)))
        }
        file => Ok(file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::GraphBuilder;
    use crate::core::process::{ProcessState, Resource};
    use crate::core::registry::Registry;
    use crate::core::telemetry::MemoryTelemetry;

    const REQUEST: &str = r#"{"data_inputs": [
        {"type": "process", "process": {
            "name": "passthrough",
            "data_inputs": [{"type": "process", "process": {
                "name": "passthrough",
                "data_inputs": [{"type": "file", "uri": "deep.shp"}]
            }}]
        }},
        {"type": "process", "process": {
            "name": "passthrough",
            "data_inputs": [{"type": "file", "uri": "shallow.tif"}]
        }}
    ]}"#;

    #[tokio::test]
    async fn test_async_run_matches_depth_first_result() {
        let registry = Registry::with_builtins().unwrap();
        let root = GraphBuilder::new(&registry)
            .build_json("passthrough", REQUEST)
            .unwrap();
        let root_id = root.id();

        let computed = run(root).await.unwrap();

        assert_eq!(computed.id(), root_id);
        assert_eq!(computed.state(), ProcessState::Computed);
        assert_eq!(computed.output().and_then(Resource::location), Some("deep.shp"));
        let children: Vec<_> = computed.children().collect();
        assert_eq!(children.len(), 2);
        assert!(children.iter().all(|c| c.state() == ProcessState::Computed));
        assert_eq!(
            children[1].output().and_then(Resource::location),
            Some("shallow.tif")
        );
    }

    #[tokio::test]
    async fn test_async_run_records_every_process() {
        let registry = Registry::with_builtins().unwrap();
        let root = GraphBuilder::new(&registry)
            .build_json("passthrough", REQUEST)
            .unwrap();
        let root_id = root.id();
        let telemetry = Arc::new(MemoryTelemetry::new());

        run_with_telemetry(root, telemetry.clone()).await.unwrap();

        let traces = telemetry.get_traces();
        assert_eq!(traces.len(), 4);
        assert_eq!(traces.last().map(|t| t.process_id), Some(root_id));
    }

    #[tokio::test]
    async fn test_async_run_propagates_failure() {
        let registry = Registry::with_builtins().unwrap();
        let root = GraphBuilder::new(&registry)
            .build_json(
                "passthrough",
                r#"{"data_inputs": [
                    {"type": "process", "process": {"name": "passthrough", "data_inputs": []}}
                ]}"#,
            )
            .unwrap();

        let err = run(root).await.unwrap_err();
        assert!(matches!(err, GraphError::Compute { .. }));
    }
}
