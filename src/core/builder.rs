use uuid::Uuid;

use crate::core::error::{GraphError, Result};
use crate::core::io::resolve;
use crate::core::process::Process;
use crate::core::registry::{self, Registry};
use crate::core::request::ProcessSpec;
use crate::core::sync_impl;

/// Suffix appended to a request's process name to form its registered type name.
pub const PROCESS_SUFFIX: &str = "Process";

/// Maps a request name to its registered type name: `within` -> `WithinProcess`.
pub fn process_type_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("{}{}{}", first.to_uppercase(), chars.as_str(), PROCESS_SUFFIX),
        None => PROCESS_SUFFIX.to_string(),
    }
}

/// Builds process trees from request specifications.
#[derive(Debug, Clone, Copy)]
pub struct GraphBuilder<'r> {
    registry: &'r Registry,
}

impl<'r> GraphBuilder<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        GraphBuilder { registry }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Creates an unbuilt process of the type `name` resolves to.
    pub fn create(&self, name: &str, parent: Option<Uuid>) -> Result<Process> {
        let type_name = process_type_name(name);
        let descriptor = self
            .registry
            .get_process(&type_name)
            .map_err(|source| GraphError::UnknownProcessType {
                name: name.to_string(),
                source: Box::new(source),
            })?;
        Ok(Process::new(&descriptor, name, parent))
    }

    /// Resolves `name` and, when a spec is given, attaches its args and inputs.
    ///
    /// Nested process inputs are built recursively with this process as their
    /// parent. On any failure nothing is returned.
    pub fn build(
        &self,
        name: &str,
        spec: Option<&ProcessSpec>,
        parent: Option<Uuid>,
    ) -> Result<Process> {
        let mut process = self.create(name, parent)?;
        if let Some(spec) = spec {
            self.parse(&mut process, spec)?;
        }
        log::debug!(
            "built {} ({}) {} with {} input(s)",
            process.name(),
            process.type_name(),
            process.id(),
            process.inputs().len()
        );
        Ok(process)
    }

    /// Attaches `spec` to an unbuilt process, resolving inputs in order.
    pub fn parse(&self, process: &mut Process, spec: &ProcessSpec) -> Result<()> {
        let inputs = spec
            .data_inputs
            .iter()
            .map(|descriptor| resolve(self, process.id(), descriptor))
            .collect::<Result<Vec<_>>>()?;
        process.attach(spec.args.clone(), inputs)
    }

    /// Parses a JSON request and builds the root process `name` from it.
    pub fn build_json(&self, name: &str, json: &str) -> Result<Process> {
        let spec = ProcessSpec::from_json(json)?;
        self.build(name, Some(&spec), None)
    }
}

impl GraphBuilder<'static> {
    /// A builder over the process-wide registry.
    pub fn global() -> Result<Self> {
        Ok(GraphBuilder::new(registry::global()?))
    }
}

/// Builds the request into a tree and computes it, children first.
pub fn parse_request(builder: &GraphBuilder<'_>, name: &str, json: &str) -> Result<Process> {
    let mut process = builder.build_json(name, json)?;
    sync_impl::run(&mut process)?;
    Ok(process)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::{FileKind, Io};
    use crate::core::process::ProcessState;
    use serde_json::json;

    #[test]
    fn test_type_name_mangling() {
        assert_eq!(process_type_name("within"), "WithinProcess");
        assert_eq!(process_type_name("zonalStats"), "ZonalStatsProcess");
        assert_eq!(process_type_name("Union"), "UnionProcess");
        assert_eq!(process_type_name(""), "Process");
    }

    #[test]
    fn test_unknown_process_carries_lookup_error() {
        let registry = Registry::with_builtins().unwrap();
        let err = GraphBuilder::new(&registry)
            .build("nosuch", None, None)
            .unwrap_err();
        match err {
            GraphError::UnknownProcessType { name, source } => {
                assert_eq!(name, "nosuch");
                assert!(matches!(*source, GraphError::UnknownType(ref t) if t == "NosuchProcess"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_builder_exposes_its_registry() {
        let registry = Registry::with_builtins().unwrap();
        let builder = GraphBuilder::new(&registry);
        assert!(std::ptr::eq(builder.registry(), &registry));
        assert!(builder.registry().contains("PassthroughProcess"));
    }

    #[test]
    fn test_build_without_spec_is_unbuilt() {
        let registry = Registry::with_builtins().unwrap();
        let process = GraphBuilder::new(&registry)
            .build("passthrough", None, None)
            .unwrap();
        assert_eq!(process.state(), ProcessState::Unbuilt);
        assert!(process.inputs().is_empty());
        assert!(process.args().is_none());
    }

    #[test]
    fn test_parse_only_once() {
        let registry = Registry::with_builtins().unwrap();
        let builder = GraphBuilder::new(&registry);
        let spec = ProcessSpec::from_value(json!({
            "data_inputs": [{"type": "file", "uri": "a.shp"}]
        }))
        .unwrap();

        let mut process = builder.create("passthrough", None).unwrap();
        builder.parse(&mut process, &spec).unwrap();
        assert_eq!(process.state(), ProcessState::Built);

        let err = builder.parse(&mut process, &spec).unwrap_err();
        assert!(matches!(err, GraphError::InvalidState { .. }));
        assert_eq!(process.inputs().len(), 1);
    }

    #[test]
    fn test_inputs_keep_declared_order() {
        let registry = Registry::with_builtins().unwrap();
        let process = GraphBuilder::new(&registry)
            .build_json(
                "passthrough",
                r#"{"data_inputs": [
                    {"type": "file", "uri": "c.tif"},
                    {"type": "file", "uri": "a.shp"},
                    {"type": "file", "uri": "b.kml"}
                ]}"#,
            )
            .unwrap();
        let uris: Vec<_> = process
            .inputs()
            .iter()
            .filter_map(Io::as_file)
            .map(|f| (f.uri.as_str(), f.kind))
            .collect();
        assert_eq!(
            uris,
            vec![
                ("c.tif", FileKind::Raster),
                ("a.shp", FileKind::Vector),
                ("b.kml", FileKind::Vector),
            ]
        );
    }

    #[test]
    fn test_failing_nested_input_aborts_parent() {
        let registry = Registry::with_builtins().unwrap();
        let builder = GraphBuilder::new(&registry);
        let mut process = builder.create("passthrough", None).unwrap();
        let spec = ProcessSpec::from_value(json!({
            "data_inputs": [
                {"type": "file", "uri": "a.shp"},
                {"type": "process", "process": {"name": "missing", "data_inputs": []}}
            ]
        }))
        .unwrap();

        let err = builder.parse(&mut process, &spec).unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnknownProcessType { ref name, .. } if name == "missing"
        ));
        assert_eq!(process.state(), ProcessState::Unbuilt);
        assert!(process.inputs().is_empty());
    }
}
