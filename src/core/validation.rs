use std::path::Path;

use crate::core::io::Io;
use crate::core::process::{Process, ProcessState};

/// Represents an issue found while checking a built process tree.
#[derive(Debug, Clone)]
pub enum ValidationIssue {
    /// A hard error: running the tree is guaranteed to fail.
    Error(String),
    /// A warning: the tree runs, but something was decided silently.
    Warning(String),
}

/// The result of a validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.issues.push(ValidationIssue::Error(msg.into()));
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.issues.push(ValidationIssue::Warning(msg.into()));
    }

    pub fn is_safe(&self) -> bool {
        !self.issues.iter().any(|i| matches!(i, ValidationIssue::Error(_)))
    }

    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| matches!(i, ValidationIssue::Warning(_)))
    }

    pub fn print_summary(&self) {
        if self.is_safe() && !self.has_warnings() {
            println!("✅ Request validation passed: every process has the inputs it needs.");
            return;
        }

        for issue in &self.issues {
            match issue {
                ValidationIssue::Error(msg) => println!("❌ Error: {}", msg),
                ValidationIssue::Warning(msg) => println!("⚠️ Warning: {}", msg),
            }
        }
    }
}

/// Checks a built tree before it is run.
pub fn validate(process: &Process) -> ValidationResult {
    let mut result = ValidationResult::new();
    visit(process, &mut result);
    result
}

fn visit(process: &Process, result: &mut ValidationResult) {
    let label = format!("'{}' ({})", process.name(), process.id());

    if process.state() != ProcessState::Built {
        result.add_error(format!(
            "process {} is {}, expected built",
            label,
            process.state().as_str()
        ));
    }

    let required = process.logic().min_inputs();
    if process.inputs().len() < required {
        result.add_error(format!(
            "process {} needs at least {} input(s), got {}",
            label,
            required,
            process.inputs().len()
        ));
    }

    for input in process.inputs() {
        match input {
            Io::File(file) if Path::new(&file.uri).extension().is_none() => {
                result.add_warning(format!(
                    "input '{}' of process {} has no extension and is treated as raster",
                    file.uri, label
                ));
            }
            Io::File(_) => {}
            Io::Process(nested) => visit(nested.process(), result),
        }
    }
}
