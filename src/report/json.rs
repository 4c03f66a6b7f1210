use crate::checker::Unused;
use crate::program::Program;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

/// JSON reporter for programmatic output.
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, prog: &Program, unused: &[Unused]) -> Result<()> {
        let report = JsonReport::from_unused(prog, unused);
        let json = serde_json::to_string_pretty(&report).into_diagnostic()?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json).into_diagnostic()?;
            println!("Report written to: {}", path.display());
        } else {
            println!("{}", json);
        }

        Ok(())
    }
}

#[derive(Serialize)]
struct JsonReport {
    version: &'static str,
    total: usize,
    unused: Vec<JsonUnused>,
}

#[derive(Serialize)]
struct JsonUnused {
    kind: &'static str,
    name: String,
    message: String,
    file: String,
    line: usize,
    column: usize,
}

impl JsonReport {
    fn from_unused(prog: &Program, unused: &[Unused]) -> Self {
        let items: Vec<JsonUnused> = unused
            .iter()
            .map(|u| {
                let obj = prog.obj(u.obj);
                let name = prog.display_name(u.obj);
                JsonUnused {
                    kind: obj.kind_name(),
                    message: format!("{} {} is unused", obj.kind_name(), name),
                    name,
                    file: u.position.file.to_string_lossy().to_string(),
                    line: u.position.line,
                    column: u.position.column,
                }
            })
            .collect();

        Self {
            version: "1.0",
            total: unused.len(),
            unused: items,
        }
    }
}
