use crate::checker::Unused;
use crate::program::Program;
use colored::Colorize;
use miette::Result;
use std::collections::HashMap;
use std::path::PathBuf;

/// Terminal reporter with colored output.
pub struct TerminalReporter;

impl TerminalReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn report(&self, prog: &Program, unused: &[Unused]) -> Result<()> {
        if unused.is_empty() {
            println!("{}", "No dead code found!".green().bold());
            return Ok(());
        }

        // Group by file
        let mut by_file: HashMap<PathBuf, Vec<&Unused>> = HashMap::new();
        for item in unused {
            by_file
                .entry(item.position.file.clone())
                .or_default()
                .push(item);
        }

        println!();
        println!(
            "{}",
            format!("Found {} unused declarations:", unused.len())
                .yellow()
                .bold()
        );
        println!();

        let mut files: Vec<_> = by_file.keys().cloned().collect();
        files.sort();

        for file in files {
            let items = &by_file[&file];

            println!("{}", file.display().to_string().cyan().bold());
            for item in items {
                self.print_item(prog, item);
            }
            println!();
        }

        println!("{}", "─".repeat(60).dimmed());
        println!("Summary: {}", format!("{} unused", unused.len()).yellow());

        Ok(())
    }

    fn print_item(&self, prog: &Program, item: &Unused) {
        let obj = prog.obj(item.obj);
        let location = format!("{}:{}", item.position.line, item.position.column);

        println!(
            "  {} {} {} {} is unused",
            location.dimmed(),
            "warning".yellow().bold(),
            obj.kind_name().dimmed(),
            prog.display_name(item.obj).white()
        );
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}
