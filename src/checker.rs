//! Per-package orchestration: build, color, quiet, report.
//!
//! The checker runs the whole pipeline for each package of a snapshot and
//! collects one [`Unused`] record per dead declaration. Quieting happens
//! here: a dead local never deserves its own diagnostic, and neither do the
//! methods of a dead type or the fields of a dead struct; the enclosing
//! declaration is the report.

use crate::config::Config;
use crate::graph::{Entity, Graph, GraphBuilder};
use crate::program::Program;
use crate::sem::{ObjId, ObjKind, PkgId, Position, Type};
use tracing::{debug, info};

/// One dead declaration: the semantic object and where it was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unused {
    pub obj: ObjId,
    pub position: Position,
}

/// Whole-snapshot dead-code checker.
#[derive(Debug, Default)]
pub struct Checker {
    config: Config,
}

impl Checker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Check every package of the snapshot.
    pub fn check(&self, prog: &Program) -> Vec<Unused> {
        let mut out = Vec::new();
        for pkg in prog.package_ids() {
            out.extend(self.check_package(prog, pkg));
        }
        out
    }

    /// Check a single package. Each package gets a fresh graph; nothing is
    /// shared between runs.
    pub fn check_package(&self, prog: &Program, pkg: PkgId) -> Vec<Unused> {
        info!("checking package {}", prog.package(pkg).path);

        let entry_pkg = match &self.config.entry_package {
            Some(name) => prog.package_by_name(name),
            None => prog.entry_package,
        };

        let mut builder = GraphBuilder::new(prog, pkg, entry_pkg, self.config.debug_graph);
        builder.seed();
        let mut graph = builder.finish();

        graph.color();
        self.quieten(prog, &mut graph);
        self.report(prog, pkg, &graph)
    }

    /// Suppress nodes whose uselessness is implied by an enclosing dead
    /// entity. Quieting never affects reachability, only report emission.
    fn quieten(&self, prog: &Program, graph: &mut Graph<'_>) {
        let mut quiet = Vec::new();

        for idx in graph.node_indices() {
            let node = graph.node_ref(idx);
            if node.seen {
                continue;
            }
            match node.entity {
                Entity::Obj(o) => {
                    if matches!(prog.obj(o).kind, ObjKind::Var { field: false, .. }) {
                        // locals and parameters are never reported on their
                        // own; a dead function is already the report
                        quiet.push(idx);
                    }
                }
                Entity::Type(t) => match prog.types.get(t) {
                    Type::Named { methods, .. } => {
                        for &m in methods {
                            let node = match graph.func_value(m) {
                                Some(fid) => graph.node_maybe(Entity::Func(fid)),
                                None => graph.node_maybe(Entity::Obj(m)),
                            };
                            quiet.extend(node);
                        }
                    }
                    Type::Struct { fields } => {
                        for &f in fields {
                            quiet.extend(graph.node_maybe(Entity::Obj(f)));
                        }
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        for idx in quiet {
            graph.set_quiet(idx);
        }
    }

    /// Emit one record per unseen, unquieted node whose semantic object is
    /// defined by the package under analysis.
    fn report(&self, prog: &Program, pkg: PkgId, graph: &Graph<'_>) -> Vec<Unused> {
        let mut out = Vec::new();

        for idx in graph.node_indices() {
            let node = graph.node_ref(idx);
            if node.seen {
                continue;
            }
            if node.quiet {
                if self.config.debug_graph {
                    debug!(target: "deadreach::graph", "n{} [color=purple];", idx.index());
                }
                continue;
            }
            if self.config.debug_graph {
                debug!(target: "deadreach::graph", "n{} [color=red];", idx.index());
            }

            let obj = match node.entity {
                Entity::Obj(o) => Some(o),
                // prefer the semantic object linked to the lowered value
                Entity::Func(f) => prog.func(f).obj,
                _ => None,
            };
            let Some(obj) = obj else {
                continue;
            };
            if prog.obj(obj).pkg != Some(pkg) {
                continue;
            }
            if self.config.should_retain(&prog.obj(obj).name) {
                debug!("retained by pattern: {}", prog.obj(obj).name);
                continue;
            }
            out.push(Unused {
                obj,
                position: prog.obj(obj).pos.clone(),
            });
        }

        out.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.obj.cmp(&b.obj))
        });
        out
    }
}
