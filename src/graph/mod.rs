//! The reachability graph: entity nodes, reasoned edges, coloring.
//!
//! Every declaration, structural type and lowered function that matters to
//! the analysis becomes one node; each reachability rule becomes an edge
//! labeled with the rule's reason string. A synthetic root node stands for
//! the world outside the package. After the walkers have recorded all
//! edges, a depth-first traversal from the root marks everything reachable;
//! whatever stays unmarked is dead.
//!
//! Node creation (`see`) and edge recording (`record_use`) are deliberately
//! separate operations: an edge may only connect entities that already have
//! nodes, which catches walker bugs the moment they happen instead of in
//! the report.

mod builder;
mod instructions;
pub mod relevance;
mod types;

pub use builder::GraphBuilder;

use crate::ir::FuncId;
use crate::program::Program;
use crate::sem::{ObjId, PkgId, TypeId};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use std::collections::HashMap;
use tracing::debug;

/// One participant of the reachability graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    /// The external world: exports, program entry, package initializers.
    Root,

    /// A semantic declaration (type name, variable, field, constant, or a
    /// function that has no lowered body).
    Obj(ObjId),

    /// A structural type.
    Type(TypeId),

    /// A lowered function value. Distinct from the function's semantic
    /// object; callers reach the lowered form, the type walker reaches the
    /// semantic method.
    Func(FuncId),
}

/// Per-node analysis state.
#[derive(Debug)]
pub struct Node {
    pub entity: Entity,
    /// Reachable from the root.
    pub seen: bool,
    /// Unreported because an enclosing entity already tells the story.
    pub quiet: bool,
}

/// The per-package entity graph.
pub struct Graph<'a> {
    prog: &'a Program,
    pkg: PkgId,

    inner: DiGraph<Node, &'static str>,
    nodes: HashMap<Entity, NodeIndex>,
    type_nodes: HashMap<TypeId, NodeIndex>,
    root: NodeIndex,

    /// Canonical lowered form per semantic function object.
    func_values: HashMap<ObjId, FuncId>,

    /// Emit the graph in Graphviz form through `tracing` as it is built.
    debug: bool,
}

impl<'a> Graph<'a> {
    pub fn new(prog: &'a Program, pkg: PkgId, debug: bool) -> Self {
        let mut inner = DiGraph::new();
        let root = inner.add_node(Node {
            entity: Entity::Root,
            seen: false,
            quiet: false,
        });
        if debug {
            debug!(target: "deadreach::graph", "n{} [label=\"Root\"];", root.index());
        }
        Self {
            prog,
            pkg,
            inner,
            nodes: HashMap::new(),
            type_nodes: HashMap::new(),
            root,
            func_values: prog.func_value_index(),
            debug,
        }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn package(&self) -> PkgId {
        self.pkg
    }

    pub fn program(&self) -> &'a Program {
        self.prog
    }

    pub fn func_value(&self, obj: ObjId) -> Option<FuncId> {
        self.func_values.get(&obj).copied()
    }

    /// The node for an entity, if it has one.
    pub fn node_maybe(&self, entity: Entity) -> Option<NodeIndex> {
        match entity {
            Entity::Type(t) => self.type_nodes.get(&t).copied(),
            _ => self.nodes.get(&entity).copied(),
        }
    }

    /// The node for an entity, creating it if needed. Returns whether the
    /// node is new.
    fn node(&mut self, entity: Entity) -> (NodeIndex, bool) {
        if let Some(idx) = self.node_maybe(entity) {
            return (idx, false);
        }
        let idx = self.inner.add_node(Node {
            entity,
            seen: false,
            quiet: false,
        });
        match entity {
            Entity::Type(t) => {
                self.type_nodes.insert(t, idx);
            }
            _ => {
                self.nodes.insert(entity, idx);
            }
        }
        (idx, true)
    }

    /// Whether a semantic object belongs to a package other than the one
    /// under analysis. Foreign objects never enter the graph.
    fn foreign(&self, entity: Entity) -> bool {
        if let Entity::Obj(o) = entity {
            if let Some(pkg) = self.prog.obj(o).pkg {
                return pkg != self.pkg;
            }
        }
        false
    }

    /// Semantic function objects that have a canonical lowered body must be
    /// referenced through that body, never directly.
    fn assert_not_shadowed(&self, entity: Entity) {
        if let Entity::Obj(o) = entity {
            if let crate::sem::ObjKind::Func { .. } = self.prog.obj(o).kind {
                assert!(
                    !self.func_values.contains_key(&o),
                    "semantic function {} used directly instead of through its lowered form",
                    self.prog.obj(o).name
                );
            }
        }
    }

    /// Ensure the entity has a node. Irrelevant and foreign entities are
    /// silently dropped.
    pub fn see(&mut self, entity: Entity) {
        if relevance::is_irrelevant(self.prog, entity) {
            return;
        }
        if self.foreign(entity) {
            return;
        }
        let (idx, new) = self.node(entity);
        if self.debug && new {
            debug!(
                target: "deadreach::graph",
                "n{} [label={:?}];",
                idx.index(),
                self.label(entity)
            );
        }
    }

    /// Record that `by` uses `used`; `by = None` means used by the root.
    /// Both endpoints must already have nodes.
    pub fn record_use(&mut self, used: Entity, by: Option<Entity>, reason: &'static str) {
        if relevance::is_irrelevant(self.prog, used) {
            return;
        }
        self.assert_not_shadowed(used);
        if let Some(by) = by {
            self.assert_not_shadowed(by);
        }
        if self.foreign(used) {
            return;
        }
        if let Some(by) = by {
            if self.foreign(by) {
                return;
            }
        }

        let (used_idx, new) = self.node(used);
        assert!(!new, "use of never-seen entity {:?} ({})", used, reason);
        let by_idx = match by {
            None => self.root,
            Some(by) => {
                let (idx, new) = self.node(by);
                assert!(!new, "use by never-seen entity {:?} ({})", by, reason);
                idx
            }
        };

        let duplicate = self
            .inner
            .edges_connecting(by_idx, used_idx)
            .any(|e| *e.weight() == reason);
        if !duplicate {
            self.inner.add_edge(by_idx, used_idx, reason);
            if self.debug {
                debug!(
                    target: "deadreach::graph",
                    "n{} -> n{} [label={:?}];",
                    by_idx.index(),
                    used_idx.index(),
                    reason
                );
            }
        }
    }

    pub fn see_and_use(&mut self, used: Entity, by: Option<Entity>, reason: &'static str) {
        self.see(used);
        self.record_use(used, by, reason);
    }

    /// Mark everything reachable from the root.
    pub fn color(&mut self) {
        let mut dfs = Dfs::new(&self.inner, self.root);
        while let Some(idx) = dfs.next(&self.inner) {
            self.inner[idx].seen = true;
        }
    }

    /// Node indices in creation order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner.node_indices()
    }

    pub fn node_ref(&self, idx: NodeIndex) -> &Node {
        &self.inner[idx]
    }

    pub fn set_quiet(&mut self, idx: NodeIndex) {
        self.inner[idx].quiet = true;
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Debug label for a node.
    pub fn label(&self, entity: Entity) -> String {
        match entity {
            Entity::Root => "Root".to_string(),
            Entity::Obj(o) => {
                format!("{} {}", self.prog.obj(o).kind_name(), self.prog.obj(o).name)
            }
            Entity::Type(t) => self.prog.type_string(t),
            Entity::Func(f) => format!("func {}", self.prog.func(f).name),
        }
    }
}

#[cfg(test)]
mod graph_tests {
    use super::*;
    use crate::program::ProgramBuilder;
    use crate::sem::BasicKind;

    #[test]
    fn duplicate_edges_collapse() {
        let mut b = ProgramBuilder::new();
        let pkg = b.package("p", "p");
        let int = b.basic(BasicKind::Int);
        let c_obj = b.constant("C", pkg, int, None);
        let prog = b.finish();

        let mut g = Graph::new(&prog, pkg, false);
        let c = Entity::Obj(c_obj);
        g.see(c);
        g.record_use(c, None, "exported constant");
        g.record_use(c, None, "exported constant");
        assert_eq!(g.edge_count(), 1);

        // a different reason between the same endpoints is a new edge
        g.record_use(c, None, "used constant");
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    #[should_panic(expected = "never-seen")]
    fn use_before_see_is_fatal() {
        let mut b = ProgramBuilder::new();
        let pkg = b.package("p", "p");
        let int = b.basic(BasicKind::Int);
        b.constant("C", pkg, int, None);
        let prog = b.finish();

        let mut g = Graph::new(&prog, pkg, false);
        g.record_use(Entity::Obj(crate::sem::ObjId(0)), None, "exported constant");
    }

    #[test]
    fn irrelevant_entities_never_gain_nodes() {
        let mut b = ProgramBuilder::new();
        let pkg = b.package("p", "p");
        let int = b.basic(BasicKind::Int);
        let slice = b.slice_of(int);
        let prog = b.finish();

        let mut g = Graph::new(&prog, pkg, false);
        g.see(Entity::Type(int));
        g.see(Entity::Type(slice));
        // only the root exists
        assert_eq!(g.node_count(), 1);
    }
}
