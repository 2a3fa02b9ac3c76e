use crate::domain::advice::AdviceKind;
use crate::domain::element::Element;
use crate::domain::model::ReferenceModel;
use petgraph::Direction;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// Cross-reference graph - a queryable view over a reference model snapshot.
///
/// Nodes are elements, edges point from the advising element to the advised one.
pub struct XrefGraph {
    pub graph: DiGraph<Element, AdviceKind>,

    /// Mapping from element handle to node index
    pub handle_to_node: HashMap<String, NodeIndex>,
}

impl XrefGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            handle_to_node: HashMap::new(),
        }
    }

    pub fn from_model(model: &ReferenceModel) -> Self {
        let mut xref = Self::new();
        for edge in model.all_edges() {
            let source = xref.get_or_add(&edge.source);
            let target = xref.get_or_add(&edge.target);
            if xref
                .graph
                .edges_connecting(source, target)
                .all(|e| *e.weight() != edge.kind)
            {
                xref.graph.add_edge(source, target, edge.kind);
            }
        }
        xref
    }

    fn get_or_add(&mut self, element: &Element) -> NodeIndex {
        if let Some(&idx) = self.handle_to_node.get(&element.handle) {
            return idx;
        }
        let idx = self.graph.add_node(element.clone());
        self.handle_to_node.insert(element.handle.clone(), idx);
        idx
    }

    pub fn get_node_by_handle(&self, handle: &str) -> Option<NodeIndex> {
        self.handle_to_node.get(handle).copied()
    }

    /// Elements advised by `handle`
    pub fn advises(&self, handle: &str) -> Vec<(&Element, AdviceKind)> {
        self.related(handle, Direction::Outgoing)
    }

    /// Elements advising `handle`
    pub fn advised_by(&self, handle: &str) -> Vec<(&Element, AdviceKind)> {
        self.related(handle, Direction::Incoming)
    }

    fn related(&self, handle: &str, direction: Direction) -> Vec<(&Element, AdviceKind)> {
        let Some(idx) = self.get_node_by_handle(handle) else {
            return Vec::new();
        };
        let mut related: Vec<(&Element, AdviceKind)> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| {
                let other = match direction {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (&self.graph[other], *e.weight())
            })
            .collect();
        related.sort_by(|a, b| a.0.handle.cmp(&b.0.handle).then(a.1.cmp(&b.1)));
        related
    }

    /// Graphviz rendering
    pub fn to_dot(&self) -> String {
        format!("{}", Dot::with_config(&self.graph, &[Config::GraphContentOnly]))
            .lines()
            .fold(String::from("digraph xref {\n"), |mut out, line| {
                out.push_str(line);
                out.push('\n');
                out
            })
            + "}\n"
    }
}

impl Default for XrefGraph {
    fn default() -> Self {
        Self::new()
    }
}
