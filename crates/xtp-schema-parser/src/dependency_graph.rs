//! Reference graph between named schemas and cycle detection over it

use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, trace};
use xtp_schema_core::{Location, Schema, SchemaId, TypedNode, ValidationError};

/// A resolved `$ref` from one schema into another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEdge {
    pub target: SchemaId,
    /// Pointer to the `$ref` that creates the edge
    pub path: String,
}

/// Dependency graph over the schema registry
///
/// Nodes are registry indices; edges come from every resolved `$ref` reachable
/// from a schema through its properties, array items and map values.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    names: Vec<String>,
    dependencies: Vec<Vec<SchemaEdge>>,
}

impl DependencyGraph {
    pub fn from_schemas(schemas: &IndexMap<String, Schema>) -> Self {
        let mut graph = Self::default();
        for (name, schema) in schemas {
            let mut edges = Vec::new();
            let mut location = Location::from_segments(["components", "schemas", name.as_str()]);
            collect_edges(&schema.node, &mut location, &mut edges);
            graph.names.push(name.clone());
            graph.dependencies.push(edges);
        }
        graph
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, id: SchemaId) -> Option<&str> {
        self.names.get(id.0).map(String::as_str)
    }

    /// Direct dependencies of a schema, in declaration order
    pub fn dependencies_of(&self, id: SchemaId) -> &[SchemaEdge] {
        self.dependencies.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every back edge found by a depth-first search from each schema in
    /// declaration order
    ///
    /// A fully explored schema is never searched again, so each loop is
    /// reported once, at the `$ref` that closes it.
    pub fn find_cycles(&self) -> Vec<CycleError> {
        let mut marks = vec![Mark::Unvisited; self.len()];
        let mut path = Vec::new();
        let mut cycles = Vec::new();

        for index in 0..self.len() {
            if marks[index] == Mark::Unvisited {
                self.find_cycle_dfs(SchemaId(index), &mut marks, &mut path, &mut cycles);
            }
        }

        debug!(schemas = self.len(), cycles = cycles.len(), "cycle detection finished");
        cycles
    }

    fn find_cycle_dfs(
        &self,
        node: SchemaId,
        marks: &mut [Mark],
        path: &mut Vec<SchemaId>,
        cycles: &mut Vec<CycleError>,
    ) {
        marks[node.0] = Mark::OnStack;
        path.push(node);

        for edge in self.dependencies_of(node) {
            match marks.get(edge.target.0).copied() {
                Some(Mark::Unvisited) => self.find_cycle_dfs(edge.target, marks, path, cycles),
                Some(Mark::OnStack) => {
                    if let Some(start) = path.iter().position(|n| *n == edge.target) {
                        let mut cycle: Vec<String> =
                            path[start..].iter().map(|id| self.display_name(*id)).collect();
                        cycle.push(self.display_name(edge.target));
                        trace!(path = %edge.path, "back edge");
                        cycles.push(CycleError::new(cycle, edge.path.clone()));
                    }
                }
                Some(Mark::Done) | None => {}
            }
        }

        path.pop();
        marks[node.0] = Mark::Done;
    }

    fn display_name(&self, id: SchemaId) -> String {
        self.name(id).unwrap_or_default().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

fn collect_edges(node: &TypedNode, location: &mut Location, edges: &mut Vec<SchemaEdge>) {
    if let Some(target) = node.schema_ref.as_ref().and_then(|r| r.target) {
        edges.push(SchemaEdge {
            target,
            path: location.with_suffix(&["$ref"]),
        });
    }

    for property in &node.properties {
        location.push("properties");
        location.push(property.name.as_str());
        collect_edges(&property.node, location, edges);
        location.pop();
        location.pop();
    }

    if let Some(items) = &node.items {
        location.push("items");
        collect_edges(items, location, edges);
        location.pop();
    }

    if let Some(value) = &node.additional_properties {
        location.push("additionalProperties");
        collect_edges(value, location, edges);
        location.pop();
    }
}

/// A loop in the schema reference graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError {
    /// Schema names along the loop, first and last equal
    pub cycle: Vec<String>,
    /// Pointer to the `$ref` that closes the loop
    pub path: String,
}

impl CycleError {
    pub fn new(cycle: Vec<String>, path: String) -> Self {
        Self { cycle, path }
    }
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Detected circular reference: {}", self.cycle.join(" -> "))
    }
}

impl std::error::Error for CycleError {}

impl From<CycleError> for ValidationError {
    fn from(err: CycleError) -> Self {
        ValidationError::cycle(err.to_string(), err.path)
    }
}
