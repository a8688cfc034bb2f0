//! Dependency graph recorded during a build, and its exports.
//!
//! Every registered provider becomes a node; every value handed from a
//! producer to a consumer becomes an edge labeled with the type. Nodes of
//! providers bound to a scope are grouped into one cluster per scope
//! handle, so two scopes sharing a name still get separate clusters. The
//! graph is rendered when the build finishes and handed to the configured
//! visualizers (see [`visualizer`](crate::visualizer)).

use indexmap::{IndexMap, IndexSet};

#[cfg(feature = "graph-export")]
use serde::{Deserialize, Serialize};

use crate::error::{InjectError, InjectResult};
use crate::key::TypeKey;
use crate::location::Location;
use crate::scope::Scope;

/// What a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub enum NodeKind {
    Provider,
    Invoker,
}

/// How far a node got during the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub enum NodeStatus {
    /// Registered but never called.
    Registered,
    /// Called successfully.
    Used,
    /// Its inputs or its own call failed.
    Failed,
}

/// A registered provider or the invoker.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct GraphNode {
    /// `n0`, `n1`, .. in insertion order
    pub id: String,
    /// Full location text
    pub location: String,
    pub label: String,
    /// Name of the scope the provider is bound to
    pub scope: Option<String>,
    /// Index of that scope's cluster
    pub cluster: Option<usize>,
    pub kind: NodeKind,
    pub status: NodeStatus,
}

/// A value handed from node `from` to node `to`, by node id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub type_name: String,
}

/// Summary written alongside JSON and YAML exports.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct GraphMetadata {
    pub node_count: usize,
    pub edge_count: usize,
    pub scope_count: usize,
    pub has_failures: bool,
    /// Export timestamp
    pub exported_at: String,
    pub version: String,
}

/// The dependency graph of one build.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: IndexMap<Location, GraphNode>,
    edges: IndexSet<GraphEdge>,
    scopes: IndexSet<Scope>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node for `location` unless one exists already.
    pub fn add_node(&mut self, location: &Location, scope: Option<&Scope>, kind: NodeKind) {
        let next = self.nodes.len();
        let node = self.nodes.entry(location.clone()).or_insert_with(|| GraphNode {
            id: format!("n{}", next),
            location: location.to_string(),
            label: location.name().to_string(),
            scope: None,
            cluster: None,
            kind,
            status: NodeStatus::Registered,
        });
        if let (None, Some(scope)) = (node.cluster, scope) {
            let (cluster, _) = self.scopes.insert_full(scope.clone());
            node.cluster = Some(cluster);
            node.scope = Some(scope.name().to_string());
        }
        if kind == NodeKind::Invoker {
            node.kind = kind;
        }
    }

    /// Records that `from` provided a `ty` to `to`.
    pub fn add_edge(&mut self, from: &Location, to: &Location, ty: TypeKey) {
        self.add_node(from, None, NodeKind::Provider);
        self.add_node(to, None, NodeKind::Provider);
        let id = |location: &Location| self.nodes[location].id.clone();
        let edge = GraphEdge {
            from: id(from),
            to: id(to),
            type_name: ty.name().to_string(),
        };
        self.edges.insert(edge);
    }

    /// Updates a node's status. A failed node stays failed.
    pub fn mark(&mut self, location: &Location, status: NodeStatus) {
        if let Some(node) = self.nodes.get_mut(location) {
            if node.status != NodeStatus::Failed {
                node.status = status;
            }
        }
    }

    pub fn node(&self, location: &Location) -> Option<&GraphNode> {
        self.nodes.get(location)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Scopes with at least one node, in first-seen order. The position
    /// of a scope is its cluster index.
    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    fn cluster(&self, index: usize) -> impl Iterator<Item = &GraphNode> {
        self.nodes().filter(move |n| n.cluster == Some(index))
    }

    fn unclustered(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes().filter(|n| n.cluster.is_none())
    }

    pub fn metadata(&self) -> GraphMetadata {
        GraphMetadata {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            scope_count: self.scopes.len(),
            has_failures: self.nodes().any(|n| n.status == NodeStatus::Failed),
            exported_at: {
                #[cfg(feature = "graph-export")]
                { chrono::Utc::now().to_rfc3339() }
                #[cfg(not(feature = "graph-export"))]
                { String::new() }
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn to_dot(&self) -> String {
        DefaultGraphExporter.export_dot(self)
    }

    pub fn to_mermaid(&self) -> String {
        DefaultGraphExporter.export_mermaid(self)
    }

    /// Exports the graph with the default exporter.
    pub fn export(&self, format: ExportFormat) -> InjectResult<String> {
        DefaultGraphExporter.export(self, format)
    }
}

/// Export formats supported for dependency graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// DOT format for Graphviz visualization
    Dot,
    /// Mermaid format for documentation
    Mermaid,
    /// JSON, with the `graph-export` feature
    Json,
    /// YAML, with the `graph-export` feature
    Yaml,
}

/// Renders a [`DependencyGraph`] into some textual format.
pub trait GraphExporter {
    fn export(&self, graph: &DependencyGraph, format: ExportFormat) -> InjectResult<String>;
}

/// Exporter used by the built-in visualizers.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultGraphExporter;

impl GraphExporter for DefaultGraphExporter {
    fn export(&self, graph: &DependencyGraph, format: ExportFormat) -> InjectResult<String> {
        match format {
            ExportFormat::Dot => Ok(self.export_dot(graph)),
            ExportFormat::Mermaid => Ok(self.export_mermaid(graph)),
            ExportFormat::Json => self.export_json(graph),
            ExportFormat::Yaml => self.export_yaml(graph),
        }
    }
}

#[cfg(feature = "graph-export")]
#[derive(Serialize)]
struct GraphDocument<'a> {
    metadata: GraphMetadata,
    nodes: Vec<&'a GraphNode>,
    edges: Vec<&'a GraphEdge>,
}

#[cfg(feature = "graph-export")]
impl<'a> GraphDocument<'a> {
    fn new(graph: &'a DependencyGraph) -> Self {
        GraphDocument {
            metadata: graph.metadata(),
            nodes: graph.nodes().collect(),
            edges: graph.edges().collect(),
        }
    }
}

impl DefaultGraphExporter {
    fn export_json(&self, graph: &DependencyGraph) -> InjectResult<String> {
        #[cfg(feature = "graph-export")]
        {
            serde_json::to_string_pretty(&GraphDocument::new(graph))
                .map_err(|e| InjectError::Config(format!("JSON serialization failed: {}", e)))
        }
        #[cfg(not(feature = "graph-export"))]
        {
            let _ = graph;
            Err(InjectError::Config("JSON export requires the `graph-export` feature".into()))
        }
    }

    fn export_yaml(&self, graph: &DependencyGraph) -> InjectResult<String> {
        #[cfg(feature = "graph-export")]
        {
            serde_yaml::to_string(&GraphDocument::new(graph))
                .map_err(|e| InjectError::Config(format!("YAML serialization failed: {}", e)))
        }
        #[cfg(not(feature = "graph-export"))]
        {
            let _ = graph;
            Err(InjectError::Config("YAML export requires the `graph-export` feature".into()))
        }
    }

    fn export_dot(&self, graph: &DependencyGraph) -> String {
        let mut output = String::new();
        output.push_str("digraph \"container\" {\n");
        output.push_str("  node [shape=box, fontname=\"Helvetica\", color=\"lightgrey\", fontcolor=\"lightgrey\"];\n");
        output.push_str("  edge [fontname=\"Helvetica\", fontsize=10];\n");

        for (i, scope) in graph.scopes().enumerate() {
            output.push_str(&format!("\n  subgraph \"cluster_{}\" {{\n", i));
            output.push_str(&format!("    label=\"{}\";\n", escape(scope.name())));
            for node in graph.cluster(i) {
                output.push_str(&format!("    {}\n", dot_node(node)));
            }
            output.push_str("  }\n");
        }

        output.push('\n');
        for node in graph.unclustered() {
            output.push_str(&format!("  {}\n", dot_node(node)));
        }

        output.push('\n');
        for edge in graph.edges() {
            output.push_str(&format!(
                "  {} -> {} [label=\"{}\"];\n",
                edge.from,
                edge.to,
                escape(&edge.type_name)
            ));
        }

        output.push_str("}\n");
        output
    }

    fn export_mermaid(&self, graph: &DependencyGraph) -> String {
        let mermaid_node = |node: &GraphNode| {
            let label = node.label.replace('"', "#quot;");
            match node.kind {
                NodeKind::Invoker => format!("{}{{{{\"{}\"}}}}", node.id, label),
                NodeKind::Provider => format!("{}[\"{}\"]", node.id, label),
            }
        };

        let mut output = String::from("graph TD\n");
        for (i, scope) in graph.scopes().enumerate() {
            output.push_str(&format!("  subgraph s{} [\"{}\"]\n", i, scope.name().replace('"', "#quot;")));
            for node in graph.cluster(i) {
                output.push_str(&format!("    {}\n", mermaid_node(node)));
            }
            output.push_str("  end\n");
        }
        for node in graph.unclustered() {
            output.push_str(&format!("  {}\n", mermaid_node(node)));
        }

        for edge in graph.edges() {
            output.push_str(&format!(
                "  {} -->|{}| {}\n",
                edge.from,
                edge.type_name.replace('|', "#124;"),
                edge.to
            ));
        }

        output.push_str("\n  classDef registered stroke:#d3d3d3,color:#a0a0a0\n");
        output.push_str("  classDef used stroke:#000000\n");
        output.push_str("  classDef failed stroke:#ff0000,color:#ff0000\n");
        for node in graph.nodes() {
            let class = match node.status {
                NodeStatus::Registered => "registered",
                NodeStatus::Used => "used",
                NodeStatus::Failed => "failed",
            };
            output.push_str(&format!("  class {} {}\n", node.id, class));
        }

        output
    }
}

fn dot_node(node: &GraphNode) -> String {
    let mut attrs = vec![
        format!("label=\"{}\"", escape(&node.label)),
        format!("tooltip=\"{}\"", escape(&node.location)),
    ];
    if node.kind == NodeKind::Invoker {
        attrs.push("shape=hexagon".to_string());
    }
    match node.status {
        NodeStatus::Registered => {}
        NodeStatus::Used => {
            attrs.push("color=\"black\", fontcolor=\"black\", penwidth=1.5".to_string());
        }
        NodeStatus::Failed => {
            attrs.push("color=\"red\", fontcolor=\"red\", penwidth=1.5".to_string());
        }
    }
    format!("{} [{}];", node.id, attrs.join(", "))
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (DependencyGraph, Location, Location, Location) {
        let scope = Scope::new("bank");
        let provider = Location::new("app::provide_db", "src/app.rs", 10);
        let scoped = Location::new("app::provide_keeper", "src/app.rs", 20);
        let invoker = Location::named("app::main");

        let mut graph = DependencyGraph::new();
        graph.add_node(&provider, None, NodeKind::Provider);
        graph.add_node(&scoped, Some(&scope), NodeKind::Provider);
        graph.add_node(&invoker, None, NodeKind::Invoker);
        graph.add_edge(&provider, &scoped, TypeKey::of::<String>());
        graph.add_edge(&scoped, &invoker, TypeKey::of::<u32>());
        graph.add_edge(&scoped, &invoker, TypeKey::of::<u32>());
        (graph, provider, scoped, invoker)
    }

    #[test]
    fn nodes_and_edges_dedupe() {
        let (graph, ..) = sample();
        assert_eq!(graph.nodes().count(), 3);
        assert_eq!(graph.edges().count(), 2);
        assert_eq!(graph.scopes().map(Scope::name).collect::<Vec<_>>(), vec!["bank"]);
    }

    #[test]
    fn numbered_locations_are_separate_nodes() {
        let shared = Location::new("app::{{closure}}", "src/app.rs", 7);
        let (first, second) = (shared.for_node(0), shared.for_node(1));

        let mut graph = DependencyGraph::new();
        graph.add_edge(&first, &second, TypeKey::of::<u8>());
        assert_eq!(graph.nodes().count(), 2);
        let edge = graph.edges().next().unwrap();
        assert_eq!((edge.from.as_str(), edge.to.as_str()), ("n0", "n1"));
        assert!(graph.to_dot().contains("n0 -> n1 [label=\"u8\"]"));
    }

    #[test]
    fn same_named_scopes_get_own_clusters() {
        let (east, west) = (Scope::new("region"), Scope::new("region"));
        let mut graph = DependencyGraph::new();
        graph.add_node(&Location::named("east"), Some(&east), NodeKind::Provider);
        graph.add_node(&Location::named("west"), Some(&west), NodeKind::Provider);
        graph.add_node(&Location::named("east-too"), Some(&east), NodeKind::Provider);

        assert_eq!(graph.scopes().count(), 2);
        assert_eq!(graph.metadata().scope_count, 2);
        let clusters: Vec<_> = graph.nodes().map(|n| n.cluster).collect();
        assert_eq!(clusters, vec![Some(0), Some(1), Some(0)]);

        let dot = graph.to_dot();
        assert!(dot.contains("subgraph \"cluster_0\""));
        assert!(dot.contains("subgraph \"cluster_1\""));
        assert_eq!(dot.matches("label=\"region\";").count(), 2);
    }

    #[test]
    fn failed_status_sticks() {
        let (mut graph, provider, ..) = sample();
        graph.mark(&provider, NodeStatus::Failed);
        graph.mark(&provider, NodeStatus::Used);
        assert_eq!(graph.node(&provider).map(|n| n.status), Some(NodeStatus::Failed));
        assert!(graph.metadata().has_failures);
    }

    #[test]
    fn dot_has_clusters_and_hexagon() {
        let (mut graph, provider, ..) = sample();
        graph.mark(&provider, NodeStatus::Used);
        let dot = graph.to_dot();
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("subgraph \"cluster_0\""));
        assert!(dot.contains("label=\"bank\""));
        assert!(dot.contains("shape=hexagon"));
        assert!(dot.contains("[label=\"alloc::string::String\"]"));
        assert!(dot.contains("color=\"black\""));
    }

    #[test]
    fn mermaid_uses_short_ids() {
        let (graph, ..) = sample();
        let mermaid = graph.to_mermaid();
        assert!(mermaid.starts_with("graph TD"));
        assert!(mermaid.contains("n0 -->|alloc::string::String| n1"));
        assert!(mermaid.contains("n2{{\"app::main\"}}"));
    }

    #[cfg(feature = "graph-export")]
    #[test]
    fn json_export_includes_metadata() {
        let (graph, ..) = sample();
        let json = graph.export(ExportFormat::Json).unwrap();
        assert!(json.contains("\"node_count\": 3"));
        assert!(json.contains("exported_at"));
    }

    #[cfg(not(feature = "graph-export"))]
    #[test]
    fn structured_exports_need_feature() {
        let (graph, ..) = sample();
        assert!(graph.export(ExportFormat::Yaml).is_err());
    }
}
