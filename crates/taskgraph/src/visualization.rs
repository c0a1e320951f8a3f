//! Export of a graph projection to DOT (Graphviz) and Mermaid.
//!
//! Nodes show the ticket id and title and are colored by type. Hierarchy
//! edges are drawn dashed; link edges carry their link type as a label.

use crate::domain::TicketType;
use crate::projection::GraphData;

fn type_color(ticket_type: TicketType) -> &'static str {
    match ticket_type {
        TicketType::Epic => "plum",
        TicketType::Task => "lightblue",
        TicketType::Subtask => "lightgray",
    }
}

fn escape_label(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Export a projection as DOT format for Graphviz
///
/// # Example
/// ```
/// use taskgraph::projection::project_graph;
/// use taskgraph::visualization;
///
/// let graph = project_graph(&[], &[]);
/// let dot = visualization::export_dot(&graph);
/// assert!(dot.starts_with("digraph tickets {"));
/// ```
pub fn export_dot(graph: &GraphData) -> String {
    let mut output = String::from("digraph tickets {\n");
    output.push_str("  rankdir=TB;\n");
    output.push_str("  node [shape=box, style=\"rounded,filled\"];\n\n");

    for node in &graph.nodes {
        output.push_str(&format!(
            "  \"{}\" [label=\"#{}\\n{}\", fillcolor={}];\n",
            node.id,
            node.id,
            escape_label(&node.label),
            type_color(node.node_type)
        ));
    }

    output.push('\n');

    for edge in &graph.edges {
        if edge.is_hierarchy() {
            output.push_str(&format!(
                "  \"{}\" -> \"{}\" [style=dashed, arrowhead=none];\n",
                edge.source, edge.target
            ));
        } else {
            output.push_str(&format!(
                "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
                edge.source,
                edge.target,
                escape_label(&edge.edge_type)
            ));
        }
    }

    output.push_str("}\n");
    output
}

/// Export a projection as a Mermaid flowchart
pub fn export_mermaid(graph: &GraphData) -> String {
    let mut output = String::from("graph TD\n");

    for node in &graph.nodes {
        // Mermaid node text cannot contain raw quotes
        let label = node.label.replace('"', "'");
        output.push_str(&format!(
            "    t{}[\"#{} {}\"]:::{}\n",
            node.id, node.id, label, node.group
        ));
    }

    for edge in &graph.edges {
        if edge.is_hierarchy() {
            output.push_str(&format!("    t{} -.- t{}\n", edge.source, edge.target));
        } else {
            let label = edge.edge_type.replace('|', "/");
            output.push_str(&format!(
                "    t{} -->|{}| t{}\n",
                edge.source, label, edge.target
            ));
        }
    }

    output.push('\n');
    for ticket_type in [TicketType::Epic, TicketType::Task, TicketType::Subtask] {
        output.push_str(&format!(
            "    classDef {} fill:{}\n",
            ticket_type.as_str(),
            type_color(ticket_type)
        ));
    }

    output
}
