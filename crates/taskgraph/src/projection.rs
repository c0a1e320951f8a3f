//! Node/edge projection of a project for visualization.
//!
//! The projection is the one structure meant for external consumers:
//!
//! - one node per ticket, in ticket listing order
//! - one `"hierarchy"` edge parent -> child for every ticket with a parent
//! - one edge per explicit link, labelled with its link type
//!
//! Hierarchy edges always precede link edges.

use crate::domain::{Ticket, TicketId, TicketLink, TicketType};
use serde::{Deserialize, Serialize};

/// Edge label used for implicit parent -> child edges
pub const HIERARCHY_EDGE: &str = "hierarchy";

/// Graph data for visualization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: TicketId,
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: TicketType,
    pub status: String,
    pub priority: String,
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: TicketId,
    pub target: TicketId,
    #[serde(rename = "type")]
    pub edge_type: String,
}

impl GraphEdge {
    /// Returns true for implicit parent -> child edges.
    pub fn is_hierarchy(&self) -> bool {
        self.edge_type == HIERARCHY_EDGE
    }
}

impl GraphData {
    /// Hierarchy edges of the projection
    pub fn hierarchy_edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(|e| e.is_hierarchy())
    }
}

/// Build the projection from a project's tickets and links.
///
/// Ordering follows the input slices, so a stable listing from the store
/// gives a stable projection.
pub fn project_graph(tickets: &[Ticket], links: &[TicketLink]) -> GraphData {
    let nodes = tickets
        .iter()
        .map(|ticket| GraphNode {
            id: ticket.id,
            label: ticket.title.clone(),
            node_type: ticket.ticket_type,
            status: ticket.status.clone(),
            priority: ticket.priority.clone(),
            group: ticket.ticket_type.as_str().to_string(),
        })
        .collect();

    let hierarchy_edges = tickets.iter().filter_map(|ticket| {
        ticket.parent_id.map(|parent_id| GraphEdge {
            source: parent_id,
            target: ticket.id,
            edge_type: HIERARCHY_EDGE.to_string(),
        })
    });

    let link_edges = links.iter().map(|link| GraphEdge {
        source: link.source_id,
        target: link.target_id,
        edge_type: link.link_type.clone(),
    });

    GraphData {
        nodes,
        edges: hierarchy_edges.chain(link_edges).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ticket(id: TicketId, ticket_type: TicketType, parent_id: Option<TicketId>) -> Ticket {
        let now = Utc::now();
        Ticket {
            id,
            title: format!("Ticket {}", id),
            description: String::new(),
            status: "new".to_string(),
            priority: "high".to_string(),
            ticket_type,
            parent_id,
            project_id: 1,
            reporter_id: 1,
            assignee_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn link(id: i64, source_id: TicketId, target_id: TicketId, link_type: &str) -> TicketLink {
        TicketLink {
            id,
            source_id,
            target_id,
            link_type: link_type.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_nodes_carry_ticket_fields() {
        let tickets = vec![ticket(1, TicketType::Epic, None)];
        let graph = project_graph(&tickets, &[]);

        assert_eq!(
            graph.nodes,
            vec![GraphNode {
                id: 1,
                label: "Ticket 1".to_string(),
                node_type: TicketType::Epic,
                status: "new".to_string(),
                priority: "high".to_string(),
                group: "epic".to_string(),
            }]
        );
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_hierarchy_edges_precede_links() {
        let tickets = vec![
            ticket(1, TicketType::Epic, None),
            ticket(2, TicketType::Task, Some(1)),
            ticket(3, TicketType::Subtask, Some(2)),
        ];
        let links = vec![link(10, 3, 1, "blocks"), link(11, 2, 3, "relates")];

        let graph = project_graph(&tickets, &links);

        let edges: Vec<_> = graph
            .edges
            .iter()
            .map(|e| (e.source, e.target, e.edge_type.as_str()))
            .collect();
        assert_eq!(
            edges,
            vec![
                (1, 2, "hierarchy"),
                (2, 3, "hierarchy"),
                (3, 1, "blocks"),
                (2, 3, "relates"),
            ]
        );
        assert_eq!(graph.hierarchy_edges().count(), 2);
    }

    #[test]
    fn test_serialized_shape() {
        let tickets = vec![
            ticket(1, TicketType::Epic, None),
            ticket(2, TicketType::Task, Some(1)),
        ];
        let json = serde_json::to_value(project_graph(&tickets, &[])).unwrap();

        assert_eq!(json["nodes"][1]["type"], "task");
        assert_eq!(json["nodes"][1]["group"], "task");
        assert_eq!(
            json["edges"][0],
            serde_json::json!({"source": 1, "target": 2, "type": "hierarchy"})
        );
    }
}
