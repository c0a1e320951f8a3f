//! Graph projection and export

use super::*;
use crate::projection::{self, GraphData};
use crate::visualization;
use tracing::debug;

impl<S: TicketStore + LinkStore> CommandExecutor<S> {
    /// Build the node/edge view of a project.
    pub fn build_graph(&self, project_id: ProjectId) -> Result<GraphData> {
        let tickets = self.storage.list_tickets(project_id)?;
        let links = self.storage.list_links(project_id)?;
        let graph = projection::project_graph(&tickets, &links);

        debug!(
            project_id,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "Built graph projection"
        );
        Ok(graph)
    }

    /// Render the project graph as `dot` or `mermaid`.
    ///
    /// Returns `Ok(None)` for an unsupported format name.
    pub fn export_graph(&self, project_id: ProjectId, format: &str) -> Result<Option<String>> {
        let render: fn(&GraphData) -> String = match format.to_lowercase().as_str() {
            "dot" => visualization::export_dot,
            "mermaid" => visualization::export_mermaid,
            _ => return Ok(None),
        };
        Ok(Some(render(&self.build_graph(project_id)?)))
    }
}
