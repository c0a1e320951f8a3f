//! Explicit link operations with cycle prevention

use super::*;
use crate::domain::{LinkId, NewLink, TicketLink, UserId};
use crate::graph::LinkGraph;
use tracing::{info, warn};

impl<S: TicketStore + LinkStore> CommandExecutor<S> {
    /// Add a directed link `source -> target` within a project.
    ///
    /// Rejected if it is a self link, if the tickets are not both in
    /// `project_id`, or if `target` already reaches `source` through
    /// existing links. Endpoints and the link set are read, checked and
    /// written while the project lock is held, so concurrent insertions
    /// cannot combine into a cycle and concurrent deletes cannot orphan the
    /// new link.
    pub fn add_link(
        &self,
        project_id: ProjectId,
        source_id: TicketId,
        target_id: TicketId,
        link_type: &str,
        caller: UserId,
    ) -> Result<TicketLink> {
        if source_id == target_id {
            return Err(TrackerError::SelfLink { id: source_id });
        }

        let lock = self.project_lock(project_id);
        let _guard = ProjectLocks::acquire(&lock);

        let source = self.load_ticket(source_id)?;
        let target = self.load_ticket(target_id)?;
        if source.project_id != target.project_id || source.project_id != project_id {
            return Err(TrackerError::CrossProjectLink {
                source_id,
                target_id,
                project_id,
            });
        }

        let links = self.storage.list_links(project_id)?;
        let graph = LinkGraph::from_links(&links);

        if let Some(path) = graph.cycle_on_add(source_id, target_id) {
            warn!(
                project_id,
                source_id,
                target_id,
                ?path,
                "Rejected link that would close a cycle"
            );
            return Err(TrackerError::CycleDetected {
                source_id,
                target_id,
                path,
            });
        }

        let link = self.storage.insert_link(NewLink {
            source_id,
            target_id,
            link_type: link_type.to_string(),
        })?;

        info!(
            project_id,
            link_id = link.id,
            source_id,
            target_id,
            link_type,
            caller,
            "Added link"
        );
        Ok(link)
    }

    /// Remove a link by identifier.
    ///
    /// Removal cannot introduce a cycle, so no graph check or project lock
    /// is involved. No project or caller scoping happens here either; see
    /// [`CommandExecutor::link_project`] for callers that gate removal.
    pub fn remove_link(&self, link_id: LinkId, caller: UserId) -> Result<()> {
        if !self.storage.delete_link(link_id)? {
            return Err(TrackerError::LinkNotFound { id: link_id });
        }
        info!(link_id, caller, "Removed link");
        Ok(())
    }

    /// Project a link belongs to, via its source ticket.
    pub fn link_project(&self, link_id: LinkId) -> Result<ProjectId> {
        let link = self
            .storage
            .get_link(link_id)?
            .ok_or(TrackerError::LinkNotFound { id: link_id })?;
        Ok(self.load_ticket(link.source_id)?.project_id)
    }

    pub fn list_links(&self, project_id: ProjectId) -> Result<Vec<TicketLink>> {
        Ok(self.storage.list_links(project_id)?)
    }
}
