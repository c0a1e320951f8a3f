//! Shared table state behind both storage backends.

use crate::domain::{
    LinkId, NewLink, NewTicket, ProjectId, Ticket, TicketId, TicketLink, UserId,
};
use crate::graph::LinkGraph;
use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const SCHEMA_VERSION: u32 = 1;

/// All persisted records plus identifier sequences.
///
/// `BTreeMap` keeps listings in ascending identifier (creation) order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoreState {
    schema_version: u32,
    next_ticket_id: TicketId,
    next_link_id: LinkId,
    tickets: BTreeMap<TicketId, Ticket>,
    links: BTreeMap<LinkId, TicketLink>,
    members: BTreeSet<(ProjectId, UserId)>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            next_ticket_id: 1,
            next_link_id: 1,
            tickets: BTreeMap::new(),
            links: BTreeMap::new(),
            members: BTreeSet::new(),
        }
    }
}

impl StoreState {
    pub(crate) fn get_ticket(&self, id: TicketId) -> Option<Ticket> {
        self.tickets.get(&id).cloned()
    }

    pub(crate) fn list_tickets(&self, project_id: ProjectId) -> Vec<Ticket> {
        self.tickets
            .values()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect()
    }

    pub(crate) fn insert_ticket(&mut self, new: NewTicket) -> Ticket {
        let id = self.next_ticket_id;
        self.next_ticket_id += 1;

        let now = Utc::now();
        let ticket = Ticket {
            id,
            title: new.title,
            description: new.description,
            status: new.status,
            priority: new.priority,
            ticket_type: new.ticket_type,
            parent_id: new.parent_id,
            project_id: new.project_id,
            reporter_id: new.reporter_id,
            assignee_id: new.assignee_id,
            created_at: now,
            updated_at: now,
        };
        self.tickets.insert(id, ticket.clone());
        ticket
    }

    pub(crate) fn update_ticket(&mut self, ticket: &Ticket) -> Result<()> {
        let slot = self
            .tickets
            .get_mut(&ticket.id)
            .ok_or_else(|| anyhow!("Ticket not found: {}", ticket.id))?;
        *slot = ticket.clone();
        Ok(())
    }

    pub(crate) fn delete_ticket(&mut self, id: TicketId) -> bool {
        self.tickets.remove(&id).is_some()
    }

    pub(crate) fn insert_link(&mut self, new: NewLink) -> TicketLink {
        let id = self.next_link_id;
        self.next_link_id += 1;

        let link = TicketLink {
            id,
            source_id: new.source_id,
            target_id: new.target_id,
            link_type: new.link_type,
            created_at: Utc::now(),
        };
        self.links.insert(id, link.clone());
        link
    }

    pub(crate) fn get_link(&self, id: LinkId) -> Option<TicketLink> {
        self.links.get(&id).cloned()
    }

    pub(crate) fn delete_link(&mut self, id: LinkId) -> bool {
        self.links.remove(&id).is_some()
    }

    /// Links whose source ticket belongs to the project (the join a SQL
    /// backend would push down).
    pub(crate) fn list_links(&self, project_id: ProjectId) -> Vec<TicketLink> {
        self.links
            .values()
            .filter(|link| {
                self.tickets
                    .get(&link.source_id)
                    .is_some_and(|t| t.project_id == project_id)
            })
            .cloned()
            .collect()
    }

    pub(crate) fn delete_links_for_ticket(&mut self, ticket_id: TicketId) -> usize {
        let before = self.links.len();
        self.links
            .retain(|_, link| link.source_id != ticket_id && link.target_id != ticket_id);
        before - self.links.len()
    }

    pub(crate) fn grant(&mut self, project_id: ProjectId, user_id: UserId) -> bool {
        self.members.insert((project_id, user_id))
    }

    pub(crate) fn is_member(&self, project_id: ProjectId, user_id: UserId) -> bool {
        self.members.contains(&(project_id, user_id))
    }

    /// Integrity check run when loading persisted state.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.schema_version != SCHEMA_VERSION {
            bail!(
                "Unsupported store schema version {} (expected {})",
                self.schema_version,
                SCHEMA_VERSION
            );
        }

        for link in self.links.values() {
            if !self.tickets.contains_key(&link.source_id)
                || !self.tickets.contains_key(&link.target_id)
            {
                bail!(
                    "Link {} references a missing ticket ({} -> {})",
                    link.id,
                    link.source_id,
                    link.target_id
                );
            }
        }

        let projects: BTreeSet<ProjectId> =
            self.tickets.values().map(|t| t.project_id).collect();
        for project_id in projects {
            let graph = LinkGraph::from_links(&self.list_links(project_id));
            if let Some(cycle) = graph.find_cycle() {
                bail!(
                    "Link graph of project {} contains a cycle: {:?}",
                    project_id,
                    cycle
                );
            }
        }

        Ok(())
    }
}
