//! JSON file-based storage implementation.
//!
//! All records are stored in a single snapshot file, `data/store.json`, under
//! the storage root. Every mutation is applied to a copy of the cached state,
//! written atomically (temp file, then rename), and only then published to
//! the cache, so a failed write leaves both disk and memory unchanged.
//!
//! One process should own a store directory at a time. Clones of one
//! instance share the cache; separate instances over the same directory do
//! not see each other's writes.

use crate::domain::{LinkId, NewLink, NewTicket, ProjectId, Ticket, TicketId, TicketLink, UserId};
use crate::storage::state::StoreState;
use crate::storage::{LinkStore, ProjectAccess, TicketStore};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

const DATA_DIR: &str = "data";
const STORE_FILE: &str = "data/store.json";

/// JSON snapshot storage for tickets, links and memberships.
#[derive(Clone)]
pub struct JsonFileStorage {
    root: PathBuf,
    cache: Arc<Mutex<Option<StoreState>>>,
}

impl JsonFileStorage {
    /// Create a new JSON file storage instance at the given root path
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            cache: Arc::new(Mutex::new(None)),
        }
    }

    /// Create the storage and initialize its directory in one step
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let storage = Self::new(root);
        storage.init()?;
        Ok(storage)
    }

    /// Root directory of this store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Record that a user is a member of a project.
    pub fn grant_access(&self, project_id: ProjectId, user_id: UserId) -> Result<bool> {
        self.mutate(|state| Ok(state.grant(project_id, user_id)))
    }

    fn store_path(&self) -> PathBuf {
        self.root.join(STORE_FILE)
    }

    fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data).context("Failed to serialize data")?;

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, json).context("Failed to write temporary file")?;
        fs::rename(&temp_path, path).context("Failed to rename temporary file")?;

        Ok(())
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, path: &Path) -> Result<T> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        serde_json::from_str(&contents).context("Failed to deserialize data")
    }

    fn load_from_disk(&self) -> Result<StoreState> {
        let path = self.store_path();
        if !path.exists() {
            return Ok(StoreState::default());
        }

        let state: StoreState = self.read_json(&path)?;
        state
            .validate()
            .with_context(|| format!("Store at {} failed integrity check", path.display()))?;
        Ok(state)
    }

    fn lock_cache(&self) -> Result<MutexGuard<'_, Option<StoreState>>> {
        self.cache
            .lock()
            .map_err(|_| anyhow!("JSON store cache lock poisoned"))
    }

    fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> Result<R> {
        let mut cache = self.lock_cache()?;
        if cache.is_none() {
            *cache = Some(self.load_from_disk()?);
        }
        let state = cache
            .as_ref()
            .ok_or_else(|| anyhow!("JSON store cache is empty"))?;
        Ok(f(state))
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut StoreState) -> Result<R>) -> Result<R> {
        let mut cache = self.lock_cache()?;
        let mut working = match cache.as_ref() {
            Some(state) => state.clone(),
            None => self.load_from_disk()?,
        };

        let result = f(&mut working)?;
        self.write_json(&self.store_path(), &working)?;
        *cache = Some(working);
        Ok(result)
    }
}

impl TicketStore for JsonFileStorage {
    fn init(&self) -> Result<()> {
        let data_dir = self.root.join(DATA_DIR);
        fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

        let state = self.load_from_disk()?;
        if !self.store_path().exists() {
            self.write_json(&self.store_path(), &state)?;
        }
        *self.lock_cache()? = Some(state);

        Ok(())
    }

    fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>> {
        self.read(|state| state.get_ticket(id))
    }

    fn list_tickets(&self, project_id: ProjectId) -> Result<Vec<Ticket>> {
        self.read(|state| state.list_tickets(project_id))
    }

    fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket> {
        self.mutate(|state| Ok(state.insert_ticket(ticket)))
    }

    fn update_ticket(&self, ticket: &Ticket) -> Result<()> {
        self.mutate(|state| state.update_ticket(ticket))
    }

    fn delete_ticket(&self, id: TicketId) -> Result<bool> {
        self.mutate(|state| Ok(state.delete_ticket(id)))
    }
}

impl LinkStore for JsonFileStorage {
    fn insert_link(&self, link: NewLink) -> Result<TicketLink> {
        self.mutate(|state| Ok(state.insert_link(link)))
    }

    fn get_link(&self, id: LinkId) -> Result<Option<TicketLink>> {
        self.read(|state| state.get_link(id))
    }

    fn delete_link(&self, id: LinkId) -> Result<bool> {
        self.mutate(|state| Ok(state.delete_link(id)))
    }

    fn list_links(&self, project_id: ProjectId) -> Result<Vec<TicketLink>> {
        self.read(|state| state.list_links(project_id))
    }

    fn delete_links_for_ticket(&self, ticket_id: TicketId) -> Result<usize> {
        self.mutate(|state| Ok(state.delete_links_for_ticket(ticket_id)))
    }
}

impl ProjectAccess for JsonFileStorage {
    fn is_member(&self, project_id: ProjectId, user_id: UserId) -> Result<bool> {
        self.read(|state| state.is_member(project_id, user_id))
    }
}
