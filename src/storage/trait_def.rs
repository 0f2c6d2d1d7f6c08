use crate::models::{ClickEvent, Link, LinkPatch, NewClick, NewLink};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("short code already exists")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables, indexes)
    async fn init(&self) -> Result<()>;

    /// Create a new link; returns `Conflict` if the short code is taken
    async fn create_link(&self, new: &NewLink) -> StorageResult<Link>;

    /// Get a link by id
    async fn get_link(&self, id: i64) -> Result<Option<Link>>;

    /// Get a link by its unique short code (active or not)
    async fn get_link_by_code(&self, short_code: &str) -> Result<Option<Link>>;

    /// Check whether a short code is already taken
    async fn code_exists(&self, short_code: &str) -> Result<bool>;

    /// List links, newest first
    async fn list_links(&self, limit: i64, offset: i64) -> Result<Vec<Link>>;

    /// Apply a partial update; returns the updated link, or None if missing.
    /// Never touches `short_code` or `clicks`.
    async fn update_link(&self, id: i64, patch: &LinkPatch) -> Result<Option<Link>>;

    /// Delete a link and all of its click history
    async fn delete_link(&self, id: i64) -> Result<bool>;

    /// Increment the cached click counter
    async fn increment_clicks(&self, id: i64) -> Result<()>;

    /// Append a click event to the log
    async fn insert_click(&self, click: &NewClick) -> Result<ClickEvent>;

    /// Click events for a link, oldest first, optionally bounded below by timestamp
    async fn clicks_for_link(&self, link_id: i64, since: Option<i64>) -> Result<Vec<ClickEvent>>;

    /// Authoritative click count from the log
    async fn click_count(&self, link_id: i64) -> Result<i64>;
}
