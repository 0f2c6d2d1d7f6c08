use crate::models::{ClickEvent, Link, LinkPatch, NewClick, NewLink};
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;

const LINK_COLUMNS: &str = "id, short_code, destination_url, title, description, \
     created_at, updated_at, clicks, is_active";

const CLICK_COLUMNS: &str = "id, link_id, ip_address, user_agent, referer, country, \
     country_code, region, city, latitude, longitude, timezone, isp, timestamp";

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        // foreign_keys must be on for the clicks -> links cascade
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    fn now() -> Result<i64> {
        Ok(std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)?
            .as_secs() as i64)
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                short_code TEXT NOT NULL UNIQUE,
                destination_url TEXT NOT NULL,
                title TEXT,
                description TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                clicks INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_links_short_code ON links(short_code)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS clicks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                link_id INTEGER NOT NULL,
                ip_address TEXT NOT NULL,
                user_agent TEXT,
                referer TEXT,
                country TEXT,
                country_code TEXT,
                region TEXT,
                city TEXT,
                latitude REAL,
                longitude REAL,
                timezone TEXT,
                isp TEXT,
                timestamp INTEGER NOT NULL,
                FOREIGN KEY (link_id) REFERENCES links(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_clicks_link_timestamp ON clicks(link_id, timestamp)",
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn create_link(&self, new: &NewLink) -> StorageResult<Link> {
        let now = Self::now().map_err(StorageError::Other)?;

        let result = sqlx::query(
            r#"
            INSERT INTO links (short_code, destination_url, title, description,
                               created_at, updated_at, is_active)
            VALUES (?, ?, ?, ?, ?, ?, 1)
            ON CONFLICT(short_code) DO NOTHING
            "#,
        )
        .bind(&new.short_code)
        .bind(&new.destination_url)
        .bind(&new.title)
        .bind(&new.description)
        .bind(now)
        .bind(now)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }

        let link = sqlx::query_as::<_, Link>(&format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE short_code = ?"
        ))
        .bind(&new.short_code)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        Ok(link)
    }

    async fn get_link(&self, id: i64) -> Result<Option<Link>> {
        let link =
            sqlx::query_as::<_, Link>(&format!("SELECT {LINK_COLUMNS} FROM links WHERE id = ?"))
                .bind(id)
                .fetch_optional(self.pool.as_ref())
                .await?;
        Ok(link)
    }

    async fn get_link_by_code(&self, short_code: &str) -> Result<Option<Link>> {
        let link = sqlx::query_as::<_, Link>(&format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE short_code = ?"
        ))
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await?;
        Ok(link)
    }

    async fn code_exists(&self, short_code: &str) -> Result<bool> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM links WHERE short_code = ?")
                .bind(short_code)
                .fetch_one(self.pool.as_ref())
                .await?;
        Ok(count > 0)
    }

    async fn list_links(&self, limit: i64, offset: i64) -> Result<Vec<Link>> {
        let links = sqlx::query_as::<_, Link>(&format!(
            "SELECT {LINK_COLUMNS} FROM links ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(links)
    }

    async fn update_link(&self, id: i64, patch: &LinkPatch) -> Result<Option<Link>> {
        let now = Self::now()?;

        let result = sqlx::query(
            r#"
            UPDATE links
            SET destination_url = COALESCE(?, destination_url),
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                is_active = COALESCE(?, is_active),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&patch.destination_url)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.is_active)
        .bind(now)
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_link(id).await
    }

    async fn delete_link(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM links WHERE id = ?")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_clicks(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE links SET clicks = clicks + 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    async fn insert_click(&self, click: &NewClick) -> Result<ClickEvent> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO clicks (link_id, ip_address, user_agent, referer, country,
                                country_code, region, city, latitude, longitude,
                                timezone, isp, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(click.link_id)
        .bind(&click.ip_address)
        .bind(&click.user_agent)
        .bind(&click.referer)
        .bind(&click.country)
        .bind(&click.country_code)
        .bind(&click.region)
        .bind(&click.city)
        .bind(click.latitude)
        .bind(click.longitude)
        .bind(&click.timezone)
        .bind(&click.isp)
        .bind(click.timestamp)
        .fetch_one(self.pool.as_ref())
        .await?;

        let event = sqlx::query_as::<_, ClickEvent>(&format!(
            "SELECT {CLICK_COLUMNS} FROM clicks WHERE id = ?"
        ))
        .bind(id)
        .fetch_one(self.pool.as_ref())
        .await?;
        Ok(event)
    }

    async fn clicks_for_link(&self, link_id: i64, since: Option<i64>) -> Result<Vec<ClickEvent>> {
        let events = match since {
            Some(since) => {
                sqlx::query_as::<_, ClickEvent>(&format!(
                    "SELECT {CLICK_COLUMNS} FROM clicks \
                     WHERE link_id = ? AND timestamp >= ? ORDER BY timestamp ASC, id ASC"
                ))
                .bind(link_id)
                .bind(since)
                .fetch_all(self.pool.as_ref())
                .await?
            }
            None => {
                sqlx::query_as::<_, ClickEvent>(&format!(
                    "SELECT {CLICK_COLUMNS} FROM clicks \
                     WHERE link_id = ? ORDER BY timestamp ASC, id ASC"
                ))
                .bind(link_id)
                .fetch_all(self.pool.as_ref())
                .await?
            }
        };
        Ok(events)
    }

    async fn click_count(&self, link_id: i64) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM clicks WHERE link_id = ?")
            .bind(link_id)
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(count)
    }
}
