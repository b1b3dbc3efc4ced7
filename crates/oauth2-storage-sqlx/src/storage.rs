use async_trait::async_trait;
use chrono::{DateTime, Utc};
use oauth2_core::{parse_scopes, AccessRequest, AccessTokenSession, OAuth2Error, User};
use oauth2_ports::Storage;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Postgres, Sqlite};
use std::borrow::Cow;
use std::path::PathBuf;

#[derive(Clone, Debug)]
enum DatabasePool {
    Sqlite(Pool<Sqlite>),
    Postgres(Pool<Postgres>),
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    signature: String,
    request_id: String,
    client_id: String,
    grant_type: String,
    granted_scopes: String,
    form: String,
    requested_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for AccessTokenSession {
    type Error = OAuth2Error;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let form = serde_json::from_str(&row.form).map_err(|e| {
            OAuth2Error::server_error(&format!("corrupt access token session form: {e}"))
        })?;

        Ok(Self {
            signature: row.signature,
            request_id: row.request_id,
            client_id: row.client_id,
            grant_type: row.grant_type,
            granted_scopes: parse_scopes(&row.granted_scopes),
            form,
            requested_at: row.requested_at,
        })
    }
}

/// SQL-backed storage implementation (SQLite/Postgres) using SQLx.
pub struct SqlxStorage {
    pool: DatabasePool,
}

impl SqlxStorage {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = if database_url.starts_with("postgres") {
            DatabasePool::Postgres(PgPoolOptions::new().connect(database_url).await?)
        } else {
            // Best-effort: if we can't create the file's directory (permissions, etc.), sqlx
            // will surface the underlying error on connect.
            if let Some(path) = sqlite_db_path(database_url) {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        let _ = std::fs::create_dir_all(parent);
                    }
                }
            }

            // Every connection to `:memory:` opens a separate database, so keep one.
            let max_connections = if database_url.starts_with("sqlite::memory:") {
                1
            } else {
                5
            };
            let connect_url = sqlite_url_with_create_mode(database_url);
            DatabasePool::Sqlite(
                SqlitePoolOptions::new()
                    .max_connections(max_connections)
                    .connect(connect_url.as_ref())
                    .await?,
            )
        };

        Ok(Self { pool })
    }

    /// Name reported as `db_system` in tracing spans.
    pub fn db_system(&self) -> &'static str {
        match &self.pool {
            DatabasePool::Sqlite(_) => "sqlite",
            DatabasePool::Postgres(_) => "postgresql",
        }
    }

    async fn init_sqlx(&self) -> Result<(), sqlx::Error> {
        match &self.pool {
            DatabasePool::Sqlite(pool) => self.bootstrap_sqlite_schema(pool).await,
            DatabasePool::Postgres(pool) => self.bootstrap_postgres_schema(pool).await,
        }
    }

    async fn bootstrap_sqlite_schema(&self, pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS access_token_sessions (
                signature TEXT PRIMARY KEY,
                request_id TEXT NOT NULL,
                client_id TEXT NOT NULL,
                grant_type TEXT NOT NULL,
                granted_scopes TEXT NOT NULL,
                form TEXT NOT NULL,
                requested_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"CREATE INDEX IF NOT EXISTS idx_access_token_sessions_client_id ON access_token_sessions(client_id);"#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn bootstrap_postgres_schema(&self, pool: &Pool<Postgres>) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                enabled BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS access_token_sessions (
                signature TEXT PRIMARY KEY,
                request_id TEXT NOT NULL,
                client_id TEXT NOT NULL,
                grant_type TEXT NOT NULL,
                granted_scopes TEXT NOT NULL,
                form TEXT NOT NULL,
                requested_at TIMESTAMPTZ NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"CREATE INDEX IF NOT EXISTS idx_access_token_sessions_client_id ON access_token_sessions(client_id);"#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl Storage for SqlxStorage {
    async fn init(&self) -> Result<(), OAuth2Error> {
        self.init_sqlx().await.map_err(Into::into)
    }

    async fn healthcheck(&self) -> Result<(), OAuth2Error> {
        // Keep readiness/liveness cheap: don't run bootstrap.
        match &self.pool {
            DatabasePool::Sqlite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
            DatabasePool::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
        }

        Ok(())
    }

    async fn save_user(&self, user: &User) -> Result<(), OAuth2Error> {
        match &self.pool {
            DatabasePool::Sqlite(pool) => {
                sqlx::query(
                    r#"
                    INSERT INTO users (id, username, password_hash, enabled, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&user.id)
                .bind(&user.username)
                .bind(&user.password_hash)
                .bind(user.enabled)
                .bind(user.created_at)
                .bind(user.updated_at)
                .execute(pool)
                .await?;
            }
            DatabasePool::Postgres(pool) => {
                sqlx::query(
                    r#"
                    INSERT INTO users (id, username, password_hash, enabled, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(&user.id)
                .bind(&user.username)
                .bind(&user.password_hash)
                .bind(user.enabled)
                .bind(user.created_at)
                .bind(user.updated_at)
                .execute(pool)
                .await?;
            }
        }

        Ok(())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, OAuth2Error> {
        let user = match &self.pool {
            DatabasePool::Sqlite(pool) => {
                sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
                    .bind(username)
                    .fetch_optional(pool)
                    .await?
            }
            DatabasePool::Postgres(pool) => {
                sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
                    .bind(username)
                    .fetch_optional(pool)
                    .await?
            }
        };

        Ok(user)
    }

    async fn create_access_token_session(
        &self,
        signature: &str,
        request: &AccessRequest,
    ) -> Result<(), OAuth2Error> {
        let session = AccessTokenSession::from_request(signature, request);
        let form = serde_json::to_string(&session.form)
            .map_err(|e| OAuth2Error::server_error(&e.to_string()))?;
        let granted_scopes = session.granted_scopes.join(" ");

        match &self.pool {
            DatabasePool::Sqlite(pool) => {
                sqlx::query(
                    r#"
                    INSERT INTO access_token_sessions (signature, request_id, client_id, grant_type, granted_scopes, form, requested_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&session.signature)
                .bind(&session.request_id)
                .bind(&session.client_id)
                .bind(&session.grant_type)
                .bind(&granted_scopes)
                .bind(&form)
                .bind(session.requested_at)
                .execute(pool)
                .await?;
            }
            DatabasePool::Postgres(pool) => {
                sqlx::query(
                    r#"
                    INSERT INTO access_token_sessions (signature, request_id, client_id, grant_type, granted_scopes, form, requested_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(&session.signature)
                .bind(&session.request_id)
                .bind(&session.client_id)
                .bind(&session.grant_type)
                .bind(&granted_scopes)
                .bind(&form)
                .bind(session.requested_at)
                .execute(pool)
                .await?;
            }
        }

        Ok(())
    }

    async fn get_access_token_session(
        &self,
        signature: &str,
    ) -> Result<Option<AccessTokenSession>, OAuth2Error> {
        let row = match &self.pool {
            DatabasePool::Sqlite(pool) => {
                sqlx::query_as::<_, SessionRow>(
                    "SELECT * FROM access_token_sessions WHERE signature = ?",
                )
                .bind(signature)
                .fetch_optional(pool)
                .await?
            }
            DatabasePool::Postgres(pool) => {
                sqlx::query_as::<_, SessionRow>(
                    "SELECT * FROM access_token_sessions WHERE signature = $1",
                )
                .bind(signature)
                .fetch_optional(pool)
                .await?
            }
        };

        row.map(AccessTokenSession::try_from).transpose()
    }

    async fn delete_access_token_session(&self, signature: &str) -> Result<(), OAuth2Error> {
        match &self.pool {
            DatabasePool::Sqlite(pool) => {
                sqlx::query("DELETE FROM access_token_sessions WHERE signature = ?")
                    .bind(signature)
                    .execute(pool)
                    .await?;
            }
            DatabasePool::Postgres(pool) => {
                sqlx::query("DELETE FROM access_token_sessions WHERE signature = $1")
                    .bind(signature)
                    .execute(pool)
                    .await?;
            }
        }

        Ok(())
    }
}

fn sqlite_db_path(database_url: &str) -> Option<PathBuf> {
    if !database_url.starts_with("sqlite:") || database_url.starts_with("sqlite::memory:") {
        return None;
    }

    let mut rest = &database_url["sqlite:".len()..];

    // Reduce URL-style leading slashes to a single one.
    if rest.starts_with("///") {
        rest = &rest[2..];
    } else if rest.starts_with("//") {
        rest = &rest[1..];
    }

    let path_part = rest.split('?').next().unwrap_or(rest);
    if path_part.is_empty() {
        return None;
    }

    Some(PathBuf::from(path_part))
}

fn sqlite_url_with_create_mode(database_url: &str) -> Cow<'_, str> {
    if !database_url.starts_with("sqlite:")
        || database_url.starts_with("sqlite::memory:")
        || database_url.contains("mode=")
    {
        return Cow::Borrowed(database_url);
    }

    let sep = if database_url.contains('?') { '&' } else { '?' };
    Cow::Owned(format!("{database_url}{sep}mode=rwc"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_paths_are_extracted_from_urls() {
        assert_eq!(
            sqlite_db_path("sqlite:///var/lib/oauth2/db.sqlite?mode=rwc"),
            Some(PathBuf::from("/var/lib/oauth2/db.sqlite"))
        );
        assert_eq!(
            sqlite_db_path("sqlite:oauth2.db"),
            Some(PathBuf::from("oauth2.db"))
        );
        assert_eq!(sqlite_db_path("sqlite::memory:"), None);
        assert_eq!(sqlite_db_path("postgres://localhost/db"), None);
    }

    #[test]
    fn create_mode_is_added_once() {
        assert_eq!(
            sqlite_url_with_create_mode("sqlite:oauth2.db"),
            "sqlite:oauth2.db?mode=rwc"
        );
        assert_eq!(
            sqlite_url_with_create_mode("sqlite:oauth2.db?cache=shared"),
            "sqlite:oauth2.db?cache=shared&mode=rwc"
        );
        assert_eq!(
            sqlite_url_with_create_mode("sqlite:oauth2.db?mode=ro"),
            "sqlite:oauth2.db?mode=ro"
        );
        assert_eq!(sqlite_url_with_create_mode("sqlite::memory:"), "sqlite::memory:");
    }

    #[tokio::test]
    async fn in_memory_database_round_trips_sessions() {
        let storage = SqlxStorage::new("sqlite::memory:").await.unwrap();
        storage.init().await.unwrap();
        assert_eq!(storage.db_system(), "sqlite");

        let form = [("username", "alice"), ("password", "correct")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut request = AccessRequest::new("client-1", "password", form);
        request.grant_scope("read");

        storage
            .create_access_token_session("sig-1", &request)
            .await
            .unwrap();
        let dup = storage.create_access_token_session("sig-1", &request).await;
        assert!(dup.is_err());

        let session = storage
            .get_access_token_session("sig-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.request_id, request.id);
        assert_eq!(session.granted_scopes, vec!["read"]);
        assert!(!session.form.contains_key("password"));

        storage.delete_access_token_session("sig-1").await.unwrap();
        assert!(storage
            .get_access_token_session("sig-1")
            .await
            .unwrap()
            .is_none());
    }
}
