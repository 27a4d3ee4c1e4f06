use anyhow::Context;
use sqlx::SqlitePool;

const MEMORY_SCHEMA_META_TABLE: &str = "
CREATE TABLE IF NOT EXISTS memory_schema_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
)";
const MEMORY_SCHEMA_VERSION_KEY: &str = "memory_schema_version";
pub(super) const MEMORY_SCHEMA_VERSION: u32 = 1;

const DOCUMENTS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS documents (
    partition   TEXT NOT NULL,
    id          TEXT NOT NULL,
    text        TEXT NOT NULL,
    metadata    TEXT NOT NULL DEFAULT '{}',
    embedding   BLOB,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    PRIMARY KEY (partition, id)
)";

const DOCUMENTS_INDEX: &str = "
CREATE INDEX IF NOT EXISTS idx_documents_recency
    ON documents(partition, updated_at DESC)";

const DOCUMENTS_FTS: &str = "
CREATE VIRTUAL TABLE IF NOT EXISTS documents_fts USING fts5(
    text, content=documents, content_rowid=rowid
)";

const FTS_TRIGGERS: [&str; 3] = [
    "CREATE TRIGGER IF NOT EXISTS documents_ai AFTER INSERT ON documents BEGIN
        INSERT INTO documents_fts(rowid, text) VALUES (new.rowid, new.text);
    END",
    "CREATE TRIGGER IF NOT EXISTS documents_ad AFTER DELETE ON documents BEGIN
        INSERT INTO documents_fts(documents_fts, rowid, text)
        VALUES ('delete', old.rowid, old.text);
    END",
    "CREATE TRIGGER IF NOT EXISTS documents_au AFTER UPDATE ON documents BEGIN
        INSERT INTO documents_fts(documents_fts, rowid, text)
        VALUES ('delete', old.rowid, old.text);
        INSERT INTO documents_fts(rowid, text) VALUES (new.rowid, new.text);
    END",
];

async fn ensure_schema_version(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(MEMORY_SCHEMA_META_TABLE)
        .execute(pool)
        .await
        .context("create memory_schema_meta table")?;

    let stored_version: Option<(String,)> =
        sqlx::query_as("SELECT value FROM memory_schema_meta WHERE key = $1")
            .bind(MEMORY_SCHEMA_VERSION_KEY)
            .fetch_optional(pool)
            .await
            .context("load memory schema version")?;

    if let Some((value,)) = stored_version {
        let parsed = value
            .parse::<u32>()
            .with_context(|| format!("invalid memory schema version value: {value}"))?;
        anyhow::ensure!(
            parsed == MEMORY_SCHEMA_VERSION,
            "incompatible memory schema version: stored={parsed}, expected={MEMORY_SCHEMA_VERSION}. \
remove the memory database and restart."
        );
        return Ok(());
    }

    sqlx::query("INSERT INTO memory_schema_meta (key, value) VALUES ($1, $2)")
        .bind(MEMORY_SCHEMA_VERSION_KEY)
        .bind(MEMORY_SCHEMA_VERSION.to_string())
        .execute(pool)
        .await
        .context("persist memory schema version")?;

    Ok(())
}

pub(super) async fn init_schema(pool: &SqlitePool) -> anyhow::Result<()> {
    ensure_schema_version(pool).await?;

    for statement in [DOCUMENTS_TABLE, DOCUMENTS_INDEX, DOCUMENTS_FTS] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("create documents schema")?;
    }
    for trigger in FTS_TRIGGERS {
        sqlx::query(trigger)
            .execute(pool)
            .await
            .context("create documents FTS trigger")?;
    }
    Ok(())
}
