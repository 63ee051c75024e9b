//! SQLite-backed vector index using the `sqlite-vec` extension.
//!
//! Records live in a single `chunks` table; embeddings are stored as JSON
//! arrays and scored in SQL with `vec_distance_cosine`, so similarity
//! search runs entirely inside SQLite. The extension is registered
//! process-wide once via `sqlite3_auto_extension`.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::OnceLock;

use tokio_rusqlite::{Connection, ffi};

use super::{ChunkMetadata, QueryResponse, StoredRecord, VectorIndex};
use crate::types::RetrievalError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS chunks (
    id TEXT PRIMARY KEY,
    source TEXT NOT NULL,
    page_number INTEGER NOT NULL,
    chunk_index INTEGER NOT NULL,
    content TEXT NOT NULL,
    embedding TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source);
";

/// Persistent vector index over a local SQLite file.
#[derive(Clone)]
pub struct SqliteVectorIndex {
    conn: Connection,
}

impl SqliteVectorIndex {
    /// Opens (and initializes if needed) the index at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RetrievalError> {
        register_sqlite_vec()?;
        let conn = Connection::open(path.as_ref().to_path_buf())
            .await
            .map_err(|err| RetrievalError::Storage(err.to_string()))?;
        conn.call(|conn| -> Result<(), tokio_rusqlite::rusqlite::Error> {
            // Fails fast when the extension did not load.
            conn.query_row("SELECT vec_version()", [], |row| row.get::<_, String>(0))
                ?;
            conn.execute_batch(SCHEMA)
                ?;
            Ok(())
        })
        .await
        .map_err(|err| RetrievalError::Storage(err.to_string()))?;
        Ok(Self { conn })
    }
}

fn register_sqlite_vec() -> Result<(), RetrievalError> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

    REGISTERED
        .get_or_init(|| unsafe {
            type SqliteExtensionInit = unsafe extern "C" fn(
                *mut ffi::sqlite3,
                *mut *mut c_char,
                *const ffi::sqlite3_api_routines,
            ) -> i32;

            let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
            let init_fn = transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
            let rc = ffi::sqlite3_auto_extension(Some(init_fn));
            if rc == 0 {
                Ok(())
            } else {
                Err(format!("failed to register sqlite-vec extension (code {rc})"))
            }
        })
        .clone()
        .map_err(RetrievalError::Storage)
}

#[async_trait::async_trait]
impl VectorIndex for SqliteVectorIndex {
    async fn add(&self, record: StoredRecord) -> Result<(), RetrievalError> {
        let embedding = serde_json::to_string(&record.embedding)
            .map_err(|err| RetrievalError::Storage(err.to_string()))?;
        self.conn
            .call(move |conn| -> Result<(), tokio_rusqlite::rusqlite::Error> {
                conn.execute(
                    "INSERT OR REPLACE INTO chunks \
                     (id, source, page_number, chunk_index, content, embedding) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    (
                        &record.id,
                        &record.metadata.source,
                        record.metadata.page_number as i64,
                        record.metadata.chunk_index as i64,
                        &record.document,
                        &embedding,
                    ),
                )
                ?;
                Ok(())
            })
            .await
            .map_err(|err| RetrievalError::Storage(err.to_string()))
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<QueryResponse, RetrievalError> {
        let query_json = serde_json::to_string(embedding)
            .map_err(|err| RetrievalError::Storage(err.to_string()))?;
        self.conn
            .call(move |conn| -> Result<QueryResponse, tokio_rusqlite::rusqlite::Error> {
                let mut stmt = conn
                    .prepare(
                        "SELECT content, source, page_number, chunk_index, \
                         vec_distance_cosine(vec_f32(embedding), vec_f32(?1)) AS distance \
                         FROM chunks ORDER BY distance ASC LIMIT ?2",
                    )
                    ?;

                let rows = stmt
                    .query_map((&query_json, k as i64), |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            ChunkMetadata {
                                source: row.get(1)?,
                                page_number: row.get::<_, i64>(2)? as u32,
                                chunk_index: row.get::<_, i64>(3)? as usize,
                            },
                            row.get::<_, f32>(4)?,
                        ))
                    })
                    ?;

                let mut response = QueryResponse::default();
                for row in rows {
                    let (document, metadata, distance) =
                        row?;
                    response.documents.push(document);
                    response.metadatas.push(metadata);
                    response.distances.push(distance);
                }
                Ok(response)
            })
            .await
            .map_err(|err| RetrievalError::Storage(err.to_string()))
    }

    async fn count(&self) -> Result<usize, RetrievalError> {
        self.conn
            .call(|conn| -> Result<usize, tokio_rusqlite::rusqlite::Error> {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
                    ?;
                Ok(count as usize)
            })
            .await
            .map_err(|err| RetrievalError::Storage(err.to_string()))
    }
}
