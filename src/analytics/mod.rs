// Best-effort query log for the API. Each aggregation/planning request is
// recorded in a small SQLite DB, separate from the catalog store. Logging
// failures are warned and swallowed; they never affect a response.

use chrono::Utc;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

// load .env at module use if present
fn load_dotenv() {
    let _ = dotenv::dotenv();
}

/// Return the path to the analytics DB. Honors ANALYTICS_DB_PATH /
/// ANALYTICS_DB_URL env (sqlite:// and file:// schemes supported).
pub fn analytics_db_path() -> PathBuf {
    load_dotenv();
    if let Ok(p) = env::var("ANALYTICS_DB_PATH") {
        PathBuf::from(p)
    } else if let Ok(p) = env::var("ANALYTICS_DB_URL") {
        if p.starts_with("sqlite://") {
            PathBuf::from(p.trim_start_matches("sqlite://"))
        } else if p.starts_with("file://") {
            PathBuf::from(p.trim_start_matches("file://"))
        } else {
            PathBuf::from("analytics/analytics.db")
        }
    } else {
        PathBuf::from("analytics/analytics.db")
    }
}

/// Initialize the analytics DB (create dir + sqlite file + table).
pub fn init_db() -> Result<(), Box<dyn Error>> {
    let db_path = analytics_db_path();
    if let Some(dir) = db_path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }
    let conn = Connection::open(db_path)?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS queries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ts TEXT NOT NULL,
            duration_ms INTEGER,
            endpoint TEXT,
            student_id INTEGER,
            request_json TEXT,
            response_json TEXT
        )",
        [],
    )?;
    Ok(())
}

/// Insert a query row. Opens a short-lived connection.
pub fn log_query(
    endpoint: &str,
    student_id: i64,
    request_json: &str,
    response_json: &str,
    duration_ms: i64,
) -> Result<(), Box<dyn Error>> {
    let conn = Connection::open(analytics_db_path())?;
    let ts = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO queries (ts, duration_ms, endpoint, student_id, request_json, response_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![ts, duration_ms, endpoint, student_id, request_json, response_json],
    )?;
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryLogRow {
    pub id: i64,
    pub ts: String,
    pub duration_ms: i64,
    pub endpoint: String,
    pub student_id: i64,
}

/// Fetch recent query rows (by id desc), without the request/response bodies.
pub fn fetch_recent(limit: i64) -> Result<Vec<QueryLogRow>, Box<dyn Error>> {
    let conn = Connection::open(analytics_db_path())?;
    let mut stmt = conn.prepare(
        "SELECT id, ts, duration_ms, endpoint, student_id
         FROM queries ORDER BY id DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], |row| {
        Ok(QueryLogRow {
            id: row.get(0)?,
            ts: row.get(1)?,
            duration_ms: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
            endpoint: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            student_id: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
        })
    })?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
