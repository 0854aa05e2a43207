use rusqlite::{params, params_from_iter, Connection};
use std::env;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::gateway::DataGateway;
use crate::models::{Course, PrereqSchema, RequirementGroupRow, SectionRecord};

// load .env at open time if present
fn load_dotenv() {
    let _ = dotenv::dotenv();
}

/// Return the path to the catalog store. Honors GRADPLAN_DB_PATH /
/// GRADPLAN_DB_URL env (sqlite:// and file:// schemes supported).
pub fn catalog_db_path() -> PathBuf {
    load_dotenv();
    if let Ok(p) = env::var("GRADPLAN_DB_PATH") {
        PathBuf::from(p)
    } else if let Ok(p) = env::var("GRADPLAN_DB_URL") {
        if p.starts_with("sqlite://") {
            // support sqlite:///absolute/path and sqlite://relative/path
            PathBuf::from(p.trim_start_matches("sqlite://"))
        } else if p.starts_with("file://") {
            PathBuf::from(p.trim_start_matches("file://"))
        } else {
            PathBuf::from("data/catalog.db")
        }
    } else {
        PathBuf::from("data/catalog.db")
    }
}

/// SQLite-backed Data Gateway. The connection is mutex-guarded so a single
/// gateway can serve concurrent read calls from the HTTP handlers.
pub struct SqliteGateway {
    conn: Mutex<Connection>,
}

impl fmt::Debug for SqliteGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SqliteGateway(..)")
    }
}

impl SqliteGateway {
    /// Open (creating if needed) the catalog store at the configured path.
    pub fn open() -> Result<Self, Box<dyn Error>> {
        let db_path = catalog_db_path();
        if let Some(dir) = db_path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let conn = Connection::open(db_path)?;
        init_schema(&conn)?;
        Ok(SqliteGateway {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, Box<dyn Error>> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(SqliteGateway {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, Box<dyn Error>> {
        self.conn
            .lock()
            .map_err(|_| "catalog store connection poisoned".into())
    }

    // ---- seed / import helpers -------------------------------------------

    pub fn insert_course(&self, code: &str, title: &str, credits: i64) -> Result<(), Box<dyn Error>> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO courses (code, title, credits) VALUES (?1, ?2, ?3)",
            params![code, title, credits],
        )?;
        Ok(())
    }

    pub fn insert_section(&self, section: &SectionRecord) -> Result<(), Box<dyn Error>> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO sections
                (section_id, course_code, term, section, credits, attribute, instructor, schedule)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                section.section_id,
                section.course_code,
                section.term,
                section.section,
                section.credits,
                section.attribute,
                section.instructor,
                section.schedule,
            ],
        )?;
        Ok(())
    }

    pub fn insert_enrollment(&self, student_id: i64, section_id: i64) -> Result<(), Box<dyn Error>> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO enrollments (student_id, section_id) VALUES (?1, ?2)",
            params![student_id, section_id],
        )?;
        Ok(())
    }

    pub fn insert_program(&self, degree_program: &str) -> Result<i64, Box<dyn Error>> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO programs (degree_program) VALUES (?1)",
            params![degree_program],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_requirement_group(
        &self,
        program_id: i64,
        sequence_id: i64,
        name: &str,
        required_credits: i64,
        note: &str,
    ) -> Result<i64, Box<dyn Error>> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO requirement_groups (program_id, json_group_id, name, req_credits, note)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![program_id, sequence_id, name, required_credits, note],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_requirement_course(
        &self,
        group_id: i64,
        course_code: &str,
    ) -> Result<(), Box<dyn Error>> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO requirement_courses (group_id, course_code) VALUES (?1, ?2)",
            params![group_id, course_code],
        )?;
        Ok(())
    }

    /// Store a prerequisite rule row. `schema_json` must be the JSON encoding
    /// of a rule tree (leaf, and/or composite, or list).
    pub fn insert_prerequisite(
        &self,
        course_code: &str,
        schema_json: &str,
    ) -> Result<(), Box<dyn Error>> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO prerequisites (course_code, prerequisite_schema) VALUES (?1, ?2)",
            params![course_code, schema_json],
        )?;
        Ok(())
    }
}

/// Create the catalog tables when missing.
fn init_schema(conn: &Connection) -> Result<(), Box<dyn Error>> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS courses (
            code TEXT PRIMARY KEY,
            title TEXT,
            credits INTEGER
        );

        CREATE TABLE IF NOT EXISTS sections (
            section_id INTEGER PRIMARY KEY,
            course_code TEXT NOT NULL,
            term TEXT NOT NULL,
            section TEXT,
            credits INTEGER,
            attribute TEXT,
            instructor TEXT,
            schedule TEXT
        );

        CREATE TABLE IF NOT EXISTS enrollments (
            student_id INTEGER NOT NULL,
            section_id INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS programs (
            program_id INTEGER PRIMARY KEY AUTOINCREMENT,
            degree_program TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS requirement_groups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            program_id INTEGER NOT NULL,
            json_group_id INTEGER,
            name TEXT NOT NULL,
            req_credits INTEGER,
            note TEXT
        );

        CREATE TABLE IF NOT EXISTS requirement_courses (
            group_id INTEGER NOT NULL,
            course_code TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS prerequisites (
            course_code TEXT NOT NULL,
            prerequisite_schema TEXT
        );",
    )?;
    Ok(())
}

fn section_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SectionRecord> {
    Ok(SectionRecord {
        section_id: row.get(0)?,
        course_code: row.get(1)?,
        term: row.get(2)?,
        section: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        credits: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
        attribute: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        instructor: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        schedule: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
    })
}

const SECTION_COLUMNS: &str =
    "section_id, course_code, term, section, credits, attribute, instructor, schedule";

impl DataGateway for SqliteGateway {
    fn enrolled_section_ids(&self, student_id: i64) -> Result<Vec<i64>, Box<dyn Error>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT section_id FROM enrollments WHERE student_id = ?1")?;
        let rows = stmt.query_map(params![student_id], |row| row.get::<_, i64>(0))?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    fn sections_by_ids(&self, section_ids: &[i64]) -> Result<Vec<SectionRecord>, Box<dyn Error>> {
        if section_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.lock()?;
        let placeholders = vec!["?"; section_ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM sections WHERE section_id IN ({}) ORDER BY section_id",
            SECTION_COLUMNS, placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(section_ids.iter()), section_from_row)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    fn program_id(&self, degree_program: &str) -> Result<Option<i64>, Box<dyn Error>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT program_id FROM programs WHERE degree_program = ?1 LIMIT 1")?;
        let mut rows = stmt.query(params![degree_program])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    fn requirement_groups(
        &self,
        program_id: i64,
    ) -> Result<Vec<RequirementGroupRow>, Box<dyn Error>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, json_group_id, name, req_credits, note
             FROM requirement_groups WHERE program_id = ?1",
        )?;
        let rows = stmt.query_map(params![program_id], |row| {
            Ok(RequirementGroupRow {
                id: row.get(0)?,
                sequence_id: row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                name: row.get(2)?,
                required_credits: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
                note: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    fn requirement_courses(&self, group_id: i64) -> Result<Vec<String>, Box<dyn Error>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT course_code FROM requirement_courses WHERE group_id = ?1")?;
        let rows = stmt.query_map(params![group_id], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    fn courses_by_codes(&self, codes: &[String]) -> Result<Vec<Course>, Box<dyn Error>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.lock()?;
        let placeholders = vec!["?"; codes.len()].join(", ");
        let sql = format!(
            "SELECT code, title, credits FROM courses WHERE code IN ({})",
            placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(codes.iter()), |row| {
            Ok(Course {
                code: row.get(0)?,
                title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                credits: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    fn sections_by_course_and_term(
        &self,
        course_code: &str,
        term: &str,
    ) -> Result<Vec<SectionRecord>, Box<dyn Error>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM sections WHERE course_code = ?1 AND term = ?2 ORDER BY section_id",
            SECTION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![course_code, term], section_from_row)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    fn sections_by_term(&self, term: &str) -> Result<Vec<SectionRecord>, Box<dyn Error>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM sections WHERE term = ?1 ORDER BY section_id",
            SECTION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![term], section_from_row)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    fn prerequisite_schemas(&self, course_code: &str) -> Result<Vec<PrereqSchema>, Box<dyn Error>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT prerequisite_schema FROM prerequisites WHERE course_code = ?1",
        )?;
        let rows = stmt.query_map(params![course_code], |row| {
            row.get::<_, Option<String>>(0)
        })?;
        let mut out = Vec::new();
        for r in rows {
            let Some(raw) = r? else { continue };
            match serde_json::from_str::<PrereqSchema>(&raw) {
                Ok(schema) => out.push(schema),
                Err(e) => {
                    eprintln!(
                        "WARN: unparseable prerequisite schema for {}: {}",
                        course_code, e
                    );
                }
            }
        }
        Ok(out)
    }

    fn course_title(&self, course_code: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT title FROM courses WHERE code = ?1 LIMIT 1")?;
        let mut rows = stmt.query(params![course_code])?;
        match rows.next()? {
            Some(row) => Ok(row.get::<_, Option<String>>(0)?),
            None => Ok(None),
        }
    }
}
