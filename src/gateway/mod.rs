// Typed read access to catalog, enrollment, program and offering records.
//
// The core never talks to a concrete store directly: it receives a
// `&dyn DataGateway` constructed once at process start. Tests inject
// in-memory gateways the same way.
pub mod sqlite;

pub use sqlite::SqliteGateway;

use std::error::Error;

use crate::models::{Course, PrereqSchema, RequirementGroupRow, SectionRecord};

/// Read capabilities the core consumes. Every method returns an empty result
/// (never an error) when no rows match; errors are reserved for the store
/// itself failing.
pub trait DataGateway {
    /// Section ids the student has enrolled in (completed or in-process).
    fn enrolled_section_ids(&self, student_id: i64) -> Result<Vec<i64>, Box<dyn Error>>;

    fn sections_by_ids(&self, section_ids: &[i64]) -> Result<Vec<SectionRecord>, Box<dyn Error>>;

    fn program_id(&self, degree_program: &str) -> Result<Option<i64>, Box<dyn Error>>;

    fn requirement_groups(
        &self,
        program_id: i64,
    ) -> Result<Vec<RequirementGroupRow>, Box<dyn Error>>;

    /// Eligible course codes mapped to a (non-attribute) requirement group.
    fn requirement_courses(&self, group_id: i64) -> Result<Vec<String>, Box<dyn Error>>;

    fn courses_by_codes(&self, codes: &[String]) -> Result<Vec<Course>, Box<dyn Error>>;

    fn sections_by_course_and_term(
        &self,
        course_code: &str,
        term: &str,
    ) -> Result<Vec<SectionRecord>, Box<dyn Error>>;

    fn sections_by_term(&self, term: &str) -> Result<Vec<SectionRecord>, Box<dyn Error>>;

    /// All stored prerequisite rule rows for a course, parsed.
    fn prerequisite_schemas(&self, course_code: &str) -> Result<Vec<PrereqSchema>, Box<dyn Error>>;

    fn course_title(&self, course_code: &str) -> Result<Option<String>, Box<dyn Error>>;
}
