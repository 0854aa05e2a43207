#![allow(dead_code)]

use gradplan::gateway::SqliteGateway;
use gradplan::models::SectionRecord;

/// Fresh in-memory catalog store.
pub fn empty_gateway() -> SqliteGateway {
    SqliteGateway::open_in_memory().expect("open in-memory catalog store")
}

pub fn add_course(gw: &SqliteGateway, code: &str, title: &str, credits: i64) {
    gw.insert_course(code, title, credits).expect("insert course");
}

pub fn add_section(
    gw: &SqliteGateway,
    section_id: i64,
    course_code: &str,
    term: &str,
    credits: i64,
    attribute: &str,
) {
    gw.insert_section(&SectionRecord {
        section_id,
        course_code: course_code.to_string(),
        term: term.to_string(),
        section: "01".to_string(),
        credits,
        attribute: attribute.to_string(),
        instructor: String::new(),
        schedule: String::new(),
    })
    .expect("insert section");
}

pub fn enroll(gw: &SqliteGateway, student_id: i64, section_id: i64) {
    gw.insert_enrollment(student_id, section_id).expect("insert enrollment");
}

pub fn add_program(gw: &SqliteGateway, name: &str) -> i64 {
    gw.insert_program(name).expect("insert program")
}

pub fn add_group(
    gw: &SqliteGateway,
    program_id: i64,
    sequence_id: i64,
    name: &str,
    required_credits: i64,
    note: &str,
) -> i64 {
    gw.insert_requirement_group(program_id, sequence_id, name, required_credits, note)
        .expect("insert requirement group")
}

pub fn map_courses(gw: &SqliteGateway, group_id: i64, codes: &[&str]) {
    for code in codes {
        gw.insert_requirement_course(group_id, code)
            .expect("insert requirement course");
    }
}

pub fn add_prereq(gw: &SqliteGateway, course_code: &str, schema_json: &str) {
    gw.insert_prerequisite(course_code, schema_json)
        .expect("insert prerequisite");
}

/// Enroll the student in a synthetic completed section of `course_code`,
/// creating the section row on the fly. Terms before the planning term.
pub fn complete_course(
    gw: &SqliteGateway,
    student_id: i64,
    section_id: i64,
    course_code: &str,
    credits: i64,
) {
    add_section(gw, section_id, course_code, "Spring 2025", credits, "");
    enroll(gw, student_id, section_id);
}
