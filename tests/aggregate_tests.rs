mod common;

use common::*;
use gradplan::algorithm::aggregate;
use gradplan::models::CandidateCourses;

const MAJOR: &str = "B.S. Computer Science";
const CORE: &str = "University Core Requirements";

#[test]
fn student_with_no_enrollments_gets_empty_sides() {
    let gw = empty_gateway();
    add_program(&gw, MAJOR);

    let result = aggregate(&gw, 1, MAJOR, CORE).expect("aggregate");
    assert!(result.core_requirements.is_empty());
    assert!(result.major_requirements.is_empty());

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(
        value,
        serde_json::json!({"core_requirements": {}, "major_requirements": {}})
    );
}

#[test]
fn missing_program_is_not_an_error() {
    let gw = empty_gateway();
    complete_course(&gw, 1, 800, "CPSC 121", 3);

    let result = aggregate(&gw, 1, "No Such Program", "Also Missing").expect("aggregate");
    assert!(result.core_requirements.is_empty());
    assert!(result.major_requirements.is_empty());
}

#[test]
fn invalid_input_is_rejected_before_any_work() {
    let gw = empty_gateway();
    assert!(aggregate(&gw, 0, MAJOR, CORE).is_err());
    assert!(aggregate(&gw, 1, "", CORE).is_err());
    assert!(aggregate(&gw, 1, MAJOR, " ").is_err());
}

#[test]
fn course_list_group_progress() {
    let gw = empty_gateway();
    let major_id = add_program(&gw, MAJOR);
    let group_id = add_group(&gw, major_id, 1, "Foundations", 6, "");
    map_courses(&gw, group_id, &["CPSC 121", "CPSC 122"]);
    add_course(&gw, "CPSC 121", "Computer Science I", 3);
    add_course(&gw, "CPSC 122", "Computer Science II", 3);
    complete_course(&gw, 1, 800, "CPSC 121", 3);

    let result = aggregate(&gw, 1, MAJOR, CORE).expect("aggregate");
    let group = &result.major_requirements[0];
    assert_eq!(group.group, "Foundations");
    assert_eq!(group.required_credits, 6);
    assert_eq!(group.taken_credits, 3);
    assert_eq!(group.remaining_credits, 3);
    assert_eq!(group.taken_courses, vec!["CPSC 121"]);
    // the displayed list is the pool minus what was allocated
    assert_eq!(
        group.available,
        CandidateCourses::List(vec!["CPSC 122".to_string()])
    );
}

#[test]
fn remaining_credits_never_go_negative() {
    let gw = empty_gateway();
    let major_id = add_program(&gw, MAJOR);
    let group_id = add_group(&gw, major_id, 1, "Foundations", 3, "");
    map_courses(&gw, group_id, &["CPSC 121", "CPSC 122"]);
    add_course(&gw, "CPSC 121", "Computer Science I", 3);
    add_course(&gw, "CPSC 122", "Computer Science II", 3);
    complete_course(&gw, 1, 800, "CPSC 121", 3);
    complete_course(&gw, 1, 801, "CPSC 122", 3);

    let result = aggregate(&gw, 1, MAJOR, CORE).expect("aggregate");
    let group = &result.major_requirements[0];
    assert_eq!(group.taken_credits, 6);
    assert_eq!(group.remaining_credits, 0);
}

#[test]
fn core_group_without_matching_tag_keeps_the_sentinel() {
    let gw = empty_gateway();
    let core_id = add_program(&gw, CORE);
    add_group(&gw, core_id, 1, "Core Philosophy", 3, "");
    // an enrollment with no Core: Philosophy tag anywhere
    complete_course(&gw, 1, 800, "CPSC 121", 3);

    let result = aggregate(&gw, 1, MAJOR, CORE).expect("aggregate");
    let group = &result.core_requirements[0];
    assert_eq!(group.expected_attribute.as_deref(), Some("Philosophy"));
    assert_eq!(group.taken_credits, 0);
    assert_eq!(group.remaining_credits, 3);

    let value = serde_json::to_value(group).unwrap();
    assert_eq!(value["available_courses"], serde_json::json!("CORE 3"));
}

#[test]
fn core_group_allocates_by_attribute_tag() {
    let gw = empty_gateway();
    let core_id = add_program(&gw, CORE);
    add_group(&gw, core_id, 1, "Core Philosophy", 6, "");
    add_course(&gw, "PHIL 101", "Reasoning", 3);
    add_section(&gw, 800, "PHIL 101", "Spring 2025", 3, "Core: Philosophy, Honors");
    enroll(&gw, 1, 800);

    let result = aggregate(&gw, 1, MAJOR, CORE).expect("aggregate");
    let group = &result.core_requirements[0];
    assert_eq!(group.taken_courses, vec!["PHIL 101"]);
    assert_eq!(group.taken_credits, 3);
    assert_eq!(group.remaining_credits, 3);
}

#[test]
fn exclusive_allocation_blocks_later_groups_unless_whitelisted() {
    let gw = empty_gateway();
    let major_id = add_program(&gw, MAJOR);
    let g1 = add_group(&gw, major_id, 1, "Foundations", 3, "");
    let g2 = add_group(&gw, major_id, 2, "Electives A", 6, "");
    let g3 = add_group(&gw, major_id, 3, "Breadth", 3, "Can double count with (1)");
    map_courses(&gw, g1, &["CPSC 121"]);
    map_courses(&gw, g2, &["CPSC 121", "CPSC 322"]);
    map_courses(&gw, g3, &["CPSC 121"]);
    add_course(&gw, "CPSC 121", "Computer Science I", 3);
    complete_course(&gw, 1, 800, "CPSC 121", 3);

    let result = aggregate(&gw, 1, MAJOR, CORE).expect("aggregate");
    let foundations = &result.major_requirements[0];
    let electives = &result.major_requirements[1];
    let breadth = &result.major_requirements[2];

    assert_eq!(foundations.taken_courses, vec!["CPSC 121"]);
    // claimed exclusively by group 1: not reusable here
    assert!(electives.taken_courses.is_empty());
    assert_eq!(
        electives.available,
        CandidateCourses::List(vec!["CPSC 322".to_string()])
    );
    // whitelisted: the same course counts again
    assert_eq!(breadth.taken_courses, vec!["CPSC 121"]);
    assert_eq!(breadth.double_count_groups, Some(vec![1]));
}

#[test]
fn missing_catalog_rows_contribute_zero_credits() {
    let gw = empty_gateway();
    let major_id = add_program(&gw, MAJOR);
    let group_id = add_group(&gw, major_id, 1, "Foundations", 6, "");
    map_courses(&gw, group_id, &["CPSC 121"]);
    // no catalog row for CPSC 121
    complete_course(&gw, 1, 800, "CPSC 121", 3);

    let result = aggregate(&gw, 1, MAJOR, CORE).expect("aggregate");
    let group = &result.major_requirements[0];
    assert_eq!(group.taken_courses, vec!["CPSC 121"]);
    assert_eq!(group.taken_credits, 0);
    assert_eq!(group.remaining_credits, 6);
}

#[test]
fn aggregate_is_idempotent() {
    let gw = empty_gateway();
    let major_id = add_program(&gw, MAJOR);
    let core_id = add_program(&gw, CORE);
    let g1 = add_group(&gw, major_id, 1, "Foundations", 6, "");
    add_group(&gw, core_id, 1, "Core Writing", 3, "");
    map_courses(&gw, g1, &["CPSC 121", "CPSC 122"]);
    add_course(&gw, "CPSC 121", "Computer Science I", 3);
    complete_course(&gw, 1, 800, "CPSC 121", 3);

    let first = serde_json::to_value(aggregate(&gw, 1, MAJOR, CORE).expect("aggregate")).unwrap();
    let second = serde_json::to_value(aggregate(&gw, 1, MAJOR, CORE).expect("aggregate")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn groups_are_reported_in_sequence_order() {
    let gw = empty_gateway();
    let major_id = add_program(&gw, MAJOR);
    // inserted out of order on purpose
    add_group(&gw, major_id, 3, "Late", 3, "");
    add_group(&gw, major_id, 1, "Early", 3, "");
    add_group(&gw, major_id, 2, "Middle", 3, "");
    complete_course(&gw, 1, 800, "CPSC 121", 3);

    let result = aggregate(&gw, 1, MAJOR, CORE).expect("aggregate");
    let names: Vec<&str> = result
        .major_requirements
        .iter()
        .map(|g| g.group.as_str())
        .collect();
    assert_eq!(names, vec!["Early", "Middle", "Late"]);
}
