// Requirement aggregation: merge a student's completed work against the
// requirement-group structure of a core and a major program.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::error::Error;

use crate::algorithm::attribute::{
    core_attribute_tags, expected_core_attribute, is_core_group, parse_double_count_note,
};
use crate::gateway::DataGateway;
use crate::models::{AggregatedRequirements, CandidateCourses, GroupStatus};

/// One completed section, reduced to what allocation needs.
struct CompletedSection {
    course_code: String,
    core_attrs: Vec<String>,
}

/// Merge the student's enrollments against both programs' requirement
/// groups. A student with no enrollments gets two empty sides; a missing
/// program empties only its own side. Identical inputs over unchanged data
/// always produce identical output.
pub fn aggregate(
    gateway: &dyn DataGateway,
    student_id: i64,
    major_program_name: &str,
    core_program_name: &str,
) -> Result<AggregatedRequirements, Box<dyn Error>> {
    if student_id <= 0 {
        return Err("student id must be a positive identifier".into());
    }
    if major_program_name.trim().is_empty() {
        return Err("major program name is required".into());
    }
    if core_program_name.trim().is_empty() {
        return Err("core program name is required".into());
    }

    let section_ids = gateway.enrolled_section_ids(student_id)?;
    if section_ids.is_empty() {
        return Ok(AggregatedRequirements::default());
    }
    let sections = gateway.sections_by_ids(&section_ids)?;

    // Completed work, deduplicated by (course, term, section): the same
    // course retaken in a different term still counts once per sitting.
    let mut completed: Vec<CompletedSection> = Vec::new();
    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    let mut taken_codes: HashSet<String> = HashSet::new();
    for sec in &sections {
        taken_codes.insert(sec.course_code.clone());
        let key = (
            sec.course_code.clone(),
            sec.term.clone(),
            sec.section.clone(),
        );
        if seen.insert(key) {
            completed.push(CompletedSection {
                course_code: sec.course_code.clone(),
                core_attrs: core_attribute_tags(&sec.attribute),
            });
        }
    }

    // Catalog credits for everything the student has taken; a missing
    // catalog row contributes 0 credits, never an error.
    let codes: Vec<String> = taken_codes.iter().cloned().collect();
    let credit_map: HashMap<String, i64> = match gateway.courses_by_codes(&codes) {
        Ok(rows) => rows.into_iter().map(|c| (c.code, c.credits)).collect(),
        Err(e) => {
            eprintln!("WARN: catalog credit lookup failed: {}", e);
            HashMap::new()
        }
    };

    Ok(AggregatedRequirements {
        core_requirements: aggregate_core_side(gateway, core_program_name, &completed, &credit_map),
        major_requirements: aggregate_major_side(
            gateway,
            major_program_name,
            &taken_codes,
            &credit_map,
        ),
    })
}

fn program_groups(
    gateway: &dyn DataGateway,
    program_name: &str,
    side: &str,
) -> Vec<crate::models::RequirementGroupRow> {
    let program_id = match gateway.program_id(program_name) {
        Ok(Some(id)) => id,
        Ok(None) => {
            eprintln!("WARN: {} program '{}' not found", side, program_name);
            return Vec::new();
        }
        Err(e) => {
            eprintln!("WARN: {} program lookup failed: {}", side, e);
            return Vec::new();
        }
    };
    let mut groups = match gateway.requirement_groups(program_id) {
        Ok(groups) => groups,
        Err(e) => {
            eprintln!("WARN: requirement groups unavailable for '{}': {}", program_name, e);
            return Vec::new();
        }
    };
    groups.sort_by_key(|g| g.sequence_id);
    groups
}

fn eligible_courses(gateway: &dyn DataGateway, group_id: i64, group_name: &str) -> HashSet<String> {
    match gateway.requirement_courses(group_id) {
        Ok(codes) => codes.into_iter().collect(),
        Err(e) => {
            eprintln!("WARN: course mapping unavailable for '{}': {}", group_name, e);
            HashSet::new()
        }
    }
}

/// Core side: groups named with a "core" token allocate by attribute tag and
/// advertise the `CORE <credits>` sentinel; the rest allocate by explicit
/// course list like major groups, but without double-count bookkeeping.
fn aggregate_core_side(
    gateway: &dyn DataGateway,
    program_name: &str,
    completed: &[CompletedSection],
    credit_map: &HashMap<String, i64>,
) -> Vec<GroupStatus> {
    let mut out = Vec::new();
    for group in program_groups(gateway, program_name, "core") {
        let mut allocated: Vec<String> = Vec::new();
        let mut taken_credits: i64 = 0;

        let (available, expected_attribute) = if is_core_group(&group.name) {
            let expected = expected_core_attribute(&group.name);
            for sec in completed {
                if !expected.is_empty() && sec.core_attrs.iter().any(|tag| tag == &expected) {
                    allocated.push(sec.course_code.clone());
                    taken_credits += credit_map.get(&sec.course_code).copied().unwrap_or(0);
                }
            }
            (
                CandidateCourses::Attribute {
                    attribute: expected.clone(),
                    required_credits: group.required_credits,
                },
                Some(expected),
            )
        } else {
            let eligible = eligible_courses(gateway, group.id, &group.name);
            for sec in completed {
                if eligible.contains(&sec.course_code) {
                    allocated.push(sec.course_code.clone());
                    taken_credits += credit_map.get(&sec.course_code).copied().unwrap_or(0);
                }
            }
            let mut listing: Vec<String> = eligible.into_iter().collect();
            listing.sort();
            (CandidateCourses::List(listing), None)
        };

        let taken_courses: Vec<String> = allocated
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        out.push(GroupStatus {
            group: group.name.clone(),
            sequence_id: group.sequence_id,
            required_credits: group.required_credits,
            taken_credits,
            remaining_credits: (group.required_credits - taken_credits).max(0),
            taken_courses,
            available,
            expected_attribute,
            double_count_groups: None,
        });
    }
    out
}

/// Major side: strictly ascending sequence order, because each group's
/// candidate pool depends on what earlier groups already claimed. A course
/// allocated by an earlier group is excluded here unless that group's
/// sequence id appears in this group's double-count whitelist.
fn aggregate_major_side(
    gateway: &dyn DataGateway,
    program_name: &str,
    taken_codes: &HashSet<String>,
    credit_map: &HashMap<String, i64>,
) -> Vec<GroupStatus> {
    let mut out = Vec::new();
    let mut processed: Vec<(i64, HashSet<String>)> = Vec::new();

    for group in program_groups(gateway, program_name, "major") {
        let double_count = parse_double_count_note(&group.note);
        let whitelist: HashSet<i64> = double_count.iter().copied().collect();
        let eligible = eligible_courses(gateway, group.id, &group.name);

        let mut allowed: HashSet<String> = HashSet::new();
        let mut exclusion: HashSet<String> = HashSet::new();
        for (prev_sequence_id, prev_allocated) in &processed {
            if whitelist.contains(prev_sequence_id) {
                allowed.extend(prev_allocated.iter().cloned());
            } else {
                exclusion.extend(prev_allocated.iter().cloned());
            }
        }

        // (eligible - exclusion) | (allowed & eligible)
        let pool: HashSet<String> = eligible
            .difference(&exclusion)
            .cloned()
            .chain(allowed.intersection(&eligible).cloned())
            .collect();
        let allocated: HashSet<String> = pool.intersection(taken_codes).cloned().collect();
        let taken_credits: i64 = allocated
            .iter()
            .map(|code| credit_map.get(code).copied().unwrap_or(0))
            .sum();

        let mut display: Vec<String> = pool.difference(&allocated).cloned().collect();
        display.sort();
        let mut taken_courses: Vec<String> = allocated.iter().cloned().collect();
        taken_courses.sort();
        let mut double_count_sorted = double_count;
        double_count_sorted.sort_unstable();

        processed.push((group.sequence_id, allocated));

        out.push(GroupStatus {
            group: group.name.clone(),
            sequence_id: group.sequence_id,
            required_credits: group.required_credits,
            taken_credits,
            remaining_credits: (group.required_credits - taken_credits).max(0),
            taken_courses,
            available: CandidateCourses::List(display),
            expected_attribute: None,
            double_count_groups: Some(double_count_sorted),
        });
    }
    out
}
