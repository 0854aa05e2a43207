// Greedy semester planner.
//
// One pass over two candidate pools (core / major), balancing the share of
// core courses while filling toward a credit cap. The planner accepts the
// first candidate that survives the sequencing, pairing, prerequisite and
// offering checks; it never backtracks, and pool exhaustion in the selected
// pool ends the pass even if the other pool still has candidates.

use std::collections::{HashMap, HashSet};
use std::error::Error;

use crate::algorithm::aggregate::aggregate;
use crate::algorithm::courses::{
    course_level, has_lower_level_course, lab_pair, parse_course_code,
};
use crate::algorithm::prereq::PrereqResolver;
use crate::gateway::DataGateway;
use crate::models::{CandidateCourses, PlanCategory, PlanItem, SectionRecord};

/// Institutional constants steering the greedy pass. `Default` carries the
/// production values; tests may override individual fields.
#[derive(Debug, Clone)]
pub struct PlannerRules {
    /// Course scheduled once, ahead of the general loop, if still owed.
    pub pinned_course: String,
    pub pinned_group: String,
    /// MATH candidates below this number are never selected.
    pub math_floor: u32,
    /// Credits from the cap at which the pass enters NEAR_TARGET.
    pub near_target_window: i64,
    /// Subject whose level/prerequisite checks relax in NEAR_TARGET.
    pub relaxation_subject: String,
    /// Watch-list tried directly after the main loop.
    pub priority_courses: Vec<String>,
    pub fallback_group: String,
    /// Nominal credit value of an attribute placeholder item.
    pub placeholder_credits: i64,
    /// Core-share bounds steering pool selection while FILLING.
    pub core_ratio_low: f64,
    pub core_ratio_high: f64,
}

impl Default for PlannerRules {
    fn default() -> Self {
        PlannerRules {
            pinned_course: "MATH 147".to_string(),
            pinned_group: "Math Requirement".to_string(),
            math_floor: 147,
            near_target_window: 6,
            relaxation_subject: "CPSC".to_string(),
            priority_courses: vec![
                "CPSC 223".to_string(),
                "CPSC 224".to_string(),
                "CPSC 260".to_string(),
            ],
            fallback_group: "lower Division".to_string(),
            placeholder_credits: 3,
            core_ratio_low: 0.3,
            core_ratio_high: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlanPhase {
    Filling,
    NearTarget,
}

#[derive(Debug, Clone)]
struct Candidate {
    course_code: String,
    group: String,
}

fn dedup_by_course(pool: &mut Vec<Candidate>) {
    let mut seen: HashSet<String> = HashSet::new();
    pool.retain(|c| seen.insert(c.course_code.clone()));
}

/// Assemble a credit-bounded schedule for `term` using the default rules.
pub fn plan(
    gateway: &dyn DataGateway,
    student_id: i64,
    major_program_name: &str,
    core_program_name: &str,
    term: &str,
    credit_cap: i64,
) -> Result<Vec<PlanItem>, Box<dyn Error>> {
    plan_with_rules(
        gateway,
        student_id,
        major_program_name,
        core_program_name,
        term,
        credit_cap,
        &PlannerRules::default(),
    )
}

pub fn plan_with_rules(
    gateway: &dyn DataGateway,
    student_id: i64,
    major_program_name: &str,
    core_program_name: &str,
    term: &str,
    credit_cap: i64,
    rules: &PlannerRules,
) -> Result<Vec<PlanItem>, Box<dyn Error>> {
    if credit_cap <= 0 {
        return Err("credit cap must be positive".into());
    }
    if term.trim().is_empty() {
        return Err("term is required".into());
    }

    // aggregate() validates the remaining identifiers.
    let requirements = aggregate(gateway, student_id, major_program_name, core_program_name)?;

    let completed: HashSet<String> = {
        let ids = gateway.enrolled_section_ids(student_id)?;
        if ids.is_empty() {
            HashSet::new()
        } else {
            gateway
                .sections_by_ids(&ids)?
                .into_iter()
                .map(|s| s.course_code)
                .collect()
        }
    };

    // The term's offerings, fetched once and indexed by course code. Each
    // course keeps its first section record; the planner does not rank
    // sections. A failed fetch degrades to "nothing offered".
    let term_sections: Vec<SectionRecord> = match gateway.sections_by_term(term) {
        Ok(sections) => sections,
        Err(e) => {
            eprintln!("WARN: could not load offerings for '{}': {}", term, e);
            Vec::new()
        }
    };
    let mut offerings: HashMap<String, SectionRecord> = HashMap::new();
    for sec in &term_sections {
        offerings
            .entry(sec.course_code.clone())
            .or_insert_with(|| sec.clone());
    }

    // Candidate pools, in group-discovery order, restricted to groups still
    // owing credits and courses not already completed.
    let mut major_pool: Vec<Candidate> = Vec::new();
    for status in &requirements.major_requirements {
        if status.remaining_credits <= 0 {
            continue;
        }
        if let CandidateCourses::List(codes) = &status.available {
            for code in codes {
                if completed.contains(code) {
                    continue;
                }
                major_pool.push(Candidate {
                    course_code: code.clone(),
                    group: status.group.clone(),
                });
            }
        }
    }

    let mut core_pool: Vec<Candidate> = Vec::new();
    for status in &requirements.core_requirements {
        if status.remaining_credits <= 0 {
            continue;
        }
        match &status.available {
            CandidateCourses::Attribute { attribute, .. } if !attribute.is_empty() => {
                // Attribute slots have no enumerable course list: any section
                // of the term carrying the tag is a candidate.
                let tag = format!("Core: {}", attribute);
                for sec in &term_sections {
                    if !sec.attribute.contains(&tag) {
                        continue;
                    }
                    if completed.contains(&sec.course_code) {
                        continue;
                    }
                    core_pool.push(Candidate {
                        course_code: sec.course_code.clone(),
                        group: status.group.clone(),
                    });
                }
            }
            CandidateCourses::List(codes) => {
                for code in codes {
                    if completed.contains(code) {
                        continue;
                    }
                    core_pool.push(Candidate {
                        course_code: code.clone(),
                        group: status.group.clone(),
                    });
                }
            }
            _ => {}
        }
    }

    dedup_by_course(&mut major_pool);
    dedup_by_course(&mut core_pool);

    let resolver = PrereqResolver::new(gateway);
    let mut plan_items: Vec<PlanItem> = Vec::new();
    let mut total_credits: i64 = 0;
    let mut used_courses: HashSet<String> = HashSet::new();
    let mut used_core: HashSet<String> = HashSet::new();
    let mut used_major: HashSet<String> = HashSet::new();
    let mut staged_group_credits: HashMap<String, i64> = HashMap::new();

    // The pinned requirement is tried exactly once, ahead of everything else.
    let pinned = rules.pinned_course.as_str();
    if !pinned.is_empty() && !completed.contains(pinned) && !used_courses.contains(pinned) {
        if let Some(sec) = offerings.get(pinned) {
            if total_credits + sec.credits <= credit_cap {
                plan_items.push(PlanItem {
                    section_id: Some(sec.section_id),
                    course_code: pinned.to_string(),
                    credits: sec.credits,
                    group: rules.pinned_group.clone(),
                    category: PlanCategory::Major,
                });
                total_credits += sec.credits;
                used_courses.insert(pinned.to_string());
                used_major.insert(pinned.to_string());
            }
        }
    }

    while total_credits < credit_cap {
        let distinct_total = (used_core.len() + used_major.len()).max(1);
        let core_ratio = used_core.len() as f64 / distinct_total as f64;
        let phase = if credit_cap - total_credits <= rules.near_target_window {
            PlanPhase::NearTarget
        } else {
            PlanPhase::Filling
        };

        // Pool policy: while FILLING, steer the core share into the
        // [low, high] band, breaking ties toward the larger pool. Near the
        // cap, finish major requirements first.
        let use_core = match phase {
            PlanPhase::Filling => {
                if core_ratio < rules.core_ratio_low && !core_pool.is_empty() {
                    true
                } else if core_ratio > rules.core_ratio_high && !major_pool.is_empty() {
                    false
                } else if major_pool.len() >= core_pool.len() {
                    major_pool.is_empty()
                } else {
                    true
                }
            }
            PlanPhase::NearTarget => major_pool.is_empty(),
        };
        let (pool, category) = if use_core {
            (&mut core_pool, PlanCategory::Core)
        } else {
            (&mut major_pool, PlanCategory::Major)
        };

        let mut accepted = false;
        for idx in 0..pool.len() {
            let course_code = pool[idx].course_code.clone();
            let group = pool[idx].group.clone();

            if completed.contains(&course_code) || used_courses.contains(&course_code) {
                continue;
            }

            let parsed = parse_course_code(&course_code);
            if let Some((subject, number, _)) = &parsed {
                if subject == "MATH" && *number < rules.math_floor {
                    continue;
                }
            }

            let relaxed = phase == PlanPhase::NearTarget
                && parsed
                    .as_ref()
                    .map(|(subject, _, _)| *subject == rules.relaxation_subject)
                    .unwrap_or(false);

            // Level sequencing: a 200+ course needs a completed-or-staged
            // course exactly 100 levels lower in the same subject.
            if !relaxed {
                if let Some((subject, level)) = course_level(&course_code) {
                    if level >= 200
                        && !has_lower_level_course(
                            used_courses.iter().chain(completed.iter()),
                            &subject,
                            level,
                        )
                    {
                        continue;
                    }
                }
            }

            // Lecture/lab pairing: the partner must already be in hand.
            if let Some(pair) = lab_pair(&course_code) {
                if !used_courses.contains(&pair) && !completed.contains(&pair) {
                    continue;
                }
            }

            if !relaxed {
                let satisfied = match resolver.has_satisfied(&completed, &course_code) {
                    Ok(ok) => ok,
                    Err(e) => {
                        eprintln!(
                            "WARN: prerequisite check failed for {}: {}",
                            course_code, e
                        );
                        false
                    }
                };
                if !satisfied {
                    continue;
                }
            }

            let Some(sec) = offerings.get(&course_code) else {
                continue;
            };
            if total_credits + sec.credits > credit_cap {
                continue;
            }

            plan_items.push(PlanItem {
                section_id: Some(sec.section_id),
                course_code: course_code.clone(),
                credits: sec.credits,
                group: group.clone(),
                category,
            });
            total_credits += sec.credits;
            used_courses.insert(course_code.clone());
            if use_core {
                used_core.insert(course_code);
            } else {
                used_major.insert(course_code);
            }
            *staged_group_credits.entry(group).or_insert(0) += sec.credits;
            pool.remove(idx);
            accepted = true;
            break;
        }

        // Nothing in the selected pool survived the checks: stop. The other
        // pool is deliberately not retried in the same pass.
        if !accepted {
            break;
        }
    }

    // Watch-list fallback: direct additions outside the pool machinery.
    for course_code in &rules.priority_courses {
        if total_credits >= credit_cap {
            break;
        }
        if used_courses.contains(course_code) || completed.contains(course_code) {
            continue;
        }
        let Some(sec) = offerings.get(course_code) else {
            continue;
        };
        if total_credits + sec.credits > credit_cap {
            continue;
        }
        plan_items.push(PlanItem {
            section_id: Some(sec.section_id),
            course_code: course_code.clone(),
            credits: sec.credits,
            group: rules.fallback_group.clone(),
            category: PlanCategory::Major,
        });
        total_credits += sec.credits;
        used_courses.insert(course_code.clone());
        used_major.insert(course_code.clone());
    }

    // Attribute slots with remaining credits and no matching offering in the
    // whole term still show up in the plan, as placeholder items.
    for status in &requirements.core_requirements {
        let CandidateCourses::Attribute { attribute, .. } = &status.available else {
            continue;
        };
        if attribute.is_empty() {
            continue;
        }
        let tag = format!("Core: {}", attribute);
        if term_sections.iter().any(|sec| sec.attribute.contains(&tag)) {
            continue;
        }
        let staged = staged_group_credits.get(&status.group).copied().unwrap_or(0);
        if status.remaining_credits - staged <= 0 {
            continue;
        }
        if total_credits + rules.placeholder_credits > credit_cap {
            continue;
        }
        plan_items.push(PlanItem {
            section_id: None,
            course_code: format!("(Placeholder) Core attribute: {}", attribute),
            credits: rules.placeholder_credits,
            group: status.group.clone(),
            category: PlanCategory::Core,
        });
        total_credits += rules.placeholder_credits;
    }

    Ok(plan_items)
}
