mod common;

use std::collections::HashSet;

use common::*;
use gradplan::algorithm::PrereqResolver;
use gradplan::gateway::SqliteGateway;

fn completed(codes: &[&str]) -> HashSet<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

fn seeded_gateway() -> SqliteGateway {
    let gw = empty_gateway();
    add_course(&gw, "CPSC 321", "Database Management Systems", 3);
    add_prereq(
        &gw,
        "CPSC 321",
        r#"{"type": "and", "requirements": [
            {"course": "CPSC 122", "min_grade": "D"},
            {"course": "CPSC 223"}
        ]}"#,
    );
    add_prereq(&gw, "CPSC 223", r#"{"course": "CPSC 121", "min_grade": "D"}"#);
    add_prereq(&gw, "CPSC 122", r#"{"course": "CPSC 121"}"#);
    gw
}

#[test]
fn flattens_composites_into_a_single_course_list() {
    let gw = seeded_gateway();
    let resolver = PrereqResolver::new(&gw);

    let prereqs = resolver.prerequisites_of("CPSC 223").expect("resolve");
    assert_eq!(prereqs, vec!["CPSC 121"]);

    let prereqs = resolver.prerequisites_of("CPSC 321").expect("resolve");
    assert_eq!(prereqs, vec!["CPSC 122", "CPSC 223"]);
}

#[test]
fn embedded_min_grade_qualifiers_are_stripped_when_flattening() {
    let gw = empty_gateway();
    add_prereq(&gw, "CPSC 499", r#"{"course": "CPSC 460 Minimum Grade of C"}"#);
    let resolver = PrereqResolver::new(&gw);

    let prereqs = resolver.prerequisites_of("CPSC 499").expect("resolve");
    assert_eq!(prereqs, vec!["CPSC 460"]);
}

#[test]
fn no_rule_rows_means_trivially_satisfied() {
    let gw = seeded_gateway();
    let resolver = PrereqResolver::new(&gw);
    assert!(resolver
        .has_satisfied(&completed(&[]), "HIST 101")
        .expect("check"));
}

#[test]
fn or_composites_are_enforced_as_and() {
    let gw = empty_gateway();
    add_prereq(
        &gw,
        "MATH 260",
        r#"{"type": "or", "requirements": [
            {"course": "MATH 157"},
            {"course": "MATH 147"}
        ]}"#,
    );
    let resolver = PrereqResolver::new(&gw);

    // one OR branch is not enough: every listed course must be present
    assert!(!resolver
        .has_satisfied(&completed(&["MATH 157"]), "MATH 260")
        .expect("check"));
    assert!(resolver
        .has_satisfied(&completed(&["MATH 157", "MATH 147"]), "MATH 260")
        .expect("check"));
}

#[test]
fn one_level_graph_has_direct_edges_only() {
    let gw = seeded_gateway();
    let resolver = PrereqResolver::new(&gw);

    let graph = resolver.build_graph("CPSC 321", false).expect("build");

    let node_ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(node_ids, vec!["CPSC 321", "CPSC 122", "CPSC 223"]);

    // catalog title when present, code fallback otherwise
    assert_eq!(graph.nodes[0].name, "Database Management Systems");
    assert_eq!(graph.nodes[1].name, "CPSC 122");

    assert_eq!(graph.edges.len(), 2);
    assert!(graph.edges.iter().all(|e| e.target == "CPSC 321"));
    let with_grade = graph
        .edges
        .iter()
        .find(|e| e.source == "CPSC 122")
        .expect("edge from CPSC 122");
    assert_eq!(with_grade.relation, "and");
    assert_eq!(with_grade.min_grade.as_deref(), Some("D"));
}

#[test]
fn expand_all_levels_follows_discovered_prerequisites() {
    let gw = seeded_gateway();
    let resolver = PrereqResolver::new(&gw);

    let graph = resolver.build_graph("CPSC 321", true).expect("build");

    let node_ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert!(node_ids.contains("CPSC 121"));
    assert!(graph
        .edges
        .iter()
        .any(|e| e.source == "CPSC 121" && e.target == "CPSC 223"));
}

#[test]
fn cyclic_rules_terminate() {
    let gw = empty_gateway();
    add_prereq(&gw, "A 101", r#"{"course": "B 101"}"#);
    add_prereq(&gw, "B 101", r#"{"course": "A 101"}"#);
    let resolver = PrereqResolver::new(&gw);

    let graph = resolver.build_graph("A 101", true).expect("build");
    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.edges.len(), 2);
}

#[test]
fn empty_course_code_is_rejected() {
    let gw = empty_gateway();
    let resolver = PrereqResolver::new(&gw);
    assert!(resolver.build_graph("  ", false).is_err());
}
