// Core data structures shared across the crate.

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};

/// Immutable catalog fact: a course and its credit value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub code: String,
    pub title: String,
    pub credits: i64,
}

/// One offering of a course in a specific term, as imported from the
/// institution's catalog. `attribute` is the raw comma-separated tag string;
/// tags of the form `Core: <Attribute>` satisfy attribute-based requirement
/// groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionRecord {
    pub section_id: i64,
    pub course_code: String,
    pub term: String,
    pub section: String,
    pub credits: i64,
    pub attribute: String,
    pub instructor: String,
    pub schedule: String,
}

/// A named bucket of required credits inside a degree program. `sequence_id`
/// is the declared ordering key; `note` may carry a
/// "Can double count with (..)" clause referencing earlier sequence ids.
#[derive(Debug, Clone)]
pub struct RequirementGroupRow {
    pub id: i64,
    pub sequence_id: i64,
    pub name: String,
    pub required_credits: i64,
    pub note: String,
}

/// Stored prerequisite rule: either a single course leaf, a composite
/// AND/OR node over nested rules, or a bare list of rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrereqSchema {
    Leaf {
        course: String,
        #[serde(default)]
        min_grade: Option<String>,
    },
    Composite {
        #[serde(rename = "type", default = "default_relation")]
        relation: String,
        requirements: Vec<PrereqSchema>,
    },
    Group(Vec<PrereqSchema>),
}

fn default_relation() -> String {
    "and".to_string()
}

/// Node of the prerequisite graph. `name` falls back to the course code when
/// the catalog has no title for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub name: String,
}

/// Directed edge: `source` is a prerequisite of `target`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub relation: String,
    pub min_grade: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PrereqGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// How a requirement group can still be satisfied: an explicit eligible
/// course list, or "any section carrying this Core attribute tag".
///
/// Attribute candidates serialize as the legacy `"CORE <credits>"` sentinel
/// string so the response shape matches what downstream consumers expect.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateCourses {
    List(Vec<String>),
    Attribute {
        attribute: String,
        required_credits: i64,
    },
}

impl Serialize for CandidateCourses {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CandidateCourses::List(codes) => codes.serialize(serializer),
            CandidateCourses::Attribute {
                required_credits, ..
            } => serializer.serialize_str(&format!("CORE {}", required_credits)),
        }
    }
}

/// Aggregated progress of a student against one requirement group.
#[derive(Debug, Clone, Serialize)]
pub struct GroupStatus {
    /// Group display name; used as the key when the status map serializes.
    #[serde(skip)]
    pub group: String,
    #[serde(rename = "json_id")]
    pub sequence_id: i64,
    pub required_credits: i64,
    pub taken_credits: i64,
    pub remaining_credits: i64,
    #[serde(rename = "taken_courses_in_group")]
    pub taken_courses: Vec<String>,
    #[serde(rename = "available_courses")]
    pub available: CandidateCourses,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub double_count_groups: Option<Vec<i64>>,
}

/// Aggregator output: group statuses for the core and major sides, kept in
/// declared sequence order. Serializes each side as an object keyed by group
/// name (empty object when a program is missing or the student has no
/// enrollments).
#[derive(Debug, Clone, Default)]
pub struct AggregatedRequirements {
    pub core_requirements: Vec<GroupStatus>,
    pub major_requirements: Vec<GroupStatus>,
}

struct GroupStatusMap<'a>(&'a [GroupStatus]);

impl Serialize for GroupStatusMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for status in self.0 {
            map.serialize_entry(&status.group, status)?;
        }
        map.end()
    }
}

impl Serialize for AggregatedRequirements {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_struct("AggregatedRequirements", 2)?;
        out.serialize_field("core_requirements", &GroupStatusMap(&self.core_requirements))?;
        out.serialize_field("major_requirements", &GroupStatusMap(&self.major_requirements))?;
        out.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanCategory {
    Core,
    Major,
}

/// One slot of a proposed semester schedule. `section_id` is `None` only for
/// attribute placeholders, whose `course_code` names the unmet attribute
/// instead of a real offering.
#[derive(Debug, Clone, Serialize)]
pub struct PlanItem {
    pub section_id: Option<i64>,
    #[serde(rename = "course_id")]
    pub course_code: String,
    pub credits: i64,
    pub group: String,
    #[serde(rename = "type")]
    pub category: PlanCategory,
}
