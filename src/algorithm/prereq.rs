// Prerequisite graph resolver.
//
// Rule rows come from the gateway as trees of leaf/composite nodes. The graph
// builder walks them with an explicit work-list and visited set: a course is
// expanded at most once, which bounds the traversal on cyclic or
// cross-referenced rule data.

use std::collections::{HashMap, HashSet, VecDeque};
use std::error::Error;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::gateway::DataGateway;
use crate::models::{GraphEdge, GraphNode, PrereqGraph, PrereqSchema};

struct EdgeMeta {
    relation: String,
    min_grade: Option<String>,
}

pub struct PrereqResolver<'a> {
    gateway: &'a dyn DataGateway,
}

impl<'a> PrereqResolver<'a> {
    pub fn new(gateway: &'a dyn DataGateway) -> Self {
        PrereqResolver { gateway }
    }

    /// Build the prerequisite graph rooted at `course_code`. With
    /// `expand_all_levels` the traversal follows each discovered prerequisite
    /// into its own rule rows, producing the full transitive graph; otherwise
    /// only the root's direct prerequisites appear.
    pub fn build_graph(
        &self,
        course_code: &str,
        expand_all_levels: bool,
    ) -> Result<PrereqGraph, Box<dyn Error>> {
        let course_code = course_code.trim();
        if course_code.is_empty() {
            return Err("course code is required".into());
        }

        let mut graph: DiGraph<GraphNode, EdgeMeta> = DiGraph::new();
        let mut index: HashMap<String, NodeIndex> = HashMap::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut worklist: VecDeque<String> = VecDeque::new();
        worklist.push_back(course_code.to_string());

        while let Some(code) = worklist.pop_front() {
            if !visited.insert(code.clone()) {
                continue;
            }
            let target = self.ensure_node(&mut graph, &mut index, &code);

            let schemas = match self.gateway.prerequisite_schemas(&code) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("WARN: prerequisite lookup failed for {}: {}", code, e);
                    continue;
                }
            };

            for schema in schemas {
                let (relation, children) = match schema {
                    PrereqSchema::Composite {
                        relation,
                        requirements,
                    } => (relation, requirements),
                    leaf @ PrereqSchema::Leaf { .. } => ("and".to_string(), vec![leaf]),
                    PrereqSchema::Group(items) => ("and".to_string(), items),
                };
                for child in children {
                    // Only direct leaf children yield edges; deeper nesting is
                    // flattened by `prerequisites_of`, not drawn here.
                    let PrereqSchema::Leaf { course, min_grade } = child else {
                        continue;
                    };
                    let source = self.ensure_node(&mut graph, &mut index, &course);
                    graph.add_edge(
                        source,
                        target,
                        EdgeMeta {
                            relation: relation.clone(),
                            min_grade,
                        },
                    );
                    if expand_all_levels {
                        worklist.push_back(course);
                    }
                }
            }
        }

        let nodes = graph.node_weights().cloned().collect();
        let edges = graph
            .edge_references()
            .map(|e| GraphEdge {
                source: graph[e.source()].id.clone(),
                target: graph[e.target()].id.clone(),
                relation: e.weight().relation.clone(),
                min_grade: e.weight().min_grade.clone(),
            })
            .collect();
        Ok(PrereqGraph { nodes, edges })
    }

    fn ensure_node(
        &self,
        graph: &mut DiGraph<GraphNode, EdgeMeta>,
        index: &mut HashMap<String, NodeIndex>,
        code: &str,
    ) -> NodeIndex {
        if let Some(&idx) = index.get(code) {
            return idx;
        }
        let name = match self.gateway.course_title(code) {
            Ok(Some(title)) if !title.is_empty() => title,
            _ => code.to_string(),
        };
        let idx = graph.add_node(GraphNode {
            id: code.to_string(),
            name,
        });
        index.insert(code.to_string(), idx);
        idx
    }

    /// Flat list of prerequisite course codes for `course_code`, from its
    /// first stored rule row. Composite nodes contribute all of their
    /// children's codes regardless of the declared AND/OR relation.
    pub fn prerequisites_of(&self, course_code: &str) -> Result<Vec<String>, Box<dyn Error>> {
        let schemas = self.gateway.prerequisite_schemas(course_code)?;
        let Some(first) = schemas.first() else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        flatten_schema(first, &mut out);
        Ok(out)
    }

    /// True when every flattened prerequisite of `course_code` is in
    /// `completed`. Trivially true for courses with no rule rows.
    ///
    /// NOTE: OR composites are enforced as AND here (every listed course must
    /// be present), matching the stored-rule consumers downstream.
    pub fn has_satisfied(
        &self,
        completed: &HashSet<String>,
        course_code: &str,
    ) -> Result<bool, Box<dyn Error>> {
        let prerequisites = self.prerequisites_of(course_code)?;
        Ok(prerequisites.iter().all(|code| completed.contains(code)))
    }
}

/// Depth-first flatten of a rule tree into course codes. A leaf's trailing
/// "Minimum Grade ..." qualifier is stripped.
pub fn flatten_schema(schema: &PrereqSchema, out: &mut Vec<String>) {
    match schema {
        PrereqSchema::Leaf { course, .. } => {
            let code = course
                .split(" Minimum Grade")
                .next()
                .unwrap_or(course)
                .trim();
            out.push(code.to_string());
        }
        PrereqSchema::Composite { requirements, .. } => {
            for req in requirements {
                flatten_schema(req, out);
            }
        }
        PrereqSchema::Group(items) => {
            for item in items {
                flatten_schema(item, out);
            }
        }
    }
}
