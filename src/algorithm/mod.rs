// Core allocation logic: prerequisite resolution, requirement aggregation
// and the greedy semester planner.
pub mod aggregate;
pub mod attribute;
pub mod courses;
pub mod planner;
pub mod prereq;

// Re-export the API the server (and library users) consume.
pub use aggregate::aggregate;
pub use planner::{plan, plan_with_rules, PlannerRules};
pub use prereq::PrereqResolver;
