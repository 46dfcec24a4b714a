//! Dependency resolution, planning and execution.
//!
//! The pieces run in sequence:
//! - [`DependencyGraph::resolve`] validates references and builds the graph
//! - [`plan`] orders it, breaking ties by registration order
//! - [`apply_plan`] and [`destroy_plan`] walk the plan against a backend

pub mod apply;
pub mod dag;
pub mod plan;
pub mod resolver;
pub mod types;

pub use apply::{apply_plan, destroy_plan};
pub use dag::DependencyGraph;
pub use plan::{Plan, plan};
pub use resolver::{Resolver, StackResolver};
pub use types::{ApplyResult, ExecuteConfig, ExecuteError, GraphError, ResourceFailure, RunStatus, RunSummary};
