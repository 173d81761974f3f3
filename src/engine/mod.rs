//! Query compilation: plan assembly, dialect choice and rendering.

pub mod generator;
pub mod parser;
pub mod planner;

pub use generator::QueryGenerator;
pub use parser::QueryParser;
pub use planner::{Dialect, QueryPlanner};
