pub mod ast;
pub mod compiler;
pub mod config;
pub mod edit_distance;
pub mod engine;
pub mod error;
pub mod fuzzy_matcher;
pub mod nlp;
pub mod schema;

pub use ast::{Condition, ConditionValue, Intent, JoinNode, JoinType, Operator, QueryAst};
pub use compiler::{
    CompileResult, ExecutionResult, ExternalQueryGenerator, QueryCompiler, QueryExecutor,
    QueryResponse, QuerySource,
};
pub use config::EngineConfig;
pub use engine::Dialect;
pub use error::{NlqError, Result};
pub use schema::{SchemaCache, SchemaIntrospector, StaticIntrospector};
