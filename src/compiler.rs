//! Question compiler
//!
//! Entry point of the engine: turns a natural-language question into query
//! text for one database, optionally executing it through a caller-supplied
//! [`QueryExecutor`].
//!
//! An [`ExternalQueryGenerator`] (for example a hosted language model) is
//! tried first when configured. When it declines or fails, the rule-based
//! pipeline runs: tokenize, classify, parse, plan, generate.

use crate::ast::{Intent, QueryAst};
use crate::config::EngineConfig;
use crate::edit_distance::find_best_match;
use crate::engine::{Dialect, QueryGenerator, QueryParser, QueryPlanner};
use crate::error::Result;
use crate::fuzzy_matcher::FuzzyMatcher;
use crate::nlp::normalizer::{normalize, remove_stop_words};
use crate::nlp::tokenizer::tokenize;
use crate::nlp::{EntityRecognizer, IntentClassifier, SynonymTable};
use crate::schema::{SchemaCache, TableColumns};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Largest edit distance for a "did you mean" suggestion
const SUGGESTION_MAX_EDITS: usize = 3;

/// Alternate query source consulted before the rule-based pipeline.
/// `Ok(None)` means "no answer, use the rules".
pub trait ExternalQueryGenerator: Send + Sync {
    fn generate(&self, question: &str, schema: &TableColumns) -> Result<Option<String>>;
}

/// Runs generated query text. Failures are reported in
/// [`ExecutionResult::error_message`], not as an `Err`.
pub trait QueryExecutor: Send + Sync {
    fn execute(&self, query: &str, dialect: Dialect) -> ExecutionResult;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    pub row_count: usize,
    pub elapsed_ms: u64,
    pub error_message: Option<String>,
}

impl ExecutionResult {
    pub fn from_rows(rows: Vec<serde_json::Map<String, serde_json::Value>>, elapsed_ms: u64) -> Self {
        Self {
            row_count: rows.len(),
            rows,
            elapsed_ms,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuerySource {
    RuleBased,
    External,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompileResult {
    pub question: String,
    pub intent: Intent,
    pub confidence: f64,
    pub resolved_table: Option<String>,
    pub generated_query: Option<String>,
    pub dialect: Dialect,
    pub source: QuerySource,
    /// Plan behind a rule-based query
    pub ast: Option<QueryAst>,
    /// User-facing reason when no query was produced
    pub error_message: Option<String>,
}

impl CompileResult {
    pub fn is_success(&self) -> bool {
        self.generated_query.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    #[serde(flatten)]
    pub compiled: CompileResult,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    pub row_count: usize,
    pub elapsed_ms: u64,
    /// Executor failure, verbatim
    pub execution_error: Option<String>,
}

pub struct QueryCompiler {
    cache: Arc<SchemaCache>,
    classifier: IntentClassifier,
    parser: QueryParser,
    planner: QueryPlanner,
    generator: QueryGenerator,
    external: Option<Arc<dyn ExternalQueryGenerator>>,
}

impl QueryCompiler {
    pub fn new(config: &EngineConfig, cache: Arc<SchemaCache>) -> Self {
        let synonyms = Arc::new(SynonymTable::with_extra(&config.extra_synonyms));
        let recognizer =
            EntityRecognizer::new(FuzzyMatcher::new(config.matching.clone()), synonyms);
        Self {
            parser: QueryParser::new(cache.clone(), recognizer),
            cache,
            classifier: IntentClassifier::new(),
            planner: QueryPlanner::new(),
            generator: QueryGenerator::new(),
            external: None,
        }
    }

    pub fn with_external_generator(mut self, generator: Arc<dyn ExternalQueryGenerator>) -> Self {
        self.external = Some(generator);
        self
    }

    pub fn cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    pub fn generator(&self) -> &QueryGenerator {
        &self.generator
    }

    /// Compile `question` against `database` (the default database when
    /// absent or empty). Never fails: problems are described in
    /// `error_message`.
    pub fn compile(&self, question: &str, database: Option<&str>) -> CompileResult {
        let tokens = tokenize(question);
        let intent = self.classifier.classify(&normalize(&tokens));
        debug!("Tokens: {:?}, intent: {} ({:.2})", tokens, intent.intent, intent.confidence);

        if let Some(query) = self.try_external(question, database) {
            info!("Compiled with external generator: {}", query);
            return CompileResult {
                question: question.to_string(),
                intent: intent.intent,
                confidence: intent.confidence,
                resolved_table: None,
                generated_query: Some(query),
                dialect: Dialect::Sql,
                source: QuerySource::External,
                ast: None,
                error_message: None,
            };
        }

        let ast = self
            .parser
            .parse(&remove_stop_words(&tokens), &intent, database);
        let dialect = self.planner.choose_dialect(&ast);
        let mut result = CompileResult {
            question: question.to_string(),
            intent: intent.intent,
            confidence: intent.confidence,
            resolved_table: ast.target_table.clone(),
            generated_query: None,
            dialect,
            source: QuerySource::RuleBased,
            ast: None,
            error_message: None,
        };

        if ast.target_table.is_none() && ast.intent != Intent::Schema {
            result.error_message = Some(self.resolution_message(&tokens, database));
            info!("No table resolved for question: {}", question);
            return result;
        }

        if self.planner.needs_optimization(&ast) {
            debug!(
                "Plan complexity {} for: {}",
                self.planner.estimate_complexity(&ast),
                question
            );
        }

        match self.generator.generate(&ast, dialect) {
            Ok(query) => {
                info!("Compiled [{}] {} -> {}", ast.intent, question, query);
                result.generated_query = Some(query);
            }
            Err(e) => {
                warn!("Query generation failed for {}: {}", question, e);
                result.error_message = Some(e.to_string());
            }
        }
        result.ast = Some(ast);
        result
    }

    /// Compile and run through `executor`. Executor errors are passed back
    /// verbatim.
    pub fn answer(
        &self,
        question: &str,
        database: Option<&str>,
        executor: &dyn QueryExecutor,
    ) -> QueryResponse {
        let compiled = self.compile(question, database);
        let Some(query) = compiled.generated_query.clone() else {
            return QueryResponse {
                compiled,
                rows: Vec::new(),
                row_count: 0,
                elapsed_ms: 0,
                execution_error: None,
            };
        };

        let execution = executor.execute(&query, compiled.dialect);
        if let Some(error) = &execution.error_message {
            warn!("Execution failed for {}: {}", query, error);
        }
        QueryResponse {
            compiled,
            rows: execution.rows,
            row_count: execution.row_count,
            elapsed_ms: execution.elapsed_ms,
            execution_error: execution.error_message,
        }
    }

    fn try_external(&self, question: &str, database: Option<&str>) -> Option<String> {
        let external = self.external.as_ref()?;
        let schema = self.cache.schema(database);
        match external.generate(question, &schema.tables) {
            Ok(Some(query)) if !query.trim().is_empty() => Some(query),
            Ok(_) => {
                debug!("External generator declined, using rule-based pipeline");
                None
            }
            Err(e) => {
                warn!("External generator failed, using rule-based pipeline: {}", e);
                None
            }
        }
    }

    fn resolution_message(&self, tokens: &[String], database: Option<&str>) -> String {
        let tables = self.cache.table_names(database);
        if tables.is_empty() {
            return "I couldn't find any tables to query.".to_string();
        }

        let suggestion = tokens
            .iter()
            .filter(|t| t.len() > 2)
            .find_map(|t| find_best_match(t, &tables, SUGGESTION_MAX_EDITS));
        match suggestion {
            Some(table) => format!(
                "I couldn't tell which table you mean. Did you mean '{}'? Available tables: {}",
                table,
                tables.iter().join(", ")
            ),
            None => format!(
                "I couldn't tell which table you mean. Available tables: {}",
                tables.iter().join(", ")
            ),
        }
    }
}
