//! Natural-language front end
//!
//! Tokenization, normalization, intent classification and the schema-aware
//! recognisers that turn tokens into tables, columns, filters and joins.

pub mod conditions;
pub mod entity;
pub mod intent;
pub mod join_detector;
pub mod normalizer;
pub mod synonyms;
pub mod tokenizer;

pub use conditions::ConditionExtractor;
pub use entity::{EntityRecognition, EntityRecognizer};
pub use intent::{IntentClassifier, IntentResult};
pub use join_detector::{JoinDetection, JoinDetector};
pub use synonyms::SynonymTable;
