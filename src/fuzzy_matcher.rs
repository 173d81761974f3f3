use crate::config::MatchingConfig;
use crate::edit_distance::within_edit_budget;
use crate::nlp::synonyms::SynonymTable;

/// Scores how well a question token names a schema identifier
///
/// Lexical scores: exact 1.0, plural/singular 0.95, substring 0.7. The
/// synonym-resolved token is scored too, and edit distance is tried when
/// the lexical score stays below `fuzzy_threshold`.
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    pub config: MatchingConfig,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self {
            config: MatchingConfig::default(),
        }
    }
}

impl FuzzyMatcher {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    /// Exact, plural/singular or substring similarity, case-insensitive
    pub fn lexical_similarity(token: &str, target: &str) -> f64 {
        let token = token.to_lowercase();
        let target = target.to_lowercase();
        if token.is_empty() || target.is_empty() {
            return 0.0;
        }

        if token == target {
            return 1.0;
        }

        if is_plural_pair(&token, &target) {
            return 0.95;
        }

        if token.contains(&target) || target.contains(&token) {
            return 0.7;
        }

        0.0
    }

    /// Exact or plural/singular match only
    pub fn is_similar(token: &str, target: &str) -> bool {
        let token = token.to_lowercase();
        let target = target.to_lowercase();
        !token.is_empty() && (token == target || is_plural_pair(&token, &target))
    }

    /// Score `token` against `target`, consulting synonyms and then edit
    /// distance. `fuzzy_score` is what an edit-distance hit is worth.
    pub fn score(
        &self,
        token: &str,
        target: &str,
        synonyms: &SynonymTable,
        fuzzy_score: f64,
    ) -> f64 {
        let mut score = Self::lexical_similarity(token, target);

        let resolved = synonyms.resolve(token);
        if !resolved.eq_ignore_ascii_case(token) {
            score = score.max(Self::lexical_similarity(&resolved, target));
        }

        if score < self.config.fuzzy_threshold
            && within_edit_budget(
                token,
                target,
                self.config.short_name_len,
                self.config.short_name_max_edits,
                self.config.long_name_max_edits,
            )
        {
            score = score.max(fuzzy_score);
        }

        score
    }

    pub fn table_score(&self, token: &str, table: &str, synonyms: &SynonymTable) -> f64 {
        self.score(token, table, synonyms, self.config.fuzzy_table_score)
    }

    pub fn column_score(&self, token: &str, column: &str, synonyms: &SynonymTable) -> f64 {
        self.score(token, column, synonyms, self.config.fuzzy_column_score)
    }
}

fn is_plural_pair(a: &str, b: &str) -> bool {
    a.strip_suffix('s') == Some(b) || b.strip_suffix('s') == Some(a)
}
