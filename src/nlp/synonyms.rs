use std::collections::HashMap;

const SEED_SYNONYMS: &[(&str, &str)] = &[
    ("pupil", "student"),
    ("pupils", "student"),
    ("class", "course"),
    ("classes", "course"),
    ("lesson", "course"),
    ("lessons", "course"),
    ("lecturer", "instructor"),
    ("teacher", "instructor"),
    ("professor", "instructor"),
    ("mark", "grade"),
    ("marks", "grade"),
    ("score", "grade"),
    ("scores", "grade"),
    ("cost", "price"),
    ("pay", "salary"),
    ("earnings", "salary"),
    ("dept", "department"),
];

/// Case-insensitive term -> canonical term mapping
#[derive(Debug, Clone)]
pub struct SynonymTable {
    entries: HashMap<String, String>,
}

impl Default for SynonymTable {
    /// Table seeded with the common school/commerce vocabulary
    fn default() -> Self {
        let mut table = Self::empty();
        for (term, canonical) in SEED_SYNONYMS {
            table.add(term, canonical);
        }
        table
    }
}

impl SynonymTable {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Seeded table extended with `extra` entries; extras win on conflict
    pub fn with_extra<'a, I>(extra: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut table = Self::default();
        for (term, canonical) in extra {
            table.add(term, canonical);
        }
        table
    }

    pub fn add(&mut self, term: &str, canonical: &str) {
        self.entries
            .insert(term.trim().to_lowercase(), canonical.trim().to_lowercase());
    }

    /// Canonical form of `token`, or the token unchanged when unknown
    pub fn resolve(&self, token: &str) -> String {
        self.entries
            .get(&token.to_lowercase())
            .cloned()
            .unwrap_or_else(|| token.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
