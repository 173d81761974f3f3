//! Edit distance helpers used by fuzzy name matching.

/// Levenshtein distance between two strings, compared case-insensitively.
pub fn levenshtein(a: &str, b: &str) -> usize {
    strsim::levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// Check whether `token` is within the edit budget for `target`.
///
/// Short names (at most `short_len` characters) tolerate `short_edits`
/// edits, longer ones `long_edits`.
pub fn within_edit_budget(
    token: &str,
    target: &str,
    short_len: usize,
    short_edits: usize,
    long_edits: usize,
) -> bool {
    let max_edits = if target.chars().count() <= short_len {
        short_edits
    } else {
        long_edits
    };
    levenshtein(token, target) <= max_edits
}

/// Find the candidate closest to `input`, if it is within `max_distance`.
/// Ties keep the first candidate.
pub fn find_best_match<'a>(
    input: &str,
    candidates: &'a [String],
    max_distance: usize,
) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for candidate in candidates {
        let distance = levenshtein(input, candidate);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((candidate.as_str(), distance));
        }
    }
    best.filter(|(_, d)| *d <= max_distance).map(|(c, _)| c)
}
