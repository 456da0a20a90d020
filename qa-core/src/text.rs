//! Text-similarity helpers shared by device resolution and candidate
//! ranking: Levenshtein distance and a token-set overlap ratio.

use std::collections::BTreeSet;

/// Simple Levenshtein distance.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (m, n) = (a.len(), b.len());
    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for (i, row) in dp.iter_mut().enumerate().take(m + 1) {
        row[0] = i;
    }
    for (j, val) in dp[0].iter_mut().enumerate().take(n + 1) {
        *val = j;
    }
    for i in 1..=m {
        for j in 1..=n {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            dp[i][j] = (dp[i - 1][j] + 1)
                .min(dp[i][j - 1] + 1)
                .min(dp[i - 1][j - 1] + cost);
        }
    }
    dp[m][n]
}

/// Edit-distance similarity of two strings as a 0-100 ratio.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    let dist = levenshtein(a, b);
    100.0 * (1.0 - dist as f64 / max_len as f64)
}

fn tokens(s: &str) -> BTreeSet<String> {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Token-set overlap ratio of two strings, 0-100.
///
/// Tokenizes both sides, splits the token sets into intersection and
/// per-side remainders, and takes the best edit-distance ratio among the
/// three sorted joins. Word order and duplicates do not matter; a question
/// that merely contains the candidate key text scores high.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let inter: Vec<&String> = ta.intersection(&tb).collect();
    let only_a: Vec<&String> = ta.difference(&tb).collect();
    let only_b: Vec<&String> = tb.difference(&ta).collect();

    let joined = |xs: &[&String]| xs.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" ");

    let base = joined(&inter);
    let combined_a = if only_a.is_empty() {
        base.clone()
    } else if base.is_empty() {
        joined(&only_a)
    } else {
        format!("{} {}", base, joined(&only_a))
    };
    let combined_b = if only_b.is_empty() {
        base.clone()
    } else if base.is_empty() {
        joined(&only_b)
    } else {
        format!("{} {}", base, joined(&only_b))
    };

    ratio(&base, &combined_a)
        .max(ratio(&base, &combined_b))
        .max(ratio(&combined_a, &combined_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", "abc"), 0);
        assert_eq!(levenshtein("abc", "abd"), 1);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }

    #[test]
    fn token_set_ratio_is_order_insensitive() {
        let a = token_set_ratio("net weight", "weight net");
        assert!((a - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn token_set_ratio_ignores_extra_question_words() {
        // The candidate key is fully contained in the question, so the
        // intersection-vs-intersection comparison dominates.
        let score = token_set_ratio("what is the net weight of my washing machine", "net weight");
        assert!((score - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn token_set_ratio_low_for_unrelated_text() {
        let score = token_set_ratio("door lock error", "spin speed");
        assert!(score < 50.0);
    }
}
