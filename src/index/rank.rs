//! Typo-tolerant fuzzy ranking of titles.
//!
//! A rank is an edit cost: lower is a better match, `None` is no match.
//! Both sides are folded first (transliterated to ASCII, lowercased), so
//! `"creme"` finds `"Crème brûlée"`.
//!
//! A title matches when either
//! - the term's characters appear in it in order (cost = edit distance), or
//! - some substring of it is within `len / 4` edits of the term
//!   (cost = edit distance + those edits).

use deunicode::deunicode;

/// Neutral rank used when there is no search term.
pub const NEUTRAL_RANK: usize = 0;

/// Fold text for comparison: ASCII transliteration, lowercase.
pub fn fold(text: &str) -> String {
    deunicode(text).to_lowercase()
}

/// Pre-folded search term, reusable across many titles.
#[derive(Debug, Clone)]
pub struct Matcher {
    term: Vec<char>,
}

impl Matcher {
    pub fn new(term: &str) -> Self {
        Self {
            term: fold(term.trim()).chars().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.term.is_empty()
    }

    /// Rank `target` against the term.
    pub fn rank(&self, target: &str) -> Option<usize> {
        if self.term.is_empty() {
            return Some(NEUTRAL_RANK);
        }
        let target: Vec<char> = fold(target).chars().collect();

        if is_subsequence(&self.term, &target) {
            return Some(levenshtein(&self.term, &target));
        }

        let typos = substring_distance(&self.term, &target);
        (typos <= typo_budget(self.term.len())).then(|| levenshtein(&self.term, &target) + typos)
    }
}

/// Rank `target` against `term`. See [`Matcher::rank`].
pub fn rank_match(term: &str, target: &str) -> Option<usize> {
    Matcher::new(term).rank(target)
}

/// Edits tolerated for a term of `len` characters.
const fn typo_budget(len: usize) -> usize {
    len / 4
}

fn is_subsequence(needle: &[char], haystack: &[char]) -> bool {
    let mut rest = haystack.iter();
    needle.iter().all(|c| rest.any(|h| h == c))
}

/// Classic edit distance (insert, delete, substitute).
fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitute = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitute.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Fewest edits turning `needle` into any substring of `haystack`.
fn substring_distance(needle: &[char], haystack: &[char]) -> usize {
    // Row 0 is all zeros: the match may start anywhere in the haystack.
    let mut prev = vec![0; haystack.len() + 1];
    let mut curr = vec![0; haystack.len() + 1];

    for (i, cn) in needle.iter().enumerate() {
        curr[0] = i + 1;
        for (j, ch) in haystack.iter().enumerate() {
            let substitute = prev[j] + usize::from(cn != ch);
            curr[j + 1] = substitute.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev.into_iter().min().unwrap_or(needle.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_fold() {
        assert_eq!(fold("Crème Brûlée"), "creme brulee");
        assert_eq!(fold("HELLO"), "hello");
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein(&chars("kitten"), &chars("sitting")), 3);
        assert_eq!(levenshtein(&chars(""), &chars("abc")), 3);
        assert_eq!(levenshtein(&chars("same"), &chars("same")), 0);
    }

    #[test]
    fn test_substring_distance() {
        assert_eq!(substring_distance(&chars("world"), &chars("hello world")), 0);
        assert_eq!(substring_distance(&chars("wrld"), &chars("hello world")), 1);
        assert_eq!(substring_distance(&chars("hallo"), &chars("hello")), 1);
        assert_eq!(substring_distance(&chars(""), &chars("x")), 0);
    }

    #[test]
    fn test_exact_and_subsequence() {
        assert_eq!(rank_match("Hello", "Hello"), Some(0));
        assert_eq!(rank_match("hlo", "Hello"), Some(2));
        assert_eq!(rank_match("hello", "Hello World"), Some(6));
    }

    #[test]
    fn test_one_typo_tolerated() {
        assert!(rank_match("Hallo", "Hello").is_some());
        assert_eq!(rank_match("Hallo", "World"), None);
    }

    #[test]
    fn test_short_terms_must_be_subsequences() {
        assert_eq!(rank_match("hx", "Hello"), None);
        assert_eq!(rank_match("xyz", "Hello"), None);
    }

    #[test]
    fn test_diacritics_folded() {
        assert_eq!(rank_match("creme", "Crème"), Some(0));
        assert_eq!(rank_match("CRÈME", "creme brulee"), Some(7));
    }

    #[test]
    fn test_better_match_ranks_lower() {
        let m = Matcher::new("rust");
        let exact = m.rank("Rust").unwrap();
        let longer = m.rank("Rust in production").unwrap();
        let typo = m.rank("Rest").unwrap();
        assert!(exact < longer);
        assert!(exact < typo);
    }

    #[test]
    fn test_empty_term_is_neutral() {
        let m = Matcher::new("   ");
        assert!(m.is_empty());
        assert_eq!(m.rank("anything"), Some(NEUTRAL_RANK));
    }
}
