//! Candidate collection with prefix filtering and typo correction.

use std::mem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Full replacement for the current word, immutable prefix included.
    pub value: String,
    /// Empty when nothing describes the candidate.
    pub description: String,
}

impl Candidate {
    pub fn new(value: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: description.into(),
        }
    }
}

/// Accumulates candidates for one request.
///
/// `iprefix` is the part of the current word that is already decided (a list
/// head such as `x,y,` or a `--flag=`) and is prepended to every value;
/// `prefix` is the part still being typed and filters what is added.
#[derive(Debug, Default)]
pub struct Collector {
    iprefix: String,
    prefix: String,
    fallback_description: String,
    excluded: Vec<String>,
    candidates: Vec<Candidate>,
    corrections: Vec<Candidate>,
}

impl Collector {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            prefix: word.into(),
            ..Self::default()
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Adds a literal candidate that may be offered as a typo correction.
    pub fn add(&mut self, value: &str, description: &str) {
        if self.is_excluded(value) {
            return;
        }
        if value.starts_with(self.prefix.as_str()) {
            self.push(value, description);
        } else if is_close_typo(&self.prefix, value) {
            let candidate = self.candidate(value, description);
            if !self.corrections.iter().any(|c| c.value == candidate.value) {
                self.corrections.push(candidate);
            }
        }
    }

    /// Adds a host-provided candidate; only exact prefix matches are kept.
    pub fn add_exact(&mut self, value: &str, description: &str) {
        if !self.is_excluded(value) && value.starts_with(self.prefix.as_str()) {
            self.push(value, description);
        }
    }

    /// Runs `f` with `consumed` moved from the typed prefix into the immutable one.
    pub fn with_segment<R>(&mut self, consumed: &str, rest: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved_iprefix = self.iprefix.clone();
        let saved_prefix = mem::replace(&mut self.prefix, rest.to_string());
        self.iprefix.push_str(consumed);
        let out = f(self);
        self.iprefix = saved_iprefix;
        self.prefix = saved_prefix;
        out
    }

    /// Runs `f` with `description` used for candidates that carry none.
    pub fn with_description<R>(&mut self, description: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = mem::replace(&mut self.fallback_description, description.to_string());
        let out = f(self);
        self.fallback_description = saved;
        out
    }

    /// Runs `f` with `values` suppressed.
    pub fn excluding<R>(&mut self, values: &[String], f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = mem::replace(&mut self.excluded, values.to_vec());
        let out = f(self);
        self.excluded = saved;
        out
    }

    /// Prefix matches in insertion order, or the typo corrections when no
    /// literal candidate matched.
    pub fn finish(self) -> Vec<Candidate> {
        if self.candidates.is_empty() {
            self.corrections
        } else {
            self.candidates
        }
    }

    fn is_excluded(&self, value: &str) -> bool {
        self.excluded.iter().any(|excluded| excluded == value)
    }

    fn candidate(&self, value: &str, description: &str) -> Candidate {
        let description = if description.is_empty() {
            self.fallback_description.as_str()
        } else {
            description
        };
        Candidate::new(format!("{}{}", self.iprefix, value), description)
    }

    fn push(&mut self, value: &str, description: &str) {
        let candidate = self.candidate(value, description);
        if !self.candidates.iter().any(|c| c.value == candidate.value) {
            self.candidates.push(candidate);
        }
    }
}

/// Case is ignored, so `--Verbose` still finds `--verbose`.
fn is_close_typo(typed: &str, value: &str) -> bool {
    if typed.is_empty() {
        return false;
    }
    let typed = typed.to_lowercase();
    let value = value.to_lowercase();
    osa_distance(&typed, &value) <= correction_threshold(&typed, &value)
}

/// Largest edit distance still offered as a correction.
pub fn correction_threshold(a: &str, b: &str) -> usize {
    1 + (a.chars().count() + b.chars().count()) / 6
}

/// Optimal string alignment distance: Levenshtein plus adjacent transpositions,
/// each substring edited at most once.
pub fn osa_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let width = b.len() + 1;
    let mut d = vec![0usize; (a.len() + 1) * width];
    for i in 0..=a.len() {
        d[i * width] = i;
    }
    for j in 0..=b.len() {
        d[j] = j;
    }
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (d[(i - 1) * width + j] + 1)
                .min(d[i * width + j - 1] + 1)
                .min(d[(i - 1) * width + j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(d[(i - 2) * width + j - 2] + 1);
            }
            d[i * width + j] = best;
        }
    }
    d[a.len() * width + b.len()]
}

#[cfg(test)]
mod tests {
    use super::{correction_threshold, osa_distance, Candidate, Collector};

    #[test]
    fn osa_counts_transpositions_once() {
        assert_eq!(osa_distance("", "abc"), 3);
        assert_eq!(osa_distance("status", "status"), 0);
        assert_eq!(osa_distance("stauts", "status"), 1);
        assert_eq!(osa_distance("ca", "abc"), 3);
        assert_eq!(osa_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn threshold_grows_with_length() {
        assert_eq!(correction_threshold("a", "b"), 1);
        assert_eq!(correction_threshold("commit", "comit"), 2);
    }

    #[test]
    fn prefix_matches_keep_insertion_order_and_dedupe() {
        let mut collector = Collector::new("b");
        collector.add("beta", "");
        collector.add("alpha", "");
        collector.add("bravo", "second");
        collector.add("beta", "again");
        assert_eq!(
            collector.finish(),
            vec![Candidate::new("beta", ""), Candidate::new("bravo", "second")]
        );
    }

    #[test]
    fn corrections_only_when_nothing_matches() {
        let mut collector = Collector::new("stauts");
        collector.add("status", "show status");
        collector.add("stash", "");
        collector.add_exact("stats.txt", "");
        assert_eq!(collector.finish(), vec![Candidate::new("status", "show status")]);

        let mut collector = Collector::new("sta");
        collector.add("status", "");
        collector.add("sat", "");
        assert_eq!(collector.finish(), vec![Candidate::new("status", "")]);
    }

    #[test]
    fn corrections_ignore_case() {
        let mut collector = Collector::new("--Verbose");
        collector.add("--verbose", "more output");
        collector.add("--version", "");
        assert_eq!(
            collector.finish(),
            vec![
                Candidate::new("--verbose", "more output"),
                Candidate::new("--version", "")
            ]
        );

        let mut collector = Collector::new("STAUTS");
        collector.add("status", "");
        assert_eq!(collector.finish(), vec![Candidate::new("status", "")]);
    }

    #[test]
    fn segments_prefix_values_and_restore() {
        let mut collector = Collector::new("x,y,z");
        collector.with_segment("x,y,", "z", |c| {
            c.excluding(&["zap".to_string()], |c| {
                c.add("zap", "");
                c.add("zip", "");
            });
        });
        assert_eq!(collector.prefix(), "x,y,z");
        collector.with_description("branch", |c| c.add_exact("x,y,zz", ""));
        assert_eq!(
            collector.finish(),
            vec![Candidate::new("x,y,zip", ""), Candidate::new("x,y,zz", "branch")]
        );
    }
}
