//! Spelling corrections applied to raw transcript cue text (spec §4.4.1).
//! Whole-word, case-insensitive, applied in document order without
//! re-scanning the substituted output.

use std::collections::HashMap;

use podcast_common::{CoreError, Correction};
use regex::Regex;

/// A compiled correction: one regex per misspelling variant, sharing a
/// single corrected spelling.
struct CompiledCorrection {
    pattern: Regex,
    corrected_spelling: String,
}

pub struct CorrectionEngine {
    compiled: Vec<CompiledCorrection>,
}

#[derive(Debug, Default)]
pub struct CorrectionReport {
    /// substitutions made, keyed by `correctedSpelling`
    pub counts: HashMap<String, usize>,
}

impl CorrectionEngine {
    pub fn compile(corrections: &[Correction]) -> Result<Self, CoreError> {
        let mut compiled = Vec::new();
        for correction in corrections {
            for misspelling in &correction.misspellings {
                let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(misspelling)))
                    .map_err(|e| {
                        CoreError::InputInvariantViolation(format!(
                            "invalid correction pattern for {misspelling:?}: {e}"
                        ))
                    })?;
                compiled.push(CompiledCorrection {
                    pattern,
                    corrected_spelling: correction.corrected_spelling.clone(),
                });
            }
        }
        Ok(Self { compiled })
    }

    /// Apply every compiled correction to `text` once, in order. A
    /// corrected spelling emitted by one rule is never re-scanned by a
    /// later rule.
    pub fn apply(&self, text: &str, report: &mut CorrectionReport) -> String {
        let mut out = text.to_string();
        for correction in &self.compiled {
            let mut count = 0;
            let replaced = correction.pattern.replace_all(&out, |_: &regex::Captures| {
                count += 1;
                correction.corrected_spelling.clone()
            });
            if count > 0 {
                out = replaced.into_owned();
                *report.counts.entry(correction.corrected_spelling.clone()).or_insert(0) += count;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correction(misspellings: &[&str], corrected: &str) -> Correction {
        Correction {
            misspellings: misspellings.iter().map(|s| s.to_string()).collect(),
            corrected_spelling: corrected.to_string(),
        }
    }

    #[test]
    fn whole_word_case_insensitive_substitution() {
        let engine = CorrectionEngine::compile(&[correction(&["kubernetes", "kuberneetes"], "Kubernetes")]).unwrap();
        let mut report = CorrectionReport::default();
        let out = engine.apply("We use KUBERNETES and kuberneetes daily", &mut report);
        assert_eq!(out, "We use Kubernetes and Kubernetes daily");
        assert_eq!(report.counts.get("Kubernetes"), Some(&2));
    }

    #[test]
    fn does_not_match_inside_a_larger_word() {
        let engine = CorrectionEngine::compile(&[correction(&["go"], "Go")]).unwrap();
        let mut report = CorrectionReport::default();
        let out = engine.apply("gopher golang go", &mut report);
        assert_eq!(out, "gopher golang Go");
        assert_eq!(report.counts.get("Go"), Some(&1));
    }

    #[test]
    fn later_rules_do_not_rescan_earlier_substitutions() {
        let engine = CorrectionEngine::compile(&[
            correction(&["foo"], "bar"),
            correction(&["bar"], "baz"),
        ])
        .unwrap();
        let mut report = CorrectionReport::default();
        // "foo" becomes "bar" from rule 1; rule 2 then matches that "bar"
        // (it's a separate pass over the whole string), but the literal
        // "already-bar" token present before rule 1 ran must not be
        // double-counted by rule 1.
        let out = engine.apply("foo bar", &mut report);
        assert_eq!(out, "baz baz");
    }
}
