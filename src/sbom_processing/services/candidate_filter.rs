use crate::shared::Result;
use globset::{Glob, GlobMatcher};
use std::sync::atomic::{AtomicBool, Ordering};

/// Maximum number of include or exclude patterns
const MAX_PATTERNS: usize = 64;

/// Maximum length of a single pattern
const MAX_PATTERN_LENGTH: usize = 255;

/// CandidateFilter - selects stored objects for a bulk merge
///
/// Patterns are globs matched against the file-name part of an object key.
/// With include patterns, a key must match at least one of them; a key
/// matching any exclude pattern is dropped.
#[derive(Debug)]
pub struct CandidateFilter {
    include: Vec<CandidatePattern>,
    exclude: Vec<CandidatePattern>,
}

impl CandidateFilter {
    /// Creates a filter from include and exclude pattern lists
    ///
    /// # Errors
    /// - Too many patterns (> MAX_PATTERNS per list)
    /// - Empty, over-long or unparsable pattern
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: compile_patterns(include, "include")?,
            exclude: compile_patterns(exclude, "exclude")?,
        })
    }

    /// Filter that accepts every key
    pub fn accept_all() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    /// Splits a comma-separated pattern list, dropping blank entries
    pub fn split_patterns(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Whether the object key passes both pattern lists
    pub fn accepts(&self, key: &str) -> bool {
        let file_name = file_name_of(key);

        if !self.include.is_empty() {
            // Evaluate every include pattern so unmatched tracking stays accurate
            let included = self
                .include
                .iter()
                .fold(false, |acc, p| p.matches(file_name) | acc);
            if !included {
                return false;
            }
        }

        !self
            .exclude
            .iter()
            .fold(false, |acc, p| p.matches(file_name) | acc)
    }

    /// Patterns that did not match any key seen so far
    ///
    /// Call after filtering to find patterns that had no effect.
    pub fn get_unmatched_patterns(&self) -> Vec<String> {
        self.include
            .iter()
            .chain(self.exclude.iter())
            .filter(|p| !p.matched.load(Ordering::Relaxed))
            .map(|p| p.original.clone())
            .collect()
    }
}

#[derive(Debug)]
struct CandidatePattern {
    original: String,
    matcher: GlobMatcher,
    matched: AtomicBool,
}

impl CandidatePattern {
    fn new(pattern: &str, kind: &str) -> Result<Self> {
        validate_pattern(pattern, kind)?;

        let matcher = Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("Invalid {} pattern '{}': {}", kind, pattern, e))?
            .compile_matcher();

        Ok(Self {
            original: pattern.to_string(),
            matcher,
            matched: AtomicBool::new(false),
        })
    }

    fn matches(&self, file_name: &str) -> bool {
        let is_match = self.matcher.is_match(file_name);
        if is_match {
            self.matched.store(true, Ordering::Relaxed);
        }
        is_match
    }
}

fn compile_patterns(patterns: &[String], kind: &str) -> Result<Vec<CandidatePattern>> {
    if patterns.len() > MAX_PATTERNS {
        anyhow::bail!(
            "Too many {} patterns: {} (maximum: {})",
            kind,
            patterns.len(),
            MAX_PATTERNS
        );
    }

    patterns
        .iter()
        .map(|p| CandidatePattern::new(p, kind))
        .collect()
}

fn validate_pattern(pattern: &str, kind: &str) -> Result<()> {
    if pattern.trim().is_empty() {
        anyhow::bail!("The {} pattern cannot be empty", kind);
    }

    if pattern.len() > MAX_PATTERN_LENGTH {
        anyhow::bail!(
            "The {} pattern is too long: '{}' ({} chars). Maximum: {} chars",
            kind,
            pattern,
            pattern.len(),
            MAX_PATTERN_LENGTH
        );
    }

    Ok(())
}

fn file_name_of(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}
