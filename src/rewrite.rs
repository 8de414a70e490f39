//! Deterministic rule application over a single file buffer
//!
//! Rules run in descending priority (stable within equal priority), each rule
//! matching against the buffer produced by the previous one. Matches are
//! spliced left to right in one pass per rule, so a replacement that happens to
//! contain its own pattern text is not rewritten again within the same rule.

use crate::error::TransformError;
use crate::pattern::{MatchTimeout, Pattern};
use crate::rule::{expand_template, CallbackRegistry, Rule};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

/// One applied rewrite, for reporting
#[derive(Debug, Clone, Serialize)]
pub struct AppliedTransform {
    pub rule_id: String,
    pub description: String,
    /// 1-based line in the buffer the rule matched against
    pub line: usize,
    pub before: String,
    pub after: String,
}

/// Outcome of applying one unit's rules to one buffer
#[derive(Debug, Clone, Default)]
pub struct RewriteResult {
    pub content: String,
    pub transforms: Vec<AppliedTransform>,
    /// Rule ids whose pattern fell back to regex matching
    pub degraded_rules: Vec<String>,
}

impl RewriteResult {
    pub fn changed(&self) -> bool {
        !self.transforms.is_empty()
    }
}

/// Applies ordered rule lists to file buffers
pub struct RewriteExecutor<'a> {
    registry: &'a CallbackRegistry,
    deadline: Option<(Instant, u64)>,
}

impl<'a> RewriteExecutor<'a> {
    pub fn new(registry: &'a CallbackRegistry) -> Self {
        RewriteExecutor {
            registry,
            deadline: None,
        }
    }

    /// Abort with a timeout error once `deadline` passes. `timeout_secs` is
    /// only used for the error message.
    pub fn with_deadline(mut self, deadline: Instant, timeout_secs: u64) -> Self {
        self.deadline = Some((deadline, timeout_secs));
        self
    }

    /// Apply `rules` to `content`, returning the rewritten buffer and a log of
    /// every change. `rules` should already be filtered to the file's globs.
    pub fn apply(
        &self,
        rules: &[Rule],
        path: &Path,
        content: &str,
    ) -> Result<RewriteResult, TransformError> {
        let mut ordered: Vec<&Rule> = rules.iter().collect();
        ordered.sort_by_key(|r| std::cmp::Reverse(r.priority));

        let mut result = RewriteResult {
            content: content.to_string(),
            ..RewriteResult::default()
        };

        for rule in ordered {
            if let Some((deadline, secs)) = self.deadline {
                if Instant::now() >= deadline {
                    return Err(TransformError::Timeout(secs, rule.id.clone()));
                }
            }
            let pattern = Pattern::compile(&rule.pattern)
                .map_err(|e| TransformError::Pattern(rule.id.clone(), e.0))?;
            if pattern.is_degraded() && !result.degraded_rules.contains(&rule.id) {
                result.degraded_rules.push(rule.id.clone());
            }

            // The deadline is threaded into the scan itself so one
            // backtracking-heavy rule cannot run past it.
            let spans = match pattern
                .find_iter_within(&result.content, self.deadline.map(|(deadline, _)| deadline))
            {
                Ok(spans) => spans,
                Err(MatchTimeout) => {
                    let secs = self.deadline.map_or(0, |(_, secs)| secs);
                    return Err(TransformError::Timeout(secs, rule.id.clone()));
                }
            };
            if spans.is_empty() {
                continue;
            }

            let mut rewritten = String::with_capacity(result.content.len());
            let mut cursor = 0usize;
            for span in &spans {
                let matched = &result.content[span.start..span.end];
                let replacement = match &rule.callback {
                    Some(id) => {
                        let callback = self.registry.get(id).ok_or_else(|| {
                            TransformError::UnknownCallback(rule.id.clone(), id.clone())
                        })?;
                        callback(&span.captures, path)
                    }
                    None => expand_template(&rule.replacement, &span.captures),
                };
                rewritten.push_str(&result.content[cursor..span.start]);
                if replacement != matched {
                    result.transforms.push(AppliedTransform {
                        rule_id: rule.id.clone(),
                        description: rule.description.clone(),
                        line: result.content[..span.start].matches('\n').count() + 1,
                        before: matched.to_string(),
                        after: replacement.clone(),
                    });
                }
                rewritten.push_str(&replacement);
                cursor = span.end;
            }
            rewritten.push_str(&result.content[cursor..]);
            result.content = rewritten;
        }

        Ok(result)
    }
}
