//! Deterministic keyword scoring.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::domain::foundation::WorkflowId;
use crate::domain::text::{contains_phrase, salient_tokens, tokens};
use crate::domain::workflow::{Workflow, WorkflowCatalogue};

use super::{IntentMatcher, MatchMethod, MatchResult};

/// Default minimum score for a keyword match.
pub const DEFAULT_MIN_SCORE: f64 = 0.2;

/// Default minimum number of shared salient tokens.
pub const DEFAULT_MIN_SHARED: usize = 1;

/// Score of one workflow against a problem description.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowScore {
    pub workflow_id: WorkflowId,
    /// Salient tokens shared by the description and the trigger phrases.
    pub shared: usize,
    /// Trigger phrases found verbatim (after normalization) in the description.
    pub phrase_hits: usize,
    pub score: f64,
}

/// Scores each workflow by token overlap with its trigger phrases.
///
/// `score = shared / min(|query|, |trigger vocabulary|) + phrase_hits`.
/// The highest score wins; ties go to the workflow added to the catalogue
/// first.
#[derive(Debug, Clone)]
pub struct KeywordIntentMatcher {
    min_score: f64,
    min_shared: usize,
}

impl Default for KeywordIntentMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SCORE, DEFAULT_MIN_SHARED)
    }
}

impl KeywordIntentMatcher {
    pub fn new(min_score: f64, min_shared: usize) -> Self {
        Self {
            min_score,
            min_shared,
        }
    }

    /// Scores every workflow in catalogue order.
    pub fn score_all(&self, problem_text: &str, catalogue: &WorkflowCatalogue) -> Vec<WorkflowScore> {
        let query = salient_tokens(problem_text);
        let words = tokens(problem_text);
        catalogue
            .all()
            .iter()
            .map(|workflow| Self::score_workflow(&query, &words, workflow))
            .collect()
    }

    /// Returns the best eligible workflow, if any.
    pub fn best_match(&self, problem_text: &str, catalogue: &WorkflowCatalogue) -> MatchResult {
        let mut best: Option<WorkflowScore> = None;
        for candidate in self.score_all(problem_text, catalogue) {
            if !self.is_eligible(&candidate) {
                continue;
            }
            // Strictly greater keeps the earliest workflow on ties.
            if best.as_ref().map_or(true, |b| candidate.score > b.score) {
                best = Some(candidate);
            }
        }

        match best {
            Some(winner) => MatchResult::Matched {
                workflow_id: winner.workflow_id,
                confidence: winner.score.min(1.0),
                method: MatchMethod::Keyword,
            },
            None => MatchResult::NoMatch,
        }
    }

    fn is_eligible(&self, score: &WorkflowScore) -> bool {
        (score.shared >= self.min_shared || score.phrase_hits > 0) && score.score >= self.min_score
    }

    fn score_workflow(query: &BTreeSet<String>, words: &[String], workflow: &Workflow) -> WorkflowScore {
        let vocabulary: BTreeSet<String> = workflow
            .triggers()
            .iter()
            .flat_map(|t| salient_tokens(t))
            .collect();

        let shared = query.intersection(&vocabulary).count();
        let phrase_hits = workflow
            .triggers()
            .iter()
            .filter(|t| contains_phrase(words, &tokens(t)))
            .count();

        let denominator = query.len().min(vocabulary.len());
        let overlap = if denominator == 0 {
            0.0
        } else {
            shared as f64 / denominator as f64
        };

        WorkflowScore {
            workflow_id: workflow.id().clone(),
            shared,
            phrase_hits,
            score: overlap + phrase_hits as f64,
        }
    }
}

#[async_trait]
impl IntentMatcher for KeywordIntentMatcher {
    async fn match_problem(
        &self,
        problem_text: &str,
        catalogue: &WorkflowCatalogue,
    ) -> MatchResult {
        self.best_match(problem_text, catalogue)
    }
}
