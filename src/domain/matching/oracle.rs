//! Keyword-first matcher with a language oracle fallback.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::consultation::{consult, extract_json};
use crate::domain::foundation::WorkflowId;
use crate::domain::workflow::WorkflowCatalogue;
use crate::ports::{LanguageOracle, MessageRole, OraclePurpose, OracleRequest};

use super::{IntentMatcher, KeywordIntentMatcher, MatchMethod, MatchResult};

/// Default minimum oracle confidence for accepting its choice.
pub const DEFAULT_CONFIDENCE_CUTOFF: f64 = 0.7;

const SYSTEM_PROMPT: &str = "You route home-maintenance problem descriptions to \
troubleshooting guides. Answer with a single JSON object of the form \
{\"workflow_id\": \"<id>\", \"confidence\": <0.0-1.0>}. Use null for workflow_id \
when no guide fits. Only use ids from the list you are given.";

/// Matches with keywords first and asks the oracle only when they fail.
///
/// The oracle's choice is accepted only if it names a workflow in the
/// catalogue with a confidence at or above the cutoff. Oracle errors,
/// timeouts and malformed answers fall back to `NoMatch`.
pub struct OracleIntentMatcher {
    keyword: KeywordIntentMatcher,
    oracle: Arc<dyn LanguageOracle>,
    confidence_cutoff: f64,
    timeout: Duration,
}

impl OracleIntentMatcher {
    pub fn new(
        keyword: KeywordIntentMatcher,
        oracle: Arc<dyn LanguageOracle>,
        confidence_cutoff: f64,
        timeout: Duration,
    ) -> Self {
        Self {
            keyword,
            oracle,
            confidence_cutoff,
            timeout,
        }
    }

    fn build_request(problem_text: &str, catalogue: &WorkflowCatalogue) -> OracleRequest {
        let mut prompt = String::from("Available guides:\n");
        for workflow in catalogue.all() {
            let _ = write!(prompt, "- id: {} | title: {}", workflow.id(), workflow.title());
            if let Some(summary) = workflow.summary() {
                let _ = write!(prompt, " | {}", summary);
            }
            prompt.push('\n');
        }
        let _ = write!(prompt, "\nProblem description:\n{}", problem_text);

        OracleRequest::new(OraclePurpose::IntentMatching)
            .with_system_prompt(SYSTEM_PROMPT)
            .with_message(MessageRole::User, prompt)
            .with_max_tokens(100)
            .with_temperature(0.0)
            .with_json_output()
    }

    fn accept(&self, content: &str, catalogue: &WorkflowCatalogue) -> MatchResult {
        let Some(answer) = extract_json(content) else {
            warn!("Oracle returned a non-JSON intent answer");
            return MatchResult::NoMatch;
        };

        let Some(raw_id) = answer["workflow_id"].as_str() else {
            debug!("Oracle found no suitable workflow");
            return MatchResult::NoMatch;
        };
        let confidence = answer["confidence"].as_f64().unwrap_or(0.0);

        let Ok(workflow_id) = WorkflowId::new(raw_id.trim()) else {
            warn!(raw_id, "Oracle returned a malformed workflow id");
            return MatchResult::NoMatch;
        };
        if catalogue.find(&workflow_id).is_err() {
            warn!(%workflow_id, "Oracle chose a workflow outside the catalogue");
            return MatchResult::NoMatch;
        }
        if confidence < self.confidence_cutoff {
            debug!(
                %workflow_id,
                confidence,
                cutoff = self.confidence_cutoff,
                "Oracle choice below confidence cutoff"
            );
            return MatchResult::NoMatch;
        }

        MatchResult::Matched {
            workflow_id,
            confidence: confidence.min(1.0),
            method: MatchMethod::Oracle,
        }
    }
}

#[async_trait]
impl IntentMatcher for OracleIntentMatcher {
    async fn match_problem(
        &self,
        problem_text: &str,
        catalogue: &WorkflowCatalogue,
    ) -> MatchResult {
        let keyword_result = self.keyword.best_match(problem_text, catalogue);
        if keyword_result.is_match() || catalogue.is_empty() {
            return keyword_result;
        }

        let request = Self::build_request(problem_text, catalogue);
        match consult(self.oracle.as_ref(), request, self.timeout).await {
            Ok(content) => self.accept(&content, catalogue),
            Err(err) => {
                warn!(error = %err, "Oracle intent matching failed, using keyword result");
                keyword_result
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockOracle;
    use crate::domain::workflow::builtin_workflows;
    use crate::ports::OracleError;

    fn catalogue() -> WorkflowCatalogue {
        WorkflowCatalogue::new(builtin_workflows().unwrap()).unwrap()
    }

    fn matcher(oracle: Arc<MockOracle>) -> OracleIntentMatcher {
        OracleIntentMatcher::new(
            KeywordIntentMatcher::default(),
            oracle,
            DEFAULT_CONFIDENCE_CUTOFF,
            Duration::from_millis(200),
        )
    }

    const VAGUE: &str = "the thing in my basement makes a funny clunk";

    #[tokio::test]
    async fn keyword_match_skips_the_oracle() {
        let oracle = Arc::new(MockOracle::new());
        let result = matcher(oracle.clone())
            .match_problem("my shower is lukewarm", &catalogue())
            .await;

        assert!(result.is_match());
        assert_eq!(oracle.call_count(), 0);
    }

    #[tokio::test]
    async fn confident_oracle_choice_is_accepted() {
        let oracle = Arc::new(
            MockOracle::new().with_response(r#"{"workflow_id": "no_hot_water", "confidence": 0.85}"#),
        );
        let result = matcher(oracle.clone()).match_problem(VAGUE, &catalogue()).await;

        match result {
            MatchResult::Matched {
                workflow_id,
                method,
                confidence,
            } => {
                assert_eq!(workflow_id.as_str(), "no_hot_water");
                assert_eq!(method, MatchMethod::Oracle);
                assert!((confidence - 0.85).abs() < f64::EPSILON);
            }
            MatchResult::NoMatch => panic!("expected oracle match"),
        }
        assert_eq!(oracle.call_count(), 1);
        let request = oracle.last_request().unwrap();
        assert_eq!(request.purpose, OraclePurpose::IntentMatching);
        assert!(request.messages[0].content.contains("drain_water_heater"));
    }

    #[tokio::test]
    async fn low_confidence_choice_is_rejected() {
        let oracle = Arc::new(
            MockOracle::new().with_response(r#"{"workflow_id": "no_hot_water", "confidence": 0.4}"#),
        );
        let result = matcher(oracle).match_problem(VAGUE, &catalogue()).await;
        assert_eq!(result, MatchResult::NoMatch);
    }

    #[tokio::test]
    async fn unknown_workflow_is_rejected() {
        let oracle = Arc::new(
            MockOracle::new().with_response(r#"{"workflow_id": "fix_dishwasher", "confidence": 0.99}"#),
        );
        let result = matcher(oracle).match_problem(VAGUE, &catalogue()).await;
        assert_eq!(result, MatchResult::NoMatch);
    }

    #[tokio::test]
    async fn null_choice_is_no_match() {
        let oracle = Arc::new(
            MockOracle::new().with_response(r#"{"workflow_id": null, "confidence": 0.9}"#),
        );
        let result = matcher(oracle).match_problem(VAGUE, &catalogue()).await;
        assert_eq!(result, MatchResult::NoMatch);
    }

    #[tokio::test]
    async fn malformed_answer_is_no_match() {
        let oracle = Arc::new(MockOracle::new().with_response("I think the second one?"));
        let result = matcher(oracle).match_problem(VAGUE, &catalogue()).await;
        assert_eq!(result, MatchResult::NoMatch);
    }

    #[tokio::test]
    async fn oracle_failure_falls_back_to_no_match() {
        let oracle = Arc::new(MockOracle::new().with_error(OracleError::unavailable("down")));
        let result = matcher(oracle).match_problem(VAGUE, &catalogue()).await;
        assert_eq!(result, MatchResult::NoMatch);
    }

    #[tokio::test]
    async fn oracle_timeout_falls_back_to_no_match() {
        let oracle = Arc::new(
            MockOracle::new()
                .with_response(r#"{"workflow_id": "no_hot_water", "confidence": 0.9}"#)
                .with_delay(Duration::from_secs(2)),
        );
        let result = matcher(oracle).match_problem(VAGUE, &catalogue()).await;
        assert_eq!(result, MatchResult::NoMatch);
    }

    #[tokio::test]
    async fn empty_catalogue_does_not_consult_oracle() {
        let oracle = Arc::new(MockOracle::new());
        let empty = WorkflowCatalogue::new(Vec::new()).unwrap();
        let result = matcher(oracle.clone()).match_problem(VAGUE, &empty).await;
        assert_eq!(result, MatchResult::NoMatch);
        assert_eq!(oracle.call_count(), 0);
    }
}
