//! Rules-first interpreter with a language oracle fallback.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::consultation::{consult, extract_json};
use crate::domain::workflow::Step;
use crate::ports::{LanguageOracle, MessageRole, OraclePurpose, OracleRequest};

use super::{Decision, RuleStepInterpreter, RuleVerdict, StepInterpreter};

const SYSTEM_PROMPT: &str = "You help a home-maintenance troubleshooting assistant \
understand a user's reply to a diagnostic question. Choose the single option that \
best matches the reply. Answer with a JSON object {\"label\": \"<option>\"}, copying \
the option text exactly, or {\"label\": \"unclear\"} if no option clearly applies.";

/// Runs the deterministic rules and asks the oracle only when they are
/// inconclusive.
///
/// An oracle answer that is not exactly one of the step's labels, an
/// oracle error or a timeout all yield [`Decision::Unclear`].
pub struct OracleStepInterpreter {
    rules: RuleStepInterpreter,
    oracle: Arc<dyn LanguageOracle>,
    timeout: Duration,
}

impl OracleStepInterpreter {
    pub fn new(rules: RuleStepInterpreter, oracle: Arc<dyn LanguageOracle>, timeout: Duration) -> Self {
        Self {
            rules,
            oracle,
            timeout,
        }
    }

    fn build_request(step: &Step, reply: &str) -> OracleRequest {
        let mut prompt = format!("Question asked:\n{}\n", step.prompt);
        if let Some(hint) = &step.hint {
            let _ = write!(prompt, "\nBackground:\n{}\n", hint);
        }
        prompt.push_str("\nOptions:\n");
        for label in step.labels() {
            let _ = writeln!(prompt, "- {}", label);
        }
        let _ = write!(prompt, "\nUser reply:\n{}", reply);

        OracleRequest::new(OraclePurpose::StepInterpretation)
            .with_system_prompt(SYSTEM_PROMPT)
            .with_message(MessageRole::User, prompt)
            .with_max_tokens(50)
            .with_temperature(0.0)
            .with_json_output()
    }

    /// Maps the oracle's answer onto one of the step's labels.
    fn resolve_label(step: &Step, content: &str) -> Option<String> {
        let raw = match extract_json(content) {
            Some(answer) => answer["label"].as_str()?.to_string(),
            None => content.to_string(),
        };
        let candidate = raw.trim().trim_matches(|c| c == '"' || c == '\'' || c == '`').trim();

        step.branches
            .iter()
            .find(|b| b.label.eq_ignore_ascii_case(candidate))
            .map(|b| b.label.clone())
    }
}

#[async_trait]
impl StepInterpreter for OracleStepInterpreter {
    async fn interpret(&self, step: &Step, reply: &str) -> Decision {
        if let RuleVerdict::Decided(label) = self.rules.evaluate(step, reply) {
            return Decision::Branch(label);
        }
        if step.branches.is_empty() {
            return Decision::Unclear;
        }

        let request = Self::build_request(step, reply);
        match consult(self.oracle.as_ref(), request, self.timeout).await {
            Ok(content) => match Self::resolve_label(step, &content) {
                Some(label) => {
                    debug!(step_id = %step.id, %label, "Oracle selected branch");
                    Decision::Branch(label)
                }
                None => {
                    debug!(step_id = %step.id, "Oracle answer is not an offered label");
                    Decision::Unclear
                }
            },
            Err(err) => {
                warn!(step_id = %step.id, error = %err, "Oracle interpretation failed");
                Decision::Unclear
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockOracle;
    use crate::domain::foundation::StepId;
    use crate::domain::workflow::fixtures::thermostat_workflow;
    use crate::ports::OracleError;

    fn step(id: &str) -> Step {
        thermostat_workflow()
            .step(&StepId::new(id).unwrap())
            .cloned()
            .unwrap()
    }

    fn interpreter(oracle: Arc<MockOracle>) -> OracleStepInterpreter {
        OracleStepInterpreter::new(RuleStepInterpreter::new(), oracle, Duration::from_millis(200))
    }

    #[tokio::test]
    async fn deterministic_reply_does_not_consult_oracle() {
        let oracle = Arc::new(MockOracle::new());
        let decision = interpreter(oracle.clone())
            .interpret(&step("check_thermostat"), "it is set to 120")
            .await;

        assert_eq!(decision, Decision::Branch("temperature >= 115".to_string()));
        assert_eq!(oracle.call_count(), 0);
    }

    #[tokio::test]
    async fn inconclusive_reply_uses_oracle_label() {
        let oracle = Arc::new(MockOracle::new().with_response(r#"{"label": "no"}"#));
        let decision = interpreter(oracle.clone())
            .interpret(&step("check_heating_element"), "the switch looks normal to me")
            .await;

        assert_eq!(decision, Decision::Branch("no".to_string()));
        let request = oracle.last_request().unwrap();
        assert_eq!(request.purpose, OraclePurpose::StepInterpretation);
        assert!(request.messages[0].content.contains("- yes"));
        assert!(request.messages[0].content.contains("the switch looks normal"));
    }

    #[tokio::test]
    async fn label_matching_is_case_insensitive_and_canonical() {
        let oracle = Arc::new(MockOracle::new().with_response("```json\n{\"label\": \"TEMPERATURE < 115\"}\n```"));
        let decision = interpreter(oracle)
            .interpret(&step("check_thermostat"), "it's on the low mark")
            .await;
        assert_eq!(decision, Decision::Branch("temperature < 115".to_string()));
    }

    #[tokio::test]
    async fn plain_text_label_is_accepted() {
        let oracle = Arc::new(MockOracle::new().with_response("\"yes\""));
        let decision = interpreter(oracle)
            .interpret(&step("check_heating_element"), "the little lever flipped over")
            .await;
        assert_eq!(decision, Decision::Branch("yes".to_string()));
    }

    #[tokio::test]
    async fn label_outside_offered_set_is_unclear() {
        let oracle = Arc::new(MockOracle::new().with_response(r#"{"label": "maybe"}"#));
        let decision = interpreter(oracle)
            .interpret(&step("check_heating_element"), "hmm")
            .await;
        assert_eq!(decision, Decision::Unclear);
    }

    #[tokio::test]
    async fn oracle_error_is_unclear() {
        let oracle = Arc::new(MockOracle::new().with_error(OracleError::network("reset")));
        let decision = interpreter(oracle)
            .interpret(&step("check_heating_element"), "hmm")
            .await;
        assert_eq!(decision, Decision::Unclear);
    }

    #[tokio::test]
    async fn oracle_timeout_is_unclear() {
        let oracle = Arc::new(
            MockOracle::new()
                .with_response(r#"{"label": "yes"}"#)
                .with_delay(Duration::from_secs(2)),
        );
        let decision = interpreter(oracle)
            .interpret(&step("check_heating_element"), "hmm")
            .await;
        assert_eq!(decision, Decision::Unclear);
    }
}
