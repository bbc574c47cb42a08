//! Deterministic reply interpretation.

use async_trait::async_trait;

use crate::domain::workflow::Step;

use super::condition::{branch_strength, MatchStrength, Reply};
use super::{Decision, StepInterpreter};

/// Outcome of the deterministic rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleVerdict {
    Decided(String),
    Inconclusive,
}

/// Interprets replies with numeric predicates, label phrases and keywords.
///
/// The branch with the strongest evidence decides: a holding numeric
/// predicate beats a keyword, a longer keyword beats a shorter one, and
/// any keyword beats a generic "yes"/"no" synonym. A tie at the top is
/// inconclusive. A step with a single branch also advances on a plain
/// acknowledgement ("done", "ok"). Hedged replies ("not sure") never
/// select a branch by phrase.
#[derive(Debug, Clone, Default)]
pub struct RuleStepInterpreter;

impl RuleStepInterpreter {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, step: &Step, text: &str) -> RuleVerdict {
        if step.branches.is_empty() {
            return RuleVerdict::Inconclusive;
        }

        let reply = Reply::parse(text);
        if reply.is_empty() {
            return RuleVerdict::Inconclusive;
        }
        let uncertain = reply.is_uncertain();

        let matching: Vec<(&str, MatchStrength)> = step
            .branches
            .iter()
            .filter_map(|branch| {
                branch_strength(branch, &reply).map(|strength| (branch.label.as_str(), strength))
            })
            .filter(|(_, strength)| !uncertain || *strength == MatchStrength::Numeric)
            .collect();

        let Some(strongest) = matching.iter().map(|(_, strength)| *strength).max() else {
            return if step.branches.len() == 1 && !uncertain && reply.is_acknowledgement() {
                RuleVerdict::Decided(step.branches[0].label.clone())
            } else {
                RuleVerdict::Inconclusive
            };
        };

        let mut top = matching.iter().filter(|(_, strength)| *strength == strongest);
        match (top.next(), top.next()) {
            (Some((label, _)), None) => RuleVerdict::Decided((*label).to_string()),
            _ => RuleVerdict::Inconclusive,
        }
    }
}

#[async_trait]
impl StepInterpreter for RuleStepInterpreter {
    async fn interpret(&self, step: &Step, reply: &str) -> Decision {
        match self.evaluate(step, reply) {
            RuleVerdict::Decided(label) => Decision::Branch(label),
            RuleVerdict::Inconclusive => Decision::Unclear,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::StepId;
    use crate::domain::workflow::fixtures::thermostat_workflow;
    use crate::domain::workflow::{Branch, StepKind};

    fn step(id: &str) -> Step {
        thermostat_workflow()
            .step(&StepId::new(id).unwrap())
            .cloned()
            .unwrap()
    }

    fn decide(step_id: &str, text: &str) -> RuleVerdict {
        RuleStepInterpreter::new().evaluate(&step(step_id), text)
    }

    fn decided(label: &str) -> RuleVerdict {
        RuleVerdict::Decided(label.to_string())
    }

    #[test]
    fn numeric_reply_selects_matching_predicate() {
        assert_eq!(
            decide("check_thermostat", "it is set to 120"),
            decided("temperature >= 115")
        );
        assert_eq!(
            decide("check_thermostat", "About 105 I think"),
            decided("temperature < 115")
        );
        assert_eq!(decide("check_thermostat", "115"), decided("temperature >= 115"));
    }

    #[test]
    fn numeric_step_without_number_is_inconclusive() {
        assert_eq!(
            decide("check_thermostat", "I can't find the dial"),
            RuleVerdict::Inconclusive
        );
    }

    #[test]
    fn hedged_number_still_decides() {
        assert_eq!(
            decide("check_thermostat", "maybe 110?"),
            decided("temperature < 115")
        );
    }

    #[test]
    fn yes_no_question() {
        assert_eq!(decide("check_heating_element", "yes"), decided("yes"));
        assert_eq!(decide("check_heating_element", "Nope."), decided("no"));
    }

    #[test]
    fn contradictory_reply_is_inconclusive() {
        assert_eq!(
            decide("check_heating_element", "yes and no"),
            RuleVerdict::Inconclusive
        );
    }

    #[test]
    fn hedged_reply_is_inconclusive() {
        assert_eq!(
            decide("check_heating_element", "I don't know"),
            RuleVerdict::Inconclusive
        );
        assert_eq!(
            decide("check_heating_element", "not sure"),
            RuleVerdict::Inconclusive
        );
    }

    #[test]
    fn single_branch_step_advances_on_acknowledgement() {
        assert_eq!(decide("raise_setting", "ok, finished"), decided("done"));
        assert_eq!(decide("raise_setting", "all set"), decided("done"));
    }

    #[test]
    fn single_branch_step_with_custom_label_accepts_acknowledgement() {
        let custom = Step::new(
            StepId::new("wait").unwrap(),
            StepKind::Instruction,
            "Wait an hour.",
        )
        .with_branch(Branch::to_step("continue", StepId::new("next").unwrap()));
        assert_eq!(
            RuleStepInterpreter::new().evaluate(&custom, "okay"),
            decided("continue")
        );
    }

    #[test]
    fn single_branch_step_rejects_questions() {
        assert_eq!(
            decide("raise_setting", "how do I do that?"),
            RuleVerdict::Inconclusive
        );
        assert_eq!(decide("raise_setting", "not done yet"), RuleVerdict::Inconclusive);
    }

    #[test]
    fn terminal_step_is_inconclusive() {
        assert_eq!(decide("fixed", "yes"), RuleVerdict::Inconclusive);
    }

    #[test]
    fn punctuation_only_is_inconclusive() {
        assert_eq!(decide("check_heating_element", "?!"), RuleVerdict::Inconclusive);
    }

    #[tokio::test]
    async fn trait_maps_inconclusive_to_unclear() {
        let interpreter = RuleStepInterpreter::new();
        assert_eq!(
            interpreter.interpret(&step("check_heating_element"), "purple").await,
            Decision::Unclear
        );
        assert_eq!(
            interpreter.interpret(&step("check_heating_element"), "yes").await,
            Decision::Branch("yes".to_string())
        );
    }

    mod builtin_library {
        use super::*;
        use crate::domain::interpretation::NumericPredicate;
        use crate::domain::workflow::builtin_workflows;

        fn builtin_step(step_id: &str) -> Step {
            let id = StepId::new(step_id).unwrap();
            builtin_workflows()
                .unwrap()
                .iter()
                .find_map(|workflow| workflow.step(&id).cloned())
                .unwrap()
        }

        #[test]
        fn every_keyword_selects_its_own_branch() {
            let interpreter = RuleStepInterpreter::new();
            for workflow in builtin_workflows().unwrap() {
                for step in workflow.steps().iter().filter(|s| s.branches.len() > 1) {
                    for branch in &step.branches {
                        let label = (NumericPredicate::parse(&branch.label).is_none())
                            .then_some(&branch.label);
                        for phrase in branch.keywords.iter().chain(label) {
                            assert_eq!(
                                interpreter.evaluate(step, phrase),
                                decided(&branch.label),
                                "{}/{}: {:?}",
                                workflow.id(),
                                step.id,
                                phrase
                            );
                        }
                    }
                }
            }
        }

        #[test]
        fn spoken_negative_answers() {
            let cases = [
                ("check_pilot", "no flame"),
                ("check_pilot", "there is no flame"),
                ("check_leak", "no leak"),
                ("check_leak", "it is dry"),
                ("check_breaker", "it is on"),
                ("confirm_thermostat_fix", "it is still lukewarm"),
            ];
            for (step_id, text) in cases {
                assert_eq!(
                    RuleStepInterpreter::new().evaluate(&builtin_step(step_id), text),
                    decided("no"),
                    "{}: {:?}",
                    step_id,
                    text
                );
            }
        }

        #[test]
        fn bare_pronoun_answer_still_counts_as_yes() {
            assert_eq!(
                RuleStepInterpreter::new().evaluate(&builtin_step("check_leak"), "it is"),
                decided("yes")
            );
        }

        #[test]
        fn specific_keyword_beats_generic_no() {
            assert_eq!(
                RuleStepInterpreter::new()
                    .evaluate(&builtin_step("check_sediment"), "never flushed it"),
                decided("yes")
            );
        }
    }
}
