//! Agent reply composition.
//!
//! All texts are fixed templates filled from workflow data, so the same
//! session state always produces the same reply.

use crate::domain::session::SessionStatus;
use crate::domain::workflow::{Outcome, Step, StepKind};

const RESOLVED_CLOSING: &str = "Glad we could sort that out. This troubleshooting session is \
now closed; start a new session if anything else comes up.";

const ESCALATED_CLOSING: &str = "This one needs a professional, so this troubleshooting session \
is now closed. Start a new session if you run into a different problem.";

const ABANDONED_CLOSING: &str = "This troubleshooting session was closed before it finished. \
Start a new session to pick things up again.";

/// The prompt of a step as shown to the user, with its safety warning.
pub fn step_message(step: &Step) -> String {
    match &step.warning {
        Some(warning) => format!("{}\n\nSafety note: {}", step.prompt, warning),
        None => step.prompt.clone(),
    }
}

/// Reply for a step that ends the dialogue.
pub fn terminal_step_message(step: &Step) -> String {
    match step.kind.outcome() {
        Some(outcome) => format!("{}\n\n{}", step_message(step), outcome_closing(outcome)),
        None => step_message(step),
    }
}

/// Reply for a branch that ends the dialogue without a final step.
pub fn outcome_message(outcome: Outcome) -> String {
    outcome_closing(outcome).to_string()
}

/// Closing text for a finished outcome.
pub fn outcome_closing(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Resolved => RESOLVED_CLOSING,
        Outcome::Escalated => ESCALATED_CLOSING,
    }
}

/// Closing text for a terminal session status.
pub fn closing_message(status: SessionStatus) -> Option<&'static str> {
    match status {
        SessionStatus::Resolved => Some(RESOLVED_CLOSING),
        SessionStatus::Escalated => Some(ESCALATED_CLOSING),
        SessionStatus::Abandoned => Some(ABANDONED_CLOSING),
        SessionStatus::New | SessionStatus::Matching | SessionStatus::InProgress => None,
    }
}

/// Reply when a helper workflow is opened from the current step.
pub fn helper_opened_message(title: &str, root: &Step) -> String {
    format!(
        "Let's go through \"{}\" first, then we'll come back to this.\n\n{}",
        title,
        step_message(root)
    )
}

/// Reply when a helper workflow ends, optionally on a final step, and the
/// dialogue returns to `origin`.
pub fn helper_closed_message(last: Option<&Step>, origin: &Step) -> String {
    let mut text = String::new();
    if let Some(last) = last {
        text.push_str(&step_message(last));
        text.push_str("\n\n");
    }
    text.push_str("Now, back to where we were.\n\n");
    text.push_str(&step_message(origin));
    text
}

/// Reply when a problem description matched no workflow.
pub fn no_match_message(titles: &[&str]) -> String {
    if titles.is_empty() {
        return "Sorry, I don't have any troubleshooting guides available right now.".to_string();
    }
    let mut text = String::from(
        "Sorry, I couldn't tell which problem you're describing. Could you describe it another \
way? I can currently help with:",
    );
    for title in titles {
        text.push_str("\n- ");
        text.push_str(title);
    }
    text
}

/// Reply when an answer to the current step was unclear.
pub fn clarification_message(step: &Step) -> String {
    let mut text = String::from("Sorry, I didn't quite catch that.");
    if let Some(hint) = &step.hint {
        text.push(' ');
        text.push_str(hint);
    }
    text.push_str("\n\n");
    text.push_str(&step_message(step));

    let labels = step.labels();
    if step.kind == StepKind::Question && !labels.is_empty() {
        text.push_str("\n\n");
        text.push_str(&answer_guidance(&labels));
    }
    text
}

fn answer_guidance(labels: &[&str]) -> String {
    let numeric = labels
        .iter()
        .any(|l| l.contains(|c: char| c == '<' || c == '>' || c == '='));
    if numeric {
        "Please reply with a number.".to_string()
    } else {
        format!("Please answer with one of: {}.", labels.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::StepId;
    use crate::domain::workflow::fixtures::thermostat_workflow;

    fn step(id: &str) -> Step {
        thermostat_workflow()
            .step(&StepId::new(id).unwrap())
            .cloned()
            .unwrap()
    }

    #[test]
    fn step_message_appends_warning() {
        let text = step_message(&step("call_pro"));
        assert!(text.starts_with("Call a plumber."));
        assert!(text.contains("Safety note: Do not open the element cover yourself."));
    }

    #[test]
    fn step_message_without_warning_is_prompt() {
        let s = step("raise_setting");
        assert_eq!(step_message(&s), s.prompt);
    }

    #[test]
    fn terminal_step_message_includes_closing() {
        let text = terminal_step_message(&step("fixed"));
        assert!(text.starts_with("Great, that fixed it."));
        assert!(text.ends_with(RESOLVED_CLOSING));

        let text = terminal_step_message(&step("call_pro"));
        assert!(text.ends_with(ESCALATED_CLOSING));
    }

    #[test]
    fn no_match_lists_titles() {
        let text = no_match_message(&["Fix Lukewarm Water", "How to Drain a Water Heater"]);
        assert!(text.contains("- Fix Lukewarm Water"));
        assert!(text.contains("- How to Drain a Water Heater"));
    }

    #[test]
    fn no_match_with_empty_catalogue() {
        assert!(no_match_message(&[]).contains("don't have any"));
    }

    #[test]
    fn clarification_includes_hint_prompt_and_number_guidance() {
        let text = clarification_message(&step("check_thermostat"));
        assert!(text.contains("The dial is on the side of the tank."));
        assert!(text.contains("What temperature is the thermostat set to?"));
        assert!(text.ends_with("Please reply with a number."));
    }

    #[test]
    fn clarification_lists_plain_labels() {
        let text = clarification_message(&step("check_heating_element"));
        assert!(text.ends_with("Please answer with one of: yes, no."));
    }

    #[test]
    fn closing_message_only_for_terminal_statuses() {
        assert!(closing_message(SessionStatus::InProgress).is_none());
        assert_eq!(closing_message(SessionStatus::Resolved), Some(RESOLVED_CLOSING));
        assert_eq!(closing_message(SessionStatus::Abandoned), Some(ABANDONED_CLOSING));
    }

    #[test]
    fn helper_opened_names_the_guide_and_its_first_step() {
        let text = helper_opened_message("How to Drain a Water Heater", &step("raise_setting"));
        assert!(text.starts_with("Let's go through \"How to Drain a Water Heater\" first"));
        assert!(text.ends_with("Raise the setting to 120 and tell me when done."));
    }

    #[test]
    fn helper_closed_repeats_the_origin_step() {
        let origin = step("check_heating_element");
        let text = helper_closed_message(Some(&step("fixed")), &origin);
        assert!(text.starts_with("Great, that fixed it."));
        assert!(!text.contains(RESOLVED_CLOSING));
        assert!(text.ends_with(&origin.prompt));

        let text = helper_closed_message(None, &origin);
        assert!(text.starts_with("Now, back to where we were."));
    }

    #[test]
    fn replies_are_deterministic() {
        let s = step("check_thermostat");
        assert_eq!(clarification_message(&s), clarification_message(&s));
    }
}
