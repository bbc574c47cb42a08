//! Branch conditions evaluated against a user's reply.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::text::{contains_phrase, first_number, tokens};
use crate::domain::workflow::{Branch, Step, WorkflowLink};

static PREDICATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z][A-Za-z _-]*?)\s*(<=|>=|==|!=|<|>|=)\s*(-?\d+(?:\.\d+)?)\s*$")
        .unwrap()
});

const YES: &[&str] = &[
    "yes", "yeah", "yep", "yup", "ya", "correct", "sure", "affirmative", "definitely",
    "absolutely", "indeed", "true",
];

/// Pronoun answers. They only count when nothing more specific matches.
const IMPLIED_YES: &[&str] = &["i do", "it does", "i have", "it is"];

const NO: &[&str] = &[
    "no", "nope", "nah", "not", "never", "none", "nothing", "negative", "false", "isnt",
    "doesnt", "dont", "didnt", "wasnt", "arent", "havent", "hasnt",
];

const DONE: &[&str] = &[
    "done", "ok", "okay", "finished", "complete", "completed", "ready", "did it", "all set",
    "next", "yes", "yeah", "yep", "sure",
];

const UNSURE: &[&str] = &[
    "dont know", "not sure", "no idea", "unsure", "cant tell", "maybe", "not certain",
    "no clue",
];

const NEGATORS: &[&str] = &[
    "not", "never", "isnt", "doesnt", "dont", "didnt", "wasnt", "werent", "arent", "havent",
    "hasnt", "cant", "cannot", "wont",
];

/// Negates only the word right after it: "no flame", "no leak".
const NO_WORD: &str = "no";

/// Comparison operator of a numeric predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Comparison {
    fn parse(op: &str) -> Option<Self> {
        match op {
            "<" => Some(Comparison::Lt),
            "<=" => Some(Comparison::Le),
            ">" => Some(Comparison::Gt),
            ">=" => Some(Comparison::Ge),
            "=" | "==" => Some(Comparison::Eq),
            "!=" => Some(Comparison::Ne),
            _ => None,
        }
    }

    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Lt => value < threshold,
            Comparison::Le => value <= threshold,
            Comparison::Gt => value > threshold,
            Comparison::Ge => value >= threshold,
            Comparison::Eq => (value - threshold).abs() < f64::EPSILON,
            Comparison::Ne => (value - threshold).abs() >= f64::EPSILON,
        }
    }
}

/// A label of the form `<subject> <op> <number>`, e.g. `temperature >= 115`.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericPredicate {
    pub subject: String,
    pub comparison: Comparison,
    pub threshold: f64,
}

impl NumericPredicate {
    /// Parses a branch label, returning `None` for non-numeric labels.
    pub fn parse(label: &str) -> Option<Self> {
        let caps = PREDICATE.captures(label)?;
        Some(Self {
            subject: caps[1].trim().to_string(),
            comparison: Comparison::parse(&caps[2])?,
            threshold: caps[3].parse().ok()?,
        })
    }

    pub fn holds(&self, value: f64) -> bool {
        self.comparison.holds(value, self.threshold)
    }
}

/// A user reply prepared for condition checks.
#[derive(Debug, Clone)]
pub struct Reply {
    words: Vec<String>,
    number: Option<f64>,
}

impl Reply {
    pub fn parse(text: &str) -> Self {
        Self {
            words: tokens(text),
            number: first_number(text),
        }
    }

    pub fn number(&self) -> Option<f64> {
        self.number
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Returns true if the reply contains `phrase` in a non-negated position.
    ///
    /// A phrase is negated by a negator in the two words before it or the
    /// word after it, or by a bare "no" right before it. Phrases that are
    /// themselves negative ("not tripped", "no leak") are never negated.
    pub fn affirms(&self, phrase: &str) -> bool {
        let phrase = tokens(phrase);
        if phrase.is_empty() || phrase.len() > self.words.len() {
            return false;
        }
        let check_negation = !is_negator(&phrase[0]) && phrase[0] != NO_WORD;

        (0..=self.words.len() - phrase.len()).any(|start| {
            let end = start + phrase.len();
            if self.words[start..end] != phrase[..] {
                return false;
            }
            if !check_negation {
                return true;
            }
            let before = &self.words[start.saturating_sub(2)..start];
            let after = self.words.get(end);
            let no_before = start > 0 && self.words[start - 1] == NO_WORD;
            !no_before
                && !before.iter().any(|w| is_negator(w))
                && !after.map_or(false, |w| is_negator(w))
        })
    }

    /// Returns true if the reply contains any of the phrases.
    pub fn affirms_any<'a>(&self, phrases: impl IntoIterator<Item = &'a str>) -> bool {
        phrases.into_iter().any(|p| self.affirms(p))
    }

    /// Token count of the longest affirmed phrase.
    fn longest_affirmed<'a>(&self, phrases: impl IntoIterator<Item = &'a str>) -> Option<usize> {
        phrases
            .into_iter()
            .filter(|p| self.affirms(p))
            .map(|p| tokens(p).len())
            .max()
    }

    /// Returns true for "not sure", "no idea" and similar non-answers.
    pub fn is_uncertain(&self) -> bool {
        UNSURE.iter().any(|phrase| {
            let phrase = tokens(phrase);
            self.words.windows(phrase.len()).any(|w| w == &phrase[..])
        })
    }

    /// Returns true for "done", "ok" and similar acknowledgements.
    pub fn is_acknowledgement(&self) -> bool {
        self.affirms_any(DONE.iter().copied())
    }
}

fn is_negator(word: &str) -> bool {
    NEGATORS.contains(&word)
}

/// Built-in synonyms for the generic labels.
fn synonyms(label: &str) -> Option<&'static [&'static str]> {
    match label.trim().to_lowercase().as_str() {
        "yes" => Some(YES),
        "no" => Some(NO),
        "done" => Some(DONE),
        _ => None,
    }
}

fn implied(label: &str) -> &'static [&'static str] {
    match label.trim().to_lowercase().as_str() {
        "yes" => IMPLIED_YES,
        _ => &[],
    }
}

/// How strongly a reply points at a branch. When several branches match,
/// only a unique strongest one is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchStrength {
    /// A pronoun answer such as "it is" or "i do".
    Implied,
    /// A generic synonym of the label, e.g. "nope" for "no".
    Synonym,
    /// The label itself or one of the branch keywords, by token count.
    Phrase(usize),
    /// A numeric predicate that holds for the reply's number.
    Numeric,
}

/// How a branch is selected during rule-based interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum BranchCondition {
    /// Numeric comparison against the first number in the reply.
    Numeric(NumericPredicate),
    /// Label phrase, or its built-in synonyms.
    Label(String),
}

impl BranchCondition {
    pub fn for_branch(branch: &Branch) -> Self {
        match NumericPredicate::parse(&branch.label) {
            Some(predicate) => BranchCondition::Numeric(predicate),
            None => BranchCondition::Label(branch.label.clone()),
        }
    }

    fn strength(&self, reply: &Reply) -> Option<MatchStrength> {
        match self {
            BranchCondition::Numeric(predicate) => reply
                .number()
                .filter(|value| predicate.holds(*value))
                .map(|_| MatchStrength::Numeric),
            BranchCondition::Label(label) => match synonyms(label) {
                Some(words) if reply.affirms_any(words.iter().copied()) => {
                    Some(MatchStrength::Synonym)
                }
                Some(_) => reply
                    .affirms_any(implied(label).iter().copied())
                    .then_some(MatchStrength::Implied),
                None => reply.longest_affirmed([label.as_str()]).map(MatchStrength::Phrase),
            },
        }
    }
}

/// Strongest evidence in the reply for this branch, by condition or keyword.
pub fn branch_strength(branch: &Branch, reply: &Reply) -> Option<MatchStrength> {
    let by_condition = BranchCondition::for_branch(branch).strength(reply);
    let by_keyword = reply
        .longest_affirmed(branch.keywords.iter().map(String::as_str))
        .map(MatchStrength::Phrase);
    by_condition.max(by_keyword)
}

/// Returns true if the reply selects this branch by condition or keyword.
pub fn branch_matches(branch: &Branch, reply: &Reply) -> bool {
    branch_strength(branch, reply).is_some()
}

/// The first of the step's links whose keyword occurs in the reply.
///
/// Link keywords are requests ("how do i drain"), so negation around them
/// is not considered.
pub fn requested_link<'a>(step: &'a Step, text: &str) -> Option<&'a WorkflowLink> {
    let words = tokens(text);
    step.links.iter().find(|link| {
        link.keywords
            .iter()
            .any(|keyword| contains_phrase(&words, &tokens(keyword)))
    })
}
