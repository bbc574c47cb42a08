//! Workflow definitions: rooted decision trees of diagnostic steps.
//!
//! A [`Workflow`] is immutable once built. Construction goes through
//! [`WorkflowDefinition`], the serialized shape stored in YAML seed files
//! and in the database, and validates the whole tree up front so the
//! session engine never meets a dangling branch at runtime.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{StepId, WorkflowId};

use super::WorkflowError;

/// What a step does in the dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Asks the user something; branches on the answer.
    Question,
    /// Tells the user to do something; usually a single "done" branch.
    Instruction,
    /// Terminal: the problem is fixed or explained.
    Resolution,
    /// Terminal: the user should call a professional or emergency service.
    Escalation,
}

impl StepKind {
    /// Returns the outcome reached by landing on a step of this kind.
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            StepKind::Resolution => Some(Outcome::Resolved),
            StepKind::Escalation => Some(Outcome::Escalated),
            StepKind::Question | StepKind::Instruction => None,
        }
    }

    /// Returns true for resolution and escalation steps.
    pub fn is_terminal(&self) -> bool {
        self.outcome().is_some()
    }
}

/// How a finished dialogue ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Resolved,
    Escalated,
}

/// Where a branch leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchTarget {
    /// Continue at another step of the same workflow.
    #[serde(rename = "next")]
    Step(StepId),
    /// End the dialogue without visiting another step.
    Outcome(Outcome),
}

/// One possible exit from a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    /// Condition label, e.g. `yes`, `gas` or `temperature >= 115`.
    pub label: String,

    /// Extra phrases that select this branch during rule-based interpretation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(flatten)]
    pub target: BranchTarget,
}

impl Branch {
    /// Creates a branch leading to another step.
    pub fn to_step(label: impl Into<String>, step: StepId) -> Self {
        Self {
            label: label.into(),
            keywords: Vec::new(),
            target: BranchTarget::Step(step),
        }
    }

    /// Creates a branch that ends the dialogue directly.
    pub fn to_outcome(label: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            label: label.into(),
            keywords: Vec::new(),
            target: BranchTarget::Outcome(outcome),
        }
    }

    /// Adds rule-matching keywords.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }
}

/// A helper workflow a step can hand over to, such as a draining guide
/// offered from a sediment question.
///
/// The helper runs inside the same session. When it ends, the dialogue
/// returns to the step that offered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowLink {
    pub workflow: WorkflowId,

    /// Phrases that open the helper, matched as contiguous words.
    pub keywords: Vec<String>,
}

impl WorkflowLink {
    pub fn new<I, S>(workflow: WorkflowId, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            workflow,
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }
}

/// One node of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub kind: StepKind,

    /// Text shown to the user when the step becomes current.
    pub prompt: String,

    /// Safety note, always shown together with the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    /// Background context used when re-asking and when consulting the oracle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,

    /// Ordered exits. Empty for terminal steps.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<Branch>,

    /// Helper workflows the user can open while this step is current.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<WorkflowLink>,
}

impl Step {
    /// Creates a step without branches.
    pub fn new(id: StepId, kind: StepKind, prompt: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            prompt: prompt.into(),
            warning: None,
            hint: None,
            branches: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Appends a branch.
    pub fn with_branch(mut self, branch: Branch) -> Self {
        self.branches.push(branch);
        self
    }

    /// Offers a helper workflow from this step.
    pub fn with_link(mut self, link: WorkflowLink) -> Self {
        self.links.push(link);
        self
    }

    /// Sets the safety warning.
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    /// Sets the clarifying hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// A step with no branches is terminal.
    pub fn is_terminal(&self) -> bool {
        self.branches.is_empty()
    }

    /// Finds a branch by its exact label.
    pub fn branch(&self, label: &str) -> Option<&Branch> {
        self.branches.iter().find(|b| b.label == label)
    }

    /// Returns the branch labels in order.
    pub fn labels(&self) -> Vec<&str> {
        self.branches.iter().map(|b| b.label.as_str()).collect()
    }
}

/// Serialized form of a workflow, as stored in seed files and the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: WorkflowId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub triggers: Vec<String>,
    pub root: StepId,
    pub steps: Vec<Step>,
}

/// A validated troubleshooting workflow.
///
/// # Invariants
///
/// - step ids are unique
/// - `root` and every branch target exist
/// - the root step is not terminal
/// - question/instruction steps have at least one branch, resolution and
///   escalation steps have none
/// - branch labels are unique within a step
/// - only question/instruction steps offer links, never to their own
///   workflow, and every link has a keyword
///
/// Whether link targets exist is checked by [`super::WorkflowCatalogue`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WorkflowDefinition", into = "WorkflowDefinition")]
pub struct Workflow {
    definition: WorkflowDefinition,
    index: HashMap<StepId, usize>,
}

impl Workflow {
    /// Validates a definition into a workflow.
    pub fn from_definition(definition: WorkflowDefinition) -> Result<Self, WorkflowError> {
        let id = definition.id.clone();

        if definition.title.trim().is_empty() {
            return Err(WorkflowError::invalid(&id, "title is empty"));
        }
        if definition.triggers.iter().all(|t| t.trim().is_empty()) {
            return Err(WorkflowError::invalid(&id, "no trigger phrases"));
        }

        let mut index = HashMap::with_capacity(definition.steps.len());
        for (position, step) in definition.steps.iter().enumerate() {
            if index.insert(step.id.clone(), position).is_some() {
                return Err(WorkflowError::DuplicateStep {
                    workflow_id: id,
                    step_id: step.id.clone(),
                });
            }
        }

        for step in &definition.steps {
            Self::validate_step(&id, step, &index)?;
        }

        match index.get(&definition.root) {
            None => {
                return Err(WorkflowError::UnknownStep {
                    workflow_id: id,
                    step_id: definition.root.clone(),
                })
            }
            Some(&position) if definition.steps[position].is_terminal() => {
                return Err(WorkflowError::invalid(&id, "root step is terminal"));
            }
            Some(_) => {}
        }

        Ok(Self { definition, index })
    }

    fn validate_step(
        id: &WorkflowId,
        step: &Step,
        index: &HashMap<StepId, usize>,
    ) -> Result<(), WorkflowError> {
        if step.prompt.trim().is_empty() {
            return Err(WorkflowError::invalid(
                id,
                format!("step '{}' has an empty prompt", step.id),
            ));
        }
        if step.kind.is_terminal() != step.branches.is_empty() {
            return Err(WorkflowError::invalid(
                id,
                format!(
                    "step '{}' of kind {:?} has {} branches",
                    step.id,
                    step.kind,
                    step.branches.len()
                ),
            ));
        }

        let mut labels = HashSet::new();
        for branch in &step.branches {
            if branch.label.trim().is_empty() {
                return Err(WorkflowError::invalid(
                    id,
                    format!("step '{}' has a branch without a label", step.id),
                ));
            }
            if !labels.insert(branch.label.as_str()) {
                return Err(WorkflowError::invalid(
                    id,
                    format!("step '{}' repeats branch label '{}'", step.id, branch.label),
                ));
            }
            if let BranchTarget::Step(target) = &branch.target {
                if !index.contains_key(target) {
                    return Err(WorkflowError::UnknownStep {
                        workflow_id: id.clone(),
                        step_id: target.clone(),
                    });
                }
            }
        }

        for link in &step.links {
            if step.kind.is_terminal() {
                return Err(WorkflowError::invalid(
                    id,
                    format!("terminal step '{}' offers a link", step.id),
                ));
            }
            if &link.workflow == id {
                return Err(WorkflowError::invalid(
                    id,
                    format!("step '{}' links to its own workflow", step.id),
                ));
            }
            if link.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(WorkflowError::invalid(
                    id,
                    format!("link from step '{}' has no keywords", step.id),
                ));
            }
        }
        Ok(())
    }

    /// Helper workflows referenced from any step, with the linking step.
    pub fn links(&self) -> impl Iterator<Item = (&Step, &WorkflowLink)> {
        self.definition
            .steps
            .iter()
            .flat_map(|step| step.links.iter().map(move |link| (step, link)))
    }

    pub fn id(&self) -> &WorkflowId {
        &self.definition.id
    }

    pub fn title(&self) -> &str {
        &self.definition.title
    }

    pub fn summary(&self) -> Option<&str> {
        self.definition.summary.as_deref()
    }

    /// Trigger phrases used by the intent matcher.
    pub fn triggers(&self) -> &[String] {
        &self.definition.triggers
    }

    pub fn root_id(&self) -> &StepId {
        &self.definition.root
    }

    /// Returns the root step. Always present for a validated workflow.
    pub fn root(&self) -> &Step {
        &self.definition.steps[self.index[&self.definition.root]]
    }

    /// Looks up a step by id.
    pub fn step(&self, id: &StepId) -> Option<&Step> {
        self.index.get(id).map(|&position| &self.definition.steps[position])
    }

    /// All steps in definition order.
    pub fn steps(&self) -> &[Step] {
        &self.definition.steps
    }

    pub fn step_count(&self) -> usize {
        self.definition.steps.len()
    }

    /// Returns the serializable definition.
    pub fn definition(&self) -> &WorkflowDefinition {
        &self.definition
    }
}

impl TryFrom<WorkflowDefinition> for Workflow {
    type Error = WorkflowError;

    fn try_from(definition: WorkflowDefinition) -> Result<Self, Self::Error> {
        Self::from_definition(definition)
    }
}

impl From<Workflow> for WorkflowDefinition {
    fn from(workflow: Workflow) -> Self {
        workflow.definition
    }
}
