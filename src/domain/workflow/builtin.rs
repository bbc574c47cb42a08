//! Workflows shipped with the binary and seeded into an empty store.

use super::{Workflow, WorkflowDefinition, WorkflowError};

const BUILTIN_SOURCES: &[(&str, &str)] = &[
    (
        "lukewarm_water.yaml",
        include_str!("../../../workflows/lukewarm_water.yaml"),
    ),
    (
        "no_hot_water.yaml",
        include_str!("../../../workflows/no_hot_water.yaml"),
    ),
    (
        "drain_water_heater.yaml",
        include_str!("../../../workflows/drain_water_heater.yaml"),
    ),
];

/// Parses a single YAML workflow definition.
pub fn parse_workflow_yaml(source_name: &str, yaml: &str) -> Result<Workflow, WorkflowError> {
    let definition: WorkflowDefinition =
        serde_yaml::from_str(yaml).map_err(|e| WorkflowError::Parse {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })?;
    Workflow::from_definition(definition)
}

/// Returns the built-in workflow library in seed order.
pub fn builtin_workflows() -> Result<Vec<Workflow>, WorkflowError> {
    BUILTIN_SOURCES
        .iter()
        .map(|(name, yaml)| parse_workflow_yaml(name, yaml))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::StepId;
    use crate::domain::workflow::{BranchTarget, StepKind, WorkflowCatalogue};

    #[test]
    fn all_builtin_workflows_parse_and_validate() {
        let workflows = builtin_workflows().unwrap();
        let ids: Vec<&str> = workflows.iter().map(|w| w.id().as_str()).collect();
        assert_eq!(ids, vec!["lukewarm_water", "no_hot_water", "drain_water_heater"]);
        assert!(WorkflowCatalogue::new(workflows).is_ok());
    }

    #[test]
    fn lukewarm_water_starts_at_numeric_thermostat_question() {
        let workflows = builtin_workflows().unwrap();
        let lukewarm = &workflows[0];
        let root = lukewarm.root();

        assert_eq!(root.id, StepId::new("check_thermostat").unwrap());
        assert_eq!(root.kind, StepKind::Question);
        assert_eq!(root.labels(), vec!["temperature < 115", "temperature >= 115"]);
        assert!(root.warning.is_some());
    }

    #[test]
    fn every_builtin_workflow_reaches_a_terminal_step() {
        for workflow in builtin_workflows().unwrap() {
            let has_terminal = workflow.steps().iter().any(|s| s.is_terminal())
                || workflow.steps().iter().any(|s| {
                    s.branches
                        .iter()
                        .any(|b| matches!(b.target, BranchTarget::Outcome(_)))
                });
            assert!(has_terminal, "{} has no way to finish", workflow.id());
        }
    }

    #[test]
    fn malformed_yaml_reports_source_name() {
        let err = parse_workflow_yaml("broken.yaml", "id: [not, a, slug").unwrap_err();
        match err {
            WorkflowError::Parse { source_name, .. } => assert_eq!(source_name, "broken.yaml"),
            other => panic!("expected Parse, got {:?}", other),
        }
    }
}
