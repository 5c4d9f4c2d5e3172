// Workflow Catalog: station id -> ordered step sequence. Pure read-only
// configuration, built once at startup.

use std::collections::HashMap;

use crate::backend::AssemblyUnitStatus;
use crate::workflow::types::{ProcessStepDefinition, StepKind, ValidationRules};

#[derive(Debug, Clone)]
pub struct WorkflowCatalog {
    workflows: HashMap<String, Vec<ProcessStepDefinition>>,
}

impl WorkflowCatalog {
    /// The three built-in station workflows: assembly, testing, packing.
    pub fn builtin() -> Self {
        let mut workflows = HashMap::new();

        workflows.insert(
            "station-assembly".to_string(),
            vec![
                step(
                    1,
                    StepKind::ScanAssemblyUnit,
                    "Scan Assembly Unit",
                    "Scan the AU barcode to start assembly process",
                    ValidationRules {
                        status_check: Some(vec![AssemblyUnitStatus::Created]),
                        bom_validation: false,
                    },
                ),
                step(
                    2,
                    StepKind::ScanRawMaterial,
                    "Scan Raw Materials",
                    "Scan and validate all raw materials according to BOM",
                    ValidationRules {
                        status_check: Some(vec![AssemblyUnitStatus::Created]),
                        bom_validation: true,
                    },
                ),
                step(
                    3,
                    StepKind::Assembled,
                    "Mark as Assembled",
                    "Complete assembly process",
                    ValidationRules::default(),
                ),
            ],
        );

        workflows.insert(
            "station-testing".to_string(),
            vec![
                step(
                    1,
                    StepKind::ScanAssemblyUnit,
                    "Scan Assembly Unit",
                    "Scan the AU barcode for testing",
                    ValidationRules {
                        status_check: Some(vec![AssemblyUnitStatus::Assembled]),
                        bom_validation: false,
                    },
                ),
                step(
                    2,
                    StepKind::FinalTest,
                    "Final Test",
                    "Perform final testing and record results",
                    ValidationRules::default(),
                ),
            ],
        );

        workflows.insert(
            "station-packing".to_string(),
            vec![
                step(
                    1,
                    StepKind::ScanAssemblyUnit,
                    "Scan Assembly Unit",
                    "Scan the AU barcode for packing",
                    ValidationRules {
                        status_check: Some(vec![
                            AssemblyUnitStatus::Tested,
                            AssemblyUnitStatus::Passed,
                        ]),
                        bom_validation: false,
                    },
                ),
                step(
                    2,
                    StepKind::Pack,
                    "Pack Product",
                    "Pack the product and close AU",
                    ValidationRules::default(),
                ),
            ],
        );

        Self { workflows }
    }

    /// Ordered step sequence for a station. Unknown stations yield an
    /// empty slice, which the engine treats as "nothing to execute".
    pub fn lookup(&self, station_id: &str) -> &[ProcessStepDefinition] {
        self.workflows
            .get(station_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn station_ids(&self) -> impl Iterator<Item = &str> {
        self.workflows.keys().map(String::as_str)
    }
}

fn step(
    number: u32,
    kind: StepKind,
    name: &str,
    description: &str,
    validation_rules: ValidationRules,
) -> ProcessStepDefinition {
    ProcessStepDefinition {
        id: format!("step-{number}"),
        step_number: number,
        kind,
        name: name.to_string(),
        description: Some(description.to_string()),
        is_required: true,
        validation_rules,
    }
}
