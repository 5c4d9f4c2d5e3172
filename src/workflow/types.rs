// Step definitions and per-run workflow state.

use serde::{Deserialize, Serialize};

use crate::backend::AssemblyUnitStatus;
use crate::workflow::errors::WorkflowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKind {
    ScanAssemblyUnit,
    ScanRawMaterial,
    Test,
    FinalTest,
    Pack,
    Assembled,
}

impl StepKind {
    /// The one input class this step kind accepts from the operator.
    pub fn expected_input(&self) -> ExpectedInput {
        match self {
            StepKind::ScanAssemblyUnit | StepKind::ScanRawMaterial => ExpectedInput::Barcode,
            StepKind::Test | StepKind::FinalTest => ExpectedInput::TestResult,
            StepKind::Pack | StepKind::Assembled => ExpectedInput::Confirmation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedInput {
    Barcode,
    TestResult,
    Confirmation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRules {
    /// Acceptable assembly-unit statuses before this step may run. This is
    /// an advisory pre-check; the backend still enforces transition
    /// legality on its side.
    pub status_check: Option<Vec<AssemblyUnitStatus>>,
    /// Whether raw-material completeness must be verified by this step.
    pub bom_validation: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessStepDefinition {
    pub id: String,
    /// 1-based ordinal, matches list position.
    pub step_number: u32,
    pub kind: StepKind,
    pub name: String,
    pub description: Option<String>,
    /// Reserved for optional-step support; the engine currently treats
    /// every step as required.
    pub is_required: bool,
    pub validation_rules: ValidationRules,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestVerdict {
    Pass,
    Fail,
}

/// Operator actions fed into the engine. One tagged union instead of the
/// prototype's pile of per-screen booleans.
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorInput {
    Scan(String),
    Accept,
    Reject,
    Test(TestVerdict),
    Confirm,
    Cancel,
}

/// Mutable state owned by a single running engine instance.
#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    /// 0-based; `0 <= current_step_index <= steps.len()`
    pub current_step_index: usize,
    /// Append-only, no duplicates, at most one entry per step.
    pub completed_steps: Vec<usize>,
    /// Error history for the current step attempt; cleared on advancement.
    pub errors: Vec<String>,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.errors.last().map(String::as_str)
    }
}

/// Splits an operator barcode of form `Code:SerialNumber`. Both parts must
/// be non-empty; anything else is a local validation error and never
/// reaches the backend.
pub fn parse_barcode(raw: &str) -> Result<(String, String), WorkflowError> {
    let invalid = || WorkflowError::InvalidBarcode {
        barcode: raw.to_string(),
    };
    let (code, serial) = raw.split_once(':').ok_or_else(invalid)?;
    if code.is_empty() || serial.is_empty() {
        return Err(invalid());
    }
    Ok((code.to_string(), serial.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn barcode_splits_on_colon() {
        assert_eq!(
            parse_barcode("PC-1:SN-1").unwrap(),
            ("PC-1".to_string(), "SN-1".to_string())
        );
    }

    #[test]
    fn barcode_without_delimiter_is_rejected() {
        assert!(matches!(
            parse_barcode("PC-1-SN-1"),
            Err(WorkflowError::InvalidBarcode { .. })
        ));
    }

    #[test]
    fn barcode_with_empty_part_is_rejected() {
        assert!(parse_barcode("AU-1:").is_err());
        assert!(parse_barcode(":SN-1").is_err());
        assert!(parse_barcode(":").is_err());
        assert!(parse_barcode("").is_err());
    }

    #[test]
    fn extra_colons_stay_in_the_serial_part() {
        // Serial numbers with embedded colons split on the first delimiter.
        let (code, serial) = parse_barcode("RM-1:A:B").unwrap();
        assert_eq!(code, "RM-1");
        assert_eq!(serial, "A:B");
    }

    #[test]
    fn every_step_kind_maps_to_one_input() {
        assert_eq!(
            StepKind::ScanAssemblyUnit.expected_input(),
            ExpectedInput::Barcode
        );
        assert_eq!(
            StepKind::ScanRawMaterial.expected_input(),
            ExpectedInput::Barcode
        );
        assert_eq!(StepKind::Test.expected_input(), ExpectedInput::TestResult);
        assert_eq!(
            StepKind::FinalTest.expected_input(),
            ExpectedInput::TestResult
        );
        assert_eq!(StepKind::Pack.expected_input(), ExpectedInput::Confirmation);
        assert_eq!(
            StepKind::Assembled.expected_input(),
            ExpectedInput::Confirmation
        );
    }
}
