pub mod catalog;
pub mod consumption;
pub mod engine;
pub mod errors;
pub mod selector;
pub mod types;

pub use catalog::WorkflowCatalog;
pub use consumption::{ConsumptionFlow, ConsumptionPhase, ConsumptionSignal};
pub use engine::{EngineEvent, EnginePhase, ProcessEngine, WorkflowOutcome};
pub use errors::WorkflowError;
pub use selector::{ProcessSelector, StationDescriptor, STATIONS};
pub use types::{
    parse_barcode, ExpectedInput, OperatorInput, ProcessStepDefinition, StepKind, TestVerdict,
    ValidationRules, WorkflowState,
};
