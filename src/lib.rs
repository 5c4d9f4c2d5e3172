// Shopfloor - operator terminal for a manufacturing execution backend.
// This exposes the core components for testing and integration.

pub mod backend;
pub mod config;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use backend::{
    AssemblyUnit, AssemblyUnitStatus, BackendCall, BackendError, HttpBackend, InMemoryBackend,
    RawMaterial, RawMaterialStatus, ShopFloorBackend, Station, WorkOrder, WorkOrderStatus,
};
pub use config::{config, init_config, ShopfloorConfig};
pub use telemetry::init_telemetry;
pub use workflow::{
    ConsumptionFlow, ConsumptionPhase, ConsumptionSignal, EngineEvent, EnginePhase, OperatorInput,
    ProcessEngine, ProcessSelector, ProcessStepDefinition, StepKind, TestVerdict, WorkflowCatalog,
    WorkflowError, WorkflowOutcome, WorkflowState,
};
