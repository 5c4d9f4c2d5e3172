use thiserror::Error;

use crate::backend::{AssemblyUnitStatus, BackendError};
use crate::workflow::types::ExpectedInput;

/// Step-level failure taxonomy. Local validation and precondition errors
/// never reach the backend; backend failures pass through with their own
/// detail text. None of these end the run; the operator retries or
/// cancels.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("invalid barcode format {barcode:?}, expected Code:SerialNumber")]
    InvalidBarcode { barcode: String },

    #[error("invalid assembly unit status: expected one of {expected:?}, got {actual}")]
    StatusCheckFailed {
        expected: Vec<AssemblyUnitStatus>,
        actual: AssemblyUnitStatus,
    },

    #[error("raw material {serial_number} is already consumed")]
    AlreadyConsumed { serial_number: String },

    #[error("no assembly unit scanned yet")]
    NoAssemblyUnit,

    #[error("no raw material scanned yet")]
    NoMaterialScanned,

    #[error("step \"{step}\" expects {expected:?} input")]
    UnexpectedInput { step: String, expected: ExpectedInput },

    #[error("workflow is not running")]
    NotRunning,

    #[error(transparent)]
    Backend(#[from] BackendError),
}
