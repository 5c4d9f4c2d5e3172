pub mod api;
pub mod errors;
pub mod http;
pub mod memory;
pub mod types;

pub use api::ShopFloorBackend;
pub use errors::BackendError;
pub use http::HttpBackend;
pub use memory::{BackendCall, InMemoryBackend};
pub use types::{
    AssemblyUnit, AssemblyUnitStatus, InspectionRequest, ProcessStepRequest, RawMaterial,
    RawMaterialStatus, Station, WorkOrder, WorkOrderStatus,
};
