// The gateway contract. Everything the workflow engine knows about the
// system-of-record goes through this trait, so tests can swap in the
// in-memory implementation and assert exact call sequences.

use async_trait::async_trait;

use crate::backend::errors::BackendError;
use crate::backend::types::{
    AssemblyUnit, AssemblyUnitStatus, InspectionRequest, ProcessStepRequest, RawMaterial, Station,
    WorkOrder,
};

#[async_trait]
pub trait ShopFloorBackend: Send + Sync {
    async fn assembly_unit_by_serial(
        &self,
        product_code: &str,
        serial_number: &str,
    ) -> Result<AssemblyUnit, BackendError>;

    async fn assembly_unit_by_id(&self, id: &str) -> Result<AssemblyUnit, BackendError>;

    /// Request a status transition. The backend owns transition legality;
    /// the engine's status pre-checks are advisory only.
    async fn change_assembly_unit_status(
        &self,
        id: &str,
        status: AssemblyUnitStatus,
    ) -> Result<(), BackendError>;

    async fn consume_raw_material(
        &self,
        assembly_unit_id: &str,
        material_code: &str,
        serial_number: &str,
    ) -> Result<(), BackendError>;

    async fn raw_material_by_serial(
        &self,
        material_code: &str,
        serial_number: &str,
    ) -> Result<RawMaterial, BackendError>;

    async fn add_inspection(
        &self,
        raw_material_id: &str,
        inspection: &InspectionRequest,
    ) -> Result<(), BackendError>;

    /// Records a process step against the unit identified by serial number.
    /// Used to close out a station run after full BOM consumption.
    async fn add_process_step(
        &self,
        serial_number: &str,
        step: &ProcessStepRequest,
    ) -> Result<(), BackendError>;

    async fn list_stations(&self) -> Result<Vec<Station>, BackendError>;

    async fn list_work_orders(&self) -> Result<Vec<WorkOrder>, BackendError>;
}
