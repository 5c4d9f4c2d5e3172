// In-memory backend: a seedable stand-in for the real system-of-record.
// Used by the test suite and by `shopfloor run --demo`. Every gateway call
// is recorded so tests can assert exact call sequences, and individual
// operations can be primed to fail once.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::backend::api::ShopFloorBackend;
use crate::backend::errors::BackendError;
use crate::backend::types::{
    AssemblyUnit, AssemblyUnitStatus, InspectionRequest, ProcessStepRequest, RawMaterial,
    RawMaterialStatus, Station, WorkOrder, WorkOrderStatus,
};

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    AssemblyUnitBySerial {
        product_code: String,
        serial_number: String,
    },
    AssemblyUnitById {
        id: String,
    },
    ChangeStatus {
        id: String,
        status: AssemblyUnitStatus,
    },
    ConsumeRawMaterial {
        assembly_unit_id: String,
        material_code: String,
        serial_number: String,
    },
    RawMaterialBySerial {
        material_code: String,
        serial_number: String,
    },
    AddInspection {
        raw_material_id: String,
        result: String,
    },
    AddProcessStep {
        serial_number: String,
        station_id: String,
    },
    ListStations,
    ListWorkOrders,
}

#[derive(Debug, Default)]
struct State {
    units: Vec<AssemblyUnit>,
    stations: Vec<Station>,
    work_orders: Vec<WorkOrder>,
    inspections: Vec<(String, InspectionRequest)>,
    process_steps: Vec<(String, ProcessStepRequest)>,
    calls: Vec<BackendCall>,
    failures: HashMap<&'static str, String>,
}

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Demo dataset for `shopfloor run --demo`: one assembly-ready unit
    /// with a two-line BOM, one assembled unit ready for testing, and the
    /// closing station the consumption sub-flow reports to.
    pub fn seeded_demo() -> Self {
        let backend = Self::new();
        backend.add_station(Station {
            id: "st-1".to_string(),
            name: "MainAssembly1".to_string(),
            location: Some("Line 1".to_string()),
            station_type: "Assembly".to_string(),
        });
        backend.add_work_order(WorkOrder {
            id: "wo-1".to_string(),
            work_order_no: "WO-1001".to_string(),
            product_code: "PC-1".to_string(),
            product_name: "Controller Unit".to_string(),
            quantity: 10,
            status: WorkOrderStatus::Released,
        });
        backend.add_assembly_unit(AssemblyUnit {
            id: "au-1".to_string(),
            serial_number: "SN-1".to_string(),
            product_code: "PC-1".to_string(),
            work_order_id: Some("wo-1".to_string()),
            status: AssemblyUnitStatus::Created,
            raw_materials: vec![
                received_material("rm-1", "RM-1", "RMS-1"),
                received_material("rm-2", "RM-2", "RMS-2"),
            ],
        });
        backend.add_assembly_unit(AssemblyUnit {
            id: "au-2".to_string(),
            serial_number: "SN-2".to_string(),
            product_code: "PC-1".to_string(),
            work_order_id: Some("wo-1".to_string()),
            status: AssemblyUnitStatus::Assembled,
            raw_materials: vec![],
        });
        backend
    }

    pub fn add_assembly_unit(&self, unit: AssemblyUnit) {
        self.lock().units.push(unit);
    }

    pub fn add_station(&self, station: Station) {
        self.lock().stations.push(station);
    }

    pub fn add_work_order(&self, work_order: WorkOrder) {
        self.lock().work_orders.push(work_order);
    }

    /// Primes `operation` (trait method name) to fail once with a
    /// Rejected error carrying `reason`.
    pub fn fail_next(&self, operation: &'static str, reason: &str) {
        self.lock().failures.insert(operation, reason.to_string());
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    pub fn inspections(&self) -> Vec<(String, InspectionRequest)> {
        self.lock().inspections.clone()
    }

    pub fn process_steps(&self) -> Vec<(String, ProcessStepRequest)> {
        self.lock().process_steps.clone()
    }

    pub fn unit_status(&self, id: &str) -> Option<AssemblyUnitStatus> {
        self.lock().units.iter().find(|u| u.id == id).map(|u| u.status)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take_failure(
        state: &mut State,
        operation: &'static str,
    ) -> Result<(), BackendError> {
        match state.failures.remove(operation) {
            Some(reason) => Err(BackendError::Rejected { reason }),
            None => Ok(()),
        }
    }
}

fn received_material(id: &str, code: &str, serial_number: &str) -> RawMaterial {
    RawMaterial {
        id: id.to_string(),
        code: code.to_string(),
        serial_number: serial_number.to_string(),
        lot_number: None,
        status: RawMaterialStatus::Received,
    }
}

#[async_trait]
impl ShopFloorBackend for InMemoryBackend {
    async fn assembly_unit_by_serial(
        &self,
        product_code: &str,
        serial_number: &str,
    ) -> Result<AssemblyUnit, BackendError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::AssemblyUnitBySerial {
            product_code: product_code.to_string(),
            serial_number: serial_number.to_string(),
        });
        Self::take_failure(&mut state, "assembly_unit_by_serial")?;
        state
            .units
            .iter()
            .find(|u| u.product_code == product_code && u.serial_number == serial_number)
            .cloned()
            .ok_or_else(|| {
                BackendError::not_found("assembly unit", format!("{product_code}:{serial_number}"))
            })
    }

    async fn assembly_unit_by_id(&self, id: &str) -> Result<AssemblyUnit, BackendError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::AssemblyUnitById { id: id.to_string() });
        Self::take_failure(&mut state, "assembly_unit_by_id")?;
        state
            .units
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| BackendError::not_found("assembly unit", id))
    }

    async fn change_assembly_unit_status(
        &self,
        id: &str,
        status: AssemblyUnitStatus,
    ) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::ChangeStatus {
            id: id.to_string(),
            status,
        });
        Self::take_failure(&mut state, "change_assembly_unit_status")?;
        let unit = state
            .units
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| BackendError::not_found("assembly unit", id))?;
        unit.status = status;
        Ok(())
    }

    async fn consume_raw_material(
        &self,
        assembly_unit_id: &str,
        material_code: &str,
        serial_number: &str,
    ) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::ConsumeRawMaterial {
            assembly_unit_id: assembly_unit_id.to_string(),
            material_code: material_code.to_string(),
            serial_number: serial_number.to_string(),
        });
        Self::take_failure(&mut state, "consume_raw_material")?;
        let unit = state
            .units
            .iter_mut()
            .find(|u| u.id == assembly_unit_id)
            .ok_or_else(|| BackendError::not_found("assembly unit", assembly_unit_id))?;
        let material = unit
            .raw_materials
            .iter_mut()
            .find(|m| m.code == material_code && m.serial_number == serial_number)
            .ok_or_else(|| {
                BackendError::not_found("raw material", format!("{material_code}:{serial_number}"))
            })?;
        if material.status == RawMaterialStatus::Consumed {
            return Err(BackendError::rejected(format!(
                "raw material {serial_number} already consumed"
            )));
        }
        material.status = RawMaterialStatus::Consumed;
        // Backend business rule: a fully consumed BOM marks the unit Assembled.
        if unit
            .raw_materials
            .iter()
            .all(|m| m.status != RawMaterialStatus::Received)
        {
            unit.status = AssemblyUnitStatus::Assembled;
        }
        Ok(())
    }

    async fn raw_material_by_serial(
        &self,
        material_code: &str,
        serial_number: &str,
    ) -> Result<RawMaterial, BackendError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::RawMaterialBySerial {
            material_code: material_code.to_string(),
            serial_number: serial_number.to_string(),
        });
        Self::take_failure(&mut state, "raw_material_by_serial")?;
        state
            .units
            .iter()
            .flat_map(|u| u.raw_materials.iter())
            .find(|m| m.code == material_code && m.serial_number == serial_number)
            .cloned()
            .ok_or_else(|| {
                BackendError::not_found("raw material", format!("{material_code}:{serial_number}"))
            })
    }

    async fn add_inspection(
        &self,
        raw_material_id: &str,
        inspection: &InspectionRequest,
    ) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::AddInspection {
            raw_material_id: raw_material_id.to_string(),
            result: inspection.result.clone(),
        });
        Self::take_failure(&mut state, "add_inspection")?;
        state
            .inspections
            .push((raw_material_id.to_string(), inspection.clone()));
        Ok(())
    }

    async fn add_process_step(
        &self,
        serial_number: &str,
        step: &ProcessStepRequest,
    ) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::AddProcessStep {
            serial_number: serial_number.to_string(),
            station_id: step.station_id.clone(),
        });
        Self::take_failure(&mut state, "add_process_step")?;
        state
            .process_steps
            .push((serial_number.to_string(), step.clone()));
        Ok(())
    }

    async fn list_stations(&self) -> Result<Vec<Station>, BackendError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::ListStations);
        Self::take_failure(&mut state, "list_stations")?;
        Ok(state.stations.clone())
    }

    async fn list_work_orders(&self) -> Result<Vec<WorkOrder>, BackendError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::ListWorkOrders);
        Self::take_failure(&mut state, "list_work_orders")?;
        Ok(state.work_orders.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn consuming_last_material_marks_unit_assembled() {
        let backend = InMemoryBackend::seeded_demo();
        backend
            .consume_raw_material("au-1", "RM-1", "RMS-1")
            .await
            .unwrap();
        assert_eq!(backend.unit_status("au-1"), Some(AssemblyUnitStatus::Created));

        backend
            .consume_raw_material("au-1", "RM-2", "RMS-2")
            .await
            .unwrap();
        assert_eq!(
            backend.unit_status("au-1"),
            Some(AssemblyUnitStatus::Assembled)
        );
    }

    #[tokio::test]
    async fn double_consume_is_rejected() {
        let backend = InMemoryBackend::seeded_demo();
        backend
            .consume_raw_material("au-1", "RM-1", "RMS-1")
            .await
            .unwrap();
        let err = backend
            .consume_raw_material("au-1", "RM-1", "RMS-1")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Rejected { .. }));
    }

    #[tokio::test]
    async fn primed_failure_fires_once() {
        let backend = InMemoryBackend::seeded_demo();
        backend.fail_next("list_stations", "backend offline");
        assert!(backend.list_stations().await.is_err());
        assert!(backend.list_stations().await.is_ok());
    }
}
