// Raw-material consumption sub-flow: the scan/accept/reject loop that
// consumes BOM line items against one assembly unit, one scan at a time.

use tracing::{info, warn};

use crate::backend::{
    AssemblyUnit, InspectionRequest, ProcessStepRequest, RawMaterialStatus, ShopFloorBackend,
};
use crate::config::ProcessConfig;
use crate::workflow::errors::WorkflowError;
use crate::workflow::types::parse_barcode;

/// Sub-flow phase as a tagged union so "scanned but also awaiting" is
/// unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumptionPhase {
    AwaitingScan,
    MaterialScanned {
        material_code: String,
        serial_number: String,
    },
    Done,
}

/// What a sub-flow operation reports back to the parent step. The parent
/// engine advances its outer step only on `AllConsumed`, which fires at
/// most once per sub-flow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumptionSignal {
    Scanned,
    Accepted,
    AllConsumed,
    Rejected,
}

#[derive(Debug)]
pub struct ConsumptionFlow {
    phase: ConsumptionPhase,
}

impl Default for ConsumptionFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsumptionFlow {
    pub fn new() -> Self {
        Self {
            phase: ConsumptionPhase::AwaitingScan,
        }
    }

    pub fn phase(&self) -> &ConsumptionPhase {
        &self.phase
    }

    /// AwaitingScan -> MaterialScanned. No backend lookup happens here;
    /// accept/reject validate against the backend themselves. A serial the
    /// unit snapshot already shows as Consumed is refused without any
    /// backend call.
    pub fn scan(
        &mut self,
        unit: &AssemblyUnit,
        barcode: &str,
    ) -> Result<ConsumptionSignal, WorkflowError> {
        let (material_code, serial_number) = parse_barcode(barcode)?;

        let already_consumed = unit.raw_materials.iter().any(|m| {
            m.code == material_code
                && m.serial_number == serial_number
                && m.status == RawMaterialStatus::Consumed
        });
        if already_consumed {
            return Err(WorkflowError::AlreadyConsumed { serial_number });
        }

        self.phase = ConsumptionPhase::MaterialScanned {
            material_code,
            serial_number,
        };
        Ok(ConsumptionSignal::Scanned)
    }

    /// Accept the scanned material: resolve it, record a passing visual
    /// inspection, consume it, then re-fetch the unit to decide whether the
    /// BOM is complete. Any failure resets to AwaitingScan with the scan
    /// field cleared; the operator re-scans.
    pub async fn accept<B: ShopFloorBackend>(
        &mut self,
        backend: &B,
        unit: &mut AssemblyUnit,
        settings: &ProcessConfig,
    ) -> Result<ConsumptionSignal, WorkflowError> {
        let (material_code, serial_number) = self.scanned_material()?;
        match self
            .accept_inner(backend, unit, settings, &material_code, &serial_number)
            .await
        {
            Ok(signal) => Ok(signal),
            Err(e) => {
                self.phase = ConsumptionPhase::AwaitingScan;
                Err(e)
            }
        }
    }

    async fn accept_inner<B: ShopFloorBackend>(
        &mut self,
        backend: &B,
        unit: &mut AssemblyUnit,
        settings: &ProcessConfig,
        material_code: &str,
        serial_number: &str,
    ) -> Result<ConsumptionSignal, WorkflowError> {
        let material = backend
            .raw_material_by_serial(material_code, serial_number)
            .await?;
        backend
            .add_inspection(&material.id, &visual_inspection(settings, "Pass"))
            .await?;
        backend
            .consume_raw_material(&unit.id, material_code, serial_number)
            .await?;

        // Reconcile the local snapshot with the backend before deciding
        // whether the BOM is complete.
        *unit = backend.assembly_unit_by_id(&unit.id).await?;
        self.phase = ConsumptionPhase::AwaitingScan;

        let remaining = unit.received_materials().count();
        info!(
            serial_number,
            material_code, remaining, "raw material consumed"
        );

        if remaining > 0 {
            return Ok(ConsumptionSignal::Accepted);
        }

        self.close_out_station(backend, unit, settings).await;
        self.phase = ConsumptionPhase::Done;
        Ok(ConsumptionSignal::AllConsumed)
    }

    /// Reject the scanned material: record a failing inspection and return
    /// to AwaitingScan. The material is not consumed and stays pending
    /// until resolved out of band.
    pub async fn reject<B: ShopFloorBackend>(
        &mut self,
        backend: &B,
        settings: &ProcessConfig,
    ) -> Result<ConsumptionSignal, WorkflowError> {
        let (material_code, serial_number) = self.scanned_material()?;
        self.phase = ConsumptionPhase::AwaitingScan;

        let material = backend
            .raw_material_by_serial(&material_code, &serial_number)
            .await?;
        backend
            .add_inspection(&material.id, &visual_inspection(settings, "Fail"))
            .await?;

        info!(serial_number, material_code, "raw material rejected");
        Ok(ConsumptionSignal::Rejected)
    }

    fn scanned_material(&self) -> Result<(String, String), WorkflowError> {
        match &self.phase {
            ConsumptionPhase::MaterialScanned {
                material_code,
                serial_number,
            } => Ok((material_code.clone(), serial_number.clone())),
            _ => Err(WorkflowError::NoMaterialScanned),
        }
    }

    /// Records the closing process step against the configured station.
    /// Failures here are logged and do not block BOM completion; the run
    /// is already physically done.
    async fn close_out_station<B: ShopFloorBackend>(
        &self,
        backend: &B,
        unit: &AssemblyUnit,
        settings: &ProcessConfig,
    ) {
        let stations = match backend.list_stations().await {
            Ok(stations) => stations,
            Err(e) => {
                warn!(error = %e, "could not list stations for closing process step");
                return;
            }
        };
        let Some(station) = stations.iter().find(|s| s.name == settings.closing_station) else {
            warn!(
                closing_station = %settings.closing_station,
                "closing station not found, skipping process step"
            );
            return;
        };

        let step = ProcessStepRequest {
            name: settings.closing_step_name.clone(),
            station_id: station.id.clone(),
            is_on_process: false,
        };
        if let Err(e) = backend.add_process_step(&unit.serial_number, &step).await {
            warn!(error = %e, serial_number = %unit.serial_number, "failed to record closing process step");
        }
    }
}

fn visual_inspection(settings: &ProcessConfig, result: &str) -> InspectionRequest {
    InspectionRequest {
        test_type: settings.visual_test_type.clone(),
        result: result.to_string(),
        measured_value: "N/A".to_string(),
        inspector: settings.inspector.clone(),
    }
}


#[cfg(test)]
impl ProcessConfig {
    pub fn test_defaults() -> Self {
        crate::config::ShopfloorConfig::default().process
    }
}
