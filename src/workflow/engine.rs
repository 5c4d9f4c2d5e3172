// Process step workflow engine: drives an operator through one station's
// ordered step sequence, validating preconditions before every advance.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::backend::{AssemblyUnit, AssemblyUnitStatus, ShopFloorBackend};
use crate::config::ProcessConfig;
use crate::workflow::consumption::{ConsumptionFlow, ConsumptionPhase, ConsumptionSignal};
use crate::workflow::errors::WorkflowError;
use crate::workflow::types::{
    OperatorInput, ProcessStepDefinition, StepKind, TestVerdict, WorkflowState,
};

/// Engine lifecycle phase. `Running` is re-entered step by step;
/// `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePhase {
    Running { step_index: usize },
    Completed { outcome: WorkflowOutcome },
    Cancelled,
}

/// How a run ended. A failed test is a valid terminal outcome, not an
/// error: it ends the run regardless of remaining steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowOutcome {
    Finished,
    TestFailed,
}

/// Successful response to one operator input.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Advanced { next_step: usize },
    MaterialScanned,
    MaterialAccepted,
    MaterialRejected,
    Completed { outcome: WorkflowOutcome },
    Cancelled,
}

pub struct ProcessEngine<B> {
    backend: Arc<B>,
    /// Correlates every log line of one station run.
    run_id: Uuid,
    started_at: DateTime<Utc>,
    station_id: String,
    work_order_id: String,
    steps: Vec<ProcessStepDefinition>,
    state: WorkflowState,
    phase: EnginePhase,
    assembly_unit: Option<AssemblyUnit>,
    consumption: ConsumptionFlow,
    settings: ProcessConfig,
}

impl<B: ShopFloorBackend> ProcessEngine<B> {
    /// A fresh engine for one station run. An empty step sequence reports
    /// completion immediately, since there is nothing to execute.
    pub fn new(
        backend: Arc<B>,
        station_id: impl Into<String>,
        work_order_id: impl Into<String>,
        steps: Vec<ProcessStepDefinition>,
        settings: ProcessConfig,
    ) -> Self {
        let station_id = station_id.into();
        let phase = if steps.is_empty() {
            info!(station_id = %station_id, "no steps configured, workflow complete");
            EnginePhase::Completed {
                outcome: WorkflowOutcome::Finished,
            }
        } else {
            EnginePhase::Running { step_index: 0 }
        };
        Self {
            backend,
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            station_id,
            work_order_id: work_order_id.into(),
            steps,
            state: WorkflowState::new(),
            phase,
            assembly_unit: None,
            consumption: ConsumptionFlow::new(),
            settings,
        }
    }

    pub fn phase(&self) -> &EnginePhase {
        &self.phase
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn steps(&self) -> &[ProcessStepDefinition] {
        &self.steps
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    pub fn work_order_id(&self) -> &str {
        &self.work_order_id
    }

    pub fn assembly_unit(&self) -> Option<&AssemblyUnit> {
        self.assembly_unit.as_ref()
    }

    pub fn current_step(&self) -> Option<&ProcessStepDefinition> {
        match self.phase {
            EnginePhase::Running { step_index } => self.steps.get(step_index),
            _ => None,
        }
    }

    pub fn consumption_phase(&self) -> &ConsumptionPhase {
        self.consumption.phase()
    }

    /// Feed one operator action into the engine. Failures are recorded in
    /// the workflow state and leave the engine at the same step; every
    /// retry is operator-initiated. `&mut self` serializes backend calls:
    /// no two calls for this run are ever in flight at once.
    pub async fn handle_input(
        &mut self,
        input: OperatorInput,
    ) -> Result<EngineEvent, WorkflowError> {
        let step_index = match self.phase {
            EnginePhase::Running { step_index } => step_index,
            _ => return Err(WorkflowError::NotRunning),
        };

        if input == OperatorInput::Cancel {
            self.transition(EnginePhase::Cancelled);
            return Ok(EngineEvent::Cancelled);
        }

        let step = self.steps[step_index].clone();
        let result = self.dispatch(&step, input).await;
        if let Err(e) = &result {
            self.state.errors.push(e.to_string());
        }
        result
    }

    async fn dispatch(
        &mut self,
        step: &ProcessStepDefinition,
        input: OperatorInput,
    ) -> Result<EngineEvent, WorkflowError> {
        match (step.kind, input) {
            (StepKind::ScanAssemblyUnit, OperatorInput::Scan(barcode)) => {
                self.scan_assembly_unit(step, &barcode).await
            }
            (StepKind::ScanRawMaterial, OperatorInput::Scan(barcode)) => {
                let unit = self.assembly_unit.as_ref().ok_or(WorkflowError::NoAssemblyUnit)?;
                self.consumption.scan(unit, &barcode)?;
                Ok(EngineEvent::MaterialScanned)
            }
            (StepKind::ScanRawMaterial, OperatorInput::Accept) => {
                let unit = self.assembly_unit.as_mut().ok_or(WorkflowError::NoAssemblyUnit)?;
                let signal = self
                    .consumption
                    .accept(self.backend.as_ref(), unit, &self.settings)
                    .await?;
                match signal {
                    ConsumptionSignal::AllConsumed => self.advance(),
                    _ => Ok(EngineEvent::MaterialAccepted),
                }
            }
            (StepKind::ScanRawMaterial, OperatorInput::Reject) => {
                self.consumption
                    .reject(self.backend.as_ref(), &self.settings)
                    .await?;
                Ok(EngineEvent::MaterialRejected)
            }
            (StepKind::Test | StepKind::FinalTest, OperatorInput::Test(verdict)) => {
                self.record_test(verdict).await
            }
            (StepKind::Pack, OperatorInput::Confirm) => {
                self.confirm_status(AssemblyUnitStatus::Pack).await
            }
            (StepKind::Assembled, OperatorInput::Confirm) => {
                self.confirm_status(AssemblyUnitStatus::Assembled).await
            }
            (_, _) => Err(WorkflowError::UnexpectedInput {
                step: step.name.clone(),
                expected: step.kind.expected_input(),
            }),
        }
    }

    /// Parse, fetch, pre-check, store, advance. The status pre-check is
    /// advisory: it gives fast local feedback and avoids doomed remote
    /// calls, but the backend still owns transition legality.
    async fn scan_assembly_unit(
        &mut self,
        step: &ProcessStepDefinition,
        barcode: &str,
    ) -> Result<EngineEvent, WorkflowError> {
        let (product_code, serial_number) = crate::workflow::types::parse_barcode(barcode)?;
        let unit = self
            .backend
            .assembly_unit_by_serial(&product_code, &serial_number)
            .await?;

        if let Some(expected) = &step.validation_rules.status_check {
            if !expected.contains(&unit.status) {
                return Err(WorkflowError::StatusCheckFailed {
                    expected: expected.clone(),
                    actual: unit.status,
                });
            }
        }

        info!(
            serial_number = %unit.serial_number,
            product_code = %unit.product_code,
            status = %unit.status,
            "assembly unit scanned"
        );
        self.assembly_unit = Some(unit);

        // Auto-advance on a valid scan. When the next step is raw-material
        // scanning this hands control straight to the sub-flow.
        self.advance()
    }

    async fn record_test(&mut self, verdict: TestVerdict) -> Result<EngineEvent, WorkflowError> {
        let unit = self.assembly_unit.as_ref().ok_or(WorkflowError::NoAssemblyUnit)?;
        match verdict {
            TestVerdict::Pass => {
                self.backend
                    .change_assembly_unit_status(&unit.id, AssemblyUnitStatus::Passed)
                    .await?;
                self.advance()
            }
            TestVerdict::Fail => {
                self.backend
                    .change_assembly_unit_status(&unit.id, AssemblyUnitStatus::Failed)
                    .await?;
                // A failed test ends the whole run, remaining steps or not.
                self.transition(EnginePhase::Completed {
                    outcome: WorkflowOutcome::TestFailed,
                });
                Ok(EngineEvent::Completed {
                    outcome: WorkflowOutcome::TestFailed,
                })
            }
        }
    }

    async fn confirm_status(
        &mut self,
        status: AssemblyUnitStatus,
    ) -> Result<EngineEvent, WorkflowError> {
        let unit = self.assembly_unit.as_ref().ok_or(WorkflowError::NoAssemblyUnit)?;
        self.backend
            .change_assembly_unit_status(&unit.id, status)
            .await?;
        self.advance()
    }

    /// Record the current step as completed and move on. Callers guarantee
    /// at most one advance per step completion; advancement only happens
    /// from within a success path.
    fn advance(&mut self) -> Result<EngineEvent, WorkflowError> {
        let step_index = match self.phase {
            EnginePhase::Running { step_index } => step_index,
            _ => return Err(WorkflowError::NotRunning),
        };

        self.state.completed_steps.push(step_index);
        let next = step_index + 1;

        if next >= self.steps.len() {
            self.transition(EnginePhase::Completed {
                outcome: WorkflowOutcome::Finished,
            });
            return Ok(EngineEvent::Completed {
                outcome: WorkflowOutcome::Finished,
            });
        }

        self.state.current_step_index = next;
        self.state.errors.clear();
        self.consumption = ConsumptionFlow::new();
        self.transition(EnginePhase::Running { step_index: next });
        Ok(EngineEvent::Advanced { next_step: next })
    }

    fn transition(&mut self, to: EnginePhase) {
        info!(
            run_id = %self.run_id,
            station_id = %self.station_id,
            work_order_id = %self.work_order_id,
            from = ?self.phase,
            to = ?to,
            completed = self.state.completed_steps.len(),
            "workflow phase transition"
        );
        if !matches!(to, EnginePhase::Running { .. }) {
            let elapsed = Utc::now().signed_duration_since(self.started_at);
            info!(
                run_id = %self.run_id,
                elapsed_seconds = elapsed.num_seconds(),
                "station run ended"
            );
        }
        self.phase = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::config::ShopfloorConfig;
    use crate::workflow::catalog::WorkflowCatalog;

    fn engine_for(station: &str, backend: Arc<InMemoryBackend>) -> ProcessEngine<InMemoryBackend> {
        let catalog = WorkflowCatalog::builtin();
        ProcessEngine::new(
            backend,
            station,
            "wo-1",
            catalog.lookup(station).to_vec(),
            ShopfloorConfig::default().process,
        )
    }

    #[test]
    fn empty_step_sequence_is_complete_at_birth() {
        let backend = Arc::new(InMemoryBackend::new());
        let engine = engine_for("station-unknown", backend);
        assert_eq!(
            *engine.phase(),
            EnginePhase::Completed {
                outcome: WorkflowOutcome::Finished
            }
        );
        assert!(engine.current_step().is_none());
    }

    #[tokio::test]
    async fn input_after_completion_is_refused() {
        let backend = Arc::new(InMemoryBackend::new());
        let mut engine = engine_for("station-unknown", backend);
        let err = engine.handle_input(OperatorInput::Confirm).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotRunning));
    }

    #[tokio::test]
    async fn mismatched_input_is_recorded_and_step_holds() {
        let backend = Arc::new(InMemoryBackend::seeded_demo());
        let mut engine = engine_for("station-assembly", backend);
        let err = engine.handle_input(OperatorInput::Confirm).await.unwrap_err();
        assert!(matches!(err, WorkflowError::UnexpectedInput { .. }));
        assert_eq!(*engine.phase(), EnginePhase::Running { step_index: 0 });
        assert_eq!(engine.state().errors.len(), 1);
    }

    #[tokio::test]
    async fn cancel_ends_the_run() {
        let backend = Arc::new(InMemoryBackend::seeded_demo());
        let mut engine = engine_for("station-assembly", backend);
        let event = engine.handle_input(OperatorInput::Cancel).await.unwrap();
        assert_eq!(event, EngineEvent::Cancelled);
        assert_eq!(*engine.phase(), EnginePhase::Cancelled);
        assert!(engine
            .handle_input(OperatorInput::Scan("PC-1:SN-1".into()))
            .await
            .is_err());
    }
}
