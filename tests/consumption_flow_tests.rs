// Raw-material consumption sub-flow against the in-memory backend.

use shopfloor::workflow::{ConsumptionFlow, ConsumptionPhase, ConsumptionSignal, WorkflowError};
use shopfloor::{
    AssemblyUnit, AssemblyUnitStatus, BackendCall, InMemoryBackend, RawMaterial,
    RawMaterialStatus, ShopFloorBackend, ShopfloorConfig,
};

fn process_settings() -> shopfloor::config::ProcessConfig {
    ShopfloorConfig::default().process
}

async fn demo_unit(backend: &InMemoryBackend) -> AssemblyUnit {
    backend
        .assembly_unit_by_serial("PC-1", "SN-1")
        .await
        .unwrap()
}

#[tokio::test]
async fn accept_with_materials_remaining_signals_accepted() {
    let backend = InMemoryBackend::seeded_demo();
    let mut unit = demo_unit(&backend).await;
    let mut flow = ConsumptionFlow::new();
    let settings = process_settings();

    flow.scan(&unit, "RM-1:RMS-1").unwrap();
    let signal = flow.accept(&backend, &mut unit, &settings).await.unwrap();
    assert_eq!(signal, ConsumptionSignal::Accepted);
    assert_eq!(*flow.phase(), ConsumptionPhase::AwaitingScan);

    // A passing visual inspection was recorded for the resolved material.
    let inspections = backend.inspections();
    assert_eq!(inspections.len(), 1);
    assert_eq!(inspections[0].0, "rm-1");
    assert_eq!(inspections[0].1.result, "Pass");
    assert_eq!(inspections[0].1.test_type, settings.visual_test_type);
    assert_eq!(inspections[0].1.inspector, settings.inspector);

    // The BOM is not complete, so no closing process step yet.
    assert!(backend.process_steps().is_empty());
    // The local snapshot was reconciled with the backend.
    assert_eq!(unit.raw_materials[0].status, RawMaterialStatus::Consumed);
}

#[tokio::test]
async fn last_material_signals_all_consumed_and_closes_out_station() {
    let backend = InMemoryBackend::seeded_demo();
    let mut unit = demo_unit(&backend).await;
    let mut flow = ConsumptionFlow::new();
    let settings = process_settings();

    flow.scan(&unit, "RM-1:RMS-1").unwrap();
    flow.accept(&backend, &mut unit, &settings).await.unwrap();
    flow.scan(&unit, "RM-2:RMS-2").unwrap();
    let signal = flow.accept(&backend, &mut unit, &settings).await.unwrap();

    assert_eq!(signal, ConsumptionSignal::AllConsumed);
    assert_eq!(*flow.phase(), ConsumptionPhase::Done);
    assert_eq!(unit.status, AssemblyUnitStatus::Assembled);

    let steps = backend.process_steps();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].0, "SN-1");
    assert_eq!(steps[0].1.name, settings.closing_step_name);
    assert_eq!(steps[0].1.station_id, "st-1");
    assert!(!steps[0].1.is_on_process);
}

#[tokio::test]
async fn reject_records_failing_inspection_without_consuming() {
    let backend = InMemoryBackend::seeded_demo();
    let mut flow = ConsumptionFlow::new();
    let settings = process_settings();
    let unit = demo_unit(&backend).await;

    flow.scan(&unit, "RM-1:RMS-1").unwrap();
    let signal = flow.reject(&backend, &settings).await.unwrap();
    assert_eq!(signal, ConsumptionSignal::Rejected);
    assert_eq!(*flow.phase(), ConsumptionPhase::AwaitingScan);

    let inspections = backend.inspections();
    assert_eq!(inspections.len(), 1);
    assert_eq!(inspections[0].1.result, "Fail");
    assert!(!backend
        .calls()
        .iter()
        .any(|c| matches!(c, BackendCall::ConsumeRawMaterial { .. })));

    // The material is still pending; a replacement scan is possible.
    let unit = demo_unit(&backend).await;
    assert_eq!(unit.raw_materials[0].status, RawMaterialStatus::Received);
    assert!(flow.scan(&unit, "RM-1:RMS-1").is_ok());
}

#[tokio::test]
async fn scanning_consumed_material_makes_no_backend_calls() {
    let backend = InMemoryBackend::seeded_demo();
    let mut unit = demo_unit(&backend).await;
    let mut flow = ConsumptionFlow::new();
    let settings = process_settings();

    flow.scan(&unit, "RM-1:RMS-1").unwrap();
    flow.accept(&backend, &mut unit, &settings).await.unwrap();

    let calls_before = backend.calls().len();
    let err = flow.scan(&unit, "RM-1:RMS-1").unwrap_err();
    assert!(matches!(err, WorkflowError::AlreadyConsumed { .. }));
    assert_eq!(backend.calls().len(), calls_before);
    assert_eq!(*flow.phase(), ConsumptionPhase::AwaitingScan);
}

#[tokio::test]
async fn consume_failure_resets_to_awaiting_scan_and_is_retryable() {
    let backend = InMemoryBackend::seeded_demo();
    let mut unit = demo_unit(&backend).await;
    let mut flow = ConsumptionFlow::new();
    let settings = process_settings();

    flow.scan(&unit, "RM-1:RMS-1").unwrap();
    backend.fail_next("consume_raw_material", "line stoppage");
    let err = flow.accept(&backend, &mut unit, &settings).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Backend(_)));
    assert_eq!(*flow.phase(), ConsumptionPhase::AwaitingScan);

    // The operator scans again and the accept goes through.
    flow.scan(&unit, "RM-1:RMS-1").unwrap();
    let signal = flow.accept(&backend, &mut unit, &settings).await.unwrap();
    assert_eq!(signal, ConsumptionSignal::Accepted);
}

#[tokio::test]
async fn missing_closing_station_does_not_block_completion() {
    // No stations seeded at all: close-out has nowhere to report.
    let backend = InMemoryBackend::new();
    backend.add_assembly_unit(AssemblyUnit {
        id: "au-9".to_string(),
        serial_number: "SN-9".to_string(),
        product_code: "PC-9".to_string(),
        work_order_id: None,
        status: AssemblyUnitStatus::Created,
        raw_materials: vec![RawMaterial {
            id: "rm-9".to_string(),
            code: "RM-9".to_string(),
            serial_number: "RMS-9".to_string(),
            lot_number: None,
            status: RawMaterialStatus::Received,
        }],
    });
    let mut unit = backend
        .assembly_unit_by_serial("PC-9", "SN-9")
        .await
        .unwrap();
    let mut flow = ConsumptionFlow::new();

    flow.scan(&unit, "RM-9:RMS-9").unwrap();
    let signal = flow
        .accept(&backend, &mut unit, &process_settings())
        .await
        .unwrap();
    assert_eq!(signal, ConsumptionSignal::AllConsumed);
    assert!(backend.calls().contains(&BackendCall::ListStations));
    assert!(backend.process_steps().is_empty());
}
