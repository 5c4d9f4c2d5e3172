// Station/work-order selection: the thin entry point that turns an
// operator's choice into a running engine.

use std::sync::Arc;

use crate::backend::{BackendError, ShopFloorBackend, WorkOrder, WorkOrderStatus};
use crate::config::ProcessConfig;
use crate::workflow::catalog::WorkflowCatalog;
use crate::workflow::engine::ProcessEngine;

/// Display metadata for the fixed set of operator stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const STATIONS: [StationDescriptor; 3] = [
    StationDescriptor {
        id: "station-assembly",
        name: "Assembly Station",
        description: "Assembly and raw material consumption",
    },
    StationDescriptor {
        id: "station-testing",
        name: "Testing Station",
        description: "Quality testing and validation",
    },
    StationDescriptor {
        id: "station-packing",
        name: "Packing Station",
        description: "Final packing and shipping preparation",
    },
];

pub struct ProcessSelector<B> {
    backend: Arc<B>,
    catalog: WorkflowCatalog,
    settings: ProcessConfig,
}

impl<B: ShopFloorBackend> ProcessSelector<B> {
    pub fn new(backend: Arc<B>, catalog: WorkflowCatalog, settings: ProcessConfig) -> Self {
        Self {
            backend,
            catalog,
            settings,
        }
    }

    pub fn stations(&self) -> &'static [StationDescriptor] {
        &STATIONS
    }

    pub fn catalog(&self) -> &WorkflowCatalog {
        &self.catalog
    }

    /// Work orders an operator may run: Released or InProgress only.
    pub async fn open_work_orders(&self) -> Result<Vec<WorkOrder>, BackendError> {
        let work_orders = self.backend.list_work_orders().await?;
        Ok(work_orders
            .into_iter()
            .filter(|wo| {
                matches!(
                    wo.status,
                    WorkOrderStatus::Released | WorkOrderStatus::InProgress
                )
            })
            .collect())
    }

    /// Instantiate a fresh engine for the chosen station. The selector
    /// keeps no state of its own once the engine starts.
    pub fn start(&self, station_id: &str, work_order_id: &str) -> ProcessEngine<B> {
        ProcessEngine::new(
            self.backend.clone(),
            station_id,
            work_order_id,
            self.catalog.lookup(station_id).to_vec(),
            self.settings.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{InMemoryBackend, WorkOrder};
    use crate::config::ShopfloorConfig;

    fn work_order(id: &str, status: WorkOrderStatus) -> WorkOrder {
        WorkOrder {
            id: id.to_string(),
            work_order_no: format!("WO-{id}"),
            product_code: "PC-1".to_string(),
            product_name: "Controller Unit".to_string(),
            quantity: 5,
            status,
        }
    }

    #[tokio::test]
    async fn only_released_and_in_progress_orders_are_offered() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.add_work_order(work_order("1", WorkOrderStatus::Created));
        backend.add_work_order(work_order("2", WorkOrderStatus::Released));
        backend.add_work_order(work_order("3", WorkOrderStatus::InProgress));
        backend.add_work_order(work_order("4", WorkOrderStatus::Completed));
        backend.add_work_order(work_order("5", WorkOrderStatus::Cancelled));

        let selector = ProcessSelector::new(
            backend,
            WorkflowCatalog::builtin(),
            ShopfloorConfig::default().process,
        );
        let open: Vec<String> = selector
            .open_work_orders()
            .await
            .unwrap()
            .into_iter()
            .map(|wo| wo.id)
            .collect();
        assert_eq!(open, vec!["2".to_string(), "3".to_string()]);
    }

    #[test]
    fn selector_offers_the_three_fixed_stations() {
        let backend = Arc::new(InMemoryBackend::new());
        let selector = ProcessSelector::new(
            backend,
            WorkflowCatalog::builtin(),
            ShopfloorConfig::default().process,
        );
        let ids: Vec<&str> = selector.stations().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["station-assembly", "station-testing", "station-packing"]);
        for station in selector.stations() {
            assert!(!selector.catalog().lookup(station.id).is_empty());
        }
    }
}
