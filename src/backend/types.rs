// Entities owned by the shop-floor backend. The engine only ever reads
// these; every mutation goes through a ShopFloorBackend call.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssemblyUnitStatus {
    Created,
    Pending,
    InProgress,
    Assembled,
    Tested,
    Passed,
    Pack,
    Failed,
    Scrapped,
}

impl std::fmt::Display for AssemblyUnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawMaterialStatus {
    Created,
    Received,
    Consumed,
    Scrapped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkOrderStatus {
    Created,
    Released,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMaterial {
    pub id: String,
    pub code: String,
    pub serial_number: String,
    #[serde(default)]
    pub lot_number: Option<String>,
    pub status: RawMaterialStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyUnit {
    pub id: String,
    pub serial_number: String,
    pub product_code: String,
    #[serde(default)]
    pub work_order_id: Option<String>,
    pub status: AssemblyUnitStatus,
    /// BOM line items attached to this unit. The backend may omit the list
    /// on endpoints that return shallow units.
    #[serde(default)]
    pub raw_materials: Vec<RawMaterial>,
}

impl AssemblyUnit {
    /// Materials still waiting to be consumed into this unit.
    pub fn received_materials(&self) -> impl Iterator<Item = &RawMaterial> {
        self.raw_materials
            .iter()
            .filter(|m| m.status == RawMaterialStatus::Received)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    pub station_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: String,
    pub work_order_no: String,
    pub product_code: String,
    pub product_name: String,
    pub quantity: u32,
    pub status: WorkOrderStatus,
}

/// Inspection record posted against a raw material during the consumption
/// sub-flow. Fixed "Visual Check" shape; only the result varies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionRequest {
    pub test_type: String,
    pub result: String,
    pub measured_value: String,
    pub inspector: String,
}

/// Process-step record closing out a station run on an assembly unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStepRequest {
    pub name: String,
    pub station_id: String,
    pub is_on_process: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembly_unit_decodes_backend_json() {
        let json = r#"{
            "id": "au-1",
            "serialNumber": "SN-1",
            "productCode": "PC-1",
            "workOrderId": "wo-1",
            "status": "Created",
            "rawMaterials": [
                {"id": "rm-1", "code": "RM-1", "serialNumber": "RMS-1", "lotNumber": "L1", "status": "Received"}
            ]
        }"#;
        let unit: AssemblyUnit = serde_json::from_str(json).unwrap();
        assert_eq!(unit.status, AssemblyUnitStatus::Created);
        assert_eq!(unit.received_materials().count(), 1);
    }

    #[test]
    fn shallow_unit_defaults_to_empty_bom() {
        let json = r#"{"id": "au-1", "serialNumber": "SN-1", "productCode": "PC-1", "status": "Assembled"}"#;
        let unit: AssemblyUnit = serde_json::from_str(json).unwrap();
        assert!(unit.raw_materials.is_empty());
        assert_eq!(unit.work_order_id, None);
    }

    #[test]
    fn status_serializes_as_backend_spelling() {
        assert_eq!(
            serde_json::to_string(&AssemblyUnitStatus::InProgress).unwrap(),
            "\"InProgress\""
        );
        assert_eq!(
            serde_json::to_string(&RawMaterialStatus::Consumed).unwrap(),
            "\"Consumed\""
        );
    }
}
