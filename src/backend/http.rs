// HTTP implementation of the gateway against the shop-floor REST backend.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::backend::api::ShopFloorBackend;
use crate::backend::errors::BackendError;
use crate::backend::types::{
    AssemblyUnit, AssemblyUnitStatus, InspectionRequest, ProcessStepRequest, RawMaterial, Station,
    WorkOrder,
};
use crate::config::BackendConfig;

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

/// Problem-details shape the backend uses for 4xx responses. Older
/// endpoints still answer with `message` instead of `detail`.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Envelope returned by paginated list endpoints.
#[derive(Debug, Deserialize)]
struct PaginatedResponse<T> {
    data: Vec<T>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Maps a non-success response into the error taxonomy. `entity`/`key`
    /// name what a 404 failed to find.
    async fn error_for(
        response: Response,
        entity: &'static str,
        key: String,
    ) -> BackendError {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return BackendError::NotFound { entity, key };
        }
        if status.is_client_error() {
            let reason = match response.json::<ApiErrorBody>().await {
                Ok(body) => body
                    .detail
                    .or(body.message)
                    .unwrap_or_else(|| format!("HTTP {status}")),
                Err(_) => format!("HTTP {status}"),
            };
            return BackendError::Rejected { reason };
        }
        BackendError::Http {
            status: status.as_u16(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        entity: &'static str,
        key: String,
    ) -> Result<T, BackendError> {
        debug!(path, "backend GET");
        let response = self.client.get(self.url(path)).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response, entity, key).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn post_json<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
        entity: &'static str,
        key: String,
    ) -> Result<(), BackendError> {
        debug!(path, "backend POST");
        let response = self.client.post(self.url(path)).json(body).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response, entity, key).await);
        }
        Ok(())
    }
}

#[async_trait]
impl ShopFloorBackend for HttpBackend {
    async fn assembly_unit_by_serial(
        &self,
        product_code: &str,
        serial_number: &str,
    ) -> Result<AssemblyUnit, BackendError> {
        self.get_json(
            &format!("/api/AssemblyUnits/by-serial/{product_code}/{serial_number}"),
            "assembly unit",
            format!("{product_code}:{serial_number}"),
        )
        .await
    }

    async fn assembly_unit_by_id(&self, id: &str) -> Result<AssemblyUnit, BackendError> {
        self.get_json(
            &format!("/api/AssemblyUnits/{id}"),
            "assembly unit",
            id.to_string(),
        )
        .await
    }

    async fn change_assembly_unit_status(
        &self,
        id: &str,
        status: AssemblyUnitStatus,
    ) -> Result<(), BackendError> {
        self.post_json(
            &format!("/api/AssemblyUnits/{id}/change-status"),
            &json!({ "status": status }),
            "assembly unit",
            id.to_string(),
        )
        .await
    }

    async fn consume_raw_material(
        &self,
        assembly_unit_id: &str,
        material_code: &str,
        serial_number: &str,
    ) -> Result<(), BackendError> {
        self.post_json(
            &format!("/api/AssemblyUnits/{assembly_unit_id}/consume-rawmaterial"),
            &json!({ "materialCode": material_code, "serialNumber": serial_number }),
            "raw material",
            format!("{material_code}:{serial_number}"),
        )
        .await
    }

    async fn raw_material_by_serial(
        &self,
        material_code: &str,
        serial_number: &str,
    ) -> Result<RawMaterial, BackendError> {
        self.get_json(
            &format!("/api/RawMaterials/by-serial/{material_code}/{serial_number}"),
            "raw material",
            format!("{material_code}:{serial_number}"),
        )
        .await
    }

    async fn add_inspection(
        &self,
        raw_material_id: &str,
        inspection: &InspectionRequest,
    ) -> Result<(), BackendError> {
        self.post_json(
            &format!("/api/RawMaterials/{raw_material_id}/inspection"),
            inspection,
            "raw material",
            raw_material_id.to_string(),
        )
        .await
    }

    async fn add_process_step(
        &self,
        serial_number: &str,
        step: &ProcessStepRequest,
    ) -> Result<(), BackendError> {
        self.post_json(
            &format!("/api/AssemblyUnits/{serial_number}/add-processstep"),
            step,
            "assembly unit",
            serial_number.to_string(),
        )
        .await
    }

    async fn list_stations(&self) -> Result<Vec<Station>, BackendError> {
        self.get_json("/api/Stations", "stations", String::new()).await
    }

    async fn list_work_orders(&self) -> Result<Vec<WorkOrder>, BackendError> {
        let page: PaginatedResponse<WorkOrder> = self
            .get_json("/api/WorkOrders?pageSize=100", "work orders", String::new())
            .await?;
        Ok(page.data)
    }
}
