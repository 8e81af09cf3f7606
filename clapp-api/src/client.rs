//! HTTP implementation of the provider trait.
//!
//! Thin request/response plumbing: the reconciliation logic lives in
//! clapp-core. Rejected requests become [`ProviderError::Api`] with the
//! provider's message verbatim; connection and decode failures become
//! [`ProviderError::Transport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

use clapp_core::{
    ActionHandle, ActionKind, ActionStatus, Application, ApplicationSpec, NicKind, NicSpec,
    Provider, ProviderError,
};

use crate::config::ClientConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Provider client for the Cloudistics REST API.
pub struct HttpProvider {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl HttpProvider {
    pub fn new(config: ClientConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::transport(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        debug!(path = %path, "GET");
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ProviderError::transport(e.to_string()))?;
        parse(response).await
    }
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    let status = response.status();
    if status.is_success() {
        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::transport(format!("decoding response: {e}")))
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::api(api_message(status, &body)))
    }
}

/// Extract the provider's message from an error body. Bodies carry
/// `{"message": "..."}`; anything else falls back to the raw text.
fn api_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("{} {}", status.as_u16(), body.trim()))
}

#[async_trait]
impl Provider for HttpProvider {
    async fn list_applications(&self) -> Result<Vec<Application>, ProviderError> {
        let wire: Vec<WireApplication> = self.get_json("/applications").await?;
        Ok(wire.into_iter().map(Application::from).collect())
    }

    async fn get_application(&self, id: &str) -> Result<Application, ProviderError> {
        let wire: WireApplication = self.get_json(&format!("/applications/{id}")).await?;
        Ok(wire.into())
    }

    async fn create_application(
        &self,
        spec: &ApplicationSpec,
    ) -> Result<ActionHandle, ProviderError> {
        debug!(name = %spec.name, "POST /applications");
        let response = self
            .http
            .post(self.url("/applications"))
            .bearer_auth(&self.token)
            .json(&CreateRequest::from(spec))
            .send()
            .await
            .map_err(|e| ProviderError::transport(e.to_string()))?;
        let wire: WireAction = parse(response).await?;
        Ok(wire.into())
    }

    async fn delete_application(&self, id: &str) -> Result<ActionHandle, ProviderError> {
        debug!(id = %id, "DELETE /applications");
        let response = self
            .http
            .delete(self.url(&format!("/applications/{id}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ProviderError::transport(e.to_string()))?;
        let wire: WireAction = parse(response).await?;
        Ok(wire.into())
    }

    async fn perform_action(
        &self,
        id: &str,
        action: ActionKind,
    ) -> Result<ActionHandle, ProviderError> {
        debug!(id = %id, action = %action, "PUT application action");
        let response = self
            .http
            .put(self.url(&format!("/applications/{id}/{action}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ProviderError::transport(e.to_string()))?;
        let wire: WireAction = parse(response).await?;
        Ok(wire.into())
    }

    async fn action_status(&self, action_id: &str) -> Result<ActionStatus, ProviderError> {
        let wire: WireActionStatus = self.get_json(&format!("/actions/{action_id}")).await?;
        Ok(ActionStatus {
            status: wire.status,
        })
    }
}

// Wire mirrors. The API uses camelCase and `uuid` identifiers.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireApplication {
    uuid: String,
    name: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    vcpus: Option<u32>,
    #[serde(default)]
    memory: Option<u64>,
    #[serde(default)]
    template_name: Option<String>,
    #[serde(default)]
    category_name: Option<String>,
    #[serde(default)]
    data_center_name: Option<String>,
    #[serde(default)]
    migration_zone_name: Option<String>,
    #[serde(default)]
    flash_pool_name: Option<String>,
    #[serde(default)]
    nics: Vec<WireNic>,
    #[serde(default)]
    tag_names: Vec<String>,
}

impl From<WireApplication> for Application {
    fn from(w: WireApplication) -> Self {
        Self {
            id: w.uuid,
            name: w.name,
            status: w.status,
            description: w.description,
            vcpus: w.vcpus,
            memory: w.memory,
            template_name: w.template_name,
            category_name: w.category_name,
            data_center_name: w.data_center_name,
            migration_zone_name: w.migration_zone_name,
            flash_pool_name: w.flash_pool_name,
            nics: w.nics.into_iter().map(NicSpec::from).collect(),
            tags: w.tag_names,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireNic {
    name: String,
    #[serde(rename = "type", default)]
    kind: NicKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vnet_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    firewall_name: Option<String>,
}

impl From<WireNic> for NicSpec {
    fn from(w: WireNic) -> Self {
        Self {
            name: w.name,
            kind: w.kind,
            vnet_name: w.vnet_name,
            firewall_name: w.firewall_name,
        }
    }
}

impl From<&NicSpec> for WireNic {
    fn from(n: &NicSpec) -> Self {
        Self {
            name: n.name.clone(),
            kind: n.kind,
            vnet_name: n.vnet_name.clone(),
            firewall_name: n.firewall_name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vcpus: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    memory: Option<u64>,
    template_name: Option<String>,
    category_name: Option<String>,
    data_center_name: Option<String>,
    migration_zone_name: Option<String>,
    flash_pool_name: Option<String>,
    nics: Vec<WireNic>,
    tag_names: Vec<String>,
}

impl From<&ApplicationSpec> for CreateRequest {
    fn from(spec: &ApplicationSpec) -> Self {
        Self {
            name: spec.name.clone(),
            description: spec.description.clone(),
            vcpus: spec.vcpus,
            memory: spec.memory,
            template_name: spec.template_name.clone(),
            category_name: spec.category_name.clone(),
            data_center_name: spec.data_center_name.clone(),
            migration_zone_name: spec.migration_zone_name.clone(),
            flash_pool_name: spec.flash_pool_name.clone(),
            nics: spec.nics.iter().map(WireNic::from).collect(),
            tag_names: spec.tags.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAction {
    action_uuid: String,
    #[serde(default)]
    object_uuid: Option<String>,
}

impl From<WireAction> for ActionHandle {
    fn from(w: WireAction) -> Self {
        Self {
            action_id: w.action_uuid,
            object_id: w.object_uuid,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireActionStatus {
    status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_wire_mapping() {
        let raw = r#"{
            "uuid": "4f5e", "name": "xx", "status": "Running",
            "vcpus": 2, "memory": 2147483648,
            "templateName": "World Community Grid",
            "categoryName": "Default", "dataCenterName": "DC2",
            "migrationZoneName": "MZ1", "flashPoolName": "SP1",
            "nics": [{"name": "vNIC 0", "type": "Virtual Networking",
                      "vnetName": "Vnet1", "firewallName": "allow all"}],
            "tagNames": ["TT1", "TT2"]
        }"#;

        let app: Application = serde_json::from_str::<WireApplication>(raw).unwrap().into();

        assert_eq!(app.id, "4f5e");
        assert_eq!(app.status, "Running");
        assert_eq!(app.template_name.as_deref(), Some("World Community Grid"));
        assert_eq!(app.nics[0].kind, NicKind::VirtualNetworking);
        assert_eq!(app.nics[0].vnet_name.as_deref(), Some("Vnet1"));
        assert_eq!(app.tags, vec!["TT1", "TT2"]);
    }

    #[test]
    fn action_wire_mapping() {
        let raw = r#"{"actionUuid": "a-1", "objectUuid": "app-9"}"#;
        let handle: ActionHandle = serde_json::from_str::<WireAction>(raw).unwrap().into();

        assert_eq!(handle.action_id, "a-1");
        assert_eq!(handle.object_id.as_deref(), Some("app-9"));

        let bare = r#"{"actionUuid": "a-2"}"#;
        let handle: ActionHandle = serde_json::from_str::<WireAction>(bare).unwrap().into();
        assert_eq!(handle.object_id, None);
    }

    #[test]
    fn create_request_serializes_camel_case() {
        let spec = ApplicationSpec {
            name: "xx".to_string(),
            template_name: Some("T".to_string()),
            nics: vec![NicSpec {
                name: "vNIC 0".to_string(),
                kind: NicKind::Vlan,
                vnet_name: None,
                firewall_name: None,
            }],
            ..ApplicationSpec::default()
        };

        let body = serde_json::to_value(CreateRequest::from(&spec)).unwrap();

        assert_eq!(body["templateName"], "T");
        assert_eq!(body["nics"][0]["type"], "VLAN");
        assert!(body["nics"][0].get("vnetName").is_none());
        assert!(body.get("description").is_none());
    }

    #[test]
    fn error_body_message_is_extracted_verbatim() {
        let status = StatusCode::UNPROCESSABLE_ENTITY;
        assert_eq!(
            api_message(status, r#"{"message": "flash pool SP9 not found"}"#),
            "flash pool SP9 not found"
        );
        assert_eq!(api_message(status, "gateway exploded"), "422 gateway exploded");
    }
}
