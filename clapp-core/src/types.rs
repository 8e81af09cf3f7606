//! Data model for Cloudistics applications and lifecycle actions.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Application status reported by the provider while the VM is running.
pub const STATUS_RUNNING: &str = "Running";

/// An application record as reported by the provider.
///
/// `id` is assigned by the provider and is the only stable identity;
/// `name` is user-chosen and not guaranteed unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub vcpus: Option<u32>,
    /// Memory in bytes.
    #[serde(default)]
    pub memory: Option<u64>,
    #[serde(default)]
    pub template_name: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub data_center_name: Option<String>,
    #[serde(default)]
    pub migration_zone_name: Option<String>,
    #[serde(default)]
    pub flash_pool_name: Option<String>,
    #[serde(default)]
    pub nics: Vec<NicSpec>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Network interface type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NicKind {
    #[serde(rename = "Virtual Networking")]
    VirtualNetworking,
    #[serde(rename = "VLAN")]
    Vlan,
}

impl Default for NicKind {
    fn default() -> Self {
        Self::VirtualNetworking
    }
}

/// A network interface descriptor for application creation.
///
/// `vnet_name` and `firewall_name` apply to virtual networking NICs;
/// the firewall is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NicSpec {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: NicKind,
    #[serde(default)]
    pub vnet_name: Option<String>,
    #[serde(default)]
    pub firewall_name: Option<String>,
}

/// Full set of creation parameters for an application.
///
/// Immutable once built from caller input; only drives a create call.
/// The provider does not support update-in-place for any of these fields,
/// so an existing application with the same name is left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSpec {
    pub name: String,
    pub description: Option<String>,
    pub vcpus: Option<u32>,
    /// Memory in bytes.
    pub memory: Option<u64>,
    pub template_name: Option<String>,
    pub category_name: Option<String>,
    pub data_center_name: Option<String>,
    pub migration_zone_name: Option<String>,
    pub flash_pool_name: Option<String>,
    pub nics: Vec<NicSpec>,
    pub tags: Vec<String>,
}

impl ApplicationSpec {
    /// Validate that every field required for creation is present.
    ///
    /// Runs before any network call; a missing field is a caller error,
    /// never retried.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::NameRequired);
        }
        if self.template_name.is_none() {
            return Err(ValidationError::TemplateRequired);
        }
        if self.category_name.is_none() {
            return Err(ValidationError::CategoryRequired);
        }
        if self.data_center_name.is_none() {
            return Err(ValidationError::DataCenterRequired);
        }
        if self.migration_zone_name.is_none() {
            return Err(ValidationError::MigrationZoneRequired);
        }
        if self.flash_pool_name.is_none() {
            return Err(ValidationError::FlashPoolRequired);
        }
        if self.nics.is_empty() {
            return Err(ValidationError::NicsRequired);
        }
        Ok(())
    }
}

/// A lifecycle action on an existing application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Start,
    Stop,
    Restart,
    Pause,
    Resume,
}

impl ActionKind {
    /// The application status the action converges toward. An application
    /// already in this status makes the action a no-op.
    pub fn expected_status(self) -> &'static str {
        match self {
            Self::Start | Self::Resume => STATUS_RUNNING,
            Self::Stop => "Shut down",
            Self::Restart => "Restarting",
            Self::Pause => "Paused",
        }
    }

    /// Whether the action additionally implies the application ends up
    /// running, warranting a second wait cycle after the action completes.
    pub fn implies_running(self) -> bool {
        matches!(self, Self::Start | Self::Restart | Self::Resume)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Pause => "pause",
            Self::Resume => "resume",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle for an asynchronous provider action.
///
/// `object_id` is set by create calls and carries the new application's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionHandle {
    pub action_id: String,
    #[serde(default)]
    pub object_id: Option<String>,
}

/// How long to wait for an issued action, if at all.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitPolicy {
    pub wait: bool,
    pub timeout: Duration,
    pub interval: Duration,
}

impl WaitPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

    /// Default for create/delete: wait up to 180 seconds.
    pub fn resource() -> Self {
        Self {
            wait: true,
            timeout: Duration::from_secs(180),
            interval: Self::DEFAULT_INTERVAL,
        }
    }

    /// Default for lifecycle actions: wait up to 60 seconds.
    pub fn action() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            ..Self::resource()
        }
    }

    /// Issue the mutating call and return without polling.
    pub fn no_wait() -> Self {
        Self {
            wait: false,
            ..Self::resource()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::resource()
    }
}

/// Result of a single reconcile invocation. Produced fresh every time,
/// never cached.
///
/// `changed` is true iff a mutating call was actually issued. `completed`
/// is only meaningful when `changed` and waiting was requested; success vs
/// failure is distinguished by `status`, not by a separate flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Outcome {
    pub changed: bool,
    pub completed: bool,
    pub status: Option<String>,
    pub application: Option<Application>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn valid_spec() -> ApplicationSpec {
        ApplicationSpec {
            name: "web-1".to_string(),
            description: Some("frontend".to_string()),
            vcpus: Some(2),
            memory: Some(2 * 1024 * 1024 * 1024),
            template_name: Some("Ubuntu 22.04".to_string()),
            category_name: Some("Default".to_string()),
            data_center_name: Some("DC1".to_string()),
            migration_zone_name: Some("MZ1".to_string()),
            flash_pool_name: Some("SP1".to_string()),
            nics: vec![NicSpec {
                name: "vNIC 0".to_string(),
                kind: NicKind::VirtualNetworking,
                vnet_name: Some("Vnet1".to_string()),
                firewall_name: Some("allow all".to_string()),
            }],
            tags: vec!["web".to_string()],
        }
    }

    #[test]
    fn valid_spec_passes_validation() {
        assert!(valid_spec().validate().is_ok());
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut spec = valid_spec();
        spec.name = "  ".to_string();
        assert_eq!(spec.validate(), Err(ValidationError::NameRequired));
    }

    #[test]
    fn missing_creation_fields_are_rejected_individually() {
        let cases: Vec<(fn(&mut ApplicationSpec), ValidationError)> = vec![
            (
                |s| s.template_name = None,
                ValidationError::TemplateRequired,
            ),
            (
                |s| s.category_name = None,
                ValidationError::CategoryRequired,
            ),
            (
                |s| s.data_center_name = None,
                ValidationError::DataCenterRequired,
            ),
            (
                |s| s.migration_zone_name = None,
                ValidationError::MigrationZoneRequired,
            ),
            (
                |s| s.flash_pool_name = None,
                ValidationError::FlashPoolRequired,
            ),
            (|s| s.nics.clear(), ValidationError::NicsRequired),
        ];

        for (mutate, expected) in cases {
            let mut spec = valid_spec();
            mutate(&mut spec);
            assert_eq!(spec.validate(), Err(expected));
        }
    }

    #[test]
    fn action_status_mapping_is_exhaustive() {
        assert_eq!(ActionKind::Start.expected_status(), "Running");
        assert_eq!(ActionKind::Stop.expected_status(), "Shut down");
        assert_eq!(ActionKind::Restart.expected_status(), "Restarting");
        assert_eq!(ActionKind::Pause.expected_status(), "Paused");
        assert_eq!(ActionKind::Resume.expected_status(), "Running");
    }

    #[test]
    fn running_actions_imply_second_wait() {
        assert!(ActionKind::Start.implies_running());
        assert!(ActionKind::Restart.implies_running());
        assert!(ActionKind::Resume.implies_running());
        assert!(!ActionKind::Stop.implies_running());
        assert!(!ActionKind::Pause.implies_running());
    }

    #[test]
    fn outcome_serializes_with_stable_field_names() {
        let outcome = Outcome {
            changed: true,
            completed: true,
            status: Some("Completed".to_string()),
            application: None,
        };

        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["changed"], true);
        assert_eq!(json["completed"], true);
        assert_eq!(json["status"], "Completed");
        assert_eq!(json["application"], serde_json::Value::Null);
    }

    #[test]
    fn wait_policy_defaults() {
        let resource = WaitPolicy::resource();
        assert!(resource.wait);
        assert_eq!(resource.timeout, Duration::from_secs(180));
        assert_eq!(resource.interval, Duration::from_secs(2));

        let action = WaitPolicy::action();
        assert!(action.wait);
        assert_eq!(action.timeout, Duration::from_secs(60));

        assert!(!WaitPolicy::no_wait().wait);
    }
}
