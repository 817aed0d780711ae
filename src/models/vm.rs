use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Requested shape of a VM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmSpec {
    pub name: String,
    pub numcpus: u32,
    pub memorymb: u64,
}

/// One accepted provisioning request. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmCreationTask {
    pub task_id: Uuid,
    pub deployment_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentStatus {
    InProgress,
    Created,
}

/// Tracks one provisioning request until its VM exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmDeployment {
    pub id: Uuid,
    /// Set by reconciliation.
    pub resource_id: Option<Uuid>,
    pub status: DeploymentStatus,
}

impl VmDeployment {
    pub fn in_progress(id: Uuid) -> Self {
        Self {
            id,
            resource_id: None,
            status: DeploymentStatus::InProgress,
        }
    }
}

/// The simulated resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vm {
    pub id: Uuid,
    pub name: String,
    pub numcpus: u32,
    pub memorymb: u64,
}

/// Sent by a worker once a VM has been fabricated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentUpdate {
    pub deployment_id: Uuid,
    pub resource_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(DeploymentStatus::InProgress).unwrap(),
            "in-progress"
        );
        assert_eq!(
            serde_json::to_value(DeploymentStatus::Created).unwrap(),
            "created"
        );
    }

    #[test]
    fn test_new_deployment_has_no_resource() {
        let d = VmDeployment::in_progress(Uuid::new_v4());
        assert_eq!(d.status, DeploymentStatus::InProgress);
        assert!(d.resource_id.is_none());
    }
}
