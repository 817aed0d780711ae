//! Background job: deployment reconciliation.
//!
//! The single consumer of `DeploymentUpdate`s and the only writer that moves a
//! deployment from `in-progress` to `created`. Runs until every sender is gone.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::models::vm::{DeploymentStatus, DeploymentUpdate};
use crate::provisioning::Inventory;

/// Spawn the reconciliation loop. Call this once, from the pipeline.
pub(crate) fn spawn(
    updates: mpsc::Receiver<DeploymentUpdate>,
    inventory: Arc<Inventory>,
) -> JoinHandle<()> {
    tokio::spawn(run(updates, inventory))
}

async fn run(mut updates: mpsc::Receiver<DeploymentUpdate>, inventory: Arc<Inventory>) {
    while let Some(update) = updates.recv().await {
        apply(&inventory, update);
    }
    tracing::info!("update channel closed, reconciler stopped");
}

/// Apply one update. Returns whether a deployment changed state.
fn apply(inventory: &Inventory, update: DeploymentUpdate) -> bool {
    let Some(mut deployment) = inventory.deployments.get_mut(&update.deployment_id) else {
        tracing::warn!(
            deployment_id = %update.deployment_id,
            resource_id = %update.resource_id,
            "update for unknown deployment dropped"
        );
        return false;
    };

    if deployment.status == DeploymentStatus::Created {
        tracing::warn!(
            deployment_id = %update.deployment_id,
            "deployment already created, duplicate update ignored"
        );
        return false;
    }

    deployment.status = DeploymentStatus::Created;
    deployment.resource_id = Some(update.resource_id);
    tracing::info!(
        deployment_id = %update.deployment_id,
        resource_id = %update.resource_id,
        "deployment reconciled"
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vm::VmDeployment;
    use std::time::Duration;
    use uuid::Uuid;

    #[test]
    fn test_apply_marks_created_and_attaches_resource() {
        let inventory = Inventory::default();
        let id = Uuid::new_v4();
        inventory.deployments.insert(id, VmDeployment::in_progress(id));

        let resource_id = Uuid::new_v4();
        assert!(apply(&inventory, DeploymentUpdate { deployment_id: id, resource_id }));

        let d = inventory.deployments.get(&id).unwrap();
        assert_eq!(d.status, DeploymentStatus::Created);
        assert_eq!(d.resource_id, Some(resource_id));
    }

    #[test]
    fn test_unknown_deployment_dropped() {
        let inventory = Inventory::default();
        let update = DeploymentUpdate {
            deployment_id: Uuid::new_v4(),
            resource_id: Uuid::new_v4(),
        };
        assert!(!apply(&inventory, update));
        assert!(inventory.deployments.is_empty());
    }

    #[test]
    fn test_second_update_does_not_relink() {
        let inventory = Inventory::default();
        let id = Uuid::new_v4();
        inventory.deployments.insert(id, VmDeployment::in_progress(id));

        let first = Uuid::new_v4();
        apply(&inventory, DeploymentUpdate { deployment_id: id, resource_id: first });
        assert!(!apply(&inventory, DeploymentUpdate { deployment_id: id, resource_id: Uuid::new_v4() }));

        assert_eq!(inventory.deployments.get(&id).unwrap().resource_id, Some(first));
    }

    #[tokio::test]
    async fn test_loop_exits_when_senders_drop() {
        let (tx, rx) = mpsc::channel(1);
        let handle = spawn(rx, Arc::new(Inventory::default()));
        drop(tx);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("reconciler did not stop")
            .unwrap();
    }
}
