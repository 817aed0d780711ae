//! Background job: fabrication worker pool.
//!
//! Workers share one work queue. Each job stores a freshly minted VM and then
//! hands a `DeploymentUpdate` to the reconciler, waiting for channel capacity
//! if the reconciler is busy.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use crate::models::vm::{DeploymentUpdate, Vm};
use crate::provisioning::{FabricationJob, Inventory};

/// Spawn `workers` fabrication tasks. Call this once, from the pipeline.
pub(crate) fn spawn(
    workers: usize,
    jobs: mpsc::UnboundedReceiver<FabricationJob>,
    updates: mpsc::Sender<DeploymentUpdate>,
    inventory: Arc<Inventory>,
    delay: Duration,
) {
    let jobs = Arc::new(Mutex::new(jobs));

    for worker in 0..workers {
        let jobs = jobs.clone();
        let updates = updates.clone();
        let inventory = inventory.clone();

        tokio::spawn(async move {
            loop {
                let next = jobs.lock().await.recv().await;
                let Some(job) = next else { break };

                let update = fabricate(&inventory, job, delay).await;
                if updates.send(update).await.is_err() {
                    tracing::warn!(
                        worker,
                        deployment_id = %update.deployment_id,
                        "reconciler stopped, update dropped"
                    );
                    break;
                }
            }
            tracing::debug!(worker, "fabrication worker stopped");
        });
    }
}

/// Build the VM described by `job` and record it.
async fn fabricate(inventory: &Inventory, job: FabricationJob, delay: Duration) -> DeploymentUpdate {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let vm = Vm {
        id: Uuid::new_v4(),
        name: job.spec.name,
        numcpus: job.spec.numcpus,
        memorymb: job.spec.memorymb,
    };
    let resource_id = vm.id;
    inventory.vms.insert(resource_id, vm);

    tracing::debug!(
        deployment_id = %job.deployment_id,
        resource_id = %resource_id,
        "vm fabricated"
    );

    DeploymentUpdate {
        deployment_id: job.deployment_id,
        resource_id,
    }
}
