//! Asynchronous VM provisioning pipeline.
//!
//! `create_vm` records an in-progress deployment and returns straight away.
//! The actual work flows through two queues:
//!
//! 1. an unbounded work queue drained by a pool of fabrication workers
//!    (`jobs::fabricator`), each of which builds the VM and publishes a
//!    [`DeploymentUpdate`];
//! 2. a capacity-1 update channel drained by a single reconciler
//!    (`jobs::reconciler`), the only writer that moves a deployment to
//!    `created`.
//!
//! Dropping the pipeline closes the work queue, which stops the workers,
//! which closes the update channel, which stops the reconciler.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::jobs;
use crate::models::vm::{DeploymentUpdate, Vm, VmCreationTask, VmDeployment, VmSpec};

/// tokio channels cannot be zero-sized; one slot is the closest to a rendezvous.
const UPDATE_CHANNEL_CAPACITY: usize = 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProvisionError {
    #[error("invalid vm spec: {0}")]
    InvalidSpec(String),

    #[error("provisioning pipeline is not running")]
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct ProvisioningConfig {
    /// Number of fabrication workers. Values below 1 are treated as 1.
    pub workers: usize,
    /// Simulated time spent fabricating each VM.
    pub fabrication_delay: Duration,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            fabrication_delay: Duration::ZERO,
        }
    }
}

/// Deployments and VMs, shared with the background workers.
#[derive(Default)]
pub(crate) struct Inventory {
    pub(crate) deployments: DashMap<Uuid, VmDeployment>,
    pub(crate) vms: DashMap<Uuid, Vm>,
}

/// One unit of work for the fabrication pool.
#[derive(Debug)]
pub(crate) struct FabricationJob {
    pub(crate) deployment_id: Uuid,
    pub(crate) spec: VmSpec,
}

pub struct ProvisioningPipeline {
    tasks: RwLock<Vec<VmCreationTask>>,
    inventory: Arc<Inventory>,
    jobs: mpsc::UnboundedSender<FabricationJob>,
}

impl ProvisioningPipeline {
    /// Build the pipeline and spawn its workers and reconciler on the
    /// current tokio runtime. Call once at startup.
    pub fn start(config: &ProvisioningConfig) -> Self {
        let inventory = Arc::new(Inventory::default());
        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::channel::<DeploymentUpdate>(UPDATE_CHANNEL_CAPACITY);

        let workers = config.workers.max(1);
        jobs::fabricator::spawn(
            workers,
            job_rx,
            update_tx,
            inventory.clone(),
            config.fabrication_delay,
        );
        jobs::reconciler::spawn(update_rx, inventory.clone());
        tracing::info!(workers, "provisioning pipeline started");

        Self {
            tasks: RwLock::new(Vec::new()),
            inventory,
            jobs: job_tx,
        }
    }

    /// Accept a provisioning request. Returns once the task and deployment
    /// are recorded; fabrication happens in the background.
    ///
    /// Never suspends, so the task and deployment records are written
    /// together or not at all.
    pub fn create_vm(&self, spec: VmSpec) -> Result<VmCreationTask, ProvisionError> {
        validate_spec(&spec)?;

        let deployment_id = Uuid::new_v4();
        let task = VmCreationTask {
            task_id: Uuid::new_v4(),
            deployment_id,
        };
        self.inventory
            .deployments
            .insert(deployment_id, VmDeployment::in_progress(deployment_id));
        self.tasks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(task.clone());

        let name = spec.name.clone();
        if self.jobs.send(FabricationJob { deployment_id, spec }).is_err() {
            self.tasks
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|t| t.task_id != task.task_id);
            self.inventory.deployments.remove(&deployment_id);
            tracing::error!(deployment_id = %deployment_id, "fabrication workers are gone");
            return Err(ProvisionError::Unavailable);
        }

        tracing::info!(
            task_id = %task.task_id,
            deployment_id = %deployment_id,
            vm_name = %name,
            "vm creation accepted"
        );
        Ok(task)
    }

    pub fn list_tasks(&self) -> Vec<VmCreationTask> {
        self.tasks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of all deployments. Order is unspecified.
    pub fn list_deployments(&self) -> Vec<VmDeployment> {
        self.inventory
            .deployments
            .iter()
            .map(|d| d.value().clone())
            .collect()
    }

    /// Snapshot of all VMs. Order is unspecified.
    pub fn list_vms(&self) -> Vec<Vm> {
        self.inventory.vms.iter().map(|v| v.value().clone()).collect()
    }

    pub fn deployment(&self, id: &Uuid) -> Option<VmDeployment> {
        self.inventory.deployments.get(id).map(|d| d.value().clone())
    }

    pub fn vm(&self, id: &Uuid) -> Option<Vm> {
        self.inventory.vms.get(id).map(|v| v.value().clone())
    }
}

fn validate_spec(spec: &VmSpec) -> Result<(), ProvisionError> {
    if spec.name.trim().is_empty() {
        return Err(ProvisionError::InvalidSpec("name must not be empty".into()));
    }
    if spec.numcpus == 0 {
        return Err(ProvisionError::InvalidSpec("numcpus must be at least 1".into()));
    }
    if spec.memorymb == 0 {
        return Err(ProvisionError::InvalidSpec("memorymb must be at least 1".into()));
    }
    Ok(())
}
