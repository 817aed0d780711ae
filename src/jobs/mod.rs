//! Long-running background tasks owned by the provisioning pipeline.

pub(crate) mod fabricator;
pub(crate) mod reconciler;
