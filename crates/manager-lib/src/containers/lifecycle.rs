//! Lifecycle commands and deletion, gated on ownership and status

use super::ContainerCatalog;
use crate::error::{ManagerError, ManagerResult};
use crate::models::LifecycleCommand;
use crate::observability::StructuredLogger;
use tracing::warn;

/// Forwards lifecycle commands to the runtime after precondition checks.
///
/// No local locking is done; the runtime serializes conflicting operations
/// on the same container.
#[derive(Clone)]
pub struct LifecycleGuard {
    catalog: ContainerCatalog,
    logger: StructuredLogger,
}

impl LifecycleGuard {
    pub fn new(catalog: ContainerCatalog, logger: StructuredLogger) -> Self {
        Self { catalog, logger }
    }

    /// Run a lifecycle command against a managed container
    pub async fn execute(&self, id: &str, command: LifecycleCommand) -> ManagerResult<()> {
        let container = self.catalog.get_owned(id).await?;
        let runtime = self.catalog.runtime();

        let result = match command {
            LifecycleCommand::Start => runtime.start(&container.id).await,
            LifecycleCommand::Stop => runtime.stop(&container.id).await,
            LifecycleCommand::Pause => runtime.pause(&container.id).await,
            LifecycleCommand::Resume => runtime.unpause(&container.id).await,
        };

        match result {
            Ok(()) => {
                self.logger
                    .log_lifecycle(&container.id, &container.name, command.as_str());
                Ok(())
            }
            Err(e) => {
                warn!(
                    container_id = %container.id,
                    command = %command,
                    error = %e,
                    "Runtime rejected lifecycle command"
                );
                Err(ManagerError::from(e))
            }
        }
    }

    /// Permanently remove a managed container.
    ///
    /// Only containers whose logical status is `stopped` or `error` are
    /// removed; anything else fails before the runtime is asked to remove.
    pub async fn delete(&self, id: &str) -> ManagerResult<()> {
        let container = self.catalog.get_owned(id).await?;
        let status = container.status();

        if !status.is_terminal() {
            return Err(ManagerError::PreconditionFailed(
                "Container is not stopped".to_string(),
            ));
        }

        self.catalog
            .runtime()
            .remove(&container.id)
            .await
            .map_err(|e| {
                warn!(container_id = %container.id, error = %e, "Runtime failed to remove container");
                ManagerError::from(e)
            })?;

        self.logger
            .log_deletion(&container.id, &container.name, status.as_str());
        Ok(())
    }
}
