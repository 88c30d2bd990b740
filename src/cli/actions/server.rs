use crate::auth::{Backend, SessionStore};
use crate::cli::actions::Action;
use crate::gate::new;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Handle the server action
/// # Errors
/// Return error if the backend client can't be built or the server fails
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server { port, config } => {
            let backend = Backend::new(&config)?;

            info!(
                "Using backend {} (environment: {})",
                config.backend_url(),
                config.frontend_env()
            );

            let store = Arc::new(SessionStore::new(config, backend));

            new(port, store).await?;
        }
    }

    Ok(())
}
