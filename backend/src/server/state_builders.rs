//! Builders wiring the selected contact repository into HTTP state.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::info;

use contacts_backend::domain::ContactsService;
use contacts_backend::domain::ports::ContactRepository;
use contacts_backend::inbound::http::state::HttpState;
use contacts_backend::outbound::memory::InMemoryContactRepository;
use contacts_backend::outbound::persistence::{
    DbPool, DieselContactRepository, DieselProcedureContactRepository, PoolError,
};

use super::config::{AppSettings, PersistenceBackend, SettingsError};

/// Errors raised while assembling the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateBuildError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Wrap a repository in the contact service and expose it through both ports.
pub fn http_state_for<R>(repository: R) -> HttpState
where
    R: ContactRepository + 'static,
{
    let service = Arc::new(ContactsService::new(Arc::new(repository)));
    HttpState::new(service.clone(), service)
}

async fn connect(settings: &AppSettings, backend: PersistenceBackend) -> Result<DbPool, StateBuildError> {
    let url = settings.database_url_for(backend)?;
    Ok(DbPool::new(settings.pool_config(url)).await?)
}

/// Build HTTP state for the configured persistence backend.
///
/// # Errors
/// Returns [`StateBuildError`] when the settings are inconsistent or the pool
/// cannot be built.
pub async fn build_http_state(
    settings: &AppSettings,
    backend: PersistenceBackend,
) -> Result<HttpState, StateBuildError> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    info!(persistence = %backend, "selecting contact repository");
    let state = match backend {
        PersistenceBackend::Memory => http_state_for(InMemoryContactRepository::new(clock)),
        PersistenceBackend::Orm => {
            let pool = connect(settings, backend).await?;
            http_state_for(DieselContactRepository::new(
                pool,
                clock,
                settings.retry_policy(),
            ))
        }
        PersistenceBackend::Procedures => {
            let pool = connect(settings, backend).await?;
            http_state_for(DieselProcedureContactRepository::new(
                pool,
                clock,
                settings.retry_policy(),
            ))
        }
    };
    Ok(state)
}
