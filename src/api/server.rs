use crate::api::routes;
use crate::config::Shared;
use crate::entry_store::DynEntryStore;
use crate::resolver::DynResolver;
use axum::Router;
use std::future::Future;

#[derive(Clone)]
pub struct AppState {
    pub config: Shared,
    pub entry_store: DynEntryStore,
    pub resolver: DynResolver,
}

impl AppState {
    /// Build the shared request state. References are resolved against `config`.
    pub fn new(config: Shared, entry_store: DynEntryStore) -> Self {
        let resolver: DynResolver = config.clone();
        Self {
            config,
            entry_store,
            resolver,
        }
    }
}

/// The API [`Router`], ready to be served or driven directly.
pub fn router(state: AppState) -> Router {
    routes::new(state)
}

pub fn new(
    config: Shared,
    entry_store: DynEntryStore,
) -> impl Future<Output = hyper::Result<()>> {
    let bind_addr = config.api_bind_addr;
    axum::Server::bind(&bind_addr)
        .serve(router(AppState::new(config, entry_store)).into_make_service())
}
