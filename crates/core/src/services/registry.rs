//! Instance registry: one registered client application per instance.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{info, warn};
use webui_common::{AppError, AppResult};
use webui_remote::{AppRegistration, Application, Instance, MastodonApi};

/// Maps instances to the application registered with them.
///
/// Registration happens at most once per instance. Concurrent first requests
/// for the same instance wait on a single outbound call; requests for
/// different instances do not block each other beyond the map lookup.
#[derive(Clone)]
pub struct InstanceRegistry {
    api: Arc<dyn MastodonApi>,
    registration: AppRegistration,
    apps: Arc<Mutex<HashMap<Instance, Arc<OnceCell<Application>>>>>,
}

impl InstanceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new(api: Arc<dyn MastodonApi>, registration: AppRegistration) -> Self {
        Self {
            api,
            registration,
            apps: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Parameters used for every registration.
    #[must_use]
    pub const fn registration(&self) -> &AppRegistration {
        &self.registration
    }

    /// Return the application for `instance`, registering one if needed.
    ///
    /// A failed registration leaves nothing behind, so the next call retries.
    pub async fn register_or_get(&self, instance: &Instance) -> AppResult<Application> {
        let cell = {
            let mut apps = self.apps.lock().await;
            Arc::clone(apps.entry(instance.clone()).or_default())
        };

        let result = cell
            .get_or_try_init(|| async {
                info!(instance = %instance, "Registering application with instance");
                self.api
                    .register_app(instance, &self.registration)
                    .await
                    .map_err(|e| {
                        warn!(instance = %instance, error = %e, "Application registration failed");
                        AppError::Registration(e.to_string())
                    })
            })
            .await
            .cloned();

        match result {
            Ok(_) => self.keep_registered(instance, &cell).await,
            Err(_) => self.forget_failed(instance, &cell).await,
        }
        result
    }

    /// Make sure a filled cell is the one the map holds.
    ///
    /// A waiter can fill a cell that a failed caller already unmapped.
    async fn keep_registered(&self, instance: &Instance, cell: &Arc<OnceCell<Application>>) {
        let mut apps = self.apps.lock().await;
        let stale = apps
            .get(instance)
            .is_none_or(|current| !Arc::ptr_eq(current, cell) && !current.initialized());
        if stale {
            apps.insert(instance.clone(), Arc::clone(cell));
        }
    }

    /// Drop the cell of a failed registration unless another caller has
    /// since replaced or filled it.
    async fn forget_failed(&self, instance: &Instance, cell: &Arc<OnceCell<Application>>) {
        let mut apps = self.apps.lock().await;
        if apps
            .get(instance)
            .is_some_and(|current| Arc::ptr_eq(current, cell) && !current.initialized())
        {
            apps.remove(instance);
        }
    }

    /// Look up an already registered application without registering.
    pub async fn get(&self, instance: &Instance) -> Option<Application> {
        let apps = self.apps.lock().await;
        apps.get(instance).and_then(|cell| cell.get().cloned())
    }

    /// Number of instances with a registered application.
    pub async fn registered_count(&self) -> usize {
        let apps = self.apps.lock().await;
        apps.values().filter(|cell| cell.initialized()).count()
    }
}
