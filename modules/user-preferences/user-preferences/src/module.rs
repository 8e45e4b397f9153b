use std::sync::Arc;

use arc_swap::ArcSwapOption;
use axum::Router;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::info;
use user_preferences_sdk::UserPreferencesApi;

use crate::api::rest::auth::IdentityHeader;
use crate::api::rest::openapi::OpenApiRegistry;
use crate::api::rest::routes;
use crate::config::UserPreferencesConfig;
use crate::domain::service::{Service, ServiceConfig};
use crate::infra::storage::SeaOrmPreferenceRepository;
use crate::local_client::LocalClient;

struct Runtime {
    service: Arc<Service>,
    identity: IdentityHeader,
}

/// Lifecycle wrapper for the user preferences module.
///
/// `migrate` prepares the schema, `init` builds the service, after which the
/// REST routes and the in-process client become available.
#[derive(Default)]
pub struct UserPreferencesModule {
    runtime: ArcSwapOption<Runtime>,
}

impl UserPreferencesModule {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns an error if a migration fails.
    pub async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running user preferences database migrations");

        crate::infra::storage::migrations::Migrator::up(db, None).await?;

        info!("User preferences database migrations completed successfully");
        Ok(())
    }

    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn init(
        &self,
        db: DatabaseConnection,
        config: &UserPreferencesConfig,
    ) -> anyhow::Result<()> {
        info!("Initializing user preferences module");

        let identity = IdentityHeader::parse(&config.identity_header)?;
        if config.max_batch_size == 0 {
            anyhow::bail!("modules.user_preferences.config.max_batch_size must be positive");
        }

        let repo = Arc::new(SeaOrmPreferenceRepository::new(db));
        let service = Service::new(
            repo,
            ServiceConfig {
                max_batch_size: config.max_batch_size,
            },
        );

        self.runtime.store(Some(Arc::new(Runtime {
            service: Arc::new(service),
            identity,
        })));

        info!(
            identity_header = %config.identity_header,
            max_batch_size = config.max_batch_size,
            "User preferences module initialized"
        );
        Ok(())
    }

    /// # Errors
    /// Returns an error if called before [`Self::init`].
    pub fn register_rest(
        &self,
        router: Router,
        openapi: &OpenApiRegistry,
    ) -> anyhow::Result<Router> {
        info!("Registering user preferences REST routes");

        let runtime = self.runtime()?;
        let router = routes::register_routes(
            router,
            openapi,
            runtime.service.clone(),
            runtime.identity.clone(),
        );

        info!("User preferences REST routes registered successfully");
        Ok(router)
    }

    /// In-process client sharing the module's service.
    ///
    /// # Errors
    /// Returns an error if called before [`Self::init`].
    pub fn client(&self) -> anyhow::Result<Arc<dyn UserPreferencesApi>> {
        let runtime = self.runtime()?;
        Ok(Arc::new(LocalClient::new(runtime.service.clone())))
    }

    fn runtime(&self) -> anyhow::Result<Arc<Runtime>> {
        self.runtime
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("User preferences module not initialized"))
    }
}
