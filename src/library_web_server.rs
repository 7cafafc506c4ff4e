use crate::core::access_policy::policy_from_config;
use crate::core::jwt_auth::JwtVerifier;
use crate::core::{AccessPolicy, AppConfig, Clock, RepositoryClient, StorageClient, SystemClock};
use crate::db::library::LibraryStores;
use crate::db::Library;
use crate::routes::library_routes;
use actix_cors::Cors;
use actix_web::http::header;
use actix_web::web::ServiceConfig;
use actix_web::{dev::Server, web::Data, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use tracing_actix_web::TracingLogger;

pub struct LibraryWebServer {
    port: u16,
    server: Server,
}

impl LibraryWebServer {
    pub async fn build(configuration: AppConfig) -> Result<Self, anyhow::Error> {
        let postgres_pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy_with(configuration.postgres.connect());

        if configuration.postgres.run_migrations {
            sqlx::migrate!("./migrations").run(&postgres_pool).await?;
            tracing::info!("database migrations applied");
        }

        Self::build_with_stores(configuration, LibraryStores::postgres(postgres_pool)).await
    }

    /// Same server over caller-supplied stores.
    pub async fn build_with_stores(
        configuration: AppConfig,
        stores: LibraryStores,
    ) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            configuration.library_server_config.host, configuration.library_server_config.port
        );

        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let services = LibraryServices::new(&configuration, stores);
        let server = run(listener, services).await?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

/// Shared state handed to every worker.
#[derive(Clone)]
pub struct LibraryServices {
    library: Data<Library>,
    storage: Data<StorageClient>,
    repository: Option<Data<RepositoryClient>>,
    verifier: Data<JwtVerifier>,
    policy: Data<dyn AccessPolicy>,
}

impl LibraryServices {
    pub fn new(configuration: &AppConfig, stores: LibraryStores) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cache_ttl = Duration::from_secs(configuration.cache.ttl_seconds);

        let repository = configuration
            .github
            .as_ref()
            .map(|github| Data::new(RepositoryClient::new(github)));
        if repository.is_none() {
            tracing::warn!("github section missing, repository uploads are disabled");
        }

        Self {
            library: Data::new(Library::new(stores, cache_ttl, clock)),
            storage: Data::new(StorageClient::new(&configuration.storage)),
            repository,
            verifier: Data::new(JwtVerifier::new(&configuration.auth)),
            policy: Data::from(policy_from_config(&configuration.auth)),
        }
    }

    pub fn attach(&self, cfg: &mut ServiceConfig) {
        cfg.app_data(self.library.clone())
            .app_data(self.storage.clone())
            .app_data(self.verifier.clone())
            .app_data(self.policy.clone());

        if let Some(repository) = &self.repository {
            cfg.app_data(repository.clone());
        }
    }
}

pub async fn run(listener: TcpListener, services: LibraryServices) -> Result<Server, anyhow::Error> {
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
            ])
            .supports_credentials();
        App::new()
            .wrap(cors)
            .wrap(TracingLogger::default())
            .configure(|cfg| services.attach(cfg))
            .configure(library_routes)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
