use crate::config::{CompletionProviderKind, ConvertProvider, DatabaseBackend, ServiceConfig};
use crate::handlers;
use crate::pipeline::ingest::MAX_UPLOAD_BYTES;
use crate::services::completion::mock::MockCompletionProvider;
use crate::services::completion::openai::{OpenAiConfig, OpenAiProvider};
use crate::services::completion::CompletionProvider;
use crate::services::convert::convertapi::{ConvertApiClient, ConvertApiConfig};
use crate::services::convert::mock::MockConverter;
use crate::services::convert::PdfConverter;
use crate::services::{
    AuthService, DocumentStore, InMemoryDocumentStore, LocalStorage, PgDocumentStore, Storage,
};
use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{delete, get, post},
    Router,
};
use service_core::error::AppError;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: ServiceConfig,
    pub store: Arc<dyn DocumentStore>,
    pub storage: Arc<dyn Storage>,
    pub converter: Arc<dyn PdfConverter>,
    pub completion: Arc<dyn CompletionProvider>,
    pub auth: AuthService,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: ServiceConfig) -> Result<Self, AppError> {
        let store: Arc<dyn DocumentStore> = match config.database.backend {
            DatabaseBackend::Postgres => {
                let url = config.database.url.as_deref().ok_or_else(|| {
                    AppError::ConfigError(anyhow::anyhow!(
                        "DATABASE_URL is required for the postgres backend"
                    ))
                })?;
                Arc::new(PgDocumentStore::connect(url).await.map_err(|e| {
                    tracing::error!("Failed to connect to Postgres: {}", e);
                    e
                })?)
            }
            DatabaseBackend::Memory => Arc::new(InMemoryDocumentStore::new()),
        };

        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(&config.storage.local_path)
                .await
                .map_err(|e| {
                    tracing::error!(
                        "Failed to initialize local storage at {}: {}",
                        config.storage.local_path,
                        e
                    );
                    e
                })?,
        );

        let converter: Arc<dyn PdfConverter> = match config.convert.provider {
            ConvertProvider::ConvertApi => Arc::new(ConvertApiClient::new(ConvertApiConfig {
                base_url: config.convert.base_url.clone(),
                secret: config.convert.secret.clone(),
            })),
            ConvertProvider::Mock => Arc::new(MockConverter::new(true)),
        };

        let completion: Arc<dyn CompletionProvider> = match config.completion.provider {
            CompletionProviderKind::OpenAi => Arc::new(OpenAiProvider::new(OpenAiConfig {
                api_key: config.completion.api_key.clone(),
                model: config.completion.model.clone(),
                base_url: config.completion.base_url.clone(),
            })),
            CompletionProviderKind::Mock => Arc::new(MockCompletionProvider::new(true)),
        };

        let auth = AuthService::new(&config.auth);

        let state = AppState {
            config: config.clone(),
            store,
            storage,
            converter,
            completion,
            auth,
        };

        let app = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/process", post(handlers::process_document))
            .route("/draft", post(handlers::generate_draft))
            .route("/save-draft", post(handlers::save_draft))
            .route("/documents", get(handlers::list_documents))
            .route("/documents/:id", delete(handlers::delete_document))
            .route("/documents/:id/download", get(handlers::download_document))
            .route(
                "/documents/:id/submission",
                get(handlers::view_submission),
            )
            .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 1024))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.state.store.clone()
    }

    pub fn auth(&self) -> &AuthService {
        &self.state.auth
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
