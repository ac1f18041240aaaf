use std::sync::Arc;
use submission_service::config::ServiceConfig;
use submission_service::models::{Document, ExtractedText};
use submission_service::services::{AuthService, DocumentStore};
use submission_service::startup::Application;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: Arc<dyn DocumentStore>,
    pub storage_path: String,
    auth: AuthService,
}

impl TestApp {
    pub async fn spawn() -> Self {
        std::env::set_var("DATABASE_BACKEND", "memory");
        std::env::set_var("CONVERT_PROVIDER", "mock");
        std::env::set_var("COMPLETION_PROVIDER", "mock");
        std::env::set_var("JWT_SECRET", "test-jwt-secret");
        std::env::set_var("SIGNING_SECRET", "test-signing-secret");

        let storage_path = format!("target/test-storage-{}", Uuid::new_v4());

        let mut config = ServiceConfig::load().expect("Failed to load configuration");
        config.common.port = 0; // Random port for testing
        config.storage.local_path = storage_path.clone();

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let store = app.store();
        let auth = app.auth().clone();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("http://127.0.0.1:{}/health", port);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            store,
            storage_path,
            auth,
        }
    }

    /// Mint a bearer token for a test user.
    pub fn token_for(&self, user_id: Uuid, email: &str) -> String {
        self.auth
            .generate_access_token(user_id, email)
            .expect("Failed to mint test token")
    }

    /// Insert a document directly into the store, bypassing the pipeline.
    pub async fn seed_document(&self, user_id: Uuid, file_name: &str) -> Document {
        let document = Document::new(
            user_id,
            file_name.to_string(),
            format!("{}/seed-{}", user_id, file_name),
            64,
            ExtractedText::single_page("Insured: Seeded Co\nEffective: 01/01/2025".to_string()),
        );
        self.store
            .insert(&document)
            .await
            .expect("Failed to seed document");
        document
    }

    /// Cleanup test resources (local blob storage).
    pub async fn cleanup(&self) {
        let _ = tokio::fs::remove_dir_all(&self.storage_path).await;
    }
}
