use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub convert: ConvertConfig,
    pub completion: CompletionConfig,
    pub auth: AuthConfig,
    pub signature: SignatureConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub local_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConvertConfig {
    pub provider: ConvertProvider,
    pub base_url: String,
    pub secret: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConvertProvider {
    ConvertApi,
    Mock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionConfig {
    pub provider: CompletionProviderKind,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CompletionProviderKind {
    OpenAi,
    Mock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_expiry_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignatureConfig {
    pub signing_secret: String,
    pub url_ttl_seconds: i64,
}

impl ServiceConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common = core_config::Config::load()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let database_backend: DatabaseBackend = get_env("DATABASE_BACKEND", Some("memory"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let database_url = match database_backend {
            DatabaseBackend::Postgres => Some(get_env("DATABASE_URL", None, is_prod)?),
            DatabaseBackend::Memory => env::var("DATABASE_URL").ok(),
        };

        let convert_provider: ConvertProvider = get_env("CONVERT_PROVIDER", Some("mock"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let convert_secret = match convert_provider {
            ConvertProvider::ConvertApi => get_env("CONVERTAPI_SECRET", None, is_prod)?,
            ConvertProvider::Mock => env::var("CONVERTAPI_SECRET").unwrap_or_default(),
        };

        let completion_provider: CompletionProviderKind =
            get_env("COMPLETION_PROVIDER", Some("mock"), is_prod)?
                .parse()
                .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let completion_api_key = match completion_provider {
            CompletionProviderKind::OpenAi => get_env("OPENAI_API_KEY", None, is_prod)?,
            CompletionProviderKind::Mock => env::var("OPENAI_API_KEY").unwrap_or_default(),
        };

        Ok(ServiceConfig {
            common,
            database: DatabaseConfig {
                backend: database_backend,
                url: database_url,
            },
            storage: StorageConfig {
                local_path: get_env("STORAGE_LOCAL_PATH", Some("storage"), is_prod)?,
            },
            convert: ConvertConfig {
                provider: convert_provider,
                base_url: get_env(
                    "CONVERTAPI_BASE_URL",
                    Some("https://v2.convertapi.com"),
                    is_prod,
                )?,
                secret: convert_secret,
            },
            completion: CompletionConfig {
                provider: completion_provider,
                api_key: completion_api_key,
                model: get_env("OPENAI_MODEL", Some("gpt-4o"), is_prod)?,
                base_url: get_env(
                    "OPENAI_BASE_URL",
                    Some("https://api.openai.com/v1"),
                    is_prod,
                )?,
            },
            auth: AuthConfig {
                jwt_secret: get_env("JWT_SECRET", Some("local-dev-secret"), is_prod)?,
                access_token_expiry_minutes: get_env(
                    "ACCESS_TOKEN_EXPIRY_MINUTES",
                    Some("30"),
                    is_prod,
                )?
                .parse()
                .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid expiry: {}", e)))?,
            },
            signature: SignatureConfig {
                signing_secret: get_env("SIGNING_SECRET", Some("local-signing-secret"), is_prod)?,
                url_ttl_seconds: get_env("DOWNLOAD_URL_TTL_SECONDS", Some("3600"), is_prod)?
                    .parse()
                    .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid TTL: {}", e)))?,
            },
        })
    }
}

impl std::str::FromStr for DatabaseBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" => Ok(DatabaseBackend::Postgres),
            "memory" => Ok(DatabaseBackend::Memory),
            _ => Err(format!("Invalid database backend: {}", s)),
        }
    }
}

impl std::str::FromStr for ConvertProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "convertapi" => Ok(ConvertProvider::ConvertApi),
            "mock" => Ok(ConvertProvider::Mock),
            _ => Err(format!("Invalid conversion provider: {}", s)),
        }
    }
}

impl std::str::FromStr for CompletionProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(CompletionProviderKind::OpenAi),
            "mock" => Ok(CompletionProviderKind::Mock),
            _ => Err(format!("Invalid completion provider: {}", s)),
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}
