//! Process bootstrap: configuration, registry and collaborators.
//!
//! Everything is built once here and handed to the use cases as
//! `Arc<dyn Trait>`; nothing below this layer reaches for globals.

use anyhow::{Context, Result, anyhow};
use notigenie_application::{Orchestrator, PipelineComponents, TodoDigest};
use notigenie_core::config::{AppConfig, SecretConfig, SessionBackend};
use notigenie_core::conversation::SessionStore;
use notigenie_core::formatter::OperationFormatter;
use notigenie_core::llm::LanguageModel;
use notigenie_core::schema::SchemaRegistry;
use notigenie_core::secret::SecretService;
use notigenie_core::store::RecordStore;
use notigenie_infrastructure::{
    ConfigService, FileSessionStore, JsonDirSchemaSource, MemorySessionStore, NotiPaths,
    SecretServiceImpl,
};
use notigenie_interaction::{GeminiLanguageModel, NotionStore};
use std::path::Path;
use std::sync::Arc;

pub struct AppBootstrap {
    pub paths: NotiPaths,
    pub config: AppConfig,
    pub registry: Arc<SchemaRegistry>,
    secrets: SecretConfig,
}

impl AppBootstrap {
    /// Loads configuration, secrets and the schema registry.
    ///
    /// A broken config file is fatal; an unreadable schema directory only
    /// leaves the registry empty.
    pub async fn load(config_file: Option<&Path>) -> Result<Self> {
        let (paths, config_service) = match config_file {
            Some(file) => (
                NotiPaths::from_config_file(file)?,
                ConfigService::new(file.to_path_buf()),
            ),
            None => {
                let paths = NotiPaths::new(None)?;
                let service = ConfigService::from_paths(&paths);
                (paths, service)
            }
        };

        let config = config_service
            .load()
            .with_context(|| format!("Failed to load {}", config_service.path().display()))?;
        tracing::debug!("[Bootstrap] Config loaded from {:?}", config_service.path());

        let secrets = SecretServiceImpl::new(paths.secret_file())
            .load_secrets()
            .await
            .context("Failed to load secrets")?;

        let schemas_dir = paths.schemas_dir(&config);
        tracing::debug!("[Bootstrap] Loading schemas from {:?}", schemas_dir);
        let registry = Arc::new(SchemaRegistry::load(&JsonDirSchemaSource::new(schemas_dir)).await);

        Ok(Self {
            paths,
            config,
            registry,
            secrets,
        })
    }

    pub fn formatter(&self) -> Arc<OperationFormatter> {
        Arc::new(OperationFormatter::new(
            self.registry.clone(),
            self.config.formatter.default_title_property.clone(),
        ))
    }

    pub fn language_model(&self) -> Result<Arc<dyn LanguageModel>> {
        let key = self.secrets.gemini_key().ok_or_else(|| {
            anyhow!(
                "Gemini API key missing: set GEMINI_API_KEY or add it to {}",
                self.paths.secret_file().display()
            )
        })?;
        Ok(Arc::new(GeminiLanguageModel::new(key, &self.config.llm)?))
    }

    pub fn record_store(&self) -> Result<Arc<dyn RecordStore>> {
        let key = self.secrets.notion_key().ok_or_else(|| {
            anyhow!(
                "Notion API key missing: set NOTION_API_KEY or add it to {}",
                self.paths.secret_file().display()
            )
        })?;
        Ok(Arc::new(NotionStore::new(key, &self.config.notion)?))
    }

    pub fn session_store(&self) -> Arc<dyn SessionStore> {
        match self.config.session.backend {
            SessionBackend::File => {
                let dir = self.paths.conversations_dir(&self.config);
                tracing::debug!("[Bootstrap] Conversations stored in {:?}", dir);
                Arc::new(FileSessionStore::new(dir))
            }
            SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
        }
    }

    /// Builds the full request pipeline.
    pub async fn orchestrator(&self) -> Result<Orchestrator> {
        let llm = self.language_model()?;
        let store = self.record_store()?;

        if let Err(e) = store.validate_connection().await {
            tracing::warn!("[Bootstrap] Record store connection check failed: {}", e);
        }

        let components = PipelineComponents::assemble(
            llm,
            store,
            self.session_store(),
            self.registry.clone(),
            &self.config,
        )?;
        Ok(Orchestrator::new(components, self.config.pipeline.clone()))
    }

    pub fn digest(&self) -> Result<TodoDigest> {
        Ok(TodoDigest::new(
            self.formatter(),
            self.record_store()?,
            self.config.digest.clone(),
        ))
    }
}
