pub mod config_service;
pub mod dto;
pub mod file_session_store;
pub mod json_dir_schema_source;
pub mod memory_session_store;
pub mod paths;
pub mod secret_service;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::file_session_store::FileSessionStore;
pub use crate::json_dir_schema_source::JsonDirSchemaSource;
pub use crate::memory_session_store::MemorySessionStore;
pub use crate::paths::NotiPaths;
pub use crate::secret_service::SecretServiceImpl;
