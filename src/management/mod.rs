mod export;
mod secret;

pub use export::ANALYSIS_FILE;
pub use export::ExportManager;
pub use export::TRACK_DIR;
pub use export::URIS_FILE;
pub use secret::SecretManager;
