pub mod capture_pipeline;
pub mod logger;
pub mod settings;
