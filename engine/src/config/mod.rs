// Engine configuration: defaults, JSON file, CLI overrides
pub mod settings;

pub use settings::EngineSettings;
