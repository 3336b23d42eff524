pub mod defaults;
pub mod paths;
pub mod settings;
pub mod validation;

pub use paths::AppPaths;
pub use settings::{GeneratorSettings, IngestBackend, Settings};
pub use validation::ConfigError;
