// * Configuration: compile-time constants and the runtime settings file

pub mod constants;
pub mod settings;

pub use settings::{
    check_credential, ConfigError, GenerationSettings, PipelineSettings, ProviderKind,
    ProviderSettings, RuleSettings, Settings, StyleSettings,
};
