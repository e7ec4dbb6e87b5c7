pub mod adapters;
pub mod client;
pub mod errors;
pub mod outcome;
pub mod prompt;
pub mod provider;
pub mod style;

pub use adapters::{adapter_for, GenerationParams, ResponseAdapter};
pub use client::{GenerateFuture, Generated, GenerationClient, TextGenerator};
pub use errors::EndpointError;
pub use outcome::GenerationOutcome;
pub use prompt::{clean_generated_text, truncate_chars, PromptBuilder};
pub use provider::{AuthStyle, EndpointSpec, ProviderSpec, ResponseFamily};
pub use style::{load_style_examples, resolve_style_examples};
