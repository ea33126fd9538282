pub mod factory;
pub mod gemini;
mod gemini_types;
pub mod http_client;
pub mod openai;
pub mod reliable;
pub mod scrub;
pub mod traits;
pub mod types;

pub use factory::{ProviderOptions, create_provider, create_resilient_provider};
pub use scrub::{sanitize_api_error, scrub_secret_patterns};
pub use traits::{Provider, ProviderFuture};
pub use types::{MessageRole, ProviderMessage, TaskKind};
