pub mod openai;
pub mod provider;
pub mod types;

pub use openai::OpenAiCompatGenerator;
pub use provider::Generator;
pub use types::{ChatMessage, GenerationParams};
