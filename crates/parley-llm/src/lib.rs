pub mod types;
pub mod traits;
pub mod streaming;
pub mod buffer_utils;
pub mod config;
pub mod registry;
pub mod openai;
pub mod gemini;

pub use traits::{ChatClient, ChatRequest, ChatOptions};

pub use streaming::{
    estimate_tokens, normalize, stream_completion,
    CompletionEvent, CompletionStream, EventStream, StreamEvent,
};
pub use buffer_utils::CircularLineBuffer;
pub use config::{ClientFactory, ProviderConfig, ProviderCredentials, ProviderType, VendorConfig};
pub use registry::{ProviderDescriptor, ProviderRegistry, ProviderRegistryBuilder};
pub use openai::OpenAIClient;
pub use gemini::GeminiClient;
pub use types::Message;
