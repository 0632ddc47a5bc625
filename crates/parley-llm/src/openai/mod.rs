mod client;

pub use client::{OpenAIClient, OPENAI_MODELS};
