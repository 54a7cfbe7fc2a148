pub mod generator;
pub mod response;
pub mod traits;

pub use generator::{
    ContentGenerator, GeneratedText, GenerationMetadata, GenerationOptions, ProviderGenerator,
};
pub use response::ProviderResponse;
pub use traits::Provider;
