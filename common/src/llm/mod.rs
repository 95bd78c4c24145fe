pub mod model;

#[cfg(test)]
pub(crate) mod testing;

pub use model::{Content, GeminiClient, GenerateContentRequest, GenerateContentResponse, Part, TextGenerator};
