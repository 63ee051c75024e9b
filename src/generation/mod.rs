//! Generation collaborator: prompt construction and the backend trait.
//!
//! The retrieval core never presents text to a user; it hands an assembled,
//! attributed context to a [`GenerationService`] and returns whatever the
//! model says. [`OllamaGenerator`] is the shipped reference backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::RetrievalError;

/// Text-generation collaborator.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, RetrievalError>;
}

/// Builds the grounded-QA prompt from an assembled context block and the
/// user's question.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a question answering assistant. Answer the question using \
         the context below. If the context does not contain enough \
         information to answer, say that you do not know. Keep the answer \
         concise, professional, and accurate.\n\n\
         Context:\n{context}\n\n\
         Question:\n{question}\n\n\
         Answer:"
    )
}

/// Ollama generation client (`POST /api/generate`, non-streaming).
#[derive(Clone, Debug)]
pub struct OllamaGenerator {
    client: Client,
    base_url: Url,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaGenerator {
    /// Builds a client for the given Ollama endpoint and model name.
    ///
    /// Temperature is kept low so answers stay grounded in the provided
    /// context instead of wandering.
    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self, RetrievalError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| RetrievalError::Generation(format!("invalid base url: {err}")))?;
        Ok(Self {
            client: Client::new(),
            base_url,
            model: model.into(),
            temperature: 0.05,
        })
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl GenerationService for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, RetrievalError> {
        let endpoint = self
            .base_url
            .join("api/generate")
            .map_err(|err| RetrievalError::Generation(err.to_string()))?;
        let response = self
            .client
            .post(endpoint)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
                options: GenerateOptions {
                    temperature: self.temperature,
                },
            })
            .send()
            .await
            .map_err(|err| RetrievalError::Generation(err.to_string()))?
            .error_for_status()
            .map_err(|err| RetrievalError::Generation(err.to_string()))?;
        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|err| RetrievalError::Generation(err.to_string()))?;
        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_context_and_question() {
        let prompt = build_prompt("[1] manual.pdf (page 3)\nchunk text", "How do I charge?");
        assert!(prompt.contains("Context:\n[1] manual.pdf (page 3)\nchunk text"));
        assert!(prompt.contains("Question:\nHow do I charge?"));
        assert!(prompt.ends_with("Answer:"));
    }
}
