//! The seam between the chat pipeline and a language model.

use std::future::Future;

use crate::client::LlmClient;
use crate::error::LlmError;
use crate::types::GenerationOptions;

/// Single-turn text generation: one system message, one user message, one
/// reply.
///
/// [`LlmClient`] is the production implementation. Tests implement this
/// with canned replies.
pub trait TextGenerator: Send + Sync {
    /// Produce a reply to `user` under the instructions in `system`.
    fn generate(
        &self,
        system: &str,
        user: &str,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;

    /// Like [`generate`](Self::generate), with per-call temperature and
    /// token-limit overrides. Generators without such knobs ignore them.
    fn generate_with(
        &self,
        system: &str,
        user: &str,
        options: GenerationOptions,
    ) -> impl Future<Output = Result<String, LlmError>> + Send {
        let _ = options;
        self.generate(system, user)
    }
}

impl TextGenerator for LlmClient {
    async fn generate(&self, system: &str, user: &str) -> Result<String, LlmError> {
        self.generate_with(system, user, GenerationOptions::default()).await
    }

    async fn generate_with(
        &self,
        system: &str,
        user: &str,
        options: GenerationOptions,
    ) -> Result<String, LlmError> {
        let request = self.request(system, user).with_options(options);
        let response = self.complete(&request).await?;
        Ok(response.text)
    }
}

impl<T: TextGenerator> TextGenerator for &T {
    fn generate(
        &self,
        system: &str,
        user: &str,
    ) -> impl Future<Output = Result<String, LlmError>> + Send {
        (**self).generate(system, user)
    }

    fn generate_with(
        &self,
        system: &str,
        user: &str,
        options: GenerationOptions,
    ) -> impl Future<Output = Result<String, LlmError>> + Send {
        (**self).generate_with(system, user, options)
    }
}

impl<T: TextGenerator> TextGenerator for std::sync::Arc<T> {
    fn generate(
        &self,
        system: &str,
        user: &str,
    ) -> impl Future<Output = Result<String, LlmError>> + Send {
        (**self).generate(system, user)
    }

    fn generate_with(
        &self,
        system: &str,
        user: &str,
        options: GenerationOptions,
    ) -> impl Future<Output = Result<String, LlmError>> + Send {
        (**self).generate_with(system, user, options)
    }
}
