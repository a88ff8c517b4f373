//! Host collaborator boundary
//!
//! The bridge never stores keys, shows UI or reads host settings itself. It
//! talks to the host through these traits.

use crate::config::SecretString;
use crate::protocol::ResponsePart;
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc::UnboundedSender;

/// Secret storage for the API key
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// The stored key, if any
    async fn get(&self) -> Option<SecretString>;

    /// Ask the user for a key and store it; `None` when the user declines
    async fn prompt_and_store(&self) -> Option<SecretString>;

    /// Forget the stored key
    async fn delete(&self);
}

/// Host settings listing which models the user enabled
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    async fn enabled_models(&self) -> Vec<String>;
}

/// Receiver of response parts as they are produced
pub trait ResponseSink: Send {
    fn report(&mut self, part: ResponsePart);
}

impl ResponseSink for Vec<ResponsePart> {
    fn report(&mut self, part: ResponsePart) {
        self.push(part);
    }
}

impl ResponseSink for UnboundedSender<ResponsePart> {
    fn report(&mut self, part: ResponsePart) {
        // A closed receiver means the host stopped listening
        let _ = self.send(part);
    }
}

/// In-memory key store, for embedding hosts without a secret vault
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    stored: Mutex<Option<SecretString>>,
    prompt_answer: Option<SecretString>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a stored key
    pub fn with_key(key: impl Into<SecretString>) -> Self {
        Self {
            stored: Mutex::new(Some(key.into())),
            prompt_answer: None,
        }
    }

    /// Key returned when the user is prompted
    pub fn with_prompt_answer(mut self, key: impl Into<SecretString>) -> Self {
        self.prompt_answer = Some(key.into());
        self
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<SecretString>> {
        self.stored.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn get(&self) -> Option<SecretString> {
        self.slot().clone()
    }

    async fn prompt_and_store(&self) -> Option<SecretString> {
        let answer = self.prompt_answer.clone()?;
        *self.slot() = Some(answer.clone());
        Some(answer)
    }

    async fn delete(&self) {
        *self.slot() = None;
    }
}

/// Fixed list of enabled models
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog(pub Vec<String>);

#[async_trait]
impl ModelCatalog for StaticCatalog {
    async fn enabled_models(&self) -> Vec<String> {
        self.0.clone()
    }
}
