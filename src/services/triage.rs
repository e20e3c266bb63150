// Maintenance request triage
// Classification never blocks a write: any failure degrades to medium priority.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::app_config::AiConfig;
use crate::models::{MaintenanceChanges, Priority};
use crate::store::{Store, StoreError};

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Debug, Error)]
pub enum TriageError {
    #[error("Classifier is not configured")]
    NotConfigured,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Classifier returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Unparsable classifier reply: {0:?}")]
    Unparsable(String),
}

pub const FALLBACK_PRIORITY: Priority = Priority::Medium;

const SYSTEM_PROMPT: &str = "You triage maintenance requests for rental properties. \
Reply with exactly one word: low, medium or high. \
High means safety risk, no water, no heat, flooding or a lockout. \
Low means cosmetic or non-urgent.";

#[async_trait]
pub trait PriorityClassifier: Send + Sync {
    async fn classify(&self, description: &str) -> Result<Priority, TriageError>;
}

// =============================================================================
// CHAT COMPLETION CLASSIFIER
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// OpenAI-compatible chat completion client
pub struct OpenAiClassifier {
    http_client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiClassifier {
    pub fn new(config: &AiConfig, api_key: String) -> Result<Self, TriageError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl PriorityClassifier for OpenAiClassifier {
    async fn classify(&self, description: &str) -> Result<Priority, TriageError> {
        let body = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            max_tokens: 5,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: description,
                },
            ],
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TriageError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response.json().await?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Priority::parse_loose(&content).ok_or(TriageError::Unparsable(content))
    }
}

/// Used when no AI key is configured
pub struct DisabledClassifier;

#[async_trait]
impl PriorityClassifier for DisabledClassifier {
    async fn classify(&self, _description: &str) -> Result<Priority, TriageError> {
        Err(TriageError::NotConfigured)
    }
}

pub fn classifier_from_config(config: &AiConfig) -> Result<Arc<dyn PriorityClassifier>, TriageError> {
    match &config.api_key {
        Some(key) => Ok(Arc::new(OpenAiClassifier::new(config, key.clone())?)),
        None => {
            info!("AI_API_KEY not set, maintenance triage falls back to medium");
            Ok(Arc::new(DisabledClassifier))
        },
    }
}

// =============================================================================
// TRIAGE
// =============================================================================

/// Classify `description`, degrading to medium on any failure
pub async fn triage(classifier: &dyn PriorityClassifier, description: &str) -> Priority {
    match classifier.classify(description).await {
        Ok(priority) => priority,
        Err(TriageError::NotConfigured) => FALLBACK_PRIORITY,
        Err(e) => {
            warn!("Triage failed, using {}: {}", FALLBACK_PRIORITY, e);
            FALLBACK_PRIORITY
        },
    }
}

/// Assign a priority to every request of the realtor that has none
#[instrument(skip(store, classifier))]
pub async fn backfill_priorities(
    store: &dyn Store,
    classifier: &dyn PriorityClassifier,
    realtor_id: &str,
) -> Result<usize, StoreError> {
    let pending = store.list_unclassified_maintenance(realtor_id).await?;
    let mut classified = 0;

    for request in pending {
        let priority = triage(classifier, &request.description).await;
        match store
            .update_maintenance(realtor_id, request.id, MaintenanceChanges::priority_only(priority))
            .await
        {
            Ok(Some(_)) => classified += 1,
            Ok(None) => {},
            Err(e) => warn!("Failed to store priority for request {}: {}", request.id, e),
        }
    }

    info!("Classified {} maintenance requests", classified);
    Ok(classified)
}
