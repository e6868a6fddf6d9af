// SPDX-License-Identifier: GPL-3.0

//! Example sentences and explanations for the studied word, fetched from a generative text
//! service. Only the latest request may update the panel: starting a new one or clearing the
//! panel cancels whatever is still in flight.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::app::core::{config::Config, models::Language};

pub mod gemini;

pub use gemini::GeminiProvider;

/// What the service returns for one word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordContext {
    pub sample_sentence: String,
    pub sentence_translation: String,
    pub explanation: String,
}

/// Fields of the structured response, the service is asked for exactly these
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextField {
    SampleSentence,
    SentenceTranslation,
    Explanation,
}

impl ContextField {
    pub const ALL: [Self; 3] = [
        Self::SampleSentence,
        Self::SentenceTranslation,
        Self::Explanation,
    ];

    /// JSON key of the field
    pub fn key(self) -> &'static str {
        match self {
            ContextField::SampleSentence => "sampleSentence",
            ContextField::SentenceTranslation => "sentenceTranslation",
            ContextField::Explanation => "explanation",
        }
    }

    /// Instruction attached to the field in the response schema
    pub fn description(self, language: Language) -> String {
        match self {
            ContextField::SampleSentence => {
                format!("A simple sample sentence in {language} using the word.")
            }
            ContextField::SentenceTranslation => {
                String::from("The English translation of the sample sentence.")
            }
            ContextField::Explanation => {
                String::from("A brief, simple explanation of the word's meaning or usage.")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("API key not configured. Add a Gemini API key in the settings.")]
    NotConfigured,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("could not parse the response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no response text received")]
    Empty,
    #[error("the request timed out after {0:?}")]
    Timeout(Duration),
}

/// A generative text service able to describe a word
#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// Ask for the context of `word` and return the raw response text
    async fn generate(&self, word: &str, language: Language) -> Result<String, ContextError>;
}

/// Removes code-fence markup the model sometimes wraps around its JSON
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // drop the info string, e.g. `json`
        text = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parse the raw response text into a [`WordContext`]
pub fn parse_context(raw: &str) -> Result<WordContext, ContextError> {
    let text = strip_code_fence(raw);
    if text.is_empty() {
        return Err(ContextError::Empty);
    }

    match serde_json::from_str(text) {
        Ok(context) => Ok(context),
        Err(e) => {
            // Fall back to the outermost object when prose surrounds it
            let object = text
                .find('{')
                .zip(text.rfind('}'))
                .filter(|(start, end)| start < end)
                .map(|(start, end)| &text[start..=end]);
            match object {
                Some(object) if object.len() < text.len() => Ok(serde_json::from_str(object)?),
                _ => Err(ContextError::Json(e)),
            }
        }
    }
}

/// Fetch the context of one word.
///
/// Returns `Ok(None)` when `token` is cancelled before the response arrives; that is not an
/// error. Running past `timeout` is.
pub async fn fetch_context(
    provider: &dyn ContextProvider,
    word: &str,
    language: Language,
    token: &CancellationToken,
    timeout: Duration,
) -> Result<Option<WordContext>, ContextError> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Ok(None),
        result = tokio::time::timeout(timeout, provider.generate(word, language)) => {
            let raw = result.map_err(|_| ContextError::Timeout(timeout))??;
            parse_context(&raw).map(Some)
        }
    }
}

/// State of the enrichment panel shown next to the current card
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum ContextPanel {
    #[default]
    Idle,
    Loading {
        word: String,
    },
    Ready {
        word: String,
        context: WordContext,
    },
    Failed {
        word: String,
        message: String,
    },
}

/// Runs enrichment requests so that only the latest one can update the [`ContextPanel`]
pub struct ContextFetcher {
    provider: Option<Arc<dyn ContextProvider>>,
    timeout: Duration,
    generation: Arc<AtomicU64>,
    token: Option<CancellationToken>,
    panel: Arc<watch::Sender<ContextPanel>>,
}

impl ContextFetcher {
    /// Init a new [`ContextFetcher`] backed by `provider`
    pub fn new(provider: Arc<dyn ContextProvider>, timeout: Duration) -> Self {
        Self::build(Some(provider), timeout)
    }

    /// A fetcher without a provider, every request fails as not configured
    pub fn disabled() -> Self {
        Self::build(None, Duration::from_secs(15))
    }

    /// Gemini backed fetcher when an api key is configured, disabled otherwise
    pub fn from_config(config: &Config) -> Self {
        match config.api_key() {
            Some(key) => Self::new(
                Arc::new(GeminiProvider::new(key, config.enrichment_timeout())),
                config.enrichment_timeout(),
            ),
            None => Self::disabled(),
        }
    }

    fn build(provider: Option<Arc<dyn ContextProvider>>, timeout: Duration) -> Self {
        let (panel, _) = watch::channel(ContextPanel::Idle);
        Self {
            provider,
            timeout,
            generation: Arc::new(AtomicU64::new(0)),
            token: None,
            panel: Arc::new(panel),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Current panel state
    pub fn panel(&self) -> ContextPanel {
        self.panel.borrow().clone()
    }

    /// Watch panel changes, e.g. to re-render when a response lands
    pub fn subscribe(&self) -> watch::Receiver<ContextPanel> {
        self.panel.subscribe()
    }

    /// Start fetching the context of `word`, abandoning any previous request.
    ///
    /// Must be called inside a tokio runtime. Returns the handle of the spawned request, or
    /// [`None`] when enrichment is not configured.
    pub fn request(&mut self, word: &str, language: Language) -> Option<JoinHandle<()>> {
        self.cancel();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let word = word.to_string();

        let Some(provider) = self.provider.clone() else {
            self.panel.send_replace(ContextPanel::Failed {
                word,
                message: ContextError::NotConfigured.to_string(),
            });
            return None;
        };

        let token = CancellationToken::new();
        self.token = Some(token.clone());
        self.panel
            .send_replace(ContextPanel::Loading { word: word.clone() });

        let timeout = self.timeout;
        let current = Arc::clone(&self.generation);
        let panel = Arc::clone(&self.panel);

        Some(tokio::spawn(async move {
            let next = match fetch_context(provider.as_ref(), &word, language, &token, timeout).await
            {
                Ok(Some(context)) => ContextPanel::Ready { word, context },
                Ok(None) => return,
                Err(e) => {
                    tracing::warn!(word = %word, "AI context error: {e}");
                    ContextPanel::Failed {
                        word,
                        message: e.to_string(),
                    }
                }
            };

            panel.send_if_modified(|state| {
                if current.load(Ordering::SeqCst) != generation {
                    return false;
                }
                *state = next;
                true
            });
        }))
    }

    /// Abandon the in-flight request without touching the panel
    pub fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }

    /// Abandon the in-flight request and empty the panel, used when the studied word changes
    pub fn clear(&mut self) {
        self.cancel();
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.panel.send_replace(ContextPanel::Idle);
    }
}

impl Drop for ContextFetcher {
    fn drop(&mut self) {
        self.cancel();
    }
}
