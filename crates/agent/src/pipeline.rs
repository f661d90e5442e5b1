//! The conversation pipeline: a two-stage workflow over a typed state.
//!
//! ```text
//! START ──▶ ANSWER ──▶ DONE
//! ```
//!
//! **START** makes sure the state carries a History (an empty one if the
//! caller had none). **ANSWER** renders the answer prompt, calls the model
//! once and appends the user/assistant exchange to the History.
//!
//! The pipeline only ever works on the History it was handed by value, so a
//! failed invocation cannot leave a half-updated History behind.

use std::sync::Arc;
use std::time::Duration;

use ragchat_config::AppConfig;
use ragchat_core::error::{Error, ProviderError, StateError};
use ragchat_core::message::History;
use ragchat_core::provider::{Provider, ProviderRequest};
use tracing::{debug, info};

use crate::prompt::answer_prompt;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Answer,
    Done,
}

/// The record flowing through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineState {
    pub user_message: String,
    pub chat_history: Option<History>,
    pub bot_response: Option<String>,
}

impl PipelineState {
    pub fn new(user_message: impl Into<String>, chat_history: Option<History>) -> Self {
        Self {
            user_message: user_message.into(),
            chat_history,
            bot_response: None,
        }
    }

    /// Which stage this state is ready to enter.
    pub fn stage(&self) -> Stage {
        match (&self.chat_history, &self.bot_response) {
            (None, _) => Stage::Start,
            (Some(_), None) => Stage::Answer,
            (Some(_), Some(_)) => Stage::Done,
        }
    }

    /// Split a finished state into the model's answer and the updated History.
    pub fn into_output(self) -> Result<(String, History), StateError> {
        match (self.bot_response, self.chat_history) {
            (Some(response), Some(history)) => Ok((response, history)),
            _ => Err(StateError::MalformedPayload(
                "pipeline state is not finished".into(),
            )),
        }
    }
}

/// Model parameters and limits for the ANSWER stage.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub model: String,
    pub system_prompt: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.default_model.clone(),
            system_prompt: config.system_prompt.clone(),
            temperature: config.default_temperature,
            top_p: config.default_top_p,
            max_tokens: config.default_max_tokens,
            timeout: Duration::from_secs(config.timeouts.model_secs),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Runs START then ANSWER against a language model.
pub struct ConversationPipeline {
    provider: Arc<dyn Provider>,
    settings: PipelineSettings,
}

impl ConversationPipeline {
    pub fn new(provider: Arc<dyn Provider>, settings: PipelineSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// START: ensure a History is present.
    pub fn start(mut state: PipelineState) -> PipelineState {
        if state.chat_history.is_none() {
            debug!("START: no history, initializing empty");
            state.chat_history = Some(History::new());
        }
        state
    }

    /// ANSWER: call the model and append the exchange.
    pub async fn answer(&self, state: PipelineState) -> Result<PipelineState, Error> {
        if state.bot_response.is_some() {
            return Err(StateError::MalformedPayload(
                "ANSWER received a state that already has a response".into(),
            )
            .into());
        }
        let history = state.chat_history.ok_or_else(|| {
            StateError::MalformedPayload("ANSWER received a state without history".into())
        })?;

        let prompt = answer_prompt(&self.settings.system_prompt, &history, &state.user_message);
        let mut request = ProviderRequest::prompt(&self.settings.model, prompt);
        request.temperature = self.settings.temperature;
        request.top_p = Some(self.settings.top_p);
        request.max_tokens = Some(self.settings.max_tokens);

        debug!(
            provider = self.provider.name(),
            model = %self.settings.model,
            history_turns = history.len(),
            "ANSWER: calling model"
        );

        let response = tokio::time::timeout(self.settings.timeout, self.provider.complete(request))
            .await
            .map_err(|_| {
                ProviderError::Timeout(format!(
                    "model call exceeded {}s",
                    self.settings.timeout.as_secs()
                ))
            })??;

        info!(
            model = %response.model,
            response_len = response.content.len(),
            "ANSWER: model responded"
        );

        let chat_history = history.with_exchange(&state.user_message, &response.content);
        Ok(PipelineState {
            user_message: state.user_message,
            chat_history: Some(chat_history),
            bot_response: Some(response.content),
        })
    }

    /// Run both stages and return the finished state.
    pub async fn invoke(&self, state: PipelineState) -> Result<PipelineState, Error> {
        let state = Self::start(state);
        let state = self.answer(state).await?;
        debug_assert_eq!(state.stage(), Stage::Done);
        Ok(state)
    }

    /// Convenience wrapper: answer `user_message` given `history`.
    ///
    /// Returns the model's answer and the extended History; `history` itself
    /// is left untouched.
    pub async fn run(&self, user_message: &str, history: &History) -> Result<(String, History), Error> {
        let state = PipelineState::new(user_message, Some(history.clone()));
        Ok(self.invoke(state).await?.into_output()?)
    }
}
