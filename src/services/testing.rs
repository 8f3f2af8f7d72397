//! Scripted LLM provider for unit tests.

use crate::llm::LlmProvider;
use crate::{Error, Result};
use std::sync::{Arc, Mutex};

/// Replies with a fixed response (or error) and records every prompt.
pub struct ScriptedLlm {
    reply: std::result::Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(cause: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(cause.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_user_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(|cause| Error::OperationFailed {
            operation: "scripted_request".to_string(),
            cause,
        })
    }

    fn complete_with_system(&self, _system: &str, user: &str) -> Result<String> {
        self.complete(user)
    }
}
