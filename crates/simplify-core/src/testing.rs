//! Scripted completion service for tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::cleanup::PRIMARY_MARKER;
use crate::llm::{CompletionRequest, CompletionService, LlmError};

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Error(LlmError),
    /// Answer with the primary text of the prompt, prefixed with "Plain: "
    Echo,
}

type Responder = Box<dyn Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync>;

pub struct ScriptedCompletion {
    script: Mutex<VecDeque<Reply>>,
    fallback: Option<Reply>,
    responder: Option<Responder>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedCompletion {
    /// Replies in order; calls past the end of the script fail with a 500
    pub fn new(script: Vec<Reply>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            responder: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Same reply to every call
    pub fn always(reply: Reply) -> Self {
        Self {
            fallback: Some(reply),
            ..Self::new(Vec::new())
        }
    }

    /// Reply computed from each request
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            responder: Some(Box::new(f)),
            ..Self::new(Vec::new())
        }
    }

    /// Wait before every reply
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Option<Reply> {
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        script.pop_front().or_else(|| self.fallback.clone())
    }
}

/// Text the prompt asks to simplify: between the last marker and the answer slot
pub fn primary_from_prompt(prompt: &str) -> &str {
    let after = prompt
        .rfind(PRIMARY_MARKER)
        .map(|pos| &prompt[pos + PRIMARY_MARKER.len()..])
        .unwrap_or(prompt);
    after
        .split("\n\nSIMPLIFIED TEXT:")
        .next()
        .unwrap_or(after)
        .trim()
}

/// Reply in the shape the simplifier asks for
pub fn echo(request: &CompletionRequest) -> String {
    format!("{}\nPlain: {}", PRIMARY_MARKER, primary_from_prompt(&request.prompt))
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(responder) = &self.responder {
            return responder(request);
        }

        match self.next_reply() {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Error(e)) => Err(e),
            Some(Reply::Echo) => Ok(echo(request)),
            None => Err(LlmError::Status {
                code: 500,
                body: "script exhausted".to_string(),
            }),
        }
    }
}
