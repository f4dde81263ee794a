//! In-memory model client for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tokio::sync::Semaphore;

use crate::model::{ModelClient, ModelRequest};
use crate::{Error, Result};

/// Canned answer for [`ScriptedModel`].
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Empty,
    Fail(String),
}

/// Model client that returns a scripted reply and records every call.
///
/// When gated, each call waits for one permit from [`ScriptedModel::release`].
pub struct ScriptedModel {
    reply: Mutex<Reply>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ModelRequest>>,
    gate: Option<Semaphore>,
}

impl ScriptedModel {
    pub fn replying(text: &str) -> Self {
        Self::new(Reply::Text(text.to_string()), false)
    }

    pub fn new(reply: Reply, gated: bool) -> Self {
        Self {
            reply: Mutex::new(reply),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            gate: gated.then(|| Semaphore::new(0)),
        }
    }

    pub fn set_reply(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }

    /// Let one pending call finish.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ModelRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl ModelClient for ScriptedModel {
    async fn converse(&self, request: ModelRequest) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        let reply = self.reply.lock().unwrap().clone();
        match reply {
            Reply::Text(text) => Ok(Some(text)),
            Reply::Empty => Ok(None),
            Reply::Fail(message) => Err(Error::Transport(message)),
        }
    }
}
