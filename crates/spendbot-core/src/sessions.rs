use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::{
    domain::UserId,
    form::{self, Flow, FormState, Step},
};

/// In-memory form state per user.
///
/// Only non-idle states are stored; a user without an entry is idle. The lock
/// is held just for the pure transition, never across I/O.
#[derive(Debug, Default)]
pub struct FormSessions {
    inner: Mutex<HashMap<UserId, FormState>>,
}

impl FormSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter `flow`, replacing any flow the user was in.
    pub async fn begin(&self, user: UserId, flow: Flow) -> Step {
        let step = form::start(flow);
        self.store(user, step.state.clone()).await;
        step
    }

    /// Feed one message to the user's active flow; `None` when idle.
    pub async fn advance(&self, user: UserId, input: &str) -> Option<Step> {
        let mut map = self.inner.lock().await;
        let current = map.remove(&user)?;
        let step = form::transition(current, input);
        if !step.state.is_idle() {
            map.insert(user, step.state.clone());
        }
        Some(step)
    }

    /// Drop the user's flow. Returns whether one was active.
    pub async fn clear(&self, user: UserId) -> bool {
        self.inner.lock().await.remove(&user).is_some()
    }

    pub async fn current(&self, user: UserId) -> FormState {
        self.inner
            .lock()
            .await
            .get(&user)
            .cloned()
            .unwrap_or_default()
    }

    async fn store(&self, user: UserId, state: FormState) {
        let mut map = self.inner.lock().await;
        if state.is_idle() {
            map.remove(&user);
        } else {
            map.insert(user, state);
        }
    }
}
