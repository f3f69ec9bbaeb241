//! 脚本化客户端（用于测试，无需安装 auggie）
//!
//! 按顺序弹出预设结果，用完后返回 fallback；可选地在每次调用时推进 ManualClock，模拟耗时。

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::client::{OperationClient, OperationRequest, OperationResult};
use crate::core::ManualClock;

/// 脚本化客户端：记录所有请求，依次返回预设结果
pub struct ScriptedClient {
    responses: Mutex<VecDeque<OperationResult>>,
    fallback: OperationResult,
    calls: Mutex<Vec<OperationRequest>>,
    clock: Option<(Arc<ManualClock>, Duration)>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: OperationResult::ok("ok"),
            calls: Mutex::new(Vec::new()),
            clock: None,
        }
    }

    pub fn with_responses(responses: impl IntoIterator<Item = OperationResult>) -> Self {
        let client = Self::new();
        client.push_all(responses);
        client
    }

    pub fn with_fallback(mut self, fallback: OperationResult) -> Self {
        self.fallback = fallback;
        self
    }

    /// 每次调用把时钟推进 per_call
    pub fn advancing(mut self, clock: Arc<ManualClock>, per_call: Duration) -> Self {
        self.clock = Some((clock, per_call));
        self
    }

    pub fn push_all(&self, results: impl IntoIterator<Item = OperationResult>) {
        lock(&self.responses).extend(results);
    }

    pub fn calls(&self) -> Vec<OperationRequest> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl OperationClient for ScriptedClient {
    async fn run_operation(&self, request: &OperationRequest) -> OperationResult {
        lock(&self.calls).push(request.clone());
        if let Some((clock, per_call)) = &self.clock {
            clock.advance(*per_call);
        }
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
