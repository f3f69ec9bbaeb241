//! 运行预算：全局墙钟上限 + 单任务超时
//!
//! 准入检查只发生在任务边界：remaining < per_task_timeout 时不再启动新任务。
//! 已启动的任务由客户端自身的超时约束，这里不会中途打断。

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::core::clock::Clock;

/// 一次运行的时间预算
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// 全局墙钟上限
    pub max_total_time: Duration,
    /// 单任务超时；同时作为准入阈值传给客户端
    pub per_task_timeout: Duration,
}

impl Budget {
    pub fn new(max_total_time: Duration, per_task_timeout: Duration) -> Self {
        Self {
            max_total_time,
            per_task_timeout,
        }
    }

    pub fn from_secs(max_total_secs: u64, per_task_secs: u64) -> Self {
        Self::new(
            Duration::from_secs(max_total_secs),
            Duration::from_secs(per_task_secs),
        )
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::from_secs(300, 120)
    }
}

/// 一次运行的截止时间跟踪，起点在创建时从时钟读取
pub struct Deadline<'a> {
    clock: &'a dyn Clock,
    started: Instant,
    budget: Budget,
}

impl<'a> Deadline<'a> {
    pub fn start(clock: &'a dyn Clock, budget: Budget) -> Self {
        Self {
            clock,
            started: clock.now(),
            budget,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.started)
    }

    pub fn remaining(&self) -> Duration {
        self.budget.max_total_time.saturating_sub(self.elapsed())
    }

    /// 是否允许启动下一个任务
    pub fn admits_next(&self) -> bool {
        self.remaining() >= self.budget.per_task_timeout
    }
}
