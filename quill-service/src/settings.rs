use chrono::Duration;
use serde::{Deserialize, Serialize};

/// 内容核心的可调参数，对应配置文件的 [content] 节
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSettings {
    pub words_per_minute: u32,
    /// 不指定位置时系列成员之间的间隔
    pub series_step: u32,
    pub max_category_depth: usize,
    pub max_comment_depth: usize,
    pub slug_max_attempts: u32,
    /// 并发冲突时的最大重试次数
    pub max_write_attempts: u32,
    pub confirmation_token_ttl_hours: i64,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            words_per_minute: 200,
            series_step: 10,
            max_category_depth: 3,
            max_comment_depth: 5,
            slug_max_attempts: 100,
            max_write_attempts: 10,
            confirmation_token_ttl_hours: 48,
        }
    }
}

impl ContentSettings {
    pub fn confirmation_token_ttl(&self) -> Duration {
        Duration::hours(self.confirmation_token_ttl_hours)
    }
}
