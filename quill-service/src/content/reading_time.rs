use regex::Regex;
use std::sync::OnceLock;

fn markup_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"<[^>]*>").unwrap())
}

fn word_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\w+").unwrap())
}

/// 阅读时间估算
#[derive(Debug, Clone, Copy)]
pub struct ReadingTimeEstimator {
    words_per_minute: u32,
}

impl Default for ReadingTimeEstimator {
    fn default() -> Self {
        Self::new(200)
    }
}

impl ReadingTimeEstimator {
    pub fn new(words_per_minute: u32) -> Self {
        Self {
            words_per_minute: words_per_minute.max(1),
        }
    }

    /// 统计去掉标记后的单词数
    pub fn word_count(body: &str) -> usize {
        let text = markup_regex().replace_all(body, " ");
        word_regex().find_iter(&text).count()
    }

    /// 估算阅读分钟数，至少为1，恰好一半时向偶数取整
    pub fn estimate(&self, body: &str) -> u32 {
        let words = Self::word_count(body) as f64;
        let minutes = (words / self.words_per_minute as f64).round_ties_even();
        (minutes as u32).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn test_estimate() {
        let estimator = ReadingTimeEstimator::default();
        assert_eq!(estimator.estimate(&words(400)), 2);
        assert_eq!(estimator.estimate(""), 1);
        assert_eq!(estimator.estimate(&words(50)), 1);
        assert_eq!(estimator.estimate(&words(1000)), 5);
    }

    /// 测试：恰好一半时向偶数取整
    #[test]
    fn test_round_half_to_even() {
        let estimator = ReadingTimeEstimator::default();
        assert_eq!(estimator.estimate(&words(300)), 2);
        assert_eq!(estimator.estimate(&words(500)), 2);
        assert_eq!(estimator.estimate(&words(700)), 4);
    }

    #[test]
    fn test_markup_is_not_counted() {
        let body = "<p class=\"lead\">Hello <strong>brave</strong> new world</p><img src=\"a.png\"/>";
        assert_eq!(ReadingTimeEstimator::word_count(body), 4);
    }

    #[test]
    fn test_custom_words_per_minute() {
        let estimator = ReadingTimeEstimator::new(100);
        assert_eq!(estimator.estimate(&words(400)), 4);
    }
}
