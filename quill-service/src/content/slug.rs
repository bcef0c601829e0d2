use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// 标题为空或只含符号时使用的slug
pub const FALLBACK_SLUG: &str = "post";

fn non_word_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"[^\w\s-]").unwrap())
}

fn separator_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"[-\s]+").unwrap())
}

/// 从标题生成slug
///
/// 先做NFKD分解再丢弃非ASCII字符（`é` 变为 `e`），转小写后去掉非单词字符，
/// 连续的空白和连字符合并为一个 `-`。
pub fn slugify(title: &str) -> String {
    let ascii: String = title.nfkd().filter(char::is_ascii).collect::<String>().to_lowercase();
    let stripped = non_word_regex().replace_all(&ascii, "");
    let joined = separator_regex().replace_all(stripped.trim(), "-");
    let slug = joined.trim_matches(|c: char| c == '-' || c == '_');
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// 第n个候选slug：第1个为原值，之后依次追加 -2、-3 ...
pub fn slug_candidate(base: &str, n: u32) -> String {
    if n <= 1 {
        base.to_string()
    } else {
        format!("{}-{}", base, n)
    }
}
