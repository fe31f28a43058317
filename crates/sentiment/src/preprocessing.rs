//! 分词与特征提取

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static WORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9]+(?:['’][A-Za-z]+)*%?").unwrap());

/// 按原始大小写切词（保留缩写，如 don't）
pub fn words(text: &str) -> Vec<&str> {
    WORD_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
}

/// 小写并统一撇号
pub fn normalize(token: &str) -> String {
    token.to_lowercase().replace('’', "'")
}

/// unigram + bigram 计数，最多取前 `max_tokens` 个词
pub fn ngram_counts(text: &str, max_tokens: usize) -> HashMap<String, f64> {
    let tokens: Vec<String> = words(text).into_iter().take(max_tokens).map(normalize).collect();

    let mut counts = HashMap::new();
    for token in &tokens {
        *counts.entry(token.clone()).or_insert(0.0) += 1.0;
    }
    for pair in tokens.windows(2) {
        *counts.entry(format!("{} {}", pair[0], pair[1])).or_insert(0.0) += 1.0;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_keep_contractions_and_case() {
        assert_eq!(
            words("Cramer's Lightning Round: Don't buy FISV!"),
            vec!["Cramer's", "Lightning", "Round", "Don't", "buy", "FISV"]
        );
        assert_eq!(words("stock craters 44%"), vec!["stock", "craters", "44%"]);
    }

    #[test]
    fn test_ngram_counts() {
        let counts = ngram_counts("Beats estimates, beats again", 512);
        assert_eq!(counts["beats"], 2.0);
        assert_eq!(counts["beats estimates"], 1.0);
        assert_eq!(counts["estimates beats"], 1.0);
        assert!(!counts.contains_key("Beats"));
    }

    #[test]
    fn test_ngram_truncation() {
        let counts = ngram_counts("one two three four", 2);
        assert!(counts.contains_key("one two"));
        assert!(!counts.contains_key("three"));
    }
}
