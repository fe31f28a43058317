//! 供应商情感聚合

use crate::types::SentimentLabel;

/// 将多篇文章的情感归约为一个供应商情感
///
/// 取优先级最高者（bullish > neutral > bearish），忽略 `N/A`；
/// 列表为空或全部为 `N/A` 时返回 `N/A`。
pub fn aggregate(labels: &[SentimentLabel]) -> SentimentLabel {
    labels
        .iter()
        .copied()
        .filter_map(|label| label.rank().map(|rank| (rank, label)))
        .max_by_key(|(rank, _)| *rank)
        .map(|(_, label)| label)
        .unwrap_or(SentimentLabel::NotAvailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use SentimentLabel::*;

    #[test]
    fn test_precedence() {
        assert_eq!(aggregate(&[Bearish, Neutral, Bullish]), Bullish);
        assert_eq!(aggregate(&[Bearish, Neutral]), Neutral);
        assert_eq!(aggregate(&[Bearish]), Bearish);
    }

    #[test]
    fn test_not_available() {
        assert_eq!(aggregate(&[]), NotAvailable);
        assert_eq!(aggregate(&[NotAvailable, NotAvailable]), NotAvailable);
    }

    #[test]
    fn test_not_available_is_ignored_in_vote() {
        assert_eq!(aggregate(&[NotAvailable, Bearish, NotAvailable]), Bearish);
        assert_eq!(aggregate(&[Neutral, NotAvailable]), Neutral);
    }
}
