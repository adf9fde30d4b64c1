//! Topic keys
//!
//! A topic is a static string key identifying a logical data stream.

/// Price samples from the producer loop.
pub const PRICE_TOPIC: &str = "crypto/prices";

/// Topics are non-empty and contain no whitespace.
pub fn is_valid_topic(topic: &str) -> bool {
    !topic.is_empty() && !topic.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_validation() {
        assert!(is_valid_topic(PRICE_TOPIC));
        assert!(is_valid_topic("crypto/news"));
        assert!(!is_valid_topic(""));
        assert!(!is_valid_topic("crypto prices"));
    }
}
