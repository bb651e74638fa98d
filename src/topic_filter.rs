//! Topic filter, the pattern of a `SUBSCRIBE` or `UNSUBSCRIBE`

use lazy_static::lazy_static;
use regex::Regex;

use crate::topic::MAX_TOPIC_LENGTH;

// `#` only as the whole last level, `+` only as a whole level
const TOPIC_FILTER_PATTERN: &str = r"^(#|((\+|\$?[^/\$\+#]+)?(/(\+|[^/\$\+#]+))*?(/(\+|#|[^/\$\+#]+))?))$";

lazy_static! {
    static ref TOPIC_FILTER: Regex = Regex::new(TOPIC_FILTER_PATTERN).unwrap();
}

fn is_valid_topic_filter(filter: &str) -> bool {
    !filter.is_empty() && filter.len() <= MAX_TOPIC_LENGTH && TOPIC_FILTER.is_match(filter)
}

validated_topic! {
    /// Subscription pattern, possibly with `+` and `#` wildcards
    ///
    /// ```rust
    /// use mqtt_lockstep::TopicFilter;
    ///
    /// assert!(TopicFilter::new("sport/+/player1").is_ok());
    /// assert!(TopicFilter::new("sport/tennis#").is_err());
    /// ```
    owned TopicFilter;
    /// Borrowed form of [`TopicFilter`]
    borrowed TopicFilterRef;
    error TopicFilterError("invalid topic filter ({0})");
    decode_error TopicFilterDecodeError::InvalidTopicFilter;
    valid if is_valid_topic_filter;
}

impl TopicFilterRef {
    pub fn has_wildcards(&self) -> bool {
        self.contains(|c: char| c == '#' || c == '+')
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::io::Cursor;

    use crate::Decodable;

    #[test]
    fn topic_filter_validate() {
        for valid in &["#", "tests/test1", "sport/tennis/player1/#", "+/tennis/#", "sport/+/player1", "+/+", "$SYS/#"] {
            assert!(TopicFilter::new(*valid).is_ok(), "{}", valid);
        }

        for invalid in &["", "sport/tennis#", "sport/tennis/#/ranking", "sport+"] {
            assert!(TopicFilter::new(*invalid).is_err(), "{}", invalid);
        }
    }

    #[test]
    fn topic_filter_wildcards() {
        assert!(TopicFilterRef::new("sport/+/player1").unwrap().has_wildcards());
        assert!(!TopicFilterRef::new("tests/test1").unwrap().has_wildcards());
    }

    #[test]
    fn topic_filter_ref_borrows() {
        let filter = TopicFilterRef::new("tests/#").unwrap();
        assert_eq!(filter.as_str(), "tests/#");
        assert_eq!(filter.to_owned(), TopicFilter::new("tests/#").unwrap());
    }

    #[test]
    fn topic_filter_decode_validates() {
        let mut cursor = Cursor::new(&b"\x00\x02a#"[..]);
        assert!(matches!(
            TopicFilter::decode(&mut cursor),
            Err(TopicFilterDecodeError::InvalidTopicFilter(_))
        ));
    }
}
