use crate::models::Category;
use crate::utils::parse_iso8601_duration_to_seconds;

/// Upper bound (inclusive) for short-form videos, in seconds.
pub const SHORT_FORM_MAX_SECONDS: u64 = 180;

/// Coarse duration filter understood by the platform's search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationBucket {
    /// Under four minutes.
    Short,
    /// Four to twenty minutes.
    Medium,
    /// Over twenty minutes.
    Long,
}

impl DurationBucket {
    pub fn as_query_value(&self) -> &'static str {
        match self {
            DurationBucket::Short => "short",
            DurationBucket::Medium => "medium",
            DurationBucket::Long => "long",
        }
    }
}

pub fn decode_duration_seconds(encoded: &str) -> u64 {
    parse_iso8601_duration_to_seconds(encoded)
}

pub fn classify(seconds: u64) -> Category {
    if seconds > 0 && seconds <= SHORT_FORM_MAX_SECONDS {
        Category::Short
    } else {
        Category::Long
    }
}

pub fn classify_encoded(encoded: &str) -> Category {
    classify(decode_duration_seconds(encoded))
}

pub fn matches_category(encoded: &str, category: Category) -> bool {
    classify_encoded(encoded) == category
}

/// Buckets to query for a category. The short bucket over-includes videos
/// between 181 and 239 seconds, and the long-form buckets exclude them, so
/// results are always re-classified after details are fetched.
pub fn search_buckets_for(category: Category) -> &'static [DurationBucket] {
    match category {
        Category::Short => &[DurationBucket::Short],
        Category::Long => &[DurationBucket::Medium, DurationBucket::Long],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_form_boundary() {
        assert_eq!(classify(180), Category::Short);
        assert_eq!(classify(181), Category::Long);
        assert_eq!(classify(1), Category::Short);
    }

    #[test]
    fn zero_seconds_is_never_short() {
        assert_eq!(classify(0), Category::Long);
        assert_eq!(classify_encoded(""), Category::Long);
        assert_eq!(classify_encoded("garbage"), Category::Long);
    }

    #[test]
    fn encoded_durations() {
        assert!(matches_category("PT3M", Category::Short));
        assert!(matches_category("PT3M1S", Category::Long));
        assert!(matches_category("PT59S", Category::Short));
        assert!(matches_category("PT1H", Category::Long));
    }

    #[test]
    fn bucket_sets() {
        assert_eq!(search_buckets_for(Category::Short), &[DurationBucket::Short]);
        assert_eq!(
            search_buckets_for(Category::Long),
            &[DurationBucket::Medium, DurationBucket::Long]
        );
        assert_eq!(DurationBucket::Medium.as_query_value(), "medium");
    }
}
