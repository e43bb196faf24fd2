//! Request interpretation: free text to a [`GenerationPlan`].
//!
//! Classification walks [`CATEGORY_RULES`] top to bottom and the first rule
//! with a keyword contained in the lower-cased text wins. Keywords overlap
//! across categories ("customer sales" is customer), so the order of the
//! table is part of the contract.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::types::{Category, GenerationPlan, DEFAULT_RECORD_COUNT};

/// Ordered (category, keywords) rules; substring match, first hit wins
pub const CATEGORY_RULES: &[(Category, &[&str])] = &[
    (Category::Customer, &["customer", "client", "user"]),
    (
        Category::Equipment,
        &["equipment", "platform", "item", "completion"],
    ),
    (Category::Sales, &["sales", "revenue", "purchase"]),
    (Category::Employee, &["employee", "staff", "hr"]),
    (Category::Financial, &["transaction", "payment", "financial"]),
    (Category::Product, &["product", "inventory", "catalog"]),
    (
        Category::TimeSeries,
        &["time series", "timeseries", "over time"],
    ),
];

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("valid digit pattern"));

/// Maps raw request text to a plan. Deterministic and infallible.
pub fn interpret(raw_text: &str) -> GenerationPlan {
    let plan = GenerationPlan {
        category: classify(raw_text),
        record_count: extract_record_count(raw_text),
        source_text: raw_text.to_string(),
    };
    debug!(
        "Interpreted request as {} with {} records",
        plan.category, plan.record_count
    );
    plan
}

pub fn classify(raw_text: &str) -> Category {
    let lowered = raw_text.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Custom)
}

/// First run of ASCII digits, else [`DEFAULT_RECORD_COUNT`].
///
/// A run too large for `usize` falls back to the default; zero is raised to one.
pub fn extract_record_count(raw_text: &str) -> usize {
    DIGIT_RUN
        .find(raw_text)
        .and_then(|digits| digits.as_str().parse::<usize>().ok())
        .map(|count| count.max(1))
        .unwrap_or(DEFAULT_RECORD_COUNT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_request() {
        let plan = interpret("I need 5 customer records");
        assert_eq!(plan.category, Category::Customer);
        assert_eq!(plan.record_count, 5);
        assert_eq!(plan.source_text, "I need 5 customer records");
    }

    #[test]
    fn test_default_count_without_digits() {
        let plan = interpret("equipment tracking");
        assert_eq!(plan.category, Category::Equipment);
        assert_eq!(plan.record_count, DEFAULT_RECORD_COUNT);
    }

    #[test]
    fn test_priority_order_resolves_overlap() {
        assert_eq!(classify("customer sales report"), Category::Customer);
        assert_eq!(classify("sales by product"), Category::Sales);
        assert_eq!(classify("payment for inventory"), Category::Financial);
        assert_eq!(classify("platform completion over time"), Category::Equipment);
    }

    #[test]
    fn test_each_category_keyword() {
        assert_eq!(classify("CLIENT list"), Category::Customer);
        assert_eq!(classify("Revenue figures"), Category::Sales);
        assert_eq!(classify("staff roster"), Category::Employee);
        assert_eq!(classify("Financial ledger"), Category::Financial);
        assert_eq!(classify("catalog entries"), Category::Product);
        assert_eq!(classify("a timeseries of sensor data"), Category::TimeSeries);
        assert_eq!(classify("random stuff"), Category::Custom);
    }

    #[test]
    fn test_substring_matching_is_literal() {
        // "hr" is matched inside "three"
        assert_eq!(classify("three rows please"), Category::Employee);
    }

    #[test]
    fn test_first_digit_run_wins() {
        assert_eq!(extract_record_count("give me 30 rows for 2024"), 30);
        assert_eq!(extract_record_count("v2 of 500 items"), 2);
        assert_eq!(extract_record_count("0 rows"), 1);
        assert_eq!(
            extract_record_count("99999999999999999999999999 rows"),
            DEFAULT_RECORD_COUNT
        );
    }

    #[test]
    fn test_interpretation_is_deterministic() {
        let text = "Generate 75 employee records for HR";
        assert_eq!(interpret(text), interpret(text));
    }
}
