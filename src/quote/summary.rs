//! Projection of an aggregator quote onto the handful of numbers we narrate.
//!
//! The aggregator's payload is treated as an untyped [`Value`] tree. Every
//! field is optional: a missing or malformed value degrades to its default,
//! so [`summarize`] never fails.

use serde::Serialize;
use serde_json::{Map, Value};

/// Provider name used when the quote does not carry one.
pub const UNKNOWN_PROVIDER: &str = "N/A";

/// Numeric summary of one route quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteSummary {
    pub provider: String,
    pub time_seconds: u64,
    pub fees_usd: f64,
    pub output_usd: f64,
}

/// Extract a [`QuoteSummary`] from a raw aggregator response.
pub fn summarize(quote: &Value) -> QuoteSummary {
    let estimate = object(quote.get("estimate"));
    let tool_details = object(quote.get("toolDetails"));

    let provider = tool_details
        .and_then(|t| t.get("name"))
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_PROVIDER)
        .to_string();

    let time_seconds = estimate
        .and_then(|e| e.get("executionDuration"))
        .and_then(as_seconds)
        .unwrap_or(0);

    let output_usd = estimate
        .and_then(|e| e.get("toAmountUSD"))
        .and_then(as_usd)
        .unwrap_or(0.0);

    let fees_usd = estimate
        .and_then(|e| e.get("feeCosts"))
        .and_then(Value::as_array)
        .map(|fees| {
            fees.iter()
                .filter_map(|fee| fee.get("amountUSD").and_then(as_usd))
                // Negative amounts are rebates, not costs; the total stays non-negative.
                .filter(|amount| *amount >= 0.0)
                .sum::<f64>()
        })
        .unwrap_or(0.0);

    QuoteSummary {
        provider,
        time_seconds,
        fees_usd,
        output_usd,
    }
}

fn object(value: Option<&Value>) -> Option<&Map<String, Value>> {
    value.and_then(Value::as_object)
}

/// Integer cast: floats truncate, negatives clamp to zero.
fn as_seconds(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_i64().map(|i| i.max(0) as u64))
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse::<i64>().ok().map(|i| i.max(0) as u64),
        _ => None,
    }
}

/// Float cast for USD amounts, which the aggregator sends as strings.
fn as_usd(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_defaults(summary: &QuoteSummary) {
        assert_eq!(summary.provider, UNKNOWN_PROVIDER);
        assert_eq!(summary.time_seconds, 0);
        assert_eq!(summary.fees_usd, 0.0);
        assert_eq!(summary.output_usd, 0.0);
    }

    #[test]
    fn test_sample_route() {
        let quote = json!({
            "estimate": {
                "executionDuration": 48,
                "toAmountUSD": "99.0625",
                "feeCosts": [
                    {"amountUSD": "0.25"},
                    {"amountUSD": "0.0098"},
                    {"amountUSD": "0.0116"},
                    {"amountUSD": "0.0048"}
                ]
            },
            "toolDetails": {"name": "AcrossV4"}
        });

        let summary = summarize(&quote);
        assert_eq!(summary.provider, "AcrossV4");
        assert_eq!(summary.time_seconds, 48);
        assert_close(summary.fees_usd, 0.2762);
        assert_close(summary.output_usd, 99.0625);
    }

    #[test]
    fn test_empty_and_null_inputs_default() {
        for quote in [
            json!({}),
            json!({"estimate": null}),
            json!({"estimate": {"feeCosts": "not-a-list"}}),
            json!({"estimate": [], "toolDetails": "AcrossV4"}),
            json!(null),
            json!([1, 2, 3]),
            json!("quote"),
        ] {
            assert_defaults(&summarize(&quote));
        }
    }

    #[test]
    fn test_bad_fee_entries_are_skipped() {
        let quote = json!({
            "estimate": {
                "feeCosts": [
                    {"amountUSD": "0.25"},
                    {"amountUSD": "0.0098"},
                    {"amountUSD": "bad"},
                    {},
                    "not-an-object",
                    {"amountUSD": null}
                ]
            }
        });
        assert_close(summarize(&quote).fees_usd, 0.2598);
    }

    #[test]
    fn test_negative_fee_entries_are_skipped() {
        let quote = json!({
            "estimate": {"feeCosts": [{"amountUSD": "0.25"}, {"amountUSD": "-1.5"}, {"amountUSD": -3}]}
        });
        assert_close(summarize(&quote).fees_usd, 0.25);

        let rebates_only = json!({"estimate": {"feeCosts": [{"amountUSD": "-0.4"}]}});
        assert_eq!(summarize(&rebates_only).fees_usd, 0.0);
    }

    #[test]
    fn test_numeric_fee_amounts_accepted() {
        let quote = json!({"estimate": {"feeCosts": [{"amountUSD": 1.5}, {"amountUSD": 2}]}});
        assert_close(summarize(&quote).fees_usd, 3.5);
    }

    #[test]
    fn test_execution_duration_casts() {
        let duration = |v: Value| summarize(&json!({"estimate": {"executionDuration": v}}));

        assert_eq!(duration(json!(48.9)).time_seconds, 48);
        assert_eq!(duration(json!("30")).time_seconds, 30);
        assert_eq!(duration(json!(-5)).time_seconds, 0);
        assert_eq!(duration(json!("48.5")).time_seconds, 0);
        assert_eq!(duration(json!("soon")).time_seconds, 0);
        assert_eq!(duration(json!(true)).time_seconds, 0);
        assert_eq!(duration(json!(null)).time_seconds, 0);
    }

    #[test]
    fn test_output_usd_casts() {
        let output = |v: Value| summarize(&json!({"estimate": {"toAmountUSD": v}}));

        assert_close(output(json!(" 12.5 ")).output_usd, 12.5);
        assert_close(output(json!(7)).output_usd, 7.0);
        assert_eq!(output(json!("NaN")).output_usd, 0.0);
        assert_eq!(output(json!("inf")).output_usd, 0.0);
        assert_eq!(output(json!({"usd": 1})).output_usd, 0.0);
    }

    #[test]
    fn test_non_string_provider_defaults() {
        let summary = summarize(&json!({"toolDetails": {"name": 42}}));
        assert_eq!(summary.provider, UNKNOWN_PROVIDER);
    }

    #[test]
    fn test_same_payload_same_summary() {
        let quote = json!({"estimate": {"toAmountUSD": "1.0"}, "toolDetails": {"name": "Stargate"}});
        assert_eq!(summarize(&quote), summarize(&quote));
    }
}
