use crate::quote::summary::QuoteSummary;

/// Render the narration prompt for one route.
///
/// Fees and output are rounded to two decimals; the text around them is fixed.
pub fn build_route_prompt(summary: &QuoteSummary) -> String {
    format!(
        "You are a helpful crypto assistant called ChainCompass. \
         Summarize the following best route for a user in a friendly, single sentence. \
         Mention the provider, the estimated time, the final amount in USD, and the fees. \
         Route details: Provider={provider}, Time={time}s, \
         Fees of approximately ${fees:.2} USD, resulting in a final amount of ${output:.2} USD.",
        provider = summary.provider,
        time = summary.time_seconds,
        fees = summary.fees_usd,
        output = summary.output_usd,
    )
}
