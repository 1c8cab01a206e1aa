//! Inbound swap parameters and their validated form.

use crate::error::QuoteError;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

/// Wallet used when the caller does not supply `fromAddress`.
pub const DEFAULT_FROM_ADDRESS: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

const MAX_ADDRESS_LEN: usize = 128;

/// Integer amount in the token's smallest unit.
static AMOUNT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{1,30}$").expect("Invalid regex"));

/// Chain and token symbols: printable, no whitespace. Dotted bridged
/// symbols such as `USDC.e` are valid.
static CHAIN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s\p{Cc}]{2,10}$").expect("Invalid regex"));

static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s\p{Cc}]{2,12}$").expect("Invalid regex"));

/// Raw query string of `GET /api/v1/quote`.
///
/// Every field is optional here so that a missing parameter becomes a
/// [`QuoteError::Validation`] instead of an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteParams {
    pub from_chain: Option<String>,
    pub to_chain: Option<String>,
    pub from_token: Option<String>,
    pub to_token: Option<String>,
    pub from_amount: Option<String>,
    pub from_address: Option<String>,
}

/// A swap request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    from_chain: String,
    to_chain: String,
    from_token: String,
    to_token: String,
    from_amount: String,
    from_address: String,
}

/// Fingerprint of a [`SwapRequest`]; identical fields give identical keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    from_chain: String,
    to_chain: String,
    from_token: String,
    to_token: String,
    from_amount: String,
    from_address: String,
}

impl SwapRequest {
    pub fn from_chain(&self) -> &str {
        &self.from_chain
    }

    pub fn to_chain(&self) -> &str {
        &self.to_chain
    }

    pub fn from_token(&self) -> &str {
        &self.from_token
    }

    pub fn to_token(&self) -> &str {
        &self.to_token
    }

    pub fn from_amount(&self) -> &str {
        &self.from_amount
    }

    pub fn from_address(&self) -> &str {
        &self.from_address
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey {
            from_chain: self.from_chain.clone(),
            to_chain: self.to_chain.clone(),
            from_token: self.from_token.clone(),
            to_token: self.to_token.clone(),
            from_amount: self.from_amount.clone(),
            from_address: self.from_address.clone(),
        }
    }

    /// Query parameters for the aggregator, named as it expects them.
    pub fn query_pairs(&self) -> [(&'static str, &str); 6] {
        [
            ("fromChain", self.from_chain.as_str()),
            ("toChain", self.to_chain.as_str()),
            ("fromToken", self.from_token.as_str()),
            ("toToken", self.to_token.as_str()),
            ("fromAmount", self.from_amount.as_str()),
            ("fromAddress", self.from_address.as_str()),
        ]
    }
}

impl TryFrom<QuoteParams> for SwapRequest {
    type Error = QuoteError;

    fn try_from(params: QuoteParams) -> Result<Self, Self::Error> {
        let from_chain = required("fromChain", params.from_chain, &CHAIN_REGEX, CHAIN_RULE)?;
        let to_chain = required("toChain", params.to_chain, &CHAIN_REGEX, CHAIN_RULE)?;
        let from_token = required("fromToken", params.from_token, &TOKEN_REGEX, TOKEN_RULE)?;
        let to_token = required("toToken", params.to_token, &TOKEN_REGEX, TOKEN_RULE)?;
        let from_amount = required("fromAmount", params.from_amount, &AMOUNT_REGEX, AMOUNT_RULE)?;
        let from_address = address(params.from_address)?;

        Ok(Self {
            from_chain,
            to_chain,
            from_token,
            to_token,
            from_amount,
            from_address,
        })
    }
}

const CHAIN_RULE: &str = "expected 2-10 characters without whitespace";
const TOKEN_RULE: &str = "expected 2-12 characters without whitespace";
const AMOUNT_RULE: &str = "expected an integer of 1-30 digits in the token's smallest unit";

fn required(
    field: &'static str,
    value: Option<String>,
    pattern: &Regex,
    rule: &str,
) -> Result<String, QuoteError> {
    let value = value.ok_or_else(|| QuoteError::validation(field, "field required"))?;
    if !pattern.is_match(&value) {
        return Err(QuoteError::validation(field, rule));
    }
    Ok(value)
}

fn address(value: Option<String>) -> Result<String, QuoteError> {
    let value = match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => return Ok(DEFAULT_FROM_ADDRESS.to_string()),
    };
    if value.len() > MAX_ADDRESS_LEN {
        return Err(QuoteError::validation(
            "fromAddress",
            format!("must be at most {MAX_ADDRESS_LEN} characters"),
        ));
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(QuoteError::validation(
            "fromAddress",
            "must not contain whitespace",
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn params(amount: &str) -> QuoteParams {
        QuoteParams {
            from_chain: Some("POL".into()),
            to_chain: Some("ARB".into()),
            from_token: Some("USDC".into()),
            to_token: Some("ETH".into()),
            from_amount: Some(amount.into()),
            from_address: None,
        }
    }

    fn rejected_field(params: QuoteParams) -> &'static str {
        match SwapRequest::try_from(params) {
            Err(QuoteError::Validation { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_request_uses_default_address() {
        let req = SwapRequest::try_from(params("100000000")).unwrap();
        assert_eq!(req.from_chain(), "POL");
        assert_eq!(req.from_amount(), "100000000");
        assert_eq!(req.from_address(), DEFAULT_FROM_ADDRESS);
    }

    #[test]
    fn test_blank_address_falls_back_to_default() {
        let mut p = params("1");
        p.from_address = Some("   ".into());
        let req = SwapRequest::try_from(p).unwrap();
        assert_eq!(req.from_address(), DEFAULT_FROM_ADDRESS);
    }

    #[test]
    fn test_amount_must_be_digits() {
        assert_eq!(rejected_field(params("12a")), "fromAmount");
        assert_eq!(rejected_field(params("")), "fromAmount");
        assert_eq!(rejected_field(params("1.5")), "fromAmount");
        assert_eq!(rejected_field(params(&"9".repeat(31))), "fromAmount");
        assert!(SwapRequest::try_from(params(&"9".repeat(30))).is_ok());
    }

    #[test]
    fn test_symbol_length_bounds() {
        let mut p = params("1");
        p.from_chain = Some("P".into());
        assert_eq!(rejected_field(p), "fromChain");

        let mut p = params("1");
        p.to_chain = Some("ABCDEFGHIJK".into());
        assert_eq!(rejected_field(p), "toChain");

        let mut p = params("1");
        p.to_token = Some("ABCDEFGHIJKLM".into());
        assert_eq!(rejected_field(p), "toToken");

        let mut p = params("1");
        p.from_token = Some("US DC".into());
        assert_eq!(rejected_field(p), "fromToken");
    }

    #[test]
    fn test_dotted_bridged_symbols_accepted() {
        let mut p = params("1");
        p.from_token = Some("USDC.e".into());
        p.to_token = Some("WETH.e".into());
        let req = SwapRequest::try_from(p).unwrap();
        assert_eq!(req.from_token(), "USDC.e");
        assert_eq!(req.to_token(), "WETH.e");
    }

    #[test]
    fn test_symbol_bounds_count_characters_not_bytes() {
        let mut p = params("1");
        p.from_chain = Some("ÄÄÄÄÄÄÄÄÄÄ".into());
        assert!(SwapRequest::try_from(p).is_ok());

        let mut p = params("1");
        p.to_token = Some("US\tDC".into());
        assert_eq!(rejected_field(p), "toToken");
    }

    #[test]
    fn test_missing_field_is_named() {
        let mut p = params("1");
        p.to_token = None;
        assert_eq!(rejected_field(p), "toToken");
    }

    #[test]
    fn test_address_with_whitespace_rejected() {
        let mut p = params("1");
        p.from_address = Some("0xabc def".into());
        assert_eq!(rejected_field(p), "fromAddress");
    }

    #[test]
    fn test_identical_requests_share_cache_key() {
        let a = SwapRequest::try_from(params("100")).unwrap();
        let mut explicit = params("100");
        explicit.from_address = Some(DEFAULT_FROM_ADDRESS.into());
        let b = SwapRequest::try_from(explicit).unwrap();
        assert_eq!(a.cache_key(), b.cache_key());

        let keys: HashSet<CacheKey> = [a.cache_key(), b.cache_key()].into_iter().collect();
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn test_different_amount_changes_cache_key() {
        let a = SwapRequest::try_from(params("100")).unwrap();
        let b = SwapRequest::try_from(params("101")).unwrap();
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_query_pairs_mirror_inbound_names() {
        let req = SwapRequest::try_from(params("5")).unwrap();
        let pairs = req.query_pairs();
        assert_eq!(pairs[0], ("fromChain", "POL"));
        assert_eq!(pairs[4], ("fromAmount", "5"));
        assert_eq!(pairs[5], ("fromAddress", DEFAULT_FROM_ADDRESS));
    }
}
