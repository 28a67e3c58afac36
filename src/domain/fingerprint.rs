//! Fingerprint customization detection.
//!
//! Events whose fingerprint was customized (by the user or by a built-in
//! rule) are grouped by that fingerprint alone, so similarity matching is
//! skipped for them. This module decides whether a fingerprint counts as
//! customized and, if so, which blocker tag to attribute.

use crate::domain::hashes::PrimaryHashes;

/// Sentinel token standing for "the default grouping behavior".
pub const DEFAULT_FINGERPRINT_TOKEN: &str = "{{ default }}";

/// Variant name used when the fingerprint came from the user.
pub const CUSTOM_FINGERPRINT_VARIANT: &str = "custom-fingerprint";

/// Variant name used when the fingerprint came from a built-in rule.
pub const BUILT_IN_FINGERPRINT_VARIANT: &str = "built-in-fingerprint";

/// Outcome of classifying an event's fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FingerprintClassification {
    /// Fully default fingerprint; similarity matching may proceed.
    Standard,
    /// The default sentinel combined with other tokens.
    Hybrid,
    /// A fully customized fingerprint. Carries the type tag of the variant
    /// that produced it.
    Customized(String),
}

impl FingerprintClassification {
    /// Whether the fingerprint counts as customized.
    pub fn is_customized(&self) -> bool {
        !matches!(self, FingerprintClassification::Standard)
    }
}

/// Classify an event's fingerprint tokens against its grouping variants.
///
/// Rules, in order:
/// - the default sentinel alone is not customized;
/// - the default sentinel alongside other tokens is a hybrid fingerprint;
/// - otherwise, a `custom-fingerprint` or `built-in-fingerprint` variant in
///   the hashes marks the fingerprint as customized, attributed to that
///   variant's type tag;
/// - anything else is not customized.
///
/// ```
/// use similarity_gate::domain::fingerprint::{
///     classify_fingerprint, FingerprintClassification, DEFAULT_FINGERPRINT_TOKEN,
/// };
/// use similarity_gate::domain::hashes::PrimaryHashes;
///
/// let hashes = PrimaryHashes::new(vec!["aaa".to_owned()]);
///
/// let default_only = vec![DEFAULT_FINGERPRINT_TOKEN.to_owned()];
/// assert_eq!(
///     classify_fingerprint(&default_only, &hashes),
///     FingerprintClassification::Standard,
/// );
///
/// let hybrid = vec![DEFAULT_FINGERPRINT_TOKEN.to_owned(), "shard-7".to_owned()];
/// assert_eq!(
///     classify_fingerprint(&hybrid, &hashes),
///     FingerprintClassification::Hybrid,
/// );
/// ```
pub fn classify_fingerprint(
    fingerprint: &[String],
    primary_hashes: &PrimaryHashes,
) -> FingerprintClassification {
    if fingerprint.iter().any(|token| token == DEFAULT_FINGERPRINT_TOKEN) {
        if fingerprint.len() == 1 {
            // No custom fingerprinting at all
            return FingerprintClassification::Standard;
        }
        // The default sentinel combined with some other value(s)
        return FingerprintClassification::Hybrid;
    }

    // Fully customized fingerprint, from either the user or a built-in rule
    let fingerprint_variant = primary_hashes
        .variant(CUSTOM_FINGERPRINT_VARIANT)
        .or_else(|| primary_hashes.variant(BUILT_IN_FINGERPRINT_VARIANT));

    match fingerprint_variant {
        Some(variant) => FingerprintClassification::Customized(variant.variant_type.clone()),
        None => FingerprintClassification::Standard,
    }
}
