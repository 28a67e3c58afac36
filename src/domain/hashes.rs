//! Grouping hashes and their named variants.

use std::collections::BTreeMap;

/// A named alternative hash-computation strategy, tagged with a type.
///
/// Variants carry the pieces of grouping input this crate needs downstream:
/// the type tag (used as a blocker label when a fingerprint variant blocks
/// the gate) and an optional stacktrace fragment contributed by the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupingVariant {
    /// Type tag, e.g. `"custom-fingerprint"` or `"built-in-fingerprint"`.
    pub variant_type: String,
    /// Hash produced by this variant, if any.
    pub hash: Option<String>,
    /// Stacktrace fragment this variant derived from the event, if any.
    pub stacktrace: Option<String>,
}

impl GroupingVariant {
    /// Create a variant with just a type tag.
    pub fn new(variant_type: impl Into<String>) -> Self {
        Self {
            variant_type: variant_type.into(),
            hash: None,
            stacktrace: None,
        }
    }

    /// Attach the hash this variant produced.
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Attach a stacktrace fragment.
    pub fn with_stacktrace(mut self, stacktrace: impl Into<String>) -> Self {
        self.stacktrace = Some(stacktrace.into());
        self
    }
}

/// The grouping hashes calculated for an event, together with the named
/// variants they came from.
///
/// Immutable input to the gate; the hash sequence is ordered with the
/// primary hash first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimaryHashes {
    hashes: Vec<String>,
    variants: BTreeMap<String, GroupingVariant>,
}

impl PrimaryHashes {
    /// Create from an ordered hash sequence.
    pub fn new(hashes: Vec<String>) -> Self {
        Self {
            hashes,
            variants: BTreeMap::new(),
        }
    }

    /// Add a named variant.
    pub fn with_variant(mut self, name: impl Into<String>, variant: GroupingVariant) -> Self {
        self.variants.insert(name.into(), variant);
        self
    }

    /// The first (primary) grouping hash, if any exist.
    pub fn primary_hash(&self) -> Option<&str> {
        self.hashes.first().map(String::as_str)
    }

    /// The full ordered hash sequence.
    pub fn hashes(&self) -> &[String] {
        &self.hashes
    }

    /// Look up a variant by name.
    pub fn variant(&self, name: &str) -> Option<&GroupingVariant> {
        self.variants.get(name)
    }

    /// All named variants.
    pub fn variants(&self) -> &BTreeMap<String, GroupingVariant> {
        &self.variants
    }

    /// Flatten the stacktrace fragments of all variants into a single
    /// string, in variant-name order.
    pub fn stacktrace_string(&self) -> String {
        let fragments: Vec<&str> = self
            .variants
            .values()
            .filter_map(|variant| variant.stacktrace.as_deref())
            .filter(|fragment| !fragment.is_empty())
            .collect();
        fragments.join("\n")
    }
}
