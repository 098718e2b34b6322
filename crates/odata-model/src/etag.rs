//! ETag computation

use sha2::{Digest, Sha256};

use crate::value::ComplexValue;

impl ComplexValue {
    /// Compute the weak ETag of this value
    ///
    /// Every declared property with an ETag-eligible primitive type contributes a
    /// `(name, canonical)` pair, in insertion order; a null value contributes
    /// `(name, null)`. The ordered pair list is hashed with SHA-256.
    pub fn etag(&self) -> String {
        let input: Vec<(&str, Option<String>)> = self
            .property_values()
            .filter(|pv| pv.property().is_etag_eligible())
            .map(|pv| (pv.name(), pv.primitive().and_then(|p| p.etag_canonical())))
            .collect();

        format!("W/\"{}\"", hash(&input))
    }
}

fn hash(input: &[(&str, Option<String>)]) -> String {
    let encoded = serde_json::to_vec(input).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&encoded);
    hex::encode(hasher.finalize())
}
