use serde::Serialize;
use std::hash::Hasher;
use twox_hash::XxHash64;

/// Hashes serializable data into an i64 using CBOR serialization and XxHash64.
///
/// This provides a stable hash across different runs and systems by:
/// - Serializing the data to CBOR format (deterministic binary representation)
/// - Using XxHash64 with a fixed seed (0) for consistent hashing
///
/// Transaction records use it to seal their immutable fields at creation.
pub fn hash_as_i64<T: Serialize>(data: &T) -> Result<i64, String> {
    let mut hasher = XxHash64::with_seed(0);
    let mut cbor = Vec::new();
    ciborium::ser::into_writer(data, &mut cbor)
        .map_err(|e| format!("Failed to serialize data for hashing: {e}"))?;
    hasher.write(&cbor);
    Ok(hasher.finish() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample<'a> {
        amount: i64,
        reference: Option<&'a str>,
    }

    #[test]
    fn hash_is_stable_and_sensitive() {
        let a = hash_as_i64(&Sample { amount: 100, reference: Some("r-1") }).unwrap();
        let b = hash_as_i64(&Sample { amount: 100, reference: Some("r-1") }).unwrap();
        let c = hash_as_i64(&Sample { amount: 101, reference: Some("r-1") }).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
