/*!
 * Serde helpers for collaborator payloads.
 *
 * Classifier responses for unresolved queries routinely send `null` where a
 * string, map or list is expected. These helpers read such fields as their
 * empty default instead of failing the whole body.
 */

use serde::{Deserialize, Deserializer};

/// Deserialize a value, treating `null` as `T::default()`.
///
/// ```rust
/// use serde::Deserialize;
/// use remediation_core::utils::serde::null_as_default;
///
/// #[derive(Deserialize)]
/// struct Payload {
///     #[serde(default, deserialize_with = "null_as_default")]
///     tags: Vec<String>,
/// }
///
/// let payload: Payload = serde_json::from_str(r#"{"tags": null}"#).unwrap();
/// assert!(payload.tags.is_empty());
/// ```
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "null_as_default")]
        name: String,
        #[serde(default, deserialize_with = "null_as_default")]
        labels: HashMap<String, String>,
    }

    #[test]
    fn test_null_reads_as_default() {
        let sample: Sample = serde_json::from_str(r#"{"name": null, "labels": null}"#).unwrap();
        assert!(sample.name.is_empty());
        assert!(sample.labels.is_empty());
    }

    #[test]
    fn test_present_values_pass_through() {
        let sample: Sample =
            serde_json::from_str(r#"{"name": "orders", "labels": {"tier": "1"}}"#).unwrap();
        assert_eq!(sample.name, "orders");
        assert_eq!(sample.labels["tier"], "1");
    }

    #[test]
    fn test_wrong_type_is_still_an_error() {
        assert!(serde_json::from_str::<Sample>(r#"{"name": 5}"#).is_err());
    }
}
