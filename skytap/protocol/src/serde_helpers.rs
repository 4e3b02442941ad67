//! Tolerant deserializers for loosely typed broker fields

use serde::{Deserialize, Deserializer};

/// Deserialize a flag that may arrive as a JSON boolean, as the strings `"true"`/`"false"`
/// (case-insensitive, surrounding whitespace ignored) or as `null`, which reads as `false`.
pub fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(false),
        Some(Flag::Bool(value)) => Ok(value),
        Some(Flag::Text(text)) => {
            let normalized = text.trim().to_ascii_lowercase();
            match normalized.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(D::Error::custom(format!(
                    "Invalid boolean flag: '{}'",
                    text
                ))),
            }
        }
    }
}
