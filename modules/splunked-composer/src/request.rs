use serde::{Deserialize, Deserializer, Serialize};

/// The caller's selection of catalog ids plus free-form time range and field.
///
/// Every field is optional on the wire; `null` is treated like an absent field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompositionRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub data_sources: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub includes: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub excludes: Vec<String>,
    /// A time-range preset id, or raw SPL time modifiers.
    #[serde(deserialize_with = "null_as_default")]
    pub time_range: String,
    #[serde(deserialize_with = "null_as_default")]
    pub output_shape: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub output_field: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Generated query plus a plain-language description of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Composition {
    pub spl: String,
    pub explanation: String,
    pub components: Components,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    pub base_search: String,
    pub output_shape: String,
}
