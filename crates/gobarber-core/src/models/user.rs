use serde::{Deserialize, Serialize};

/// The authenticated principal, as returned by `POST /sessions` and the
/// profile endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Remote image URL. The API sends `null` when no avatar was uploaded.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub avatar_url: String,
}

impl User {
    /// A user record is usable only when it carries an identifier.
    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    pub fn has_avatar(&self) -> bool {
        !self.avatar_url.is_empty()
    }

    /// First word of the display name, used for greetings.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
