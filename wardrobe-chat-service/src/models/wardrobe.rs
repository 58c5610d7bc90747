//! Records returned by the wardrobe backend.
//!
//! The backend is loose about scalar types (ages and heights arrive as
//! numbers or strings), so every scalar is read as optional display text.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WardrobeItem {
    #[serde(default, deserialize_with = "lenient_text")]
    pub clothing_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub size: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub season: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
}

/// A profile row. Any column the backend returns marks the profile as present,
/// even when none of the styling fields are filled in.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct UserProfile {
    pub gender: Option<String>,
    pub age: Option<String>,
    pub height: Option<String>,
    pub season: Option<String>,
    pub undertone: Option<String>,
    /// Usually a list of colour codes, rendered as-is otherwise.
    pub palette: Option<Value>,
    columns: usize,
}

impl From<Map<String, Value>> for UserProfile {
    fn from(row: Map<String, Value>) -> Self {
        let text = |key: &str| row.get(key).and_then(display_text);

        Self {
            gender: text("gender"),
            age: text("age"),
            height: text("height"),
            season: text("season"),
            undertone: text("undertone"),
            palette: row.get("palette").filter(|v| !v.is_null()).cloned(),
            columns: row.len(),
        }
    }
}

impl UserProfile {
    /// True for an empty row.
    pub fn is_empty(&self) -> bool {
        self.columns == 0
    }

    /// The first `limit` palette colours joined by commas.
    pub fn palette_summary(&self, limit: usize) -> Option<String> {
        match self.palette.as_ref()? {
            Value::Array(colors) if colors.is_empty() => None,
            Value::Array(colors) => Some(
                colors
                    .iter()
                    .take(limit)
                    .filter_map(display_text)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            other => display_text(other),
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(display_text))
}

/// Human-readable text for a JSON scalar; null and blank strings are absent.
fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
