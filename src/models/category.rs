use serde::{Deserialize, Serialize};

/// A music category shown as one row: a display name and a cover image URL.
///
/// Both fields are always present; the default value has both empty, which
/// is a valid (if blank) category rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryRecord {
    name: String,
    cover_url: String,
}

impl CategoryRecord {
    pub fn new(name: impl Into<String>, cover_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cover_url: cover_url.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// URL or local path of the cover image, handed to the cover loader as-is.
    pub fn cover_url(&self) -> &str {
        &self.cover_url
    }

    pub(crate) fn with_cover_url(self, cover_url: String) -> Self {
        Self {
            name: self.name,
            cover_url,
        }
    }
}
