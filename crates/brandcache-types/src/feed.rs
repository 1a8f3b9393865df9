use serde::{Deserialize, Serialize};

/// One term from the paginated authority feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTerm {
    /// Identifier within the source taxonomy.
    #[serde(rename = "id")]
    pub raw_id: String,
    #[serde(rename = "name")]
    pub canonical_name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl RawTerm {
    pub fn new(raw_id: impl Into<String>, canonical_name: impl Into<String>) -> Self {
        Self {
            raw_id: raw_id.into(),
            canonical_name: canonical_name.into(),
            aliases: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }
}

/// One record from the curated override feed.
///
/// Never persisted as-is; only its effect on a [`crate::Brand`] is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRecord {
    /// Carried through from the feed; does not filter records.
    #[serde(default)]
    pub active: bool,
    #[serde(rename = "prefLabel", default)]
    pub label: String,
    #[serde(default)]
    pub strapline: String,
    #[serde(rename = "imageurl", alias = "imageUrl", default)]
    pub image_ref: String,
    #[serde(rename = "descriptionxml", alias = "descriptionXML", default)]
    pub description_raw: String,
    /// Natural key of this brand. Empty when the curators left it out.
    #[serde(rename = "tmeIdentifier", alias = "tmeidentifier", default)]
    pub natural_key: String,
    #[serde(
        rename = "tmeParentIdentifier",
        alias = "tmeparentidentifier",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_natural_key: Option<String>,
}

impl OverrideRecord {
    /// The parent's natural key, treating an empty string as absent.
    #[must_use]
    pub fn parent_key(&self) -> Option<&str> {
        self.parent_natural_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}
