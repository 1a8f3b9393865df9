use serde::{Deserialize, Serialize};

use crate::ROOT_BRAND_ID;

/// Every identifier a brand has been known by, across both feeds.
///
/// Both lists behave as insertion-ordered sets: the `add_*` methods never
/// introduce duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeIdentifiers {
    /// Natural keys from the authority feed.
    #[serde(rename = "TME", default, skip_serializing_if = "Vec::is_empty")]
    pub legacy_keys: Vec<String>,
    /// Identities (UUIDs). Always contains the owning brand's `id`.
    #[serde(rename = "uuids", default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
}

impl AlternativeIdentifiers {
    /// Add `id` unless already present. Returns whether it was added.
    pub fn add_id(&mut self, id: impl Into<String>) -> bool {
        push_unique(&mut self.ids, id.into())
    }

    /// Add a natural key unless already present. Returns whether it was added.
    pub fn add_legacy_key(&mut self, key: impl Into<String>) -> bool {
        push_unique(&mut self.legacy_keys, key.into())
    }

    #[must_use]
    pub fn contains_id(&self, id: &str) -> bool {
        self.ids.iter().any(|known| known == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.legacy_keys.is_empty() && self.ids.is_empty()
    }
}

fn push_unique(list: &mut Vec<String>, value: String) -> bool {
    if list.contains(&value) {
        return false;
    }
    list.push(value);
    true
}

/// A cached brand: the unit of storage and the unit returned to callers.
///
/// Serialized with the field tags of the published brand representation;
/// empty fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    /// Primary key in the store. Immutable once assigned.
    #[serde(rename = "uuid")]
    pub id: String,
    /// Hierarchical parent. Empty only for the root brand (or before the
    /// persistence stage applies the root default).
    #[serde(rename = "parentUUID", default, skip_serializing_if = "String::is_empty")]
    pub parent_id: String,
    #[serde(rename = "prefLabel", default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(
        rename = "alternativeIdentifiers",
        default,
        skip_serializing_if = "AlternativeIdentifiers::is_empty"
    )]
    pub alternative_identifiers: AlternativeIdentifiers,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub strapline: String,
    /// Plain-text rendering of `description_raw`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Description markup as supplied by the curated feed.
    #[serde(rename = "descriptionXML", default, skip_serializing_if = "String::is_empty")]
    pub description_raw: String,
    #[serde(rename = "_imageUrl", default, skip_serializing_if = "String::is_empty")]
    pub image_ref: String,
}

impl Brand {
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.id == ROOT_BRAND_ID
    }

    /// Give a parentless, non-root brand the root as parent.
    ///
    /// Returns whether the parent was changed.
    pub fn apply_root_default(&mut self) -> bool {
        if self.parent_id.is_empty() && !self.is_root() {
            self.parent_id = ROOT_BRAND_ID.to_owned();
            return true;
        }
        false
    }
}

/// One element of the identifier listing: `{"ID": "<uuid>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandId {
    #[serde(rename = "ID")]
    pub id: String,
}

/// One element of the link listing: `{"apiUrl": "<base>/<uuid>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandLink {
    #[serde(rename = "apiUrl")]
    pub api_url: String,
}

impl BrandLink {
    /// Join `base_url` and `id` with exactly one `/`.
    #[must_use]
    pub fn new(base_url: &str, id: &str) -> Self {
        Self {
            api_url: format!("{}/{id}", base_url.trim_end_matches('/')),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_id_is_set_like() {
        let mut alt = AlternativeIdentifiers::default();
        assert!(alt.add_id("a"));
        assert!(alt.add_id("b"));
        assert!(!alt.add_id("a"));
        assert_eq!(alt.ids, vec!["a", "b"]);
        assert!(alt.contains_id("b"));
    }

    #[test]
    fn root_default_skips_root_and_existing_parents() {
        let mut orphan = Brand {
            id: "0e86d39b-8320-3a98-a87a-ff35d2cb04b9".to_owned(),
            ..Brand::default()
        };
        assert!(orphan.apply_root_default());
        assert_eq!(orphan.parent_id, ROOT_BRAND_ID);

        let mut root = Brand {
            id: ROOT_BRAND_ID.to_owned(),
            ..Brand::default()
        };
        assert!(!root.apply_root_default());
        assert!(root.parent_id.is_empty());

        let mut child = Brand {
            id: "x".to_owned(),
            parent_id: "y".to_owned(),
            ..Brand::default()
        };
        assert!(!child.apply_root_default());
        assert_eq!(child.parent_id, "y");
    }

    #[test]
    fn serializes_with_published_field_tags() {
        let brand = Brand {
            id: "89400620-0727-3b07-b39e-3e614c115706".to_owned(),
            parent_id: ROOT_BRAND_ID.to_owned(),
            label: "Bob".to_owned(),
            kind: "Brand".to_owned(),
            alternative_identifiers: AlternativeIdentifiers {
                legacy_keys: vec!["Ym9i-QnJhbmRz".to_owned()],
                ids: vec!["89400620-0727-3b07-b39e-3e614c115706".to_owned()],
            },
            aliases: vec!["Bob".to_owned()],
            image_ref: "http://img".to_owned(),
            ..Brand::default()
        };
        let json: serde_json::Value = serde_json::to_value(&brand).unwrap();
        assert_eq!(json["uuid"], "89400620-0727-3b07-b39e-3e614c115706");
        assert_eq!(json["parentUUID"], ROOT_BRAND_ID);
        assert_eq!(json["prefLabel"], "Bob");
        assert_eq!(json["type"], "Brand");
        assert_eq!(json["alternativeIdentifiers"]["TME"][0], "Ym9i-QnJhbmRz");
        assert_eq!(json["_imageUrl"], "http://img");
        // Empty fields are omitted.
        assert!(json.get("strapline").is_none());
        assert!(json.get("descriptionXML").is_none());
    }

    #[test]
    fn deserializes_sparse_documents() {
        let brand: Brand = serde_json::from_str(r#"{"uuid":"abc"}"#).unwrap();
        assert_eq!(brand.id, "abc");
        assert!(brand.parent_id.is_empty());
        assert!(brand.alternative_identifiers.is_empty());
    }

    #[test]
    fn link_joins_with_single_slash() {
        assert_eq!(BrandLink::new("/base/url", "abc").api_url, "/base/url/abc");
        assert_eq!(
            BrandLink::new("http://host/brands/", "abc").api_url,
            "http://host/brands/abc"
        );
    }

    #[test]
    fn brand_id_wire_shape() {
        let json = serde_json::to_string(&BrandId { id: "abc".to_owned() }).unwrap();
        assert_eq!(json, r#"{"ID":"abc"}"#);
    }
}
