//! Raw authority term → cache entity.

use brandcache_types::{AlternativeIdentifiers, BRAND_TYPE, Brand, RawTerm};

use crate::identity::{hash_identity, natural_key};
use crate::legacy_ids;

/// Remove duplicates, keeping the first occurrence of each value.
#[must_use]
pub fn dedup(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// `aliases` followed by `canonical_name`, deduplicated.
#[must_use]
pub fn build_aliases(aliases: &[String], canonical_name: &str) -> Vec<String> {
    let mut all = Vec::with_capacity(aliases.len() + 1);
    all.extend(aliases.iter().cloned());
    all.push(canonical_name.to_owned());
    dedup(all)
}

/// Turn one authority term into a cache entity.
///
/// The parent is left empty; persistence applies the root default.
#[must_use]
pub fn transform_term(term: &RawTerm, taxonomy: &str) -> Brand {
    let key = natural_key(&term.raw_id, taxonomy);
    let hashed = hash_identity(&key);
    let legacy = legacy_ids::lookup(&key);

    let mut ids = vec![hashed.clone()];
    ids.extend(legacy.map(str::to_owned));
    let id = legacy.map_or(hashed, str::to_owned);

    Brand {
        id,
        label: term.canonical_name.clone(),
        kind: BRAND_TYPE.to_owned(),
        alternative_identifiers: AlternativeIdentifiers {
            legacy_keys: vec![key],
            ids: dedup(ids),
        },
        aliases: build_aliases(&term.aliases, &term.canonical_name),
        ..Brand::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        assert_eq!(
            dedup(strings(&["a", "b", "b", "c", "d", "d"])),
            strings(&["a", "b", "c", "d"])
        );
    }

    #[test]
    fn aliases_end_with_canonical_name() {
        assert_eq!(
            build_aliases(&strings(&["B", "b"]), "Bob"),
            strings(&["B", "b", "Bob"])
        );
        assert_eq!(
            build_aliases(&strings(&["A", "B", "C"]), "C"),
            strings(&["A", "B", "C"])
        );
    }

    #[test]
    fn transforms_plain_term() {
        let term = RawTerm::new("bob", "Bob").with_aliases(["B", "b"]);
        let brand = transform_term(&term, "taxonomy_name");
        assert_eq!(brand.id, "0e86d39b-8320-3a98-a87a-ff35d2cb04b9");
        assert_eq!(brand.label, "Bob");
        assert_eq!(brand.kind, "Brand");
        assert_eq!(brand.aliases, strings(&["B", "b", "Bob"]));
        assert_eq!(brand.alternative_identifiers.ids, vec![brand.id.clone()]);
        assert!(brand.parent_id.is_empty());
    }

    #[test]
    fn legacy_identity_is_primary_and_hash_is_kept() {
        let term = RawTerm::new("Brands_86", "Business blog")
            .with_aliases(["Business Blog", "The Blog of Business"]);
        let brand = transform_term(&term, "Brands");
        assert_eq!(brand.id, "fd4459b2-cc4e-4ec8-9853-c5238eb860fb");
        assert_eq!(
            brand.alternative_identifiers.ids,
            strings(&[
                "0312776d-bac4-3118-bc76-b93b2cd3f1ba",
                "fd4459b2-cc4e-4ec8-9853-c5238eb860fb"
            ])
        );
        assert_eq!(
            brand.alternative_identifiers.legacy_keys,
            strings(&["QnJhbmRzXzg2-QnJhbmRz"])
        );
    }

    proptest! {
        #[test]
        fn dedup_output_is_unique_and_ordered(values in proptest::collection::vec("[a-c]{1,2}", 0..20)) {
            let out = dedup(values.clone());
            for (i, v) in out.iter().enumerate() {
                prop_assert!(!out[..i].contains(v));
            }
            // Each kept value appears in first-occurrence order.
            let mut firsts: Vec<String> = Vec::new();
            for v in values {
                if !firsts.contains(&v) {
                    firsts.push(v);
                }
            }
            prop_assert_eq!(out, firsts);
        }

        #[test]
        fn id_always_listed(raw in "[a-zA-Z0-9_]{1,20}") {
            let brand = transform_term(&RawTerm::new(raw, "Brands"), "Brands");
            prop_assert!(brand.alternative_identifiers.contains_id(&brand.id));
        }
    }
}
