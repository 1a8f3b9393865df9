//! Merge curated override records into the snapshot.
//!
//! Curated values win for the display fields they carry; identity
//! bookkeeping (alternative identifiers, aliases) on an existing entity is
//! never discarded. Records whose identity cannot be resolved are dropped.

use brandcache_error::{BrandCacheError, Result};
use brandcache_store::{Store, WriteTxn};
use brandcache_types::{AlternativeIdentifiers, BRAND_TYPE, Brand, OverrideRecord, ROOT_BRAND_ID};
use tracing::{debug, info, warn};

use crate::identity::resolve_identity;
use crate::markup::to_plain_text;

/// Outcome counts for one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Records merged into an existing entity.
    pub merged: usize,
    /// Records that created a new entity.
    pub created: usize,
    /// Merged entities whose stored id differed and were re-keyed.
    pub rekeyed: usize,
    pub skipped_unresolvable: usize,
    pub skipped_markup: usize,
    pub skipped_corrupt: usize,
}

impl ReconcileReport {
    #[must_use]
    pub const fn written(&self) -> usize {
        self.merged + self.created
    }

    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped_unresolvable + self.skipped_markup + self.skipped_corrupt
    }
}

/// Parent identity for a record whose own identity is `self_id`.
#[must_use]
pub fn resolve_parent(record: &OverrideRecord, self_id: &str) -> String {
    if let Some(parent) = record.parent_key().and_then(resolve_identity) {
        return parent;
    }
    if self_id == ROOT_BRAND_ID {
        String::new()
    } else {
        ROOT_BRAND_ID.to_owned()
    }
}

/// Overlay `record` onto an existing entity.
///
/// # Errors
/// `Markup` if the description cannot be converted.
pub fn merge_override(
    mut existing: Brand,
    record: &OverrideRecord,
    parent_id: String,
) -> Result<Brand> {
    existing.description = to_plain_text(&record.description_raw)?;
    existing.description_raw.clone_from(&record.description_raw);
    existing.label.clone_from(&record.label);
    existing.strapline.clone_from(&record.strapline);
    existing.parent_id = parent_id;
    existing.image_ref.clone_from(&record.image_ref);
    existing.kind = BRAND_TYPE.to_owned();
    Ok(existing)
}

/// Build an entity from a curated record alone.
pub fn synthesize(record: &OverrideRecord, id: String, parent_id: String) -> Result<Brand> {
    let description = to_plain_text(&record.description_raw)?;
    let mut alternative_identifiers = AlternativeIdentifiers::default();
    alternative_identifiers.add_id(id.clone());
    if record.natural_key != ROOT_BRAND_ID {
        alternative_identifiers.add_legacy_key(record.natural_key.clone());
    }
    Ok(Brand {
        id,
        parent_id,
        label: record.label.clone(),
        kind: BRAND_TYPE.to_owned(),
        alternative_identifiers,
        aliases: Vec::new(),
        strapline: record.strapline.clone(),
        description,
        description_raw: record.description_raw.clone(),
        image_ref: record.image_ref.clone(),
    })
}

/// Apply every record to the snapshot in one write transaction.
///
/// Per-record problems are logged and counted; storage failures abort the
/// pass and roll it back.
pub fn reconcile(store: &Store, records: &[OverrideRecord]) -> Result<ReconcileReport> {
    let report = store.update(|txn| {
        let mut report = ReconcileReport::default();
        for record in records {
            apply_record(txn, record, &mut report)?;
        }
        Ok(report)
    })?;

    info!(
        target: "brandcache.reconcile",
        records = records.len(),
        merged = report.merged,
        created = report.created,
        rekeyed = report.rekeyed,
        skipped = report.skipped(),
        "curated overrides applied"
    );
    Ok(report)
}

fn apply_record(
    txn: &WriteTxn<'_>,
    record: &OverrideRecord,
    report: &mut ReconcileReport,
) -> Result<()> {
    let Some(id) = resolve_identity(&record.natural_key) else {
        let err = BrandCacheError::UnresolvableIdentity {
            label: record.label.clone(),
        };
        warn!(
            target: "brandcache.reconcile",
            parent_key = record.parent_natural_key.as_deref().unwrap_or(""),
            error = %err,
            "curated record ignored"
        );
        report.skipped_unresolvable += 1;
        return Ok(());
    };
    let parent_id = resolve_parent(record, &id);

    let (mut brand, existed) = match txn.get(&id)? {
        None => match synthesize(record, id.clone(), parent_id) {
            Ok(brand) => (brand, false),
            Err(err) => return skip_markup(record, &id, &err, report),
        },
        Some(raw) => {
            let existing: Brand = match serde_json::from_slice(&raw) {
                Ok(existing) => existing,
                Err(err) => {
                    warn!(
                        target: "brandcache.reconcile",
                        id = %id,
                        error = %BrandCacheError::corrupt(id.clone(), err.to_string()),
                        "stored brand unreadable; curated record skipped"
                    );
                    report.skipped_corrupt += 1;
                    return Ok(());
                }
            };
            match merge_override(existing, record, parent_id) {
                Ok(brand) => (brand, true),
                Err(err) => return skip_markup(record, &id, &err, report),
            }
        }
    };

    // The entity lives under the resolved key; only its body is corrected.
    // Whatever sits under the stale body id is a separate entity.
    if brand.id != id {
        debug!(target: "brandcache.reconcile", old = %brand.id, new = %id, "re-keying brand");
        brand.id.clone_from(&id);
        report.rekeyed += 1;
    }
    brand.alternative_identifiers.add_id(id.clone());

    let value = serde_json::to_vec(&brand).map_err(|err| BrandCacheError::Encode {
        key: id.clone(),
        detail: err.to_string(),
    })?;
    txn.put(&id, &value)?;

    if existed {
        report.merged += 1;
        debug!(target: "brandcache.reconcile", id = %id, label = %brand.label, "curated record merged");
    } else {
        report.created += 1;
        info!(
            target: "brandcache.reconcile",
            id = %id,
            label = %brand.label,
            "curated brand not in authority feed; added without authority data"
        );
    }
    Ok(())
}

fn skip_markup(
    record: &OverrideRecord,
    id: &str,
    err: &BrandCacheError,
    report: &mut ReconcileReport,
) -> Result<()> {
    warn!(
        target: "brandcache.reconcile",
        id,
        label = %record.label,
        error = %err,
        "curated description unusable; record skipped"
    );
    report.skipped_markup += 1;
    Ok(())
}
