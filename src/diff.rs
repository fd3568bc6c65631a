//! Minimal patches between two versions of a record.

use thiserror::Error;

use crate::models::{Field, FieldValue, Patch, Record, StorageView};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("update changes nothing")]
pub struct NoChange;

/// Computes the patch that turns `old` into `new`.
///
/// Only fields present in the storage view of `new` take part, so empty
/// strings and a zero counter in `new` never overwrite stored values. A field
/// enters the patch when `old` lacks it or holds a different value. The id is
/// never patched. An empty patch is an error: updates must change something.
pub fn diff(old: &Record, new: &Record) -> Result<Patch, NoChange> {
    let before = StorageView::of(old);
    let after = StorageView::of(new);

    let mut patch = Patch::default();
    for (field, value) in after.iter() {
        if before.get(field) == Some(value) {
            continue;
        }

        match (field, value) {
            (Field::Url, FieldValue::Text(url)) => patch.url = Some(url.clone()),
            (Field::ShortCode, FieldValue::Text(code)) => patch.short_code = Some(code.clone()),
            (Field::CreatedAt, FieldValue::Time(at)) => patch.created_at = Some(*at),
            (Field::UpdatedAt, FieldValue::Time(at)) => patch.updated_at = Some(*at),
            (Field::AccessCount, FieldValue::Count(count)) => patch.access_count = Some(*count),
            _ => {}
        }
    }

    if patch.is_empty() {
        Err(NoChange)
    } else {
        Ok(patch)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn record(url: &str, code: &str) -> Record {
        let now = Utc::now();
        Record::new(url.into(), code.into(), now)
    }

    #[test]
    fn identical_records_change_nothing() {
        let old = record("a", "c1");
        let new = old.clone();

        assert_eq!(diff(&old, &new), Err(NoChange));
    }

    #[test]
    fn patch_holds_only_the_changed_field() {
        let old = record("a", "c1");
        let new = Record {
            url: "b".into(),
            ..old.clone()
        };

        assert_eq!(
            diff(&old, &new),
            Ok(Patch {
                url: Some("b".into()),
                ..Patch::default()
            })
        );
    }

    #[test]
    fn empty_fields_in_new_keep_stored_values() {
        let mut old = record("a", "c1");
        old.access_count = 9;
        let new = Record {
            short_code: String::new(),
            access_count: 0,
            ..old.clone()
        };

        assert_eq!(diff(&old, &new), Err(NoChange));
    }

    #[test]
    fn fields_missing_from_old_are_included() {
        let old = record("a", "c1");
        let new = Record {
            access_count: 2,
            ..old.clone()
        };

        assert_eq!(diff(&old, &new).unwrap(), Patch::access_count(2));
    }

    #[test]
    fn refreshed_timestamp_is_a_change() {
        let old = record("a", "c1");
        let new = Record {
            url: "b".into(),
            updated_at: old.updated_at + Duration::seconds(1),
            ..old.clone()
        };

        let patch = diff(&old, &new).unwrap();
        assert_eq!(patch.url.as_deref(), Some("b"));
        assert_eq!(patch.updated_at, Some(new.updated_at));
        assert!(patch.created_at.is_none());
        assert!(patch.short_code.is_none());
    }

    #[test]
    fn id_is_never_patched() {
        let old = record("a", "c1");
        let new = Record {
            id: "elsewhere".into(),
            ..old.clone()
        };

        assert_eq!(diff(&old, &new), Err(NoChange));
    }
}
