use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};
use validator::Validate;

use crate::{error::AppError, service::RecordService};

/// A URL and the short code it is reachable under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Assigned by the store on insert; empty before that.
    pub id: String,
    pub url: String,
    pub short_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub access_count: i64,
}

impl Record {
    pub fn new(url: String, short_code: String, now: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            url,
            short_code,
            created_at: now,
            updated_at: now,
            access_count: 0,
        }
    }

    pub fn wire(&self, access_count: AccessCount) -> WireRecord<'_> {
        WireRecord {
            id: &self.id,
            url: &self.url,
            short_code: &self.short_code,
            access_count: match access_count {
                AccessCount::Shown => Some(self.access_count),
                AccessCount::Hidden => None,
            },
        }
    }

    pub fn to_wire_bytes(&self, access_count: AccessCount) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.wire(access_count))
    }
}

/// Whether the wire view carries the access counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessCount {
    Hidden,
    Shown,
}

/// Client-facing view of a [`Record`]. Timestamps are never exposed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRecord<'a> {
    #[serde(rename = "_id", skip_serializing_if = "str::is_empty")]
    pub id: &'a str,
    pub url: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub short_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_count: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    Id,
    Url,
    ShortCode,
    CreatedAt,
    UpdatedAt,
    AccessCount,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Id => "_id",
            Field::Url => "url",
            Field::ShortCode => "shortCode",
            Field::CreatedAt => "createdAt",
            Field::UpdatedAt => "updatedAt",
            Field::AccessCount => "accessCount",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Time(DateTime<Utc>),
    Count(i64),
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(text) => serializer.serialize_str(text),
            FieldValue::Time(time) => serializer.serialize_str(&storage_timestamp(time)),
            FieldValue::Count(count) => serializer.serialize_i64(*count),
        }
    }
}

/// RFC 3339 in UTC with fixed nanosecond precision, so the text sorts in
/// time order.
pub fn storage_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Persisted view of a [`Record`]: every non-empty field, keyed by its
/// stored name. Empty strings and a zero counter are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageView(BTreeMap<Field, FieldValue>);

impl StorageView {
    pub fn of(record: &Record) -> Self {
        let mut fields = BTreeMap::new();

        let texts = [
            (Field::Id, &record.id),
            (Field::Url, &record.url),
            (Field::ShortCode, &record.short_code),
        ];
        for (field, text) in texts {
            if !text.is_empty() {
                fields.insert(field, FieldValue::Text(text.clone()));
            }
        }

        fields.insert(Field::CreatedAt, FieldValue::Time(record.created_at));
        fields.insert(Field::UpdatedAt, FieldValue::Time(record.updated_at));

        if record.access_count != 0 {
            fields.insert(Field::AccessCount, FieldValue::Count(record.access_count));
        }

        Self(fields)
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.0.get(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldValue)> {
        self.0.iter().map(|(field, value)| (*field, value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for StorageView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, value) in &self.0 {
            map.serialize_entry(field.name(), value)?;
        }
        map.end()
    }
}

/// Body of `POST /shorten` and `PUT /shorten/{code}`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UrlRequest {
    #[validate(url(message = "Not a valid URL"))]
    pub url: String,
}

impl UrlRequest {
    pub fn from_wire_bytes(bytes: &[u8]) -> Result<Self, AppError> {
        let request: UrlRequest = serde_json::from_slice(bytes)
            .map_err(|e| AppError::MalformedInput(e.to_string()))?;

        if let Err(e) = request.validate() {
            return Err(AppError::MalformedInput(e.to_string()));
        }

        Ok(request)
    }
}

pub struct AppState {
    pub service: RecordService,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn stored() -> Record {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        Record {
            id: "0000000000000000000000a1".into(),
            access_count: 3,
            ..Record::new("http://a".into(), "xyz123".into(), now)
        }
    }

    #[test]
    fn wire_view_hides_access_count_by_default() {
        let bytes = stored().to_wire_bytes(AccessCount::Hidden).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(
            value,
            json!({
                "_id": "0000000000000000000000a1",
                "url": "http://a",
                "shortCode": "xyz123",
            })
        );
    }

    #[test]
    fn wire_view_shows_access_count_on_request() {
        let bytes = stored().to_wire_bytes(AccessCount::Shown).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["accessCount"], 3);
        assert!(value.get("createdAt").is_none());
        assert!(value.get("updatedAt").is_none());
    }

    #[test]
    fn storage_view_carries_timestamps() {
        let value = serde_json::to_value(StorageView::of(&stored())).unwrap();

        assert_eq!(
            value,
            json!({
                "_id": "0000000000000000000000a1",
                "url": "http://a",
                "shortCode": "xyz123",
                "createdAt": "2024-05-01T12:30:00.000000000Z",
                "updatedAt": "2024-05-01T12:30:00.000000000Z",
                "accessCount": 3,
            })
        );
    }

    #[test]
    fn storage_view_omits_empty_fields() {
        let record = Record::new("http://a".into(), String::new(), Utc::now());
        let view = StorageView::of(&record);

        assert!(view.get(Field::Id).is_none());
        assert!(view.get(Field::ShortCode).is_none());
        assert!(view.get(Field::AccessCount).is_none());
        assert_eq!(view.len(), 3);
    }

    #[test]
    fn storage_timestamps_sort_in_time_order() {
        let earlier = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let later = earlier + chrono::Duration::milliseconds(1500);

        assert!(storage_timestamp(&earlier) < storage_timestamp(&later));
    }

    #[test]
    fn parses_url_request() {
        let request = UrlRequest::from_wire_bytes(br#"{"url": "http://someurl"}"#).unwrap();
        assert_eq!(request.url, "http://someurl");
    }

    #[test]
    fn ignores_client_supplied_short_code() {
        let request =
            UrlRequest::from_wire_bytes(br#"{"url": "http://someurl", "shortCode": "mine"}"#)
                .unwrap();
        assert_eq!(request.url, "http://someurl");
    }

    #[test]
    fn rejects_malformed_requests() {
        let bodies: [&[u8]; 6] = [
            b"",
            br#"{"url": 123}"#,
            br#"{"url": "http://someurl""#,
            br#"{"notaurl": "http://someurl"}"#,
            br#"{"url": ""}"#,
            br#"{"url": "not a url"}"#,
        ];

        for body in bodies {
            assert!(
                matches!(
                    UrlRequest::from_wire_bytes(body),
                    Err(AppError::MalformedInput(_))
                ),
                "accepted {:?}",
                String::from_utf8_lossy(body)
            );
        }
    }
}
