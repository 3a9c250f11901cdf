//! Lead schema and the derived aggregation types.
//!
//! The cache layer treats payloads as opaque except for three lead fields
//! named by a [`LeadSchema`]: a status string, an export flag and an
//! optional list name. All three live inside the payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::Payload;
use crate::EpochMillis;

/// Status value that marks a lead as valid.
pub const VALID_STATUS: &str = "valid";

/// Names of the payload fields read during classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadSchema {
    pub status_field: String,
    pub export_field: String,
    pub list_field: String,
}

impl Default for LeadSchema {
    fn default() -> Self {
        Self {
            status_field: "emailStatus".to_string(),
            export_field: "exported".to_string(),
            list_field: "listLeadBelongsTo".to_string(),
        }
    }
}

/// Classification of a single decoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadClass {
    ValidExported,
    ValidUnexported { list: Option<String> },
    Invalid,
}

impl LeadSchema {
    /// Classify a payload.
    ///
    /// A missing or non-string status is invalid. A missing or non-boolean
    /// export flag counts as not exported. Empty list names are ignored.
    pub fn classify(&self, payload: &Payload) -> LeadClass {
        let Some(status) = payload.get(&self.status_field).and_then(Value::as_str) else {
            return LeadClass::Invalid;
        };
        if status != VALID_STATUS {
            return LeadClass::Invalid;
        }

        let exported = payload
            .get(&self.export_field)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if exported {
            return LeadClass::ValidExported;
        }

        let list = payload
            .get(&self.list_field)
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        LeadClass::ValidUnexported { list }
    }
}

/// Per-category counts over every key in the namespace.
///
/// `total` counts key presence; every key contributes to exactly one of
/// `valid_exported`, `valid_unexported` or `invalid`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClassificationTally {
    pub valid_exported: u64,
    pub valid_unexported: u64,
    pub invalid: u64,
    pub total: u64,
    pub per_list_counts: BTreeMap<String, u64>,
}

impl ClassificationTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one key.
    pub fn record(&mut self, class: LeadClass) {
        self.total += 1;
        match class {
            LeadClass::ValidExported => self.valid_exported += 1,
            LeadClass::ValidUnexported { list } => {
                self.valid_unexported += 1;
                if let Some(list) = list {
                    *self.per_list_counts.entry(list).or_insert(0) += 1;
                }
            }
            LeadClass::Invalid => self.invalid += 1,
        }
    }

    /// Combine two partial tallies. Commutative and associative.
    pub fn merge(mut self, other: ClassificationTally) -> Self {
        self.valid_exported += other.valid_exported;
        self.valid_unexported += other.valid_unexported;
        self.invalid += other.invalid;
        self.total += other.total;
        for (list, count) in other.per_list_counts {
            *self.per_list_counts.entry(list).or_insert(0) += count;
        }
        self
    }

    /// `valid_exported + valid_unexported + invalid == total`.
    pub fn is_balanced(&self) -> bool {
        self.valid_exported + self.valid_unexported + self.invalid == self.total
    }
}

/// Entry count plus the write-time window of a bounded sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StatsSnapshot {
    pub total_entries: u64,
    /// Largest sampled `written_at`; 0 when nothing was sampled.
    pub newest_timestamp: EpochMillis,
    /// Smallest sampled `written_at`; the request time when nothing was sampled.
    pub oldest_timestamp: EpochMillis,
}

impl StatsSnapshot {
    /// Empty window: newest starts at 0 and oldest at `now`, so "no data"
    /// stays distinguishable from very old or very new data.
    pub fn start(total_entries: u64, now: EpochMillis) -> Self {
        Self {
            total_entries,
            newest_timestamp: 0,
            oldest_timestamp: now,
        }
    }

    /// Widen the window with one sampled write time.
    pub fn observe(&mut self, written_at: EpochMillis) {
        if written_at > self.newest_timestamp {
            self.newest_timestamp = written_at;
        }
        if written_at < self.oldest_timestamp {
            self.oldest_timestamp = written_at;
        }
    }
}

// ============================================================================
// EXPORT
// ============================================================================

/// Payload fields copied into an export row.
const FIRST_NAME_FIELD: &str = "firstName";
const LAST_NAME_FIELD: &str = "lastName";
const COMPANY_NAME_FIELD: &str = "companyName";
const EMAIL_FIELD: &str = "email";
/// Optional object holding a generated `{subject, body}` draft.
const EMAIL_DATA_FIELD: &str = "emailData";

/// One exported lead. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub email: String,
    pub subject: String,
    pub body: String,
}

impl ExportRow {
    /// Build a row from a lead payload. `None` when the lead has no email.
    ///
    /// Non-string fields export as empty cells.
    pub fn from_payload(payload: &Payload) -> Option<Self> {
        let text = |map: &Payload, field: &str| {
            map.get(field)
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };

        let email = text(payload, EMAIL_FIELD);
        if email.is_empty() {
            return None;
        }

        let draft = payload.get(EMAIL_DATA_FIELD).and_then(Value::as_object);
        Some(Self {
            first_name: text(payload, FIRST_NAME_FIELD),
            last_name: text(payload, LAST_NAME_FIELD),
            company_name: text(payload, COMPANY_NAME_FIELD),
            email,
            subject: draft.map(|d| text(d, "subject")).unwrap_or_default(),
            body: draft.map(|d| text(d, "body")).unwrap_or_default(),
        })
    }

    /// Whether the row carries both a subject and a body.
    pub fn has_draft(&self) -> bool {
        !self.subject.is_empty() && !self.body.is_empty()
    }
}

/// Outcome of exporting the valid, not yet exported leads.
///
/// `rows` holds exactly the leads that were marked exported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub rows: Vec<ExportRow>,
    /// Valid leads already flagged as exported.
    pub skipped_exported: u64,
    /// Leads that are not valid, plus unreadable or vanished keys.
    pub skipped_invalid: u64,
    pub skipped_no_email: u64,
    /// Later leads whose email was already exported in this run.
    pub skipped_duplicate: u64,
    /// Leads whose export flag could not be written back.
    pub failed: u64,
}

impl ExportReport {
    pub fn exported(&self) -> u64 {
        self.rows.len() as u64
    }

    pub fn with_draft(&self) -> u64 {
        self.rows.iter().filter(|row| row.has_draft()).count() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => Payload::new(),
        }
    }

    #[test]
    fn test_classify_valid_unexported_with_list() {
        let schema = LeadSchema::default();
        let p = payload(json!({"emailStatus": "valid", "exported": false, "listLeadBelongsTo": "L1"}));
        assert_eq!(
            schema.classify(&p),
            LeadClass::ValidUnexported {
                list: Some("L1".to_string())
            }
        );
    }

    #[test]
    fn test_classify_valid_exported() {
        let schema = LeadSchema::default();
        let p = payload(json!({"emailStatus": "valid", "exported": true, "listLeadBelongsTo": "L1"}));
        assert_eq!(schema.classify(&p), LeadClass::ValidExported);
    }

    #[test]
    fn test_classify_missing_export_flag_is_unexported() {
        let schema = LeadSchema::default();
        let p = payload(json!({"emailStatus": "valid", "listLeadBelongsTo": ""}));
        assert_eq!(schema.classify(&p), LeadClass::ValidUnexported { list: None });

        let p = payload(json!({"emailStatus": "valid", "exported": "yes"}));
        assert_eq!(schema.classify(&p), LeadClass::ValidUnexported { list: None });
    }

    #[test]
    fn test_classify_invalid() {
        let schema = LeadSchema::default();
        assert_eq!(
            schema.classify(&payload(json!({"emailStatus": "bounced"}))),
            LeadClass::Invalid
        );
        assert_eq!(
            schema.classify(&payload(json!({"emailStatus": "VALID"}))),
            LeadClass::Invalid
        );
        assert_eq!(schema.classify(&payload(json!({"emailStatus": 1}))), LeadClass::Invalid);
        assert_eq!(schema.classify(&Payload::new()), LeadClass::Invalid);
    }

    #[test]
    fn test_custom_schema() {
        let schema = LeadSchema {
            status_field: "status".to_string(),
            export_field: "done".to_string(),
            list_field: "list".to_string(),
        };
        let p = payload(json!({"status": "valid", "done": true}));
        assert_eq!(schema.classify(&p), LeadClass::ValidExported);
    }

    #[test]
    fn test_tally_record() {
        let mut tally = ClassificationTally::new();
        tally.record(LeadClass::ValidUnexported {
            list: Some("L1".to_string()),
        });
        tally.record(LeadClass::ValidExported);
        tally.record(LeadClass::Invalid);

        assert_eq!(tally.valid_unexported, 1);
        assert_eq!(tally.valid_exported, 1);
        assert_eq!(tally.invalid, 1);
        assert_eq!(tally.total, 3);
        assert_eq!(tally.per_list_counts.get("L1"), Some(&1));
        assert!(tally.is_balanced());
    }

    #[test]
    fn test_stats_snapshot_window() {
        let mut stats = StatsSnapshot::start(3, 10_000);
        assert_eq!(stats.newest_timestamp, 0);
        assert_eq!(stats.oldest_timestamp, 10_000);

        stats.observe(4_000);
        stats.observe(6_000);
        assert_eq!(stats.newest_timestamp, 6_000);
        assert_eq!(stats.oldest_timestamp, 4_000);
        assert!(stats.oldest_timestamp <= stats.newest_timestamp);
    }

    #[test]
    fn test_export_row_from_payload() {
        let p = payload(json!({
            "email": " jane@acme.com ",
            "firstName": "Jane",
            "lastName": "Doe",
            "companyName": "Acme",
            "emailData": {"subject": "Hi", "body": "<p>Hello</p>"}
        }));
        let row = ExportRow::from_payload(&p).unwrap();
        assert_eq!(row.email, "jane@acme.com");
        assert_eq!(row.first_name, "Jane");
        assert_eq!(row.company_name, "Acme");
        assert_eq!(row.subject, "Hi");
        assert!(row.has_draft());
    }

    #[test]
    fn test_export_row_missing_fields() {
        assert_eq!(ExportRow::from_payload(&payload(json!({"firstName": "Jane"}))), None);
        assert_eq!(ExportRow::from_payload(&payload(json!({"email": 7}))), None);

        let row = ExportRow::from_payload(&payload(json!({"email": "a@x.com", "lastName": 3})))
            .unwrap();
        assert!(row.last_name.is_empty());
        assert!(!row.has_draft());
    }

    fn lead_class() -> impl Strategy<Value = LeadClass> {
        prop_oneof![
            Just(LeadClass::ValidExported),
            Just(LeadClass::Invalid),
            prop::option::of("L[0-3]").prop_map(|list| LeadClass::ValidUnexported { list }),
        ]
    }

    fn tally_of(classes: &[LeadClass]) -> ClassificationTally {
        let mut tally = ClassificationTally::new();
        for class in classes {
            tally.record(class.clone());
        }
        tally
    }

    proptest! {
        #[test]
        fn prop_merge_matches_sequential(
            a in prop::collection::vec(lead_class(), 0..20),
            b in prop::collection::vec(lead_class(), 0..20),
            c in prop::collection::vec(lead_class(), 0..20),
        ) {
            let all: Vec<LeadClass> = a.iter().chain(&b).chain(&c).cloned().collect();
            let sequential = tally_of(&all);

            let left = tally_of(&a).merge(tally_of(&b)).merge(tally_of(&c));
            let right = tally_of(&c).merge(tally_of(&b).merge(tally_of(&a)));

            prop_assert_eq!(&left, &sequential);
            prop_assert_eq!(&right, &sequential);
            prop_assert!(sequential.is_balanced());
        }
    }
}
