use std::collections::{BTreeMap, HashMap};

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::dispatcher::DispatchedOutcome;
use crate::outcome::WorkerOutcome;
use crate::source::SourceId;

/// Per-key view across every source.
///
/// For a given source at most one of `payloads` and `errors` holds an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub key: String,
    pub payloads: BTreeMap<SourceId, serde_json::Value>,
    pub errors: BTreeMap<SourceId, String>,
}

impl MergedRecord {
    fn empty(key: &str) -> Self {
        Self {
            key: key.to_string(),
            payloads: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn has_any_payload(&self) -> bool {
        !self.payloads.is_empty()
    }
}

/// Wire shape: `{ "medicine": key, "apollo": payload|null, "netmed": payload|null, "errors"?: {source: message} }`.
///
/// Only sources the record was merged with appear; a failed source is
/// `null` with its message under `errors`.
impl Serialize for MergedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("medicine", &self.key)?;
        for source in SourceId::ALL {
            if self.payloads.contains_key(&source) || self.errors.contains_key(&source) {
                map.serialize_entry(source.mode(), &self.payloads.get(&source))?;
            }
        }
        if !self.errors.is_empty() {
            map.serialize_entry("errors", &self.errors)?;
        }
        map.end()
    }
}

/// Fold dispatched outcomes into one record per distinct key, in input order.
///
/// When a key repeats, the outcome from its earliest position wins. A
/// `(source, key)` with no outcome at all is recorded as an error so every
/// source ends up in exactly one of the two slots.
#[must_use]
pub fn merge_outcomes(
    keys: &[String],
    sources: &[SourceId],
    outcomes: Vec<DispatchedOutcome>,
) -> Vec<MergedRecord> {
    let mut order: Vec<&str> = Vec::new();
    let mut records: HashMap<&str, MergedRecord> = HashMap::new();
    for key in keys {
        records.entry(key.as_str()).or_insert_with(|| {
            order.push(key.as_str());
            MergedRecord::empty(key)
        });
    }

    let mut sorted = outcomes;
    sorted.sort_by_key(|o| o.position);

    for dispatched in sorted {
        let Some(record) = records.get_mut(dispatched.key.as_str()) else {
            tracing::warn!(
                source = %dispatched.source,
                key = dispatched.key.as_str(),
                "dropping outcome for key outside the batch"
            );
            continue;
        };
        let source = dispatched.source;
        if record.payloads.contains_key(&source) || record.errors.contains_key(&source) {
            continue;
        }
        match dispatched.outcome {
            WorkerOutcome::Success { payload } => {
                record.payloads.insert(source, payload);
            }
            WorkerOutcome::Failure(failure) => {
                record.errors.insert(source, failure.message);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| records.remove(key))
        .map(|mut record| {
            for &source in sources {
                if !record.payloads.contains_key(&source) && !record.errors.contains_key(&source) {
                    record
                        .errors
                        .insert(source, format!("no {source} result was produced"));
                }
            }
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    fn ok(source: SourceId, position: usize, key: &str, payload: serde_json::Value) -> DispatchedOutcome {
        DispatchedOutcome {
            source,
            position,
            key: key.to_string(),
            outcome: WorkerOutcome::success(payload),
        }
    }

    fn failed(source: SourceId, position: usize, key: &str, message: &str) -> DispatchedOutcome {
        DispatchedOutcome {
            source,
            position,
            key: key.to_string(),
            outcome: WorkerOutcome::failure(message),
        }
    }

    #[test]
    fn records_follow_input_order_not_outcome_order() {
        let batch = keys(&["Paracetamol", "Amoxicillin"]);
        let outcomes = vec![
            ok(SourceId::Netmed, 1, "Amoxicillin", json!({ "n": 2 })),
            ok(SourceId::Apollo, 1, "Amoxicillin", json!({ "a": 2 })),
            ok(SourceId::Netmed, 0, "Paracetamol", json!({ "n": 1 })),
            ok(SourceId::Apollo, 0, "Paracetamol", json!({ "a": 1 })),
        ];

        let records = merge_outcomes(&batch, &SourceId::ALL, outcomes);

        let order: Vec<&str> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(order, ["Paracetamol", "Amoxicillin"]);
        assert_eq!(records[0].payloads[&SourceId::Apollo], json!({ "a": 1 }));
        assert_eq!(records[1].payloads[&SourceId::Netmed], json!({ "n": 2 }));
    }

    #[test]
    fn key_with_no_successes_still_appears() {
        let batch = keys(&["Unobtainium"]);
        let outcomes = vec![
            failed(SourceId::Apollo, 0, "Unobtainium", "No products found."),
            failed(SourceId::Netmed, 0, "Unobtainium", "Failed to parse scraper output"),
        ];

        let records = merge_outcomes(&batch, &SourceId::ALL, outcomes);

        assert_eq!(records.len(), 1);
        assert!(!records[0].has_any_payload());
        assert_eq!(records[0].errors.len(), 2);
    }

    #[test]
    fn duplicate_keys_merge_into_first_position() {
        let batch = keys(&["Dolo", "Crocin", "Dolo"]);
        let outcomes = vec![
            failed(SourceId::Apollo, 2, "Dolo", "later failure"),
            ok(SourceId::Apollo, 0, "Dolo", json!({ "first": true })),
            ok(SourceId::Apollo, 1, "Crocin", json!({})),
        ];

        let records = merge_outcomes(&batch, &[SourceId::Apollo], outcomes);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key, "Dolo");
        assert_eq!(records[0].payloads[&SourceId::Apollo], json!({ "first": true }));
        assert!(records[0].errors.is_empty());
    }

    #[test]
    fn missing_outcome_is_recorded_as_error() {
        let batch = keys(&["Dolo"]);
        let outcomes = vec![ok(SourceId::Apollo, 0, "Dolo", json!({}))];

        let records = merge_outcomes(&batch, &SourceId::ALL, outcomes);

        assert_eq!(
            records[0].errors.get(&SourceId::Netmed).map(String::as_str),
            Some("no netmed result was produced")
        );
    }

    #[test]
    fn serializes_to_wire_shape() {
        let batch = keys(&["Paracetamol"]);
        let outcomes = vec![
            ok(SourceId::Apollo, 0, "Paracetamol", json!({ "best_choice": null })),
            failed(SourceId::Netmed, 0, "Paracetamol", "No products found."),
        ];

        let records = merge_outcomes(&batch, &SourceId::ALL, outcomes);
        let value = serde_json::to_value(&records[0]).unwrap();

        assert_eq!(
            value,
            json!({
                "medicine": "Paracetamol",
                "apollo": { "best_choice": null },
                "netmed": null,
                "errors": { "netmed": "No products found." }
            })
        );
    }

    #[test]
    fn single_source_record_omits_other_sources() {
        let batch = keys(&["Paracetamol"]);
        let outcomes = vec![ok(SourceId::Apollo, 0, "Paracetamol", json!({ "price": 31.5 }))];

        let records = merge_outcomes(&batch, &[SourceId::Apollo], outcomes);
        let value = serde_json::to_value(&records[0]).unwrap();

        assert_eq!(
            value,
            json!({ "medicine": "Paracetamol", "apollo": { "price": 31.5 } })
        );
    }

    #[test]
    fn errors_field_omitted_when_clean() {
        let batch = keys(&["Paracetamol"]);
        let outcomes = vec![
            ok(SourceId::Apollo, 0, "Paracetamol", json!(1)),
            ok(SourceId::Netmed, 0, "Paracetamol", json!(2)),
        ];
        let records = merge_outcomes(&batch, &SourceId::ALL, outcomes);
        let value = serde_json::to_value(&records[0]).unwrap();
        assert!(value.get("errors").is_none());
    }
}
