//! Append-only hash-chained audit log binding all election phases.

use chrono::Utc;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::{
    constants,
    crypto_tools::hash::{hash_to_challenge, Element},
};

/// Election phase recorded by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Setup,
    Registro,
    Voto,
    Mezcla,
    Conteo,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Setup => "SETUP",
            EventKind::Registro => "REGISTRO",
            EventKind::Voto => "VOTO",
            EventKind::Mezcla => "MEZCLA",
            EventKind::Conteo => "CONTEO",
        }
    }
}

/// One chain entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Wall clock, epoch milliseconds.
    pub timestamp: i64,
    pub kind: EventKind,
    pub payload: Value,
    pub prev_hash: BigUint,
    pub this_hash: BigUint,
}

/// Snapshot of the full chain for external consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditExport {
    pub hash_genesis: BigUint,
    pub total_eventos: usize,
    pub eventos: Vec<AuditEvent>,
}

/// Tamper-evident event log. Events are appended in completion order, so
/// the chain totally orders all observable state changes.
#[derive(Debug, Clone)]
pub struct AuditLog {
    genesis: BigUint,
    events: Vec<AuditEvent>,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLog {
    pub fn new() -> Self {
        let genesis = chain_hash("GENESIS_BLOCK", 0, &Value::Object(Default::default()), None);
        Self {
            genesis,
            events: Vec::new(),
        }
    }

    /// Append an event and return its chain hash.
    pub fn record(&mut self, kind: EventKind, payload: Value) -> BigUint {
        let timestamp = Utc::now().timestamp_millis();
        let prev_hash = self
            .events
            .last()
            .map(|event| event.this_hash.clone())
            .unwrap_or_else(|| self.genesis.clone());
        let this_hash = chain_hash(kind.as_str(), timestamp, &payload, Some(&prev_hash));

        self.events.push(AuditEvent {
            timestamp,
            kind,
            payload,
            prev_hash,
            this_hash: this_hash.clone(),
        });
        this_hash
    }

    /// Walk the chain; true iff no event's fields have been altered.
    pub fn verify_integrity(&self) -> bool {
        for (i, event) in self.events.iter().enumerate() {
            let expected_prev = if i == 0 {
                &self.genesis
            } else {
                &self.events[i - 1].this_hash
            };
            if &event.prev_hash != expected_prev {
                warn!("audit event {}: broken previous-hash link", i);
                return false;
            }

            let recomputed = chain_hash(
                event.kind.as_str(),
                event.timestamp,
                &event.payload,
                Some(&event.prev_hash),
            );
            if recomputed != event.this_hash {
                warn!("audit event {}: stored hash does not match contents", i);
                return false;
            }
        }
        true
    }

    pub fn genesis(&self) -> &BigUint {
        &self.genesis
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events_by_kind(&self, kind: EventKind) -> Vec<&AuditEvent> {
        self.events
            .iter()
            .filter(|event| event.kind == kind)
            .collect()
    }

    pub fn export(&self) -> AuditExport {
        AuditExport {
            hash_genesis: self.genesis.clone(),
            total_eventos: self.events.len(),
            eventos: self.events.clone(),
        }
    }
}

/// Hash one event. The payload is canonical JSON and the previous hash is
/// absorbed as its decimal string ("" while seeding the genesis hash).
fn chain_hash(kind: &str, timestamp: i64, payload: &Value, prev_hash: Option<&BigUint>) -> BigUint {
    let payload_json = canonical_json(payload);
    let timestamp = timestamp.to_string();
    let prev = prev_hash.map(|h| h.to_str_radix(10)).unwrap_or_default();
    hash_to_challenge(
        constants::AUDIT_EVENT_TAG,
        &[
            Element::Text(kind),
            Element::Text(&timestamp),
            Element::Text(&payload_json),
            Element::Text(&prev),
        ],
    )
}

/// Objects serialise with sorted keys (the backing map is ordered), which
/// keeps chain hashes stable across rebuilds.
fn canonical_json(payload: &Value) -> String {
    payload.to_string()
}

#[cfg(any(test, feature = "malicious"))] // malicious module used in tests
pub mod malicious {
    use super::*;

    /// Overwrite a stored payload in place, breaking the chain.
    pub fn corrupt_payload(log: &mut AuditLog, index: usize, payload: Value) {
        log.events[index].payload = payload;
    }

    /// Overwrite a stored previous-hash link.
    pub fn corrupt_prev_hash(log: &mut AuditLog, index: usize) {
        let bumped = &log.events[index].prev_hash + 1u32;
        log.events[index].prev_hash = bumped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing_test::traced_test; // enable logs in tests

    #[test]
    fn empty_chain_verifies() {
        assert!(AuditLog::new().verify_integrity());
    }

    #[test]
    fn chain_links_in_order() {
        let mut log = AuditLog::new();
        log.record(EventKind::Setup, json!({ "bits": 128 }));
        log.record(EventKind::Registro, json!({ "voter_id": "Alice_2024" }));
        log.record(EventKind::Voto, json!({ "voter_id": "Alice_2024" }));

        assert_eq!(log.len(), 3);
        assert_eq!(&log.events()[0].prev_hash, log.genesis());
        assert_eq!(log.events()[1].prev_hash, log.events()[0].this_hash);
        assert_eq!(log.events()[2].prev_hash, log.events()[1].this_hash);
        assert!(log.verify_integrity());
    }

    #[test]
    #[traced_test]
    fn tampered_payload_detected() {
        let mut log = AuditLog::new();
        for voter in ["Alice_2024", "Bob_2024", "Carlos_2024"] {
            log.record(EventKind::Registro, json!({ "voter_id": voter }));
        }
        log.record(EventKind::Voto, json!({ "voter_id": "Alice_2024" }));
        log.record(EventKind::Voto, json!({ "voter_id": "Bob_2024" }));
        assert!(log.verify_integrity());

        malicious::corrupt_payload(&mut log, 1, json!({ "voter_id": "Mallory_2024" }));
        assert!(!log.verify_integrity());
    }

    #[test]
    #[traced_test]
    fn tampered_link_detected() {
        let mut log = AuditLog::new();
        log.record(EventKind::Setup, json!({}));
        log.record(EventKind::Conteo, json!({ "total_votos": 8 }));

        malicious::corrupt_prev_hash(&mut log, 1);
        assert!(!log.verify_integrity());
    }

    #[test]
    fn payload_key_order_is_canonical() {
        let a = json!({ "b": 1, "a": 2 });
        let b = json!({ "a": 2, "b": 1 });
        assert_eq!(canonical_json(&a), canonical_json(&b));
    }

    #[test]
    fn export_snapshot() {
        let mut log = AuditLog::new();
        log.record(EventKind::Setup, json!({}));
        log.record(EventKind::Registro, json!({ "voter_id": "Alice_2024" }));

        let export = log.export();
        assert_eq!(export.total_eventos, 2);
        assert_eq!(&export.hash_genesis, log.genesis());
        assert_eq!(export.eventos, log.events());

        assert_eq!(log.events_by_kind(EventKind::Registro).len(), 1);
        assert_eq!(log.events_by_kind(EventKind::Voto).len(), 0);
    }
}
