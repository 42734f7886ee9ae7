use collector_core::{Identify, IdentityError, RecordId};

use crate::types::RawRecord;

/// Identity extractor for JSON records keyed by one top-level field,
/// e.g. the invoice portal's `unique_id` column.
///
/// String and integer values are accepted; anything else is a source
/// contract violation.
#[derive(Debug, Clone)]
pub struct FieldIdentity {
    key: String,
}

impl FieldIdentity {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Identify<RawRecord> for FieldIdentity {
    fn identity(&self, record: &RawRecord) -> Result<RecordId, IdentityError> {
        let value = record
            .get(&self.key)
            .ok_or_else(|| IdentityError::MissingKey(self.key.clone()))?;

        match value {
            serde_json::Value::String(s) if !s.is_empty() => Ok(RecordId::new(s.as_str())),
            serde_json::Value::String(_) => Err(IdentityError::Unusable {
                key: self.key.clone(),
                reason: "empty string".to_string(),
            }),
            serde_json::Value::Number(n) => Ok(RecordId::new(n.to_string())),
            other => Err(IdentityError::Unusable {
                key: self.key.clone(),
                reason: format!("unexpected type: {other}"),
            }),
        }
    }
}
