use serde::{Deserialize, Serialize};

/// A gateway reference that arrives either as a bare identifier or as the
/// expanded object it points to, depending on how the caller fetched it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expandable {
    Id(String),
    Object { id: String },
}

impl Expandable {
    /// The bare identifier, regardless of representation.
    pub fn id(&self) -> &str {
        match self {
            Expandable::Id(id) => id,
            Expandable::Object { id } => id,
        }
    }
}

/// The slice of the gateway's payment-intent record this crate reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// The charge the intent last settled with. Absent only in upstream
    /// states this crate treats as precondition violations.
    pub latest_charge: Option<Expandable>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_id_from_both_representations() {
        assert_eq!(Expandable::Id("ch_123".to_owned()).id(), "ch_123");
        assert_eq!(
            Expandable::Object {
                id: "ch_123".to_owned()
            }
            .id(),
            "ch_123"
        );
    }

    #[test]
    fn deserializes_bare_id_and_expanded_object() {
        let bare: PaymentIntent =
            serde_json::from_str(r#"{"id": "pi_1", "latest_charge": "ch_123"}"#).unwrap();
        assert_eq!(bare.latest_charge.unwrap().id(), "ch_123");

        let expanded: PaymentIntent =
            serde_json::from_str(r#"{"id": "pi_1", "latest_charge": {"id": "ch_123"}}"#).unwrap();
        assert_eq!(expanded.latest_charge.unwrap().id(), "ch_123");

        let missing: PaymentIntent =
            serde_json::from_str(r#"{"id": "pi_1", "latest_charge": null}"#).unwrap();
        assert!(missing.latest_charge.is_none());
    }
}
