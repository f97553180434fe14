//! Signable typed-data messages.
//!
//! Signature steps carry an EIP-712 envelope of the form
//! `{ domain, types, primaryType, value }` (some backends use `message`
//! instead of `value`). It is normalized into alloy's `TypedData` so any
//! wallet integration can sign it without re-parsing.

use alloy::dyn_abi::TypedData;
use serde_json::{Value, json};

/// Message fields that carry an order identifier, in lookup order.
const ORDER_ID_FIELDS: [&str; 2] = ["orderId", "orderHash"];

/// EIP-712 typed data ready to be handed to a wallet.
#[derive(Debug, Clone)]
pub struct SignableMessage {
    typed_data: TypedData,
}

impl SignableMessage {
    /// Interpret a raw envelope as typed data.
    ///
    /// Returns `None` unless the envelope is structurally typed-data shaped:
    /// object `domain`, object `types`, string `primaryType` and an object
    /// `value`/`message`, and it parses as EIP-712 typed data.
    pub fn from_envelope(envelope: &Value) -> Option<Self> {
        let obj = envelope.as_object()?;
        let domain = obj.get("domain").filter(|v| v.is_object())?;
        let types = obj.get("types").filter(|v| v.is_object())?;
        let primary_type = obj.get("primaryType").filter(|v| v.is_string())?;
        let message = obj
            .get("value")
            .or_else(|| obj.get("message"))
            .filter(|v| v.is_object())?;

        let normalized = json!({
            "domain": domain,
            "types": types,
            "primaryType": primary_type,
            "message": message,
        });

        serde_json::from_value::<TypedData>(normalized)
            .ok()
            .map(|typed_data| Self { typed_data })
    }

    /// Wrap already-parsed typed data.
    pub const fn from_typed_data(typed_data: TypedData) -> Self {
        Self { typed_data }
    }

    pub const fn typed_data(&self) -> &TypedData {
        &self.typed_data
    }

    pub fn primary_type(&self) -> &str {
        &self.typed_data.primary_type
    }

    /// Order identifier embedded in the signed message, if any.
    pub fn embedded_order_id(&self) -> Option<String> {
        ORDER_ID_FIELDS
            .iter()
            .find_map(|field| match self.typed_data.message.get(*field)? {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_envelope(message_key: &str, message: Value) -> Value {
        let mut envelope = json!({
            "domain": {
                "name": "Marketplace",
                "version": "1",
                "chainId": 137,
                "verifyingContract": "0x0000000000000000000000000000000000000abc"
            },
            "types": {
                "Order": [
                    { "name": "orderId", "type": "string" },
                    { "name": "maker", "type": "address" }
                ]
            },
            "primaryType": "Order"
        });
        envelope[message_key] = message;
        envelope
    }

    #[test]
    fn test_envelope_with_value_key() {
        let envelope = order_envelope(
            "value",
            json!({ "orderId": "ord-42", "maker": "0x0000000000000000000000000000000000000001" }),
        );
        let message = SignableMessage::from_envelope(&envelope).unwrap();

        assert_eq!(message.primary_type(), "Order");
        assert_eq!(message.embedded_order_id().as_deref(), Some("ord-42"));
    }

    #[test]
    fn test_envelope_with_message_key() {
        let envelope = order_envelope(
            "message",
            json!({ "orderId": 7, "maker": "0x0000000000000000000000000000000000000001" }),
        );
        let message = SignableMessage::from_envelope(&envelope).unwrap();
        assert_eq!(message.embedded_order_id().as_deref(), Some("7"));
    }

    #[test]
    fn test_no_embedded_order_id() {
        let envelope = order_envelope(
            "value",
            json!({ "maker": "0x0000000000000000000000000000000000000001" }),
        );
        let message = SignableMessage::from_envelope(&envelope).unwrap();
        assert!(message.embedded_order_id().is_none());
    }

    #[test]
    fn test_rejects_non_typed_data_shapes() {
        assert!(SignableMessage::from_envelope(&json!("0xdeadbeef")).is_none());
        assert!(SignableMessage::from_envelope(&json!({ "hash": "0x01" })).is_none());

        let mut missing_primary = order_envelope("value", json!({ "orderId": "x" }));
        missing_primary.as_object_mut().unwrap().remove("primaryType");
        assert!(SignableMessage::from_envelope(&missing_primary).is_none());
    }
}
