//! Request and response envelopes of the serverless functions.
//!
//! Order payloads use the shop's camelCase field names; the link functions
//! answer in snake_case. Unknown fields are ignored.

use chrono::{DateTime, Utc};
use kiezbett_core::{LinkToken, Order, OrderId, OrderLinkToken, TokenInfo, Transition};
use serde::{Deserialize, Serialize};

/// `GET /orders?state=` response.
#[derive(Debug, Deserialize)]
pub(crate) struct OrdersEnvelope {
    pub orders: OrdersPage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrdersPage {
    #[serde(default)]
    pub data: Vec<Order>,
}

/// `GET /orders/{id}/transitions` response.
#[derive(Debug, Deserialize)]
pub(crate) struct TransitionsEnvelope {
    pub order: TransitionsHolder,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransitionsHolder {
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

/// Body of the three state-change calls.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewStateBody<'a> {
    pub new_state: &'a str,
}

/// `POST /order-links` body; an absent `orderId` issues a global token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateLinkBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<&'a str>,
    pub expiration_days: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<&'a str>,
    pub token_type: &'static str,
}

/// A freshly issued deep link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedLink {
    pub token: LinkToken,
    /// Public URL as generated by the backend.
    #[serde(default)]
    pub url: String,
    pub expires_at: DateTime<Utc>,
    /// `None` for global links.
    #[serde(default)]
    pub order_id: Option<OrderId>,
}

/// `GET /order-links/order/{orderId|global}` response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenList {
    #[serde(default)]
    pub tokens: Vec<OrderLinkToken>,
}

/// `DELETE /order-links/{token}` response.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RevokeAck {
    #[serde(default)]
    pub message: Option<String>,
}

/// An order resolved through a single-order token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedOrder {
    pub order: Order,
    pub token_info: TokenInfo,
}

/// All orders resolved through a global token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedOrders {
    #[serde(default)]
    pub orders: Vec<Order>,
    pub token_info: TokenInfo,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_create_body_for_global_link_omits_order_id() {
        let body = CreateLinkBody {
            order_id: None,
            expiration_days: 30,
            created_by: None,
            token_type: "global",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"expirationDays": 30, "tokenType": "global"})
        );
    }

    #[test]
    fn test_new_state_body() {
        let body = NewStateBody {
            new_state: "nbtoolboxtransto",
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"newState":"nbtoolboxtransto"}"#
        );
    }

    #[test]
    fn test_resolved_orders_decodes_snake_case_token_info() {
        let json = r#"{
            "success": true,
            "orders": [{"id": "o-1", "orderNumber": "1001",
                        "stateMachineState": {"technicalName": "open"}}],
            "token_info": {
                "created_at": "2026-01-01T10:00:00Z",
                "expires_at": "2026-01-31T10:00:00Z",
                "used_count": 4,
                "token_type": "global"
            }
        }"#;
        let resolved: ResolvedOrders = serde_json::from_str(json).unwrap();
        assert_eq!(resolved.orders.len(), 1);
        assert_eq!(resolved.token_info.used_count, 4);
        assert_eq!(resolved.token_info.token_type.as_deref(), Some("global"));
    }
}
