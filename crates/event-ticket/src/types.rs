//! Wire types for the event ticket resources.
//!
//! Drupal serialises integer ids as strings on some deployments, so id
//! fields accept either form.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use smol_str::SmolStr;

/// Default log message for ticket validation.
pub const DEFAULT_VALIDATE_LOG: &str = "Validated via API client";

/// Default log message for ticket reset.
pub const DEFAULT_RESET_LOG: &str = "Reset via API client";

/// Maximum number of barcodes accepted by one batch validation call.
pub const MAX_BATCH_SIZE: usize = 100;

/// A ticket as returned by `event-ticket/{barcode}` and node ticket listings.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique ticket id.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub ticket_id: u64,
    /// The ticket's barcode.
    pub barcode_token: SmolStr,
    /// Whether the ticket is valid right now.
    pub valid: bool,
    /// Why the ticket is invalid, when it is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Whether the ticket has been used before.
    pub used: bool,
    /// Position within the customer's order for this product, e.g. `1 of 2`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<SmolStr>,
    /// Creation date (ISO 8601).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Last change date (ISO 8601).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed: Option<String>,
    /// Further fields, depending on the privileges of the logged in user.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Ticket {
    /// Parsed creation date, if present and well formed.
    pub fn created_at(&self) -> Option<DateTime<FixedOffset>> {
        parse_date(self.created.as_deref())
    }

    /// Parsed last change date, if present and well formed.
    pub fn changed_at(&self) -> Option<DateTime<FixedOffset>> {
        parse_date(self.changed.as_deref())
    }
}

/// A node with tickets, i.e. an event.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node id.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub nid: u64,
    /// Node title.
    pub title: String,
    /// Event start (ISO 8601).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Event end (ISO 8601).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Any other fields the server sends.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Node {
    /// Parsed start date, if present and well formed.
    pub fn starts_at(&self) -> Option<DateTime<FixedOffset>> {
        parse_date(self.start_date.as_deref())
    }

    /// Parsed end date, if present and well formed.
    pub fn ends_at(&self) -> Option<DateTime<FixedOffset>> {
        parse_date(self.end_date.as_deref())
    }
}

fn parse_date(value: Option<&str>) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value?).ok()
}

/// Outcome of validating (marking used) a single ticket.
///
/// On the wire this is `{"validated": true}` or
/// `{"validated": false, "reason": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ValidationWire", into = "ValidationWire")]
pub enum Validation {
    /// The ticket is now marked as used.
    Validated,
    /// The ticket exists but could not be validated.
    Rejected {
        /// Server-provided reason, e.g. `Already used`.
        reason: String,
    },
}

impl Validation {
    /// Whether the ticket was validated.
    pub fn is_validated(&self) -> bool {
        matches!(self, Self::Validated)
    }

    /// Rejection reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Validated => None,
            Self::Rejected { reason } => Some(reason),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ValidationWire {
    validated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl From<ValidationWire> for Validation {
    fn from(wire: ValidationWire) -> Self {
        if wire.validated {
            Self::Validated
        } else {
            Self::Rejected {
                reason: wire.reason.unwrap_or_default(),
            }
        }
    }
}

impl From<Validation> for ValidationWire {
    fn from(value: Validation) -> Self {
        match value {
            Validation::Validated => Self {
                validated: true,
                reason: None,
            },
            Validation::Rejected { reason } => Self {
                validated: false,
                reason: Some(reason),
            },
        }
    }
}

/// Per-barcode outcome of a batch validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Whether a ticket with this barcode exists.
    pub found: bool,
    /// Whether it was validated.
    pub validated: bool,
    /// Why a found ticket was not validated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Batch validation results keyed by barcode.
pub type BatchValidation = BTreeMap<SmolStr, BatchOutcome>;

/// Outcome of resetting a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetOutcome {
    /// Whether the reset happened.
    pub reset: bool,
    /// Whether the ticket is (still) marked used.
    pub used: bool,
}

/// Query for `event-ticket-nodes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, bon::Builder)]
#[builder(start_fn = new)]
pub struct NodeQuery {
    /// Offset from 0.
    #[builder(default)]
    pub offset: u32,
    /// Maximum number of nodes.
    #[builder(default = 50)]
    pub limit: u32,
    /// Only nodes starting today or later, where the server can tell.
    #[builder(default = true)]
    #[serde(serialize_with = "bool_as_int")]
    pub date_filter: bool,
    /// Sort by event date, where the server can.
    #[builder(default = true)]
    #[serde(serialize_with = "bool_as_int")]
    pub date_sort: bool,
}

impl Default for NodeQuery {
    fn default() -> Self {
        Self::new().build()
    }
}

/// Query for `node/{nid}/tickets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, bon::Builder)]
#[builder(start_fn = new)]
pub struct NodeTicketsQuery {
    /// Offset from 0.
    #[builder(default)]
    pub offset: u32,
    /// Maximum number of tickets.
    #[builder(default = 50)]
    pub limit: u32,
    /// Unix timestamp; only tickets created or changed after it. 0 means no bound.
    #[builder(default)]
    pub changed_since: i64,
}

impl Default for NodeTicketsQuery {
    fn default() -> Self {
        Self::new().build()
    }
}

fn bool_as_int<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

/// Body for single-ticket validate and reset calls.
#[derive(Debug, Serialize)]
pub(crate) struct LogBody<'a> {
    pub log: &'a str,
}

/// Body for `event-ticket/validate-multiple`.
#[derive(Debug, Serialize)]
pub(crate) struct BatchBody<'a, T: AsRef<str>> {
    #[serde(serialize_with = "as_str_seq")]
    pub tickets: &'a [T],
    pub log: &'a str,
}

fn as_str_seq<S: Serializer, T: AsRef<str>>(items: &&[T], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(items.iter().map(AsRef::as_ref))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ticket_accepts_string_ids_and_keeps_extra_fields() {
        let ticket: Ticket = serde_json::from_value(json!({
            "ticket_id": "42",
            "barcode_token": "ABC123XYZ",
            "valid": false,
            "reason": "Already used",
            "used": true,
            "position": "1 of 2",
            "created": "2014-05-01T10:00:00+01:00",
            "changed": "garbage",
            "order_id": 7
        }))
        .unwrap();
        assert_eq!(ticket.ticket_id, 42);
        assert_eq!(ticket.reason.as_deref(), Some("Already used"));
        assert_eq!(ticket.extra["order_id"], 7);
        assert_eq!(
            ticket.created_at().map(|d| d.to_rfc3339()),
            Some("2014-05-01T10:00:00+01:00".to_owned())
        );
        assert_eq!(ticket.changed_at(), None);
    }

    #[test]
    fn node_with_numeric_id_and_no_dates() {
        let node: Node = serde_json::from_value(json!({"nid": 3, "title": "Gig"})).unwrap();
        assert_eq!(node.nid, 3);
        assert_eq!(node.starts_at(), None);
        assert!(node.extra.is_empty());
    }

    #[test]
    fn validation_wire_shapes() {
        let ok: Validation = serde_json::from_value(json!({"validated": true})).unwrap();
        assert_eq!(ok, Validation::Validated);
        let no: Validation =
            serde_json::from_value(json!({"validated": false, "reason": "Already used"})).unwrap();
        assert_eq!(no.reason(), Some("Already used"));
        assert!(!no.is_validated());
        assert_eq!(
            serde_json::to_value(&no).unwrap(),
            json!({"validated": false, "reason": "Already used"})
        );
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"validated": true}));
    }

    #[test]
    fn node_query_encodes_booleans_as_digits() {
        let qs = serde_html_form::to_string(&NodeQuery::default()).unwrap();
        assert_eq!(qs, "offset=0&limit=50&date_filter=1&date_sort=1");
        let qs = serde_html_form::to_string(
            &NodeQuery::new().offset(50).limit(10).date_sort(false).build(),
        )
        .unwrap();
        assert_eq!(qs, "offset=50&limit=10&date_filter=1&date_sort=0");
    }

    #[test]
    fn batch_body_serializes_barcodes() {
        let tickets = ["ABC123", "DEF456"];
        let body = BatchBody {
            tickets: &tickets,
            log: DEFAULT_VALIDATE_LOG,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"tickets": ["ABC123", "DEF456"], "log": "Validated via API client"})
        );
    }
}
