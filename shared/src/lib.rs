use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A persisted expense record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Store-assigned identifier, never reused
    pub expense_id: i64,
    pub name: String,
    /// Decimal currency amount exactly as the client sent it (e.g. "4.50")
    pub amount: String,
    /// Reference to an expense-type category
    pub type_id: String,
    pub category: String,
    /// Creation time in UTC, set by the server
    pub date: DateTime<Utc>,
}

impl Expense {
    /// Path under which this expense can be fetched
    pub fn location(&self) -> String {
        format!("/expenses/{}", self.expense_id)
    }
}

/// Request body for POST /expenses and PATCH /expenses/:expense_id.
///
/// Every field is optional at the wire level and kept as raw JSON; which
/// fields are required, and which JSON types they accept, is decided by
/// the backend's field schema. Unknown keys are ignored, `null` is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Value>,
}

/// Error body: `{ "error": { "message": ... } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: ErrorMessage {
                message: message.into(),
            },
        }
    }
}
