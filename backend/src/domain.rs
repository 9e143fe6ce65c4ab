use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;
use shared::{Expense, ExpenseFields};
use tracing::{info, warn};

use crate::db::DbConnection;
use crate::error::ExpenseError;

/// A client-settable expense field. `ALL` is the schema: every field is
/// required on create and checked in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseField {
    Name,
    Amount,
    TypeId,
    Category,
}

impl ExpenseField {
    pub const ALL: [ExpenseField; 4] = [
        ExpenseField::Name,
        ExpenseField::Amount,
        ExpenseField::TypeId,
        ExpenseField::Category,
    ];

    /// Column name, identical to the JSON key
    pub fn column(self) -> &'static str {
        match self {
            ExpenseField::Name => "name",
            ExpenseField::Amount => "amount",
            ExpenseField::TypeId => "type_id",
            ExpenseField::Category => "category",
        }
    }

    fn value(self, fields: &ExpenseFields) -> Option<&Value> {
        match self {
            ExpenseField::Name => fields.name.as_ref(),
            ExpenseField::Amount => fields.amount.as_ref(),
            ExpenseField::TypeId => fields.type_id.as_ref(),
            ExpenseField::Category => fields.category.as_ref(),
        }
    }

    /// The stored text for a JSON value. `type_id` is a free-form reference
    /// and also takes numbers; everything else must be a string.
    fn text(self, value: &Value) -> Result<String, String> {
        match (self, value) {
            (_, Value::String(text)) => Ok(text.clone()),
            (ExpenseField::TypeId, Value::Number(number)) => Ok(number.to_string()),
            (ExpenseField::TypeId, _) => Err("must be a string or a number".to_string()),
            _ => Err("must be a string".to_string()),
        }
    }

    /// Returns the reason a non-empty value is rejected
    fn check(self, value: &str) -> Result<(), String> {
        match self {
            ExpenseField::Amount => check_amount(value),
            ExpenseField::Name | ExpenseField::TypeId | ExpenseField::Category => Ok(()),
        }
    }

    fn invalid(self, reason: &str) -> ExpenseError {
        ExpenseError::Validation(format!(
            "Invalid '{}' in request body: {}",
            self.column(),
            reason
        ))
    }

    /// Type check, then format check. `Ok(None)` when the field is absent,
    /// null, or blank.
    fn read(self, fields: &ExpenseFields) -> Result<Option<String>, ExpenseError> {
        let Some(value) = self.value(fields) else {
            return Ok(None);
        };
        let text = self.text(value).map_err(|reason| self.invalid(&reason))?;
        if is_blank(&text) {
            return Ok(None);
        }
        self.check(&text).map_err(|reason| self.invalid(&reason))?;
        Ok(Some(text))
    }

    fn required(self, fields: &ExpenseFields) -> Result<String, ExpenseError> {
        self.read(fields)?.ok_or_else(|| {
            ExpenseError::Validation(format!("Missing '{}' in request body", self.column()))
        })
    }
}

/// Amounts are plain decimal strings: digits, an optional '.', and at
/// most two fractional digits. Signs and exponents are rejected.
fn check_amount(value: &str) -> Result<(), String> {
    fn is_digits(s: &str) -> bool {
        !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
    }

    let well_formed = match value.split_once('.') {
        Some((whole, fraction)) => is_digits(whole) && is_digits(fraction) && fraction.len() <= 2,
        None => is_digits(value),
    };
    if !well_formed {
        return Err("must be a non-negative number with at most 2 decimal places".to_string());
    }

    Decimal::from_str(value)
        .map(|_| ())
        .map_err(|e| format!("not a representable amount ({e})"))
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// A fully validated create request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpense {
    pub name: String,
    pub amount: String,
    pub type_id: String,
    pub category: String,
}

/// A validated, non-empty set of field overwrites for a partial update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseChanges {
    values: Vec<(ExpenseField, String)>,
}

impl ExpenseChanges {
    pub fn iter(&self) -> impl Iterator<Item = (ExpenseField, &str)> {
        self.values.iter().map(|(field, value)| (*field, value.as_str()))
    }

    pub fn field_count(&self) -> usize {
        self.values.len()
    }
}

/// Validate a create request against the schema. Fields are checked in
/// `ExpenseField::ALL` order and the first failure is reported.
pub fn validate_new_expense(fields: &ExpenseFields) -> Result<NewExpense, ExpenseError> {
    // Struct fields are evaluated in the order written
    Ok(NewExpense {
        name: ExpenseField::Name.required(fields)?,
        amount: ExpenseField::Amount.required(fields)?,
        type_id: ExpenseField::TypeId.required(fields)?,
        category: ExpenseField::Category.required(fields)?,
    })
}

/// Validate a partial update. Absent and null fields are left alone;
/// supplied fields must be non-empty and valid.
pub fn validate_changes(fields: &ExpenseFields) -> Result<ExpenseChanges, ExpenseError> {
    let mut values = Vec::new();
    for field in ExpenseField::ALL {
        if field.value(fields).is_none() {
            continue;
        }
        match field.read(fields)? {
            Some(text) => values.push((field, text)),
            None => return Err(field.invalid("must not be empty")),
        }
    }

    if values.is_empty() {
        return Err(ExpenseError::Validation(
            "Request body must contain either 'name', 'amount', 'type_id' or 'category'".to_string(),
        ));
    }

    Ok(ExpenseChanges { values })
}

/// Expense lifecycle operations, one store round-trip each
#[derive(Clone)]
pub struct ExpenseService {
    db: DbConnection,
}

impl ExpenseService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn list_expenses(&self) -> Result<Vec<Expense>, ExpenseError> {
        let expenses = self.db.list_all().await?;
        info!("Found {} expenses", expenses.len());
        Ok(expenses)
    }

    pub async fn get_expense(&self, expense_id: i64) -> Result<Expense, ExpenseError> {
        match self.db.get_by_id(expense_id).await? {
            Some(expense) => Ok(expense),
            None => {
                warn!("Expense not found: {}", expense_id);
                Err(ExpenseError::NotFound)
            }
        }
    }

    pub async fn create_expense(&self, fields: &ExpenseFields) -> Result<Expense, ExpenseError> {
        let new_expense = validate_new_expense(fields)?;
        let expense = self.db.insert(&new_expense).await?;
        info!("Created expense {} ({})", expense.expense_id, expense.name);
        Ok(expense)
    }

    /// Apply a partial update. Zero rows updated is reported as not found.
    pub async fn update_expense(
        &self,
        expense_id: i64,
        fields: &ExpenseFields,
    ) -> Result<(), ExpenseError> {
        let changes = validate_changes(fields)?;
        if self.db.update(expense_id, &changes).await? == 0 {
            warn!("Expense vanished before update: {}", expense_id);
            return Err(ExpenseError::NotFound);
        }
        info!("Updated {} field(s) of expense {}", changes.field_count(), expense_id);
        Ok(())
    }

    pub async fn delete_expense(&self, expense_id: i64) -> Result<(), ExpenseError> {
        if self.db.remove(expense_id).await? == 0 {
            warn!("Expense not found for delete: {}", expense_id);
            return Err(ExpenseError::NotFound);
        }
        info!("Deleted expense {}", expense_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: Option<&str>, amount: Option<&str>) -> ExpenseFields {
        ExpenseFields {
            name: name.map(Value::from),
            amount: amount.map(Value::from),
            type_id: Some("14".into()),
            category: Some("Recurring".into()),
        }
    }

    fn validation_message(result: Result<impl std::fmt::Debug, ExpenseError>) -> String {
        match result {
            Err(ExpenseError::Validation(message)) => message,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    async fn create_test_service() -> ExpenseService {
        let db = DbConnection::in_memory()
            .await
            .expect("Failed to init test DB");
        ExpenseService::new(db)
    }

    #[test]
    fn test_amount_format() {
        for valid in ["0", "4.50", "15.00", "1000", "0.5", "12.3"] {
            assert!(check_amount(valid).is_ok(), "{valid} should be accepted");
        }
        for invalid in ["", "-1", "+1", "1.234", "abc", "1e5", "1.", ".5", "1,000", "1_000", "1.2.3"] {
            assert!(check_amount(invalid).is_err(), "{invalid} should be rejected");
        }
    }

    #[test]
    fn test_amount_out_of_range() {
        assert!(check_amount("99999999999999999999999999999999").is_err());
    }

    #[test]
    fn test_new_expense_reports_first_missing_field() {
        assert_eq!(
            validation_message(validate_new_expense(&fields(None, None))),
            "Missing 'name' in request body"
        );
        assert_eq!(
            validation_message(validate_new_expense(&fields(Some("rent"), None))),
            "Missing 'amount' in request body"
        );
        assert_eq!(
            validation_message(validate_new_expense(&ExpenseFields {
                name: Some("rent".into()),
                amount: Some("1.00".into()),
                ..Default::default()
            })),
            "Missing 'type_id' in request body"
        );
    }

    #[test]
    fn test_new_expense_blank_counts_as_missing() {
        assert_eq!(
            validation_message(validate_new_expense(&fields(Some("   "), Some("1.00")))),
            "Missing 'name' in request body"
        );
    }

    #[test]
    fn test_new_expense_rejects_bad_amount() {
        let message = validation_message(validate_new_expense(&fields(Some("rent"), Some("-3"))));
        assert!(message.starts_with("Invalid 'amount' in request body"));
    }

    #[test]
    fn test_new_expense_checks_types_in_schema_order() {
        // A wrong-typed amount does not hide the missing name
        let only_amount = ExpenseFields {
            amount: Some(Value::from(1000)),
            ..Default::default()
        };
        assert_eq!(
            validation_message(validate_new_expense(&only_amount)),
            "Missing 'name' in request body"
        );

        let numeric_amount = ExpenseFields {
            amount: Some(Value::from(1000)),
            ..fields(Some("rent"), None)
        };
        assert_eq!(
            validation_message(validate_new_expense(&numeric_amount)),
            "Invalid 'amount' in request body: must be a string"
        );

        let object_name = ExpenseFields {
            name: Some(serde_json::json!({ "first": "rent" })),
            ..fields(None, Some("1.00"))
        };
        assert_eq!(
            validation_message(validate_new_expense(&object_name)),
            "Invalid 'name' in request body: must be a string"
        );
    }

    #[test]
    fn test_type_id_accepts_numbers() {
        let expense = validate_new_expense(&ExpenseFields {
            type_id: Some(Value::from(3)),
            ..fields(Some("rent"), Some("1.00"))
        })
        .unwrap();
        assert_eq!(expense.type_id, "3");

        let rejected = validate_new_expense(&ExpenseFields {
            type_id: Some(Value::Bool(true)),
            ..fields(Some("rent"), Some("1.00"))
        });
        assert_eq!(
            validation_message(rejected),
            "Invalid 'type_id' in request body: must be a string or a number"
        );
    }

    #[test]
    fn test_new_expense_keeps_values_verbatim() {
        let expense = validate_new_expense(&fields(Some(" test new expense"), Some("1000.00"))).unwrap();
        assert_eq!(expense.name, " test new expense");
        assert_eq!(expense.amount, "1000.00");
        assert_eq!(expense.type_id, "14");
        assert_eq!(expense.category, "Recurring");
    }

    #[test]
    fn test_changes_require_a_known_field() {
        let message = validation_message(validate_changes(&ExpenseFields::default()));
        assert_eq!(
            message,
            "Request body must contain either 'name', 'amount', 'type_id' or 'category'"
        );
    }

    #[test]
    fn test_changes_keep_only_supplied_fields() {
        let changes = validate_changes(&ExpenseFields {
            name: Some("updated".into()),
            category: Some("Savings".into()),
            ..Default::default()
        })
        .unwrap();

        let collected: Vec<_> = changes.iter().collect();
        assert_eq!(
            collected,
            [(ExpenseField::Name, "updated"), (ExpenseField::Category, "Savings")]
        );
    }

    #[test]
    fn test_changes_reject_empty_and_invalid_values() {
        let empty = validate_changes(&ExpenseFields {
            name: Some("".into()),
            ..Default::default()
        });
        assert!(validation_message(empty).contains("must not be empty"));

        let bad_amount = validate_changes(&ExpenseFields {
            amount: Some("12.345".into()),
            ..Default::default()
        });
        assert!(validation_message(bad_amount).starts_with("Invalid 'amount'"));

        let numeric_name = validate_changes(&ExpenseFields {
            name: Some(Value::from(7)),
            ..Default::default()
        });
        assert_eq!(
            validation_message(numeric_name),
            "Invalid 'name' in request body: must be a string"
        );
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let service = create_test_service().await;

        let created = service
            .create_expense(&fields(Some("coffee"), Some("4.50")))
            .await
            .unwrap();
        let fetched = service.get_expense(created.expense_id).await.unwrap();

        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_invalid_touches_nothing() {
        let service = create_test_service().await;

        let result = service.create_expense(&fields(Some("coffee"), None)).await;
        assert!(matches!(result, Err(ExpenseError::Validation(_))));
        assert!(service.list_expenses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let service = create_test_service().await;
        assert!(matches!(
            service.get_expense(42).await,
            Err(ExpenseError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let service = create_test_service().await;
        let result = service
            .update_expense(42, &fields(Some("x"), Some("1.00")))
            .await;
        assert!(matches!(result, Err(ExpenseError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let service = create_test_service().await;
        let created = service
            .create_expense(&fields(Some("coffee"), Some("4.50")))
            .await
            .unwrap();

        service.delete_expense(created.expense_id).await.unwrap();
        assert!(matches!(
            service.delete_expense(created.expense_id).await,
            Err(ExpenseError::NotFound)
        ));
    }
}
