use std::str::FromStr;

use chrono::Utc;
use shared::Expense;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    QueryBuilder, Row, Sqlite, SqlitePool,
};

use crate::domain::{ExpenseChanges, NewExpense};

const EXPENSE_COLUMNS: &str = "expense_id, name, amount, type_id, category, date";

/// DbConnection performs the expense table operations.
/// Every method issues exactly one SQL statement.
#[derive(Clone)]
pub struct DbConnection {
    pool: SqlitePool,
}

impl DbConnection {
    /// Connect to the database at `url`, creating the file if needed
    pub async fn new(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        Self::setup_schema(&pool).await?;

        Ok(Self { pool })
    }

    /// Private in-memory database. The pool keeps its single connection
    /// open for its whole lifetime, otherwise the data would vanish.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::setup_schema(&pool).await?;

        Ok(Self { pool })
    }

    /// Create the expenses table if it doesn't exist.
    /// AUTOINCREMENT keeps ids of deleted rows from being handed out again.
    async fn setup_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS expenses (
                expense_id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                amount TEXT NOT NULL,
                type_id TEXT NOT NULL,
                category TEXT NOT NULL,
                date TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Get the underlying SQLite pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// List every expense in insertion order
    pub async fn list_all(&self) -> Result<Vec<Expense>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses ORDER BY expense_id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(expense_from_row).collect()
    }

    /// Retrieve an expense by id
    pub async fn get_by_id(&self, expense_id: i64) -> Result<Option<Expense>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE expense_id = ?"
        ))
        .bind(expense_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(expense_from_row).transpose()
    }

    /// Insert a new expense stamped with the current UTC time and
    /// return the stored row
    pub async fn insert(&self, expense: &NewExpense) -> Result<Expense, sqlx::Error> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO expenses (name, amount, type_id, category, date)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(&expense.name)
        .bind(&expense.amount)
        .bind(&expense.type_id)
        .bind(&expense.category)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        expense_from_row(&row)
    }

    /// Overwrite only the columns present in `changes`.
    /// Returns the number of rows updated.
    pub async fn update(&self, expense_id: i64, changes: &ExpenseChanges) -> Result<u64, sqlx::Error> {
        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE expenses SET ");
        let mut assignments = builder.separated(", ");
        for (field, value) in changes.iter() {
            assignments.push(format!("{} = ", field.column()));
            assignments.push_bind_unseparated(value.to_string());
        }
        builder.push(" WHERE expense_id = ").push_bind(expense_id);

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Delete an expense by id. Returns the number of rows removed.
    pub async fn remove(&self, expense_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM expenses WHERE expense_id = ?")
            .bind(expense_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn expense_from_row(row: &SqliteRow) -> Result<Expense, sqlx::Error> {
    Ok(Expense {
        expense_id: row.try_get("expense_id")?,
        name: row.try_get("name")?,
        amount: row.try_get("amount")?,
        type_id: row.try_get("type_id")?,
        category: row.try_get("category")?,
        date: row.try_get("date")?,
    })
}
