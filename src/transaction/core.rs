//! Defines the core data models and database queries for transactions.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, UserID, money::Cents};

// ============================================================================
// MODELS
// ============================================================================

/// The ID of a transaction in the database.
pub type TransactionId = i64;

/// Whether a transaction brings money in or takes money out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned, e.g. salary.
    Income,
    /// Money spent, e.g. groceries.
    Expense,
}

impl TransactionKind {
    /// The lowercase string stored in the database and used in forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(FromSqlError::Other(
                format!("unknown transaction kind \"{other}\"").into(),
            )),
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The ID of the user that owns the transaction.
    pub user_id: UserID,
    /// The amount of money spent or earned, in cents. Always positive; the
    /// direction of the money is carried by `kind`.
    pub amount_cents: Cents,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The category label, e.g. "food" or "salary". Free text, not a foreign
    /// key: color and icon lookups normalize the string and fall back to a
    /// default for unknown labels.
    pub category: String,
    /// Whether this is income or an expense.
    pub kind: TransactionKind,
    /// When the record was created. Informational only.
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(amount_cents: Cents, date: Date, description: &str) -> TransactionBuilder {
        TransactionBuilder {
            amount_cents,
            date,
            description: description.to_owned(),
            category: String::new(),
            kind: TransactionKind::Expense,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// Set the category and kind with the builder methods, then insert with
/// [create_transaction].
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The amount of money spent or earned, in cents.
    pub amount_cents: Cents,
    /// The date when the transaction occurred.
    pub date: Date,
    /// A human-readable description of the transaction.
    pub description: String,
    /// The category label for the transaction.
    pub category: String,
    /// Whether this is income or an expense. Defaults to expense.
    pub kind: TransactionKind,
}

impl TransactionBuilder {
    /// Set the category label for the transaction.
    pub fn category(mut self, category: &str) -> Self {
        self.category = category.to_owned();
        self
    }

    /// Set whether the transaction is income or an expense.
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = kind;
        self
    }
}

// ============================================================================
// QUERY FILTERS
// ============================================================================

/// The column to order a transaction listing by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    /// Order by transaction date.
    #[default]
    Date,
    /// Order by amount.
    Amount,
    /// Order by description text.
    Description,
    /// Order by category label.
    Category,
}

impl SortField {
    fn column(&self) -> &'static str {
        match self {
            SortField::Date => "date",
            SortField::Amount => "amount_cents",
            SortField::Description => "description",
            SortField::Category => "category",
        }
    }
}

/// The direction to order a transaction listing in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest/earliest first.
    Asc,
    /// Largest/latest first.
    #[default]
    Desc,
}

impl SortDirection {
    fn sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Filtering and ordering options for listing a user's transactions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// Only include transactions of this kind.
    pub kind: Option<TransactionKind>,
    /// Only include transactions dated on or after this date.
    pub date_from: Option<Date>,
    /// The column to order by. Defaults to date.
    pub sort: SortField,
    /// The order direction. Defaults to latest first.
    pub direction: SortDirection,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str =
    "id, user_id, amount_cents, date, description, category, kind, created_at";

/// Create a new transaction owned by `user_id` from a builder.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\"
                (user_id, amount_cents, date, description, category, kind, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                user_id,
                builder.amount_cents,
                builder.date,
                builder.description,
                builder.category,
                builder.kind,
                OffsetDateTime::now_utc(),
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction by its `id`, scoped to its owner.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a transaction owned by
/// `user_id`, or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            &[(":id", &id as &dyn ToSql), (":user_id", &user_id)],
            map_transaction_row,
        )
        .map_err(|error| error.into())
}

/// List a user's transactions with the given filter and ordering.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut sql = format!("SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE user_id = :user_id");
    let mut params: Vec<(&str, &dyn ToSql)> = vec![(":user_id", &user_id)];

    if let Some(kind) = &filter.kind {
        sql.push_str(" AND kind = :kind");
        params.push((":kind", kind));
    }

    if let Some(date_from) = &filter.date_from {
        sql.push_str(" AND date >= :date_from");
        params.push((":date_from", date_from));
    }

    // Sort columns come from a fixed enum, never from user input.
    sql.push_str(&format!(
        " ORDER BY {} {}, id DESC",
        filter.sort.column(),
        filter.direction.sql()
    ));

    connection
        .prepare(&sql)?
        .query_map(params.as_slice(), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Replace all editable fields of the transaction with `id`.
///
/// # Errors
/// Returns [Error::UpdateMissingTransaction] if `id` does not refer to a
/// transaction owned by `user_id`, or [Error::SqlError] on other SQL errors.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    fields: TransactionBuilder,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
         SET amount_cents = ?1, date = ?2, description = ?3, category = ?4, kind = ?5
         WHERE id = ?6 AND user_id = ?7",
        (
            fields.amount_cents,
            fields.date,
            fields.description,
            fields.category,
            fields.kind,
            id,
            user_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    Ok(())
}

/// Delete the transaction with `id`.
///
/// # Errors
/// Returns [Error::DeleteMissingTransaction] if `id` does not refer to a
/// transaction owned by `user_id`, or [Error::SqlError] on other SQL errors.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                amount_cents INTEGER NOT NULL,
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                kind TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    // Composite index used by the dashboard and transactions pages.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1)?;
    let amount_cents = row.get(2)?;
    let date = row.get(3)?;
    let description = row.get(4)?;
    let category = row.get(5)?;
    let kind = row.get(6)?;
    let created_at = row.get(7)?;

    Ok(Transaction {
        id,
        user_id,
        amount_cents,
        date,
        description,
        category,
        kind,
        created_at,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, UserID,
        db::initialize,
        password::PasswordHash,
        transaction::{
            SortDirection, SortField, Transaction, TransactionFilter, TransactionKind,
            create_transaction, delete_transaction, get_transaction, get_transactions,
            update_transaction,
        },
        user::create_user,
    };

    fn get_test_connection() -> (Connection, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("test@example.com", PasswordHash::new_unchecked("x"), &conn)
            .expect("Could not create test user");
        (conn, user.id)
    }

    #[test]
    fn create_succeeds() {
        let (conn, user_id) = get_test_connection();

        let result = create_transaction(
            Transaction::build(12_30, date!(2025 - 10 - 05), "groceries run")
                .category("groceries")
                .kind(TransactionKind::Expense),
            user_id,
            &conn,
        );

        let transaction = result.expect("Could not create transaction");
        assert!(transaction.id > 0);
        assert_eq!(transaction.amount_cents, 12_30);
        assert_eq!(transaction.category, "groceries");
        assert_eq!(transaction.kind, TransactionKind::Expense);
        assert_eq!(transaction.user_id, user_id);
    }

    #[test]
    fn get_transaction_scopes_by_owner() {
        let (conn, user_id) = get_test_connection();
        let other_user = create_user("other@example.com", PasswordHash::new_unchecked("y"), &conn)
            .expect("Could not create test user");
        let transaction = create_transaction(
            Transaction::build(5_00, date!(2025 - 10 - 05), "coffee").category("food"),
            user_id,
            &conn,
        )
        .expect("Could not create transaction");

        let own = get_transaction(transaction.id, user_id, &conn);
        let not_owned = get_transaction(transaction.id, other_user.id, &conn);

        assert_eq!(own, Ok(transaction));
        assert_eq!(not_owned, Err(Error::NotFound));
    }

    #[test]
    fn get_transactions_filters_by_kind() {
        let (conn, user_id) = get_test_connection();
        create_transaction(
            Transaction::build(100_00, date!(2024 - 03 - 01), "pay")
                .category("salary")
                .kind(TransactionKind::Income),
            user_id,
            &conn,
        )
        .unwrap();
        create_transaction(
            Transaction::build(40_00, date!(2024 - 03 - 05), "lunch").category("food"),
            user_id,
            &conn,
        )
        .unwrap();

        let filter = TransactionFilter {
            kind: Some(TransactionKind::Expense),
            ..Default::default()
        };
        let got = get_transactions(user_id, &filter, &conn).unwrap();

        assert_eq!(got.len(), 1, "want 1 expense, got {}", got.len());
        assert_eq!(got[0].description, "lunch");
    }

    #[test]
    fn get_transactions_filters_by_date_from() {
        let (conn, user_id) = get_test_connection();
        create_transaction(
            Transaction::build(10_00, date!(2024 - 02 - 01), "old").category("food"),
            user_id,
            &conn,
        )
        .unwrap();
        create_transaction(
            Transaction::build(40_00, date!(2024 - 03 - 05), "new").category("food"),
            user_id,
            &conn,
        )
        .unwrap();

        let filter = TransactionFilter {
            date_from: Some(date!(2024 - 03 - 01)),
            ..Default::default()
        };
        let got = get_transactions(user_id, &filter, &conn).unwrap();

        assert_eq!(got.len(), 1, "want 1 transaction, got {}", got.len());
        assert_eq!(got[0].description, "new");
    }

    #[test]
    fn get_transactions_sorts_by_amount_ascending() {
        let (conn, user_id) = get_test_connection();
        for (amount, description) in [(30_00, "big"), (10_00, "small"), (20_00, "medium")] {
            create_transaction(
                Transaction::build(amount, date!(2024 - 03 - 05), description).category("food"),
                user_id,
                &conn,
            )
            .unwrap();
        }

        let filter = TransactionFilter {
            sort: SortField::Amount,
            direction: SortDirection::Asc,
            ..Default::default()
        };
        let got = get_transactions(user_id, &filter, &conn).unwrap();

        let descriptions: Vec<_> = got
            .iter()
            .map(|transaction| transaction.description.as_str())
            .collect();
        assert_eq!(descriptions, ["small", "medium", "big"]);
    }

    #[test]
    fn get_transactions_excludes_other_users() {
        let (conn, user_id) = get_test_connection();
        let other_user = create_user("other@example.com", PasswordHash::new_unchecked("y"), &conn)
            .expect("Could not create test user");
        create_transaction(
            Transaction::build(10_00, date!(2024 - 03 - 05), "mine").category("food"),
            user_id,
            &conn,
        )
        .unwrap();
        create_transaction(
            Transaction::build(20_00, date!(2024 - 03 - 05), "theirs").category("food"),
            other_user.id,
            &conn,
        )
        .unwrap();

        let got = get_transactions(user_id, &TransactionFilter::default(), &conn).unwrap();

        assert_eq!(got.len(), 1, "want 1 transaction, got {}", got.len());
        assert_eq!(got[0].description, "mine");
    }

    #[test]
    fn update_transaction_replaces_fields() {
        let (conn, user_id) = get_test_connection();
        let transaction = create_transaction(
            Transaction::build(10_00, date!(2024 - 03 - 05), "before").category("food"),
            user_id,
            &conn,
        )
        .unwrap();

        let result = update_transaction(
            transaction.id,
            user_id,
            Transaction::build(99_99, date!(2024 - 03 - 06), "after")
                .category("travel")
                .kind(TransactionKind::Expense),
            &conn,
        );

        assert_eq!(result, Ok(()));
        let updated = get_transaction(transaction.id, user_id, &conn).unwrap();
        assert_eq!(updated.amount_cents, 99_99);
        assert_eq!(updated.description, "after");
        assert_eq!(updated.category, "travel");
    }

    #[test]
    fn update_missing_transaction_fails() {
        let (conn, user_id) = get_test_connection();

        let result = update_transaction(
            999,
            user_id,
            Transaction::build(1_00, date!(2024 - 03 - 06), "ghost").category("food"),
            &conn,
        );

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
    }

    #[test]
    fn delete_transaction_succeeds() {
        let (conn, user_id) = get_test_connection();
        let transaction = create_transaction(
            Transaction::build(10_00, date!(2024 - 03 - 05), "doomed").category("food"),
            user_id,
            &conn,
        )
        .unwrap();

        let result = delete_transaction(transaction.id, user_id, &conn);

        assert_eq!(result, Ok(()));
        assert_eq!(
            get_transaction(transaction.id, user_id, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_missing_transaction_fails() {
        let (conn, user_id) = get_test_connection();

        let result = delete_transaction(999, user_id, &conn);

        assert_eq!(result, Err(Error::DeleteMissingTransaction));
    }

    #[test]
    fn delete_is_scoped_to_owner() {
        let (conn, user_id) = get_test_connection();
        let other_user = create_user("other@example.com", PasswordHash::new_unchecked("y"), &conn)
            .expect("Could not create test user");
        let transaction = create_transaction(
            Transaction::build(10_00, date!(2024 - 03 - 05), "mine").category("food"),
            user_id,
            &conn,
        )
        .unwrap();

        let result = delete_transaction(transaction.id, other_user.id, &conn);

        assert_eq!(result, Err(Error::DeleteMissingTransaction));
        assert!(get_transaction(transaction.id, user_id, &conn).is_ok());
    }
}
