//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    category::normalize_category,
    endpoints,
    money::cents_from_amount,
    timezone::get_local_offset,
    transaction::{Transaction, TransactionBuilder, TransactionKind, core::create_transaction},
    user::UserID,
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The form data for creating or editing a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// The value of the transaction in major currency units, e.g. dollars.
    pub amount: f64,
    /// The date when the transaction occurred.
    pub date: Date,
    /// Text detailing the transaction.
    pub description: String,
    /// The category label for the transaction.
    pub category: String,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionKind,
}

/// Validate the form data against today's date in `local_timezone` and turn it
/// into a [TransactionBuilder].
///
/// Shared by the create and edit endpoints.
pub(super) fn builder_from_form(
    form: &TransactionForm,
    local_timezone: &str,
) -> Result<TransactionBuilder, Error> {
    let Some(local_offset) = get_local_offset(local_timezone) else {
        tracing::error!("Invalid timezone {local_timezone}");
        return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
    };

    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();
    if form.date > today {
        return Err(Error::FutureDate(form.date));
    }

    let amount_cents = cents_from_amount(form.amount)?;

    if form.description.trim().is_empty() {
        return Err(Error::EmptyDescription);
    }

    let category = normalize_category(&form.category);
    if category.is_empty() {
        return Err(Error::MissingCategory);
    }

    Ok(Transaction::build(amount_cents, form.date, form.description.trim())
        .category(&category)
        .kind(form.kind))
}

/// A route handler for creating a new transaction, redirects to transactions view on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let builder = match builder_from_form(&form, &state.local_timezone) {
        Ok(builder) => builder,
        Err(error) => {
            tracing::error!("invalid transaction form: {error}");
            return error.into_alert_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = create_transaction(builder, user_id, &connection) {
        tracing::error!("could not create transaction: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
