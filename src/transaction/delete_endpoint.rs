//! Defines the endpoint for deleting a transaction.

use axum::{
    Extension,
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};

use crate::{
    Error,
    transaction::{TransactionId, core::delete_transaction, create_page::CreateTransactionPageState},
    user::UserID,
};

/// A route handler for deleting a transaction by its ID.
///
/// Responds with an empty body on success so that htmx can remove the table
/// row targeted by the delete button.
pub async fn delete_transaction_endpoint(
    State(state): State<CreateTransactionPageState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = delete_transaction(transaction_id, user_id, &connection) {
        tracing::error!("could not delete transaction {transaction_id}: {error}");

        return error.into_alert_response();
    }

    Html("").into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        password::PasswordHash,
        transaction::{
            Transaction, create_page::CreateTransactionPageState, create_transaction,
            delete_endpoint::delete_transaction_endpoint, get_transaction,
        },
        user::{UserID, create_user},
    };

    fn get_test_state() -> (CreateTransactionPageState, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("test@example.com", PasswordHash::new_unchecked("x"), &conn)
            .expect("Could not create test user");

        (
            CreateTransactionPageState {
                local_timezone: "Etc/UTC".to_owned(),
                db_connection: Arc::new(Mutex::new(conn)),
            },
            user.id,
        )
    }

    #[tokio::test]
    async fn can_delete_transaction() {
        let (state, user_id) = get_test_state();
        let transaction = {
            let connection = state.db_connection.lock().unwrap();
            create_transaction(
                Transaction::build(10_00, date!(2024 - 03 - 05), "doomed").category("food"),
                user_id,
                &connection,
            )
            .unwrap()
        };

        let response = delete_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Path(transaction.id),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_transaction(transaction.id, user_id, &connection),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn delete_missing_transaction_returns_not_found() {
        let (state, user_id) = get_test_state();

        let response = delete_transaction_endpoint(State(state), Extension(user_id), Path(999))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_is_scoped_to_owner() {
        let (state, user_id) = get_test_state();
        let (transaction_id, other_user_id) = {
            let connection = state.db_connection.lock().unwrap();
            let other_user = create_user(
                "other@example.com",
                PasswordHash::new_unchecked("y"),
                &connection,
            )
            .expect("Could not create test user");
            let transaction = create_transaction(
                Transaction::build(10_00, date!(2024 - 03 - 05), "mine").category("food"),
                user_id,
                &connection,
            )
            .unwrap();
            (transaction.id, other_user.id)
        };

        let response = delete_transaction_endpoint(
            State(state.clone()),
            Extension(other_user_id),
            Path(transaction_id),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let connection = state.db_connection.lock().unwrap();
        assert!(get_transaction(transaction_id, user_id, &connection).is_ok());
    }
}
