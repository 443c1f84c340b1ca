//! Defines the route handler for the page for editing an existing transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    category::all_category_names,
    endpoints::{self, format_endpoint},
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, currency_input_styles, loading_spinner},
    money::currency_symbol,
    navigation::NavBar,
    profile::get_profile,
    timezone::get_local_offset,
    transaction::{
        Transaction, TransactionId,
        core::get_transaction,
        form::{TransactionFormDefaults, transaction_form_fields},
    },
    user::UserID,
};

fn edit_transaction_view(
    transaction: &Transaction,
    max_date: Date,
    category_names: &[String],
    currency_code: &str,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let spinner = loading_spinner();
    let fields = transaction_form_fields(
        &TransactionFormDefaults {
            kind: transaction.kind,
            amount_cents: Some(transaction.amount_cents),
            date: transaction.date,
            description: Some(&transaction.description),
            category: Some(&transaction.category),
            max_date,
            autofocus_amount: false,
        },
        category_names,
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-put=(format_endpoint(endpoints::TRANSACTION, transaction.id))
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Edit Transaction" }

                (fields)

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span
                        id="indicator"
                        class="inline htmx-indicator"
                    {
                        (spinner)
                    }
                    " Save Changes"
                }
            }
        }
    };

    base(
        "Edit Transaction",
        &[currency_input_styles(currency_symbol(currency_code))],
        &content,
    )
}

/// The state needed for the edit transaction page.
#[derive(Debug, Clone)]
pub struct EditTransactionPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for accessing transactions and categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing the transaction with the ID given in the URL.
pub async fn get_edit_transaction_page(
    State(state): State<EditTransactionPageState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Response, Error> {
    let (transaction, category_names, profile) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let transaction = get_transaction(transaction_id, user_id, &connection)?;
        let names = all_category_names(user_id, &connection).inspect_err(|error| {
            tracing::error!("Failed to retrieve categories for edit transaction page: {error}")
        })?;
        let profile = get_profile(user_id, &connection)?;

        (transaction, names, profile)
    };

    let local_timezone = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone)
    })?;

    let max_date = OffsetDateTime::now_utc().to_offset(local_timezone).date();

    Ok(
        edit_transaction_view(&transaction, max_date, &category_names, &profile.currency)
            .into_response(),
    )
}

#[cfg(test)]
mod view_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, body::Body, extract::Path, extract::State, http::StatusCode,
        response::Response};
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        endpoints::{self, format_endpoint},
        password::PasswordHash,
        transaction::{
            Transaction, TransactionKind, create_transaction,
            edit_page::{EditTransactionPageState, get_edit_transaction_page},
        },
        user::{UserID, create_user},
    };

    fn get_test_state() -> (EditTransactionPageState, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("test@example.com", PasswordHash::new_unchecked("x"), &conn)
            .expect("Could not create test user");

        (
            EditTransactionPageState {
                local_timezone: "Etc/UTC".to_owned(),
                db_connection: Arc::new(Mutex::new(conn)),
            },
            user.id,
        )
    }

    #[tokio::test]
    async fn edit_page_prefills_transaction() {
        let (state, user_id) = get_test_state();
        let transaction = {
            let connection = state.db_connection.lock().unwrap();
            create_transaction(
                Transaction::build(12_50, date!(2024 - 03 - 05), "lunch")
                    .category("food")
                    .kind(TransactionKind::Expense),
                user_id,
                &connection,
            )
            .unwrap()
        };

        let response = get_edit_transaction_page(
            State(state),
            Extension(user_id),
            Path(transaction.id),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html(response).await;
        assert!(
            document.errors.is_empty(),
            "Got HTML parsing errors: {:?}",
            document.errors
        );

        let form_selector = Selector::parse("form").unwrap();
        let form = document
            .select(&form_selector)
            .next()
            .expect("No form found");
        let want_target = format_endpoint(endpoints::TRANSACTION, transaction.id);
        assert_eq!(
            form.value().attr("hx-put"),
            Some(want_target.as_str()),
            "want form with hx-put=\"{want_target}\", got {:?}",
            form.value().attr("hx-put")
        );

        assert_input_value(&document, "amount", "12.50");
        assert_input_value(&document, "date", "2024-03-05");
        assert_input_value(&document, "description", "lunch");

        let selected_selector = Selector::parse("select#category option[selected]").unwrap();
        let selected = document
            .select(&selected_selector)
            .next()
            .expect("No selected category option found");
        assert_eq!(selected.value().attr("value"), Some("food"));
    }

    #[tokio::test]
    async fn edit_page_returns_not_found_for_missing_transaction() {
        let (state, user_id) = get_test_state();

        let result =
            get_edit_transaction_page(State(state), Extension(user_id), Path(999)).await;

        assert!(
            matches!(result, Err(Error::NotFound)),
            "want Err(Error::NotFound), got {result:?}"
        );
    }

    #[tokio::test]
    async fn edit_page_hides_other_users_transaction() {
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
                Transaction::build(12_50, date!(2024 - 03 - 05), "lunch").category("food"),
                user_id,
                &connection,
            )
            .unwrap();
            (transaction.id, other_user.id)
        };

        let result =
            get_edit_transaction_page(State(state), Extension(other_user_id), Path(transaction_id))
                .await;

        assert!(
            matches!(result, Err(Error::NotFound)),
            "want Err(Error::NotFound), got {result:?}"
        );
    }

    #[track_caller]
    fn assert_input_value(document: &Html, name: &str, expected: &str) {
        let selector = Selector::parse(&format!("input[name={name}]")).unwrap();
        let input = document
            .select(&selector)
            .next()
            .unwrap_or_else(|| panic!("No {name} input found"));
        assert_eq!(
            input.value().attr("value"),
            Some(expected),
            "want {name} input with value=\"{expected}\", got {:?}",
            input.value().attr("value")
        );
    }

    async fn parse_html(response: Response<Body>) -> Html {
        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX)
            .await
            .expect("Could not get response body");
        let text = String::from_utf8_lossy(&body).to_string();

        Html::parse_document(&text)
    }
}
