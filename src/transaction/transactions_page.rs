//! Defines the transactions page which lists, filters and sorts the user's
//! transactions and links to the create and edit forms.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, PreEscaped, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    category::{category_color, category_icon, display_category},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    money::format_currency,
    navigation::NavBar,
    profile::get_profile,
    transaction::{
        SortDirection, SortField, Transaction, TransactionFilter, TransactionKind,
        core::get_transactions,
    },
    user::UserID,
};

/// The query parameters accepted by the transactions page.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TransactionsQuery {
    /// Only show transactions of this kind. Shows all kinds when omitted.
    pub kind: Option<TransactionKind>,
    /// The column to order by. Defaults to date.
    pub sort: Option<SortField>,
    /// The order direction. Defaults to latest first.
    pub direction: Option<SortDirection>,
}

impl TransactionsQuery {
    fn filter(&self) -> TransactionFilter {
        TransactionFilter {
            kind: self.kind,
            date_from: None,
            sort: self.sort.unwrap_or_default(),
            direction: self.direction.unwrap_or_default(),
        }
    }

    fn page_url(&self) -> String {
        let mut url = endpoints::TRANSACTIONS_VIEW.to_owned();
        let mut separator = '?';

        if let Some(kind) = self.kind {
            url.push(separator);
            url.push_str("kind=");
            url.push_str(kind.as_str());
            separator = '&';
        }

        if let Some(sort) = self.sort {
            url.push(separator);
            url.push_str("sort=");
            url.push_str(sort_str(sort));
            separator = '&';
        }

        if let Some(direction) = self.direction {
            url.push(separator);
            url.push_str("direction=");
            url.push_str(match direction {
                SortDirection::Asc => "asc",
                SortDirection::Desc => "desc",
            });
        }

        url
    }
}

fn sort_str(sort: SortField) -> &'static str {
    match sort {
        SortField::Date => "date",
        SortField::Amount => "amount",
        SortField::Description => "description",
        SortField::Category => "category",
    }
}

/// The URL for a column header link: clicking a new column sorts by it in the
/// default direction, clicking the current column flips the direction.
fn sort_link(query: &TransactionsQuery, column: SortField) -> String {
    let current_sort = query.sort.unwrap_or_default();
    let current_direction = query.direction.unwrap_or_default();

    let direction = if current_sort == column {
        match current_direction {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    } else {
        SortDirection::default()
    };

    TransactionsQuery {
        kind: query.kind,
        sort: Some(column),
        direction: Some(direction),
    }
    .page_url()
}

fn kind_filter_link(query: &TransactionsQuery, kind: Option<TransactionKind>) -> String {
    TransactionsQuery {
        kind,
        sort: query.sort,
        direction: query.direction,
    }
    .page_url()
}

fn kind_filter_tabs(query: &TransactionsQuery) -> Markup {
    let tabs = [
        (None, "All"),
        (Some(TransactionKind::Expense), "Expenses"),
        (Some(TransactionKind::Income), "Income"),
    ];

    html! {
        div class="flex gap-2" role="tablist"
        {
            @for (kind, label) in tabs {
                @let is_current = query.kind == kind;
                a
                    href=(kind_filter_link(query, kind))
                    role="tab"
                    aria-selected=(is_current)
                    class=(if is_current {
                        "px-3 py-1.5 rounded-full text-sm font-semibold bg-blue-100 \
                        text-blue-700 dark:bg-blue-900/40 dark:text-blue-200"
                    } else {
                        "px-3 py-1.5 rounded-full text-sm font-semibold text-gray-600 \
                        hover:bg-gray-100 dark:text-gray-300 dark:hover:bg-gray-700"
                    })
                {
                    (label)
                }
            }
        }
    }
}

fn column_header(query: &TransactionsQuery, column: SortField, label: &str) -> Markup {
    let is_sorted = query.sort.unwrap_or_default() == column;
    let marker = if is_sorted {
        match query.direction.unwrap_or_default() {
            SortDirection::Asc => " ▲",
            SortDirection::Desc => " ▼",
        }
    } else {
        ""
    };

    html! {
        th scope="col" class=(TABLE_CELL_STYLE)
        {
            a href=(sort_link(query, column)) class="hover:underline"
            {
                (label) (marker)
            }
        }
    }
}

fn transaction_row(transaction: &Transaction, currency_code: &str) -> Markup {
    let amount = format_currency(transaction.amount_cents, currency_code);
    let (amount_style, sign) = match transaction.kind {
        TransactionKind::Income => ("text-green-600 dark:text-green-400 font-medium", "+"),
        TransactionKind::Expense => ("text-red-600 dark:text-red-400 font-medium", "-"),
    };
    let color = category_color(&transaction.category);
    let icon = category_icon(&transaction.category, transaction.kind);

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(format!("{TABLE_CELL_STYLE} {amount_style}")) { (sign) (amount) }
            td class=(TABLE_CELL_STYLE) { (transaction.date) }
            td class=(TABLE_CELL_STYLE) { (transaction.description) }
            td class=(TABLE_CELL_STYLE)
            {
                span
                    class="inline-flex items-center gap-1.5 px-2 py-0.5 rounded-full text-xs font-medium text-white"
                    style=(format!("background-color: {color}"))
                {
                    (PreEscaped(icon)) " " (display_category(&transaction.category))
                }
            }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    a
                        href=(format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id))
                        class=(LINK_STYLE)
                    {
                        "Edit"
                    }

                    button
                        type="button"
                        hx-delete=(format_endpoint(endpoints::TRANSACTION, transaction.id))
                        hx-target="closest tr"
                        hx-swap="outerHTML"
                        hx-confirm="Delete this transaction?"
                        hx-target-error="#alert-container"
                        class=(BUTTON_DELETE_STYLE)
                    {
                        "Delete"
                    }
                }
            }
        }
    }
}

fn transactions_view(
    transactions: &[Transaction],
    query: &TransactionsQuery,
    currency_code: &str,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex items-center justify-between"
            {
                h1 class="text-2xl font-bold" { "Transactions" }

                a
                    href=(endpoints::NEW_TRANSACTION_VIEW)
                    class="px-4 py-2 bg-blue-500 hover:bg-blue-600 text-white rounded font-medium"
                {
                    "New Transaction"
                }
            }

            (kind_filter_tabs(query))

            @if transactions.is_empty() {
                p class="text-gray-500 dark:text-gray-400 py-8 text-center"
                {
                    "No transactions yet. Add your first transaction to get started."
                }
            } @else {
                div class="relative overflow-x-auto rounded shadow-md"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                (column_header(query, SortField::Amount, "Amount"))
                                (column_header(query, SortField::Date, "Date"))
                                (column_header(query, SortField::Description, "Description"))
                                (column_header(query, SortField::Category, "Category"))
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for transaction in transactions {
                                (transaction_row(transaction, currency_code))
                            }
                        }
                    }
                }
            }
        }
    };

    base("Transactions", &[], &content)
}

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsViewState {
    /// The database connection for accessing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsViewState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the transactions page with the filter and ordering given in the
/// query string.
pub async fn get_transactions_page(
    State(state): State<TransactionsViewState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = get_transactions(user_id, &query.filter(), &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve transactions: {error}"))?;
    let profile = get_profile(user_id, &connection)?;

    Ok(transactions_view(&transactions, &query, &profile.currency).into_response())
}
