//! Defines the route handler for the dashboard page.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, PreEscaped, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    category::{category_color, category_icon, display_category},
    dashboard::{
        aggregation::{CategorySummary, Totals, expense_breakdown, totals, trend_buckets},
        chart::trend_chart,
    },
    endpoints,
    html::{PAGE_CONTAINER_STYLE, base},
    money::format_currency,
    navigation::NavBar,
    profile::get_profile,
    timezone::get_local_offset,
    transaction::{Transaction, TransactionFilter, TransactionKind, get_transactions},
    user::UserID,
};

/// How many months the trend chart covers.
const TREND_WINDOW_MONTHS: usize = 3;

/// How far back the dashboard totals look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    /// The last seven days.
    Week,
    /// The last calendar month.
    #[default]
    Month,
    /// The last calendar year.
    Year,
    /// No date cutoff.
    All,
}

impl Timeframe {
    fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Week => "week",
            Timeframe::Month => "month",
            Timeframe::Year => "year",
            Timeframe::All => "all",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Timeframe::Week => "Week",
            Timeframe::Month => "Month",
            Timeframe::Year => "Year",
            Timeframe::All => "All",
        }
    }

    /// The earliest date included by this timeframe, or `None` for no cutoff.
    fn date_from(&self, today: Date) -> Option<Date> {
        match self {
            Timeframe::Week => Some(today - Duration::days(7)),
            Timeframe::Month => Some(months_earlier(today, 1)),
            Timeframe::Year => Some(months_earlier(today, 12)),
            Timeframe::All => None,
        }
    }
}

/// The same day `months` calendar months earlier, clamped to the length of
/// the target month, e.g. March 31st minus one month is February 29th in a
/// leap year.
fn months_earlier(date: Date, months: i32) -> Date {
    let mut year = date.year();
    let mut month = date.month() as i32 - months;
    while month < 1 {
        month += 12;
        year -= 1;
    }

    // The month number is in 1..=12 here, so the conversion cannot fail.
    let month = time::Month::try_from(month as u8).unwrap_or(time::Month::January);
    let day = date.day().min(time::util::days_in_year_month(year, month));

    Date::from_calendar_date(year, month, day).unwrap_or(date)
}

/// The query parameters accepted by the dashboard page.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DashboardQuery {
    /// How far back to aggregate. Defaults to the last month.
    pub range: Option<Timeframe>,
}

fn timeframe_selector(current: Timeframe) -> Markup {
    html! {
        div class="flex gap-2" role="tablist"
        {
            @for timeframe in [Timeframe::Week, Timeframe::Month, Timeframe::Year, Timeframe::All] {
                @let is_current = timeframe == current;
                a
                    href=(format!("{}?range={}", endpoints::DASHBOARD_VIEW, timeframe.as_str()))
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
                    (timeframe.label())
                }
            }
        }
    }
}

fn totals_cards(totals: &Totals, currency_code: &str) -> Markup {
    let balance_style = if totals.balance_cents() < 0 {
        "text-red-600 dark:text-red-400"
    } else {
        "text-gray-900 dark:text-white"
    };

    let card_style = "flex-1 min-w-40 p-4 rounded-lg bg-white shadow dark:bg-gray-800";
    let title_style = "text-sm text-gray-500 dark:text-gray-400";

    html! {
        div class="flex flex-wrap gap-4"
        {
            div class=(card_style)
            {
                p class=(title_style) { "Income" }
                p class="text-2xl font-bold text-green-600 dark:text-green-400"
                {
                    (format_currency(totals.income_cents, currency_code))
                }
            }

            div class=(card_style)
            {
                p class=(title_style) { "Expenses" }
                p class="text-2xl font-bold text-red-600 dark:text-red-400"
                {
                    (format_currency(totals.expense_cents, currency_code))
                }
            }

            div class=(card_style)
            {
                p class=(title_style) { "Balance" }
                p class=(format!("text-2xl font-bold {balance_style}"))
                {
                    (format_currency(totals.balance_cents(), currency_code))
                }
            }
        }
    }
}

fn breakdown_list(breakdown: &[CategorySummary], currency_code: &str) -> Markup {
    html! {
        div class="p-4 rounded-lg bg-white shadow dark:bg-gray-800 space-y-3"
        {
            h2 class="text-lg font-semibold" { "Spending by Category" }

            @if breakdown.is_empty() {
                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "No expenses in this period."
                }
            }

            @for summary in breakdown {
                @let color = category_color(&summary.category);
                @let icon = category_icon(&summary.category, TransactionKind::Expense);
                div class="space-y-1"
                {
                    div class="flex items-center justify-between text-sm"
                    {
                        span class="flex items-center gap-1.5"
                        {
                            (PreEscaped(icon)) " " (display_category(&summary.category))
                            span class="text-gray-400"
                            {
                                (format!(
                                    "({} × avg {})",
                                    summary.count,
                                    format_currency(summary.avg_cents, currency_code)
                                ))
                            }
                        }

                        span class="font-medium"
                        {
                            (format_currency(summary.total_cents, currency_code))
                        }
                    }

                    div class="w-full h-2 rounded-full bg-gray-100 dark:bg-gray-700"
                    {
                        div
                            class="h-2 rounded-full"
                            style=(format!(
                                "width: {:.1}%; background-color: {color}",
                                summary.percentage
                            ))
                        {}
                    }
                }
            }
        }
    }
}

fn dashboard_view(
    timeframe: Timeframe,
    totals: &Totals,
    breakdown: &[CategorySummary],
    chart: Markup,
    currency_code: &str,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex items-center justify-between"
            {
                h1 class="text-2xl font-bold" { "Dashboard" }
                (timeframe_selector(timeframe))
            }

            (totals_cards(totals, currency_code))

            div class="grid gap-4 lg:grid-cols-2"
            {
                (breakdown_list(breakdown, currency_code))

                div class="p-4 rounded-lg bg-white shadow dark:bg-gray-800"
                {
                    h2 class="text-lg font-semibold" { "Monthly Trend" }
                    (chart)
                }
            }
        }
    };

    base("Dashboard", &[], &content)
}

/// The state needed for the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for accessing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the dashboard with totals, the category breakdown and the trend
/// chart for the signed-in user.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let timeframe = query.range.unwrap_or_default();

    let (transactions, profile) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let transactions =
            get_transactions(user_id, &TransactionFilter::default(), &connection)
                .inspect_err(|error| {
                    tracing::error!("Failed to retrieve transactions for dashboard: {error}")
                })?;
        let profile = get_profile(user_id, &connection)?;

        (transactions, profile)
    };

    let in_timeframe: Vec<Transaction> = match timeframe.date_from(today) {
        Some(date_from) => transactions
            .iter()
            .filter(|transaction| transaction.date >= date_from)
            .cloned()
            .collect(),
        None => transactions.clone(),
    };

    let totals = totals(&in_timeframe);
    let breakdown = expense_breakdown(&in_timeframe);
    // The trend chart always shows the last few months regardless of the
    // selected timeframe.
    let buckets = trend_buckets(&transactions, TREND_WINDOW_MONTHS, today);
    let chart = trend_chart(&buckets, &profile.currency);

    Ok(
        dashboard_view(timeframe, &totals, &breakdown, chart, &profile.currency)
            .into_response(),
    )
}
