//! Pure aggregation functions over a slice of transactions.
//!
//! These functions take the transactions to summarise as input and never
//! touch the database or the clock, which keeps them trivial to test. The
//! reference month for the trend chart is a parameter for the same reason.

use time::Date;

use crate::{
    money::Cents,
    transaction::{Transaction, TransactionKind},
};

/// Income and expense totals for a set of transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    pub income_cents: Cents,
    pub expense_cents: Cents,
}

impl Totals {
    /// Income minus expenses. Negative when the user spent more than they
    /// earned.
    pub fn balance_cents(&self) -> Cents {
        self.income_cents - self.expense_cents
    }
}

/// Sum the income and expense amounts of `transactions`.
pub fn totals(transactions: &[Transaction]) -> Totals {
    transactions
        .iter()
        .fold(Totals::default(), |mut totals, transaction| {
            match transaction.kind {
                TransactionKind::Income => totals.income_cents += transaction.amount_cents,
                TransactionKind::Expense => totals.expense_cents += transaction.amount_cents,
            }

            totals
        })
}

/// The spending summary for one expense category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    /// The category label as stored on the transactions.
    pub category: String,
    /// Total spent in this category.
    pub total_cents: Cents,
    /// How many transactions are in this category.
    pub count: usize,
    /// The mean amount per transaction, rounded down to the cent.
    pub avg_cents: Cents,
    /// This category's share of all expenses, in percent.
    pub percentage: f64,
}

/// Group the expenses in `transactions` by category.
///
/// Income is ignored. The result is sorted by total descending; categories
/// with equal totals keep the order they were first seen in.
pub fn expense_breakdown(transactions: &[Transaction]) -> Vec<CategorySummary> {
    let mut summaries: Vec<CategorySummary> = Vec::new();

    for transaction in transactions {
        if transaction.kind != TransactionKind::Expense {
            continue;
        }

        match summaries
            .iter_mut()
            .find(|summary| summary.category == transaction.category)
        {
            Some(summary) => {
                summary.total_cents += transaction.amount_cents;
                summary.count += 1;
            }
            None => summaries.push(CategorySummary {
                category: transaction.category.clone(),
                total_cents: transaction.amount_cents,
                count: 1,
                avg_cents: 0,
                percentage: 0.0,
            }),
        }
    }

    let expense_total: Cents = summaries.iter().map(|summary| summary.total_cents).sum();

    for summary in &mut summaries {
        summary.avg_cents = summary.total_cents / summary.count as Cents;
        summary.percentage = if expense_total > 0 {
            summary.total_cents as f64 / expense_total as f64 * 100.0
        } else {
            0.0
        };
    }

    // Stable sort keeps first-seen order for equal totals.
    summaries.sort_by(|a, b| b.total_cents.cmp(&a.total_cents));

    summaries
}

/// The income and expense totals for one calendar month of the trend chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendBucket {
    /// The month label, e.g. "Mar 2024".
    pub label: String,
    pub income_cents: Cents,
    pub expense_cents: Cents,
}

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Bucket `transactions` into `window` consecutive calendar months ending at
/// the month of `end_month`, oldest first.
///
/// Months without transactions get zero totals rather than being omitted so
/// the chart always shows a fixed number of bars.
pub fn trend_buckets(
    transactions: &[Transaction],
    window: usize,
    end_month: Date,
) -> Vec<TrendBucket> {
    let end_year = end_month.year();
    let end_month_number = end_month.month() as i32;

    (0..window)
        .map(|offset| {
            // Walk backwards from the end month, borrowing from the year when
            // the month number goes below 1.
            let months_back = (window - 1 - offset) as i32;
            let mut year = end_year;
            let mut month = end_month_number - months_back;
            while month < 1 {
                month += 12;
                year -= 1;
            }

            let mut bucket = TrendBucket {
                label: format!("{} {year}", MONTH_ABBREVIATIONS[(month - 1) as usize]),
                income_cents: 0,
                expense_cents: 0,
            };

            for transaction in transactions {
                if transaction.date.year() == year && transaction.date.month() as i32 == month {
                    match transaction.kind {
                        TransactionKind::Income => bucket.income_cents += transaction.amount_cents,
                        TransactionKind::Expense => {
                            bucket.expense_cents += transaction.amount_cents
                        }
                    }
                }
            }

            bucket
        })
        .collect()
}

/// The smallest chart scale, $1000 in cents.
///
/// Keeps an all-zero chart from dividing by zero and stops tiny amounts from
/// filling the whole chart height.
pub const CHART_MAX_FLOOR: Cents = 1000_00;

/// The value the tallest bar of the trend chart represents.
pub fn chart_max(buckets: &[TrendBucket]) -> Cents {
    buckets
        .iter()
        .flat_map(|bucket| [bucket.income_cents, bucket.expense_cents])
        .max()
        .unwrap_or(0)
        .max(CHART_MAX_FLOOR)
}
