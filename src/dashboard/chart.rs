//! Renders the monthly trend chart as plain HTML and CSS bars.

use maud::{Markup, html};

use crate::{
    dashboard::aggregation::{TrendBucket, chart_max},
    money::{Cents, format_currency},
};

/// The height of the tallest possible bar in pixels.
const CHART_HEIGHT_PX: i64 = 160;

/// The smallest rendered bar height so small values stay visible.
const MIN_BAR_HEIGHT_PX: i64 = 4;

/// Scale `value` linearly against `chart_max` into the chart height.
fn bar_height(value: Cents, chart_max: Cents) -> i64 {
    (value * CHART_HEIGHT_PX / chart_max).max(MIN_BAR_HEIGHT_PX)
}

fn bar(value: Cents, max: Cents, color_class: &str, label: &str, currency_code: &str) -> Markup {
    let height = bar_height(value, max);

    html! {
        div
            class=(format!("w-4 rounded-t {color_class}"))
            style=(format!("height: {height}px"))
            title=(format!("{label}: {}", format_currency(value, currency_code)))
        {}
    }
}

/// Render the income/expense bars for the given months.
pub fn trend_chart(buckets: &[TrendBucket], currency_code: &str) -> Markup {
    let max = chart_max(buckets);

    html! {
        div class="flex items-end justify-around gap-4 h-48 pt-4"
        {
            @for bucket in buckets {
                div class="flex flex-col items-center gap-1"
                {
                    div class="flex items-end gap-1"
                    {
                        (bar(bucket.income_cents, max, "bg-green-500", "Income", currency_code))
                        (bar(bucket.expense_cents, max, "bg-red-500", "Expenses", currency_code))
                    }

                    span class="text-xs text-gray-500 dark:text-gray-400" { (bucket.label) }
                }
            }
        }

        div class="flex justify-center gap-6 text-xs text-gray-500 dark:text-gray-400 pt-2"
        {
            span class="flex items-center gap-1.5"
            {
                span class="inline-block w-3 h-3 rounded-sm bg-green-500" {}
                "Income"
            }

            span class="flex items-center gap-1.5"
            {
                span class="inline-block w-3 h-3 rounded-sm bg-red-500" {}
                "Expenses"
            }
        }
    }
}
