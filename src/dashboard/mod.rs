//! The dashboard summarises the user's finances: income, expense and balance
//! totals, per-category spending and a monthly trend chart.

mod aggregation;
mod chart;
mod page;

pub use page::get_dashboard_page;
