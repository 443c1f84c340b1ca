//! Transactions record money coming in and going out of the user's pocket.
//!
//! This module defines the transaction data model and queries, plus the pages
//! and endpoints for listing, creating, editing and deleting transactions.

mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod form;
mod transactions_page;

pub use core::{
    SortDirection, SortField, Transaction, TransactionBuilder, TransactionFilter, TransactionId,
    TransactionKind, create_transaction, create_transaction_table, delete_transaction,
    get_transaction, get_transactions, update_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use create_page::get_create_transaction_page;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::update_transaction_endpoint;
pub use edit_page::get_edit_transaction_page;
pub use transactions_page::get_transactions_page;
