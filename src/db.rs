//! This file defines the function for initializing the application database.

use rusqlite::Connection;

use crate::{
    category::create_category_table, profile::create_profile_table,
    transaction::create_transaction_table, user::create_user_table,
};

/// Create the tables for the application in the database.
///
/// # Errors
/// Returns an error if the tables could not be created or if there was an SQL
/// error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    create_user_table(connection)?;
    create_profile_table(connection)?;
    create_category_table(connection)?;
    create_transaction_table(connection)?;

    Ok(())
}
