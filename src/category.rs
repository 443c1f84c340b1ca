//! Category labels for transactions.
//!
//! Categories are free-text labels rather than foreign keys. A fixed set of
//! default labels is always offered, each user can add their own, and the
//! color/icon lookups fall back to a neutral default for labels they do not
//! recognize.

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use std::sync::{Arc, Mutex};

use crate::{AppState, Error, UserID, transaction::TransactionKind};

// ============================================================================
// NORMALIZATION AND DISPLAY
// ============================================================================

/// Normalize a category label for storage and lookup.
///
/// Lowercases the label and collapses whitespace runs into single underscores,
/// so that "Public Transport" and "public_transport" refer to the same
/// category.
pub fn normalize_category(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Convert a normalized category label into display text, e.g.
/// "public_transport" becomes "Public Transport".
pub fn display_category(category: &str) -> String {
    category
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// DEFAULTS, COLORS AND ICONS
// ============================================================================

/// The category labels offered for income transactions.
pub const DEFAULT_INCOME_CATEGORIES: [&str; 9] = [
    "salary",
    "freelance",
    "investments",
    "business",
    "gifts",
    "rental",
    "refunds",
    "lottery",
    "other_income",
];

/// The category labels offered for expense transactions.
pub const DEFAULT_EXPENSE_CATEGORIES: [&str; 26] = [
    "food",
    "groceries",
    "restaurants",
    "transportation",
    "public_transport",
    "fuel",
    "housing",
    "rent",
    "utilities",
    "electricity",
    "internet",
    "phone",
    "shopping",
    "clothing",
    "electronics",
    "entertainment",
    "subscriptions",
    "travel",
    "healthcare",
    "insurance",
    "fitness",
    "education",
    "personal_care",
    "pets",
    "fees",
    "other_expense",
];

/// The default category labels for the given transaction kind.
pub fn default_categories(kind: TransactionKind) -> &'static [&'static str] {
    match kind {
        TransactionKind::Income => &DEFAULT_INCOME_CATEGORIES,
        TransactionKind::Expense => &DEFAULT_EXPENSE_CATEGORIES,
    }
}

/// The color for categories without an entry in the color table.
pub const DEFAULT_CATEGORY_COLOR: &str = "#9ca3af";

const CATEGORY_COLORS: [(&str, &str); 20] = [
    ("food", "#f97316"),
    ("groceries", "#84cc16"),
    ("housing", "#3b82f6"),
    ("rent", "#2563eb"),
    ("transportation", "#6366f1"),
    ("utilities", "#eab308"),
    ("entertainment", "#ec4899"),
    ("healthcare", "#ef4444"),
    ("education", "#06b6d4"),
    ("salary", "#10b981"),
    ("freelance", "#8b5cf6"),
    ("investments", "#14b8a6"),
    ("shopping", "#f43f5e"),
    ("travel", "#8b5cf6"),
    ("subscriptions", "#6366f1"),
    ("insurance", "#0891b2"),
    ("internet", "#f97316"),
    ("phone", "#f59e0b"),
    ("electronics", "#7c3aed"),
    ("gifts", "#ec4899"),
];

/// Get the accent color for a category label.
///
/// The label is normalized before lookup, and unknown labels get
/// [DEFAULT_CATEGORY_COLOR].
pub fn category_color(category: &str) -> &'static str {
    let normalized = normalize_category(category);

    CATEGORY_COLORS
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_CATEGORY_COLOR)
}

/// Get the icon for a category label.
///
/// Unknown labels get a default icon based on the transaction kind.
pub fn category_icon(category: &str, kind: TransactionKind) -> &'static str {
    match normalize_category(category).as_str() {
        "food" | "groceries" | "restaurants" => "🛍️",
        "housing" | "rent" | "utilities" => "🏠",
        "transportation" | "fuel" | "public_transport" => "🚚",
        "entertainment" | "phone" => "📱",
        "healthcare" | "fitness" => "❤️",
        "education" => "🎓",
        "salary" => "💵",
        "freelance" => "👥",
        "investments" => "📈",
        _ => match kind {
            TransactionKind::Income => "💵",
            TransactionKind::Expense => "🛍️",
        },
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// A user-defined category label.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// The ID of the category.
    pub id: i64,
    /// The ID of the user who created the category.
    pub user_id: UserID,
    /// The normalized category label.
    pub name: String,
    /// The transaction kind the category applies to.
    pub kind: TransactionKind,
}

/// Save a user-defined category label.
///
/// The label is normalized before saving. Saving a label that already exists
/// for the user is a no-op.
///
/// # Errors
/// Returns [Error::MissingCategory] if the label is empty after normalization,
/// or [Error::SqlError] if there is an SQL error.
pub fn create_category(
    label: &str,
    kind: TransactionKind,
    user_id: UserID,
    connection: &Connection,
) -> Result<String, Error> {
    let name = normalize_category(label);

    if name.is_empty() {
        return Err(Error::MissingCategory);
    }

    connection.execute(
        "INSERT OR IGNORE INTO category (user_id, name, kind) VALUES (?1, ?2, ?3)",
        (user_id, &name, kind),
    )?;

    Ok(name)
}

/// Get the labels of the categories the user has created for `kind`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_custom_categories(
    user_id: UserID,
    kind: TransactionKind,
    connection: &Connection,
) -> Result<Vec<String>, Error> {
    connection
        .prepare(
            "SELECT name FROM category WHERE user_id = :user_id AND kind = :kind ORDER BY name ASC",
        )?
        .query_map(
            &[
                (":user_id", &user_id as &dyn rusqlite::ToSql),
                (":kind", &kind),
            ],
            |row| row.get(0),
        )?
        .map(|maybe_name| maybe_name.map_err(|error| error.into()))
        .collect()
}

/// The full list of category labels to offer the user for `kind`: the
/// defaults followed by the user's own labels.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn category_names(
    user_id: UserID,
    kind: TransactionKind,
    connection: &Connection,
) -> Result<Vec<String>, Error> {
    let mut names: Vec<String> = default_categories(kind)
        .iter()
        .map(|name| name.to_string())
        .collect();

    for custom_name in get_custom_categories(user_id, kind, connection)? {
        if !names.contains(&custom_name) {
            names.push(custom_name);
        }
    }

    Ok(names)
}

/// The category labels for both transaction kinds, deduplicated. Used by the
/// transaction form, where the kind is chosen by a radio button on the client.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn all_category_names(user_id: UserID, connection: &Connection) -> Result<Vec<String>, Error> {
    let mut names = category_names(user_id, TransactionKind::Expense, connection)?;

    for name in category_names(user_id, TransactionKind::Income, connection)? {
        if !names.contains(&name) {
            names.push(name);
        }
    }

    Ok(names)
}

/// Create the category table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                kind TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE,
                UNIQUE(user_id, name, kind)
                )",
        (),
    )?;

    Ok(())
}

// ============================================================================
// ROUTE HANDLER
// ============================================================================

/// The state needed for creating categories.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for saving categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a category.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    /// The label for the new category.
    pub name: String,
    /// The transaction kind the category applies to.
    pub kind: TransactionKind,
}

/// A route handler for creating a user-defined category.
///
/// Responds with the refreshed category dropdown with the new category
/// selected, for htmx to swap into the transaction form.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<CategoryForm>,
) -> Response {
    create_category_and_render_select(&state, user_id, form)
        .unwrap_or_else(|error| error.into_alert_response())
}

fn create_category_and_render_select(
    state: &CategoryState,
    user_id: UserID,
    form: CategoryForm,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let name = create_category(&form.name, form.kind, user_id, &connection)?;
    let names = category_names(user_id, form.kind, &connection)?;

    Ok(category_select(&names, Some(&name)).into_response())
}

/// Render the category dropdown for a transaction form.
///
/// The dropdown carries the element ID that [create_category_endpoint] targets
/// when it swaps in the refreshed list.
pub fn category_select(category_names: &[String], selected: Option<&str>) -> Markup {
    html! {
        select id="category" name="category" class=(crate::html::FORM_TEXT_INPUT_STYLE) {
            option value="" disabled[selected.is_none()] selected[selected.is_none()] {
                "Select a category"
            }

            @for name in category_names {
                option value=(name) selected[selected == Some(name.as_str())] {
                    (display_category(name))
                }
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod category_lookup_tests {
    use crate::transaction::TransactionKind;

    use super::{DEFAULT_CATEGORY_COLOR, category_color, category_icon};

    #[test]
    fn known_category_gets_its_color() {
        assert_eq!(category_color("food"), "#f97316");
        assert_eq!(category_color("salary"), "#10b981");
    }

    #[test]
    fn lookup_normalizes_the_label() {
        assert_eq!(category_color("Food"), "#f97316");
    }

    #[test]
    fn unknown_category_gets_default_color() {
        assert_eq!(category_color("underwater_basket_weaving"), DEFAULT_CATEGORY_COLOR);
    }

    #[test]
    fn unknown_category_icon_depends_on_kind() {
        assert_eq!(category_icon("mystery", TransactionKind::Income), "💵");
        assert_eq!(category_icon("mystery", TransactionKind::Expense), "🛍️");
    }
}
