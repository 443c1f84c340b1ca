//! The user's profile settings: the country they live in and the currency
//! their amounts are displayed in.
//!
//! This file defines the profile model and queries, the profile page, and the
//! endpoint for saving changes to the profile.

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use maud::{Markup, html};
use rusqlite::{Connection, Row};
use serde::Deserialize;
use std::sync::{Arc, Mutex};

use crate::{
    AppState, Error, UserID,
    alert::alert_response,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base,
    },
    navigation::NavBar,
};

/// The currency assigned to profiles that have never been edited.
pub const DEFAULT_CURRENCY: &str = "USD";

/// The currency codes offered in the profile form.
pub const SUPPORTED_CURRENCIES: [&str; 14] = [
    "USD", "EUR", "GBP", "JPY", "CAD", "AUD", "INR", "BRL", "ZAR", "CNY", "RUB", "MXN", "SGD",
    "CHF",
];

/// A user's profile settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// The ID of the user the profile belongs to.
    pub user_id: UserID,
    /// The country the user lives in. Informational only, may be empty.
    pub country: String,
    /// The ISO 4217 code of the currency amounts are displayed in.
    pub currency: String,
}

impl Profile {
    /// The profile used for users who have never edited their settings.
    pub fn default_for(user_id: UserID) -> Self {
        Self {
            user_id,
            country: String::new(),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Get the profile for `user_id`, falling back to the default profile if the
/// user has never saved their settings.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_profile(user_id: UserID, connection: &Connection) -> Result<Profile, Error> {
    let result = connection
        .prepare("SELECT user_id, country, currency FROM profile WHERE user_id = :user_id")?
        .query_row(&[(":user_id", &user_id)], map_profile_row);

    match result {
        Ok(profile) => Ok(profile),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(Profile::default_for(user_id)),
        Err(error) => Err(error.into()),
    }
}

/// Save the profile settings for `user_id`, replacing any previous settings.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn upsert_profile(
    user_id: UserID,
    country: &str,
    currency: &str,
    connection: &Connection,
) -> Result<Profile, Error> {
    connection.execute(
        "INSERT INTO profile (user_id, country, currency) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO UPDATE SET country = excluded.country, currency = excluded.currency",
        (user_id, country, currency),
    )?;

    Ok(Profile {
        user_id,
        country: country.to_owned(),
        currency: currency.to_owned(),
    })
}

fn map_profile_row(row: &Row) -> Result<Profile, rusqlite::Error> {
    let user_id = row.get(0)?;
    let country = row.get(1)?;
    let currency = row.get(2)?;

    Ok(Profile {
        user_id,
        country,
        currency,
    })
}

/// Create the profile table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_profile_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS profile (
                user_id INTEGER PRIMARY KEY,
                country TEXT NOT NULL,
                currency TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// The state needed for displaying and editing profiles.
#[derive(Debug, Clone)]
pub struct ProfileState {
    /// The database connection for profile settings.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for displaying the profile page.
pub async fn get_profile_page(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    render_profile_page(&state, user_id).unwrap_or_else(|error| error.into_response())
}

fn render_profile_page(state: &ProfileState, user_id: UserID) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let profile = get_profile(user_id, &connection)?;

    let nav_bar = NavBar::new(endpoints::PROFILE_VIEW);
    let content = html! {
        (nav_bar.into_html())

        div class=(PAGE_CONTAINER_STYLE) {
            h1 class="text-xl font-bold" { "Profile" }

            (profile_form(&profile))
        }
    };

    Ok(base("Profile", &[], &content).into_response())
}

fn profile_form(profile: &Profile) -> Markup {
    html! {
        form
            class="flex flex-col gap-4 max-w-sm"
            hx-put=(endpoints::PUT_PROFILE)
            hx-swap="none"
        {
            div {
                label for="country" class=(FORM_LABEL_STYLE) { "Country" }
                input
                    type="text"
                    id="country"
                    name="country"
                    value=(profile.country)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div {
                label for="currency" class=(FORM_LABEL_STYLE) { "Currency" }
                select id="currency" name="currency" class=(FORM_TEXT_INPUT_STYLE) {
                    @for code in SUPPORTED_CURRENCIES {
                        option value=(code) selected[code == profile.currency] { (code) }
                    }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
        }
    }
}

/// The form data for updating the user's profile settings.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    /// The country the user lives in. May be empty.
    pub country: Option<String>,
    /// The ISO 4217 code of the currency amounts are displayed in.
    pub currency: String,
}

/// A route handler for saving changes to the user's profile settings.
///
/// Responds with an alert confirming the save, or an alert describing the
/// error.
pub async fn update_profile(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ProfileForm>,
) -> Response {
    let result = save_profile(&state, user_id, form);

    match result {
        Ok(profile) => alert_response(
            StatusCode::OK,
            "Profile saved",
            &format!("Amounts will now be displayed in {}.", profile.currency),
        ),
        Err(error) => error.into_alert_response(),
    }
}

fn save_profile(state: &ProfileState, user_id: UserID, form: ProfileForm) -> Result<Profile, Error> {
    let currency = form.currency.trim().to_uppercase();

    if !SUPPORTED_CURRENCIES.contains(&currency.as_str()) {
        return Err(Error::NotFound);
    }

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    upsert_profile(
        user_id,
        form.country.as_deref().unwrap_or_default().trim(),
        &currency,
        &connection,
    )
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod profile_query_tests {
    use rusqlite::Connection;

    use crate::{UserID, db::initialize, password::PasswordHash, user::create_user};

    use super::{DEFAULT_CURRENCY, get_profile, upsert_profile};

    fn get_test_connection() -> (Connection, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("x"),
            &connection,
        )
        .expect("Could not create test user");
        (connection, user.id)
    }

    #[test]
    fn get_profile_returns_default_for_new_user() {
        let (connection, user_id) = get_test_connection();

        let profile = get_profile(user_id, &connection).expect("Could not get profile");

        assert_eq!(profile.currency, DEFAULT_CURRENCY);
        assert_eq!(profile.country, "");
    }

    #[test]
    fn upsert_profile_saves_settings() {
        let (connection, user_id) = get_test_connection();

        upsert_profile(user_id, "New Zealand", "EUR", &connection)
            .expect("Could not save profile");
        let profile = get_profile(user_id, &connection).expect("Could not get profile");

        assert_eq!(profile.country, "New Zealand");
        assert_eq!(profile.currency, "EUR");
    }

    #[test]
    fn upsert_profile_replaces_previous_settings() {
        let (connection, user_id) = get_test_connection();
        upsert_profile(user_id, "New Zealand", "EUR", &connection).unwrap();

        upsert_profile(user_id, "Japan", "JPY", &connection).expect("Could not save profile");
        let profile = get_profile(user_id, &connection).expect("Could not get profile");

        assert_eq!(profile.country, "Japan");
        assert_eq!(profile.currency, "JPY");
    }
}
