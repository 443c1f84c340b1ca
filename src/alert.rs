//! Dismissable alert messages for showing the outcome of htmx requests.
//!
//! Alerts are rendered into the `#alert-container` element that [crate::html::base]
//! places on every page, using an htmx out-of-band swap.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::{Markup, html};

/// An alert message to display to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// The request succeeded.
    Success {
        /// A short summary of what happened.
        message: String,
        /// Extra detail about the outcome.
        details: String,
    },
    /// The request succeeded, no extra detail needed.
    SuccessSimple {
        /// A short summary of what happened.
        message: String,
    },
    /// The request failed.
    Error {
        /// A short summary of what went wrong.
        message: String,
        /// Extra detail about the error and how to fix it.
        details: String,
    },
}

impl Alert {
    /// Render the alert as an out-of-band swap targeting the alert container.
    pub fn into_html(self) -> Html<String> {
        let (message, details, is_error) = match self {
            Alert::Success { message, details } => (message, details, false),
            Alert::SuccessSimple { message } => (message, String::new(), false),
            Alert::Error { message, details } => (message, details, true),
        };

        let accent_style = if is_error {
            "text-red-800 bg-red-50 dark:bg-gray-800 dark:text-red-400 border-red-300 dark:border-red-800"
        } else {
            "text-green-800 bg-green-50 dark:bg-gray-800 dark:text-green-400 border-green-300 dark:border-green-800"
        };

        let markup: Markup = html! {
            div id="alert-container" hx-swap-oob="true" class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div
                    class={ "flex items-start p-4 mb-4 rounded-lg border shadow " (accent_style) }
                    role="alert"
                {
                    div class="text-sm font-medium" {
                        p class="font-semibold" { (message) }

                        @if !details.is_empty() {
                            p class="font-normal mt-1" { (details) }
                        }
                    }

                    button
                        type="button"
                        class="ms-auto -mx-1.5 -my-1.5 rounded-lg p-1.5 inline-flex items-center justify-center h-8 w-8 hover:bg-gray-100 dark:hover:bg-gray-700"
                        aria-label="Close"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "✕"
                    }
                }
            }
        };

        Html(markup.into_string())
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}

/// Create an HTTP response with `status_code` that swaps an alert into the
/// alert container. Statuses below 400 render a success alert, everything
/// else renders an error alert.
pub fn alert_response(status_code: StatusCode, message: &str, details: &str) -> Response {
    let alert = if status_code.is_client_error() || status_code.is_server_error() {
        Alert::Error {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    } else {
        Alert::Success {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    };

    (status_code, alert.into_html()).into_response()
}

#[cfg(test)]
mod alert_tests {
    use axum::http::StatusCode;

    use super::{Alert, alert_response};

    #[test]
    fn alert_targets_alert_container() {
        let html = Alert::SuccessSimple {
            message: "Saved".to_owned(),
        }
        .into_html();

        assert!(html.0.contains("id=\"alert-container\""));
        assert!(html.0.contains("hx-swap-oob"));
        assert!(html.0.contains("Saved"));
    }

    #[test]
    fn error_alert_includes_details() {
        let html = Alert::Error {
            message: "Something went wrong".to_owned(),
            details: "Check the server logs.".to_owned(),
        }
        .into_html();

        assert!(html.0.contains("Something went wrong"));
        assert!(html.0.contains("Check the server logs."));
    }

    #[test]
    fn alert_response_uses_status_code() {
        let response = alert_response(StatusCode::BAD_REQUEST, "Invalid amount", "");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
