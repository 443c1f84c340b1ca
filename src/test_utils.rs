//! Helpers shared between the HTML page tests.

use axum::{body::Body, http::Response};
use scraper::Html;

/// Read the response body and parse it as a full HTML document.
pub async fn parse_html_document(response: Response<Body>) -> Html {
    Html::parse_document(&response_text(response).await)
}

/// Read the response body and parse it as an HTML fragment, e.g. a form
/// returned to HTMX without the surrounding page.
pub async fn parse_html_fragment(response: Response<Body>) -> Html {
    Html::parse_fragment(&response_text(response).await)
}

async fn response_text(response: Response<Body>) -> String {
    let body = response.into_body();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Could not get response body");

    String::from_utf8_lossy(&body_bytes).to_string()
}

/// Assert that the parser produced no errors for the HTML.
#[track_caller]
pub fn assert_valid_html(html: &Html) {
    assert!(
        html.errors.is_empty(),
        "Got HTML parsing errors: {:?}",
        html.errors
    );
}
