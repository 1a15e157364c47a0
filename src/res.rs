use axum::{debug_handler, extract::Path, http::{header, StatusCode}, response::{Html, IntoResponse, Response}};
use tower_sessions::Session;

use crate::{notify::{self, Toast}, AppResult};

#[macro_export]
macro_rules! include_res {
    (bytes, $p:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

/// Escapes markup, and the braces of template placeholders so filled-in
/// text can never be taken for one.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '{' => escaped.push_str("&#123;"),
            '}' => escaped.push_str("&#125;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Wraps a page body in the shared shell, which carries the toast surface.
/// The body goes in last: it may hold generated text with braces in it.
pub fn page(title: &str, toasts: &[Toast], body: &str) -> Html<String> {
    Html(
        include_res!(str, "/pages/shell.html")
            .replace("{title}", &escape_html(title))
            .replace("{toasts}", &notify::render(toasts))
            .replace("{body}", body)
    )
}

/// A page that shows `toast` and then moves the browser to `to` after
/// `delay_ms`, leaving time for the toast to be read.
pub fn redirect_after(to: &str, delay_ms: u64, toast: Toast) -> Html<String> {
    let body = include_res!(str, "/pages/redirect.html")
        .replace("{delay}", &delay_ms.to_string())
        .replace("{to}", &escape_html(to));
    page("Redirecting", &[toast], &body)
}

#[debug_handler]
pub async fn not_found(session: Session) -> AppResult<Response> {
    let toasts = notify::take(&session).await?;
    Ok((
        StatusCode::NOT_FOUND,
        page("Page Not Found", &toasts, include_res!(str, "/pages/not_found.html")),
    ).into_response())
}

#[debug_handler]
pub async fn asset(Path(file): Path<String>) -> Response {
    let (content_type, body): (&str, &'static str) = match file.as_str() {
        "app.css" => ("text/css; charset=utf-8", include_res!(str, "/static/app.css")),
        "app.js" => ("text/javascript; charset=utf-8", include_res!(str, "/static/app.js")),
        "dashboard.js" => ("text/javascript; charset=utf-8", include_res!(str, "/static/dashboard.js")),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    ([(header::CONTENT_TYPE, content_type)], body).into_response()
}
