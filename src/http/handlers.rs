//! Demo application handlers.
//!
//! A tiny page that exercises the whole chain: the nonce lands in an inline
//! script, and a flash message survives exactly one redirect.

use axum::{
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::cookies::Cookies;
use crate::security::SecurityContext;

/// Cookie holding the pending flash message.
pub const FLASH_COOKIE: &str = "flash";

/// Flash messages outlive the redirect by at most this long.
const FLASH_MAX_AGE_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
pub struct FlashForm {
    pub message: String,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

/// Routes served behind the nonce and cookie middleware.
pub fn demo_routes() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/flash", post(store_flash))
        .route("/healthz", get(healthz))
}

async fn index(ctx: SecurityContext, cookies: Cookies) -> Html<String> {
    let flash = cookies.read_flash(FLASH_COOKIE);
    let notice = if flash.is_empty() {
        String::new()
    } else {
        format!("<p class=\"flash\">{}</p>\n", escape_html(&flash))
    };

    Html(format!(
        "<!doctype html>\n\
         <html>\n\
         <head><title>edge-guard</title></head>\n\
         <body>\n\
         {notice}<form method=\"post\" action=\"/flash\">\n\
         <input name=\"message\"><button>Flash</button>\n\
         </form>\n\
         <script nonce=\"{nonce}\">document.body.dataset.ready = \"1\";</script>\n\
         </body>\n\
         </html>\n",
        nonce = ctx.nonce(),
    ))
}

async fn store_flash(cookies: Cookies, Form(form): Form<FlashForm>) -> impl IntoResponse {
    cookies.set(FLASH_COOKIE, &form.message, FLASH_MAX_AGE_SECS);
    Redirect::to("/")
}

async fn healthz() -> Json<Health> {
    Json(Health { status: "ok" })
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#x27;x&#x27;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }
}
