use std::time::Duration;

use maud::{DOCTYPE, Markup, html};

const TITLE: &str = "Employee Dashboard";

fn layout(title: &str, refresh: Option<String>, body: Markup) -> String {
    let markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                @if let Some(refresh) = refresh {
                    meta http-equiv="refresh" content=(refresh);
                }
                title { (title) }
            }
            body { (body) }
        }
    };
    markup.into_string()
}

pub(super) fn login(start_href: &str, error: Option<&str>) -> String {
    layout(
        TITLE,
        None,
        html! {
            h1 { (TITLE) }
            p { "Login with your Discord account" }
            @if let Some(error) = error {
                p class="error" { (error) }
            }
            a class="button" href=(start_href) { "Login with Discord" }
        },
    )
}

/// Meta refresh to `to` after `after`, rounded up to whole seconds.
pub(super) fn callback_failed(message: &str, to: &str, after: Duration) -> String {
    let secs = after.as_millis().div_ceil(1000);
    layout(
        "Login Failed",
        Some(format!("{secs};url={to}")),
        html! {
            h2 { "Login Failed" }
            @if !message.is_empty() {
                p { (message) }
            }
            p { "Redirecting to login page..." }
        },
    )
}

pub(super) fn dashboard(display_name: &str, logout_href: &str) -> String {
    layout(
        TITLE,
        None,
        html! {
            h1 { (TITLE) }
            p { "Welcome, " (display_name) }
            form method="post" action=(logout_href) {
                button type="submit" { "Logout" }
            }
        },
    )
}
