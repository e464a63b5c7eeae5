//! HTML pages for the dashboard.
//!
//! Inline templates without a template engine; styling lives in
//! `public/dashboard.css`.

use super::chat_session::{ChatSession, Notice};
use super::markdown::{self, escape_html};
use crate::message::MessageRole;

/// Static text and form target of a chat page.
#[derive(Debug, Clone, Copy)]
pub struct PageHeading {
    pub title: &'static str,
    pub description: &'static str,
    pub action: &'static str,
    pub placeholder: &'static str,
    pub accent: &'static str,
}

const NAV_LINKS: [(&str, &str); 3] = [
    ("/code", "Code Generation"),
    ("/conversation", "Conversation"),
    ("/settings", "Settings"),
];

fn layout(title: &str, body: &str) -> String {
    let nav: String = NAV_LINKS
        .iter()
        .map(|(href, label)| format!(r#"<a href="{href}">{label}</a>"#))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <link rel="stylesheet" href="/dashboard.css">
</head>
<body>
    <nav class="sidebar">{nav}</nav>
    <main>{body}</main>
</body>
</html>"#,
        title = escape_html(title),
    )
}

fn heading(title: &str, description: &str, accent: &str) -> String {
    format!(
        r#"<div class="heading">
    <div class="heading-icon {accent}"></div>
    <div>
        <h2>{}</h2>
        <p class="muted">{}</p>
    </div>
</div>"#,
        escape_html(title),
        escape_html(description),
    )
}

/// Marks the form as submitting in the browser: locks the prompt, disables
/// the button and shows the loader until the next page arrives. Returns
/// false on a repeated submit so only one request is in flight.
const SUBMIT_GUARD: &str = r#"<script>
function lockPromptForm(form) {
    if (form.dataset.submitting) { return false; }
    form.dataset.submitting = "true";
    form.elements.prompt.readOnly = true;
    form.querySelector("button[type=submit]").disabled = true;
    document.getElementById("loader").hidden = false;
    var empty = document.getElementById("empty");
    if (empty) { empty.hidden = true; }
    return true;
}
</script>"#;

/// Render a chat page for the given view state. Fails only if the log
/// cannot be serialized into the hidden history field.
pub fn chat_page(page: &PageHeading, session: &ChatSession) -> serde_json::Result<String> {
    let disabled = if session.submit_disabled() { " disabled" } else { "" };
    let history = session.log().to_json()?;

    let (toast, form_error) = match session.notice() {
        Some(Notice::Toast(text)) => (
            format!(r#"<div class="toast" role="alert">{}</div>"#, escape_html(text)),
            String::new(),
        ),
        Some(Notice::FormError(text)) => (
            String::new(),
            format!(r#"<p class="form-error">{}</p>"#, escape_html(text)),
        ),
        None => (String::new(), String::new()),
    };

    let loader = format!(
        r#"<div class="loader" id="loader"{hidden}><div class="spinner"></div><p>Thinking...</p></div>"#,
        hidden = if session.is_loading() { "" } else { " hidden" },
    );
    let empty = if !session.is_loading() && session.log().is_empty() {
        r#"<div class="empty" id="empty"><p>No conversation started.</p></div>"#
    } else {
        ""
    };

    let entries: String = session
        .log()
        .newest_first()
        .map(|message| {
            let (class, avatar) = match message.role {
                MessageRole::User => ("message-user", "You"),
                MessageRole::Assistant | MessageRole::System => ("message-bot", "AI"),
            };
            format!(
                r#"<div class="message {class}"><div class="avatar">{avatar}</div><div class="markdown">{}</div></div>"#,
                markdown::render(&message.content)
            )
        })
        .collect();

    let body = format!(
        r#"{heading}
<div class="content">
    {toast}
    <form method="POST" action="{action}" class="prompt-form" onsubmit="return lockPromptForm(this)">
        <input type="text" name="prompt" value="{draft}" placeholder="{placeholder}" autocomplete="off"{disabled}>
        <input type="hidden" name="history" value="{history}">
        <button type="submit"{disabled}>Generate</button>
    </form>
    {form_error}
    <div class="messages">
        {loader}
        {empty}
        {entries}
    </div>
</div>
{guard}"#,
        heading = heading(page.title, page.description, page.accent),
        action = page.action,
        draft = escape_html(session.draft()),
        placeholder = escape_html(page.placeholder),
        history = escape_html(&history),
        guard = SUBMIT_GUARD,
    );

    Ok(layout(page.title, &body))
}

/// Render the account settings page.
pub fn settings_page(subscription_url: &str) -> String {
    let body = format!(
        r#"{heading}
<div class="content">
    <p class="muted">You are currently on a pro plan.</p>
    <a class="button" href="{url}">Manage Subscription</a>
</div>"#,
        heading = heading("Settings", "Manage account settings.", "accent-grey"),
        url = escape_html(subscription_url),
    );
    layout("Settings", &body)
}
