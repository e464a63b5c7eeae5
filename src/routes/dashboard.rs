use axum::{
    Form,
    extract::State,
    response::{Html, Redirect},
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    auth::CallerIdentity,
    error::AppError,
    message::{ChatMessage, RelayPayload},
    services::relay::{self, CODE, CONVERSATION, RelayVariant},
    state::{AppState, SharedState},
    views::{
        chat_session::{ChatLog, ChatSession, PromptRelay, RelayFailure},
        templates::{self, PageHeading},
    },
};

/// A chat page: what it shows, which relay it talks to, and where the
/// assistant message sits in that relay's reply.
pub struct ChatPage {
    pub heading: PageHeading,
    pub relay: &'static RelayVariant,
    pub reply: fn(Value) -> Option<ChatMessage>,
}

pub static CODE_PAGE: ChatPage = ChatPage {
    heading: PageHeading {
        title: "Code Generation",
        description: "Generate code using descriptive text.",
        action: "/code",
        placeholder: "Simple toggle button using react hooks.",
        accent: "accent-green",
    },
    relay: &CODE,
    reply: completion_message,
};

pub static CONVERSATION_PAGE: ChatPage = ChatPage {
    heading: PageHeading {
        title: "Conversation",
        description: "Our most advanced conversation model.",
        action: "/conversation",
        placeholder: "How do I calculate the radius of a circle?",
        accent: "accent-violet",
    },
    relay: &CONVERSATION,
    reply: bare_message,
};

fn completion_message(body: Value) -> Option<ChatMessage> {
    relay::first_choice(body).ok()
}

fn bare_message(body: Value) -> Option<ChatMessage> {
    serde_json::from_value(body).ok()
}

/// Runs the relay pipeline in-process, the same one the `/api` routes use.
struct InProcessRelay<'a> {
    state: &'a AppState,
    page: &'static ChatPage,
}

impl PromptRelay for InProcessRelay<'_> {
    async fn relay(&self, messages: Vec<ChatMessage>) -> Result<ChatMessage, RelayFailure> {
        let body = self
            .page
            .relay
            .relay(self.state, RelayPayload::with_messages(messages))
            .await
            .map_err(|e| RelayFailure::new(e.to_string()))?;
        (self.page.reply)(body).ok_or_else(|| RelayFailure::new("reply did not contain a message"))
    }
}

#[derive(Debug, Deserialize)]
pub struct PromptForm {
    #[serde(default)]
    pub prompt: String,
    /// JSON encoded log of the page being submitted from.
    #[serde(default)]
    pub history: String,
}

async fn submit_prompt(
    state: &AppState,
    page: &'static ChatPage,
    form: PromptForm,
) -> Result<Html<String>, AppError> {
    let log = ChatLog::from_json(&form.history)
        .map_err(|e| AppError::BadRequest(format!("Invalid conversation history: {e}")))?;
    let relay = InProcessRelay { state, page };
    let next = ChatSession::from_log(log).submit(&form.prompt, &relay).await;
    render_chat(page, &next)
}

fn render_chat(page: &ChatPage, session: &ChatSession) -> Result<Html<String>, AppError> {
    templates::chat_page(&page.heading, session)
        .map(Html)
        .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("rendering chat history")))
}

pub async fn root_handler() -> Redirect {
    Redirect::to("/code")
}

pub async fn code_page(_caller: CallerIdentity) -> Result<Html<String>, AppError> {
    render_chat(&CODE_PAGE, &ChatSession::new())
}

pub async fn code_submit(
    State(state): State<SharedState>,
    _caller: CallerIdentity,
    Form(form): Form<PromptForm>,
) -> Result<Html<String>, AppError> {
    submit_prompt(&state, &CODE_PAGE, form).await
}

pub async fn conversation_page(_caller: CallerIdentity) -> Result<Html<String>, AppError> {
    render_chat(&CONVERSATION_PAGE, &ChatSession::new())
}

pub async fn conversation_submit(
    State(state): State<SharedState>,
    _caller: CallerIdentity,
    Form(form): Form<PromptForm>,
) -> Result<Html<String>, AppError> {
    submit_prompt(&state, &CONVERSATION_PAGE, form).await
}

pub async fn settings_page(State(state): State<SharedState>, _caller: CallerIdentity) -> Html<String> {
    Html(templates::settings_page(&state.config.subscription_url))
}
