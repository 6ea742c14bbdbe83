use crate::api::TaskCompletion;
use crate::error::{AppError, AppResult};
use crate::session::{self, session_cookie, LoginOutcome, SessionState, TokenValidation};
use crate::web::gate::require_session;
use crate::web::templates::{AdminPage, CeremonyPage, IndexPage, TaskPage, TokenPage};
use crate::web::AppState;
use askama::Template;
use axum::{
    extract::{Form, State},
    middleware,
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use zeroize::Zeroize;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Landing page
pub async fn index() -> AppResult<Html<String>> {
    let page = IndexPage {
        title: "RSTUF Web Interface",
    };
    Ok(Html(page.render()?))
}

/// Admin page: server, auth mode and login form
pub async fn admin_index(State(state): State<AppState>, jar: CookieJar) -> AppResult<Html<String>> {
    let session = SessionState::from_jar(&jar);
    let page = AdminPage {
        title: "Admin",
        server: &state.config.server,
        auth: state.config.auth.is_enforced(),
        session: session.label(),
    };
    Ok(Html(page.render()?))
}

#[derive(Deserialize)]
pub struct LoginForm {
    password: String,
}

/// Login form submission. Always answers with a cookie and a redirect back
/// to the admin page, whether the backend accepted the password or not.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(mut form): Form<LoginForm>,
) -> AppResult<(CookieJar, Redirect)> {
    let outcome = session::login(&state.client, &form.password).await;
    form.password.zeroize();
    let outcome = outcome?;

    if let LoginOutcome::Failed { status } = &outcome {
        info!(status = status.as_u16(), "Admin login failed");
    }

    let cookie = session_cookie(outcome.cookie_value(), state.config.cookie_domain()?);
    Ok((jar.add(cookie), Redirect::to("/admin/")))
}

/// Signing ceremony page: current bootstrap state of the backend
pub async fn ceremony(State(state): State<AppState>, jar: CookieJar) -> AppResult<Html<String>> {
    let headers = SessionState::from_jar(&jar).headers();
    let ceremony = state.client.bootstrap_status(&headers).await?;
    let page = CeremonyPage {
        title: "Ceremony",
        server: &state.config.server,
        ceremony: &ceremony,
    };
    Ok(Html(page.render()?))
}

/// Token page: asks the backend whether the session token is still valid
pub async fn token_status(State(state): State<AppState>, jar: CookieJar) -> AppResult<Html<String>> {
    let validation = match SessionState::from_jar(&jar).token() {
        Some(token) => session::validate(&state.client, token).await?,
        None => TokenValidation::default(),
    };
    let details = match &validation.data {
        Some(data) => serde_json::to_string_pretty(data)?,
        None => String::new(),
    };
    let page = TokenPage {
        title: "Token",
        server: &state.config.server,
        valid: validation.valid,
        details,
    };
    Ok(Html(page.render()?))
}

/// Trigger a targets publish and wait for the task
pub async fn publish(State(state): State<AppState>, jar: CookieJar) -> AppResult<Html<String>> {
    let headers = SessionState::from_jar(&jar).headers();
    let task_id = state.client.publish_targets(&headers).await?;
    let completion = wait_for_task(&state, task_id, &headers).await?;
    render_task("Publish targets", &completion)
}

#[derive(Deserialize)]
pub struct SignForm {
    payload: String,
}

/// Submit a metadata signature and wait for the task
pub async fn sign(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignForm>,
) -> AppResult<Html<String>> {
    let payload: serde_json::Value = serde_json::from_str(&form.payload)?;
    let headers = SessionState::from_jar(&jar).headers();
    let task_id = state.client.sign_metadata(&headers, &payload).await?;
    let completion = wait_for_task(&state, task_id, &headers).await?;
    render_task("Sign metadata", &completion)
}

/// Poll a task under the configured deadline. Server shutdown cancels the
/// wait through the child token.
async fn wait_for_task(
    state: &AppState,
    task_id: String,
    headers: &HeaderMap,
) -> AppResult<TaskCompletion> {
    let cancel = state.shutdown.child_token();
    let wait = state.poller.await_completion(&task_id, headers, &cancel);
    match tokio::time::timeout(state.config.task_timeout, wait).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(task_id)),
    }
}

fn render_task(action: &str, completion: &TaskCompletion) -> AppResult<Html<String>> {
    let page = TaskPage {
        title: action,
        action,
        task_id: &completion.task_id,
        states: &completion.states,
        payload: serde_json::to_string_pretty(&completion.payload)?,
    };
    Ok(Html(page.render()?))
}

async fn not_found() -> Response {
    AppError::NotFound.into_response()
}

/// Create the web router
pub fn create_router(state: AppState) -> Router {
    let gated = Router::new()
        .route("/admin/ceremony", get(ceremony))
        .route("/admin/ceremony/", get(ceremony))
        .route("/admin/token", get(token_status))
        .route("/admin/token/", get(token_status))
        .route("/admin/publish", post(publish))
        .route("/admin/sign", post(sign))
        .route_layer(middleware::from_fn_with_state(
            state.config.clone(),
            require_session,
        ));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/admin", get(admin_index).post(login))
        .route("/admin/", get(admin_index).post(login))
        .merge(gated)
        .fallback(not_found)
        .with_state(state)
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
}
