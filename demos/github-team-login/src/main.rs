use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use ras_identity_github::{
    AuthConfig, AuthenticatedUser, GitHubTeamAuth, InMemoryStateStore, LoginState,
    PermissionCheck, StateStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const STATE_TTL_SECONDS: u64 = 600;

/// Configuration for the GitHub team login demo
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub github_client_id: String,
    pub github_client_secret: String,
    pub organization: String,
    pub team: String,
    pub redirect_uri: String,
    pub server_host: String,
    pub server_port: u16,
    pub http_timeout_seconds: Option<u64>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            github_client_id: std::env::var("GITHUB_CLIENT_ID")
                .context("GITHUB_CLIENT_ID environment variable is required")?,
            github_client_secret: std::env::var("GITHUB_CLIENT_SECRET")
                .context("GITHUB_CLIENT_SECRET environment variable is required")?,
            organization: std::env::var("GITHUB_ORGANIZATION")
                .context("GITHUB_ORGANIZATION environment variable is required")?,
            team: std::env::var("GITHUB_TEAM")
                .context("GITHUB_TEAM environment variable is required")?,
            redirect_uri: std::env::var("REDIRECT_URI")
                .unwrap_or_else(|_| "http://localhost:3000/auth/callback".to_string()),
            server_host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: std::env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            http_timeout_seconds: std::env::var("HTTP_TIMEOUT_SECONDS")
                .ok()
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("HTTP_TIMEOUT_SECONDS must be a number of seconds")?,
        })
    }

    fn auth_config(&self) -> AuthConfig {
        let config = AuthConfig::new(
            &self.organization,
            &self.team,
            &self.github_client_id,
            &self.github_client_secret,
        )
        .with_redirect_uri(&self.redirect_uri);

        match self.http_timeout_seconds {
            Some(seconds) => config.with_http_timeout(seconds),
            None => config,
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<GitHubTeamAuth>,
    pub states: Arc<dyn StateStore>,
}

/// OAuth2 callback query parameters
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    authorized: bool,
    message: String,
    user: Option<AuthenticatedUser>,
}

impl LoginResponse {
    fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> Response {
    LoginResponse {
        authorized: false,
        message: message.into(),
        user: None,
    }
    .with_status(StatusCode::BAD_REQUEST)
}

async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let config = state.auth.config();
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>GitHub Team Login</title></head>
<body>
    <h1>GitHub Team Login</h1>
    <p>Members of <strong>{}/{}</strong> may sign in.</p>
    <a href="/auth/login">Sign in with GitHub</a>
</body>
</html>"#,
        config.organization, config.team
    ))
}

/// Issue a state and send the browser to GitHub
async fn login_handler(State(state): State<AppState>) -> Response {
    let login_state = LoginState::new(None, STATE_TTL_SECONDS);
    let state_param = login_state.state.clone();

    if let Err(e) = state.states.store(login_state).await {
        error!("Failed to store login state: {}", e);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    Redirect::to(&state.auth.auth_code_url(&state_param)).into_response()
}

async fn callback_handler(
    State(state): State<AppState>,
    Query(callback_query): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = &callback_query.error {
        let error_desc = callback_query
            .error_description
            .as_deref()
            .unwrap_or("No description");
        warn!("GitHub returned an error to the callback: {}: {}", error, error_desc);
        return bad_request(format!("{error}: {error_desc}"));
    }

    let Some(code) = callback_query.code else {
        return bad_request("Missing authorization code in callback");
    };
    let Some(state_param) = callback_query.state else {
        return bad_request("Missing state parameter in callback");
    };

    if state.states.take(&state_param).await.is_err() {
        warn!("Callback with unknown or expired state");
        return bad_request("Unknown or expired login state");
    }

    match state.auth.check_permission(&code).await {
        PermissionCheck::Authorized(user) => LoginResponse {
            authorized: true,
            message: format!("Welcome, {}", user.login),
            user: Some(user),
        }
        .with_status(StatusCode::OK),
        PermissionCheck::Denied(user) => LoginResponse {
            authorized: false,
            message: "Access denied".to_string(),
            user: Some(user),
        }
        .with_status(StatusCode::FORBIDDEN),
        PermissionCheck::Failed(e) => {
            error!("Login failed: {}", e);
            LoginResponse {
                authorized: false,
                message: "Login failed".to_string(),
                user: None,
            }
            .with_status(StatusCode::BAD_GATEWAY)
        }
    }
}

fn spawn_state_cleanup(states: Arc<dyn StateStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(STATE_TTL_SECONDS));
        loop {
            interval.tick().await;
            match states.cleanup_expired().await {
                Ok(0) => {}
                Ok(count) => info!("Removed {} expired login states", count),
                Err(e) => error!("Failed to clean up login states: {}", e),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    info!("Starting GitHub team login demo");

    let auth = GitHubTeamAuth::new(config.auth_config())
        .context("Failed to initialize GitHub authentication")?;

    let states: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
    spawn_state_cleanup(states.clone());

    let app_state = AppState {
        auth: Arc::new(auth),
        states,
    };

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/auth/login", get(login_handler))
        .route("/auth/callback", get(callback_handler))
        .with_state(app_state);

    let bind_addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    info!("Server running on http://{}", bind_addr);
    info!(
        "Admitting members of {}/{}, redirect URI: {}",
        config.organization, config.team, config.redirect_uri
    );

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
