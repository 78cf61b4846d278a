//! Staff authentication.
//!
//! The backend issues tokens to every account; the back-office only keeps
//! them when the profile has `is_staff`. Other accounts are logged straight
//! back out.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use boilerparts_api::Credentials;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAdmin, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Query parameters for the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
    pub logged_out: Option<String>,
}

/// Message shown for a login error code.
fn error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Incorrect username or password.",
        "not_staff" => "This account has no access to the back-office.",
        "session" => "Your session could not be saved, please try again.",
        _ => "Login failed, please try again.",
    }
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<&'static str>,
    pub notice: Option<&'static str>,
    pub username: String,
}

/// Display the login page.
#[instrument(skip(admin))]
pub async fn login_page(
    OptionalAdmin(admin): OptionalAdmin,
    Query(query): Query<LoginQuery>,
) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        error: query.error.as_deref().map(error_message),
        notice: query
            .logged_out
            .is_some()
            .then_some("You have been logged out."),
        username: String::new(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let credentials = Credentials {
        username: form.username.trim().to_string(),
        password: form.password,
    };

    let tokens = match state.api().login(&credentials, &session).await {
        Ok(tokens) => tokens,
        Err(e) if e.is_unauthorized() || e.is_validation() => {
            warn!(error = %e, "Staff login rejected");
            return Ok(LoginTemplate {
                error: Some(error_message("credentials")),
                notice: None,
                username: credentials.username,
            }
            .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let profile = state.api().me(tokens.access()).await?;
    let Some(admin) = CurrentAdmin::from_staff(&profile) else {
        warn!(user_id = %profile.id, "Non-staff account tried to log in");
        state.api().logout(&session).await?;
        return Ok(Redirect::to("/auth/login?error=not_staff").into_response());
    };

    if let Err(e) = set_current_admin(&session, &admin).await {
        tracing::error!("Failed to set session: {e}");
        return Ok(Redirect::to("/auth/login?error=session").into_response());
    }

    set_sentry_user(&admin.id, admin.email.as_deref());
    info!(user_id = %admin.id, "Staff logged in");

    Ok(Redirect::to("/").into_response())
}

/// Log out: drop the tokens and the staff identity.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    state.api().logout(&session).await?;
    clear_current_admin(&session).await?;
    clear_sentry_user();

    Ok(Redirect::to("/auth/login?logged_out=1"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(error_message("not_staff"), "This account has no access to the back-office.");
        assert_eq!(error_message("whatever"), "Login failed, please try again.");
    }
}
