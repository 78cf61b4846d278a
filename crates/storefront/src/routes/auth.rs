//! Authentication route handlers.
//!
//! Login exchanges username and password for a JWT pair on the backend. The
//! tokens and a [`CurrentCustomer`] snapshot are stored in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use boilerparts_api::{Credentials, Registration};
use boilerparts_core::{Email, Phone};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{instrument, warn};

use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_customer, set_current_customer};
use crate::models::validation::non_blank;
use crate::models::{CurrentCustomer, FieldErrors};
use crate::routes::LayoutView;
use crate::services::cart as cart_service;
use crate::state::AppState;

/// Minimum password length accepted at registration.
const MIN_PASSWORD_LENGTH: usize = 8;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub next: String,
}

/// Registration form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

impl RegisterForm {
    /// Validate the form into a backend registration.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when a field is invalid.
    pub fn validate(&self) -> std::result::Result<Registration, FieldErrors> {
        let mut errors = FieldErrors::new();

        let username = non_blank(&self.username);
        if username.is_none() {
            errors.add("username", "Please choose a username");
        }

        let email = Email::parse(&self.email)
            .map_err(|e| errors.add("email", e.to_string()))
            .ok();

        let phone = match non_blank(&self.phone) {
            Some(raw) => Phone::parse(&raw)
                .map_err(|e| errors.add("phone", e.to_string()))
                .ok(),
            None => None,
        };

        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
            );
        }
        if self.password != self.password_confirm {
            errors.add("password_confirm", "Passwords do not match");
        }

        match (username, email) {
            (Some(username), Some(email)) if errors.is_empty() => Ok(Registration {
                username,
                email: email.into_inner(),
                password: self.password.clone(),
                first_name: self.first_name.trim().to_string(),
                last_name: self.last_name.trim().to_string(),
                phone: phone.map(|p| p.as_str().to_string()),
            }),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
    pub success: Option<String>,
    pub next: Option<String>,
}

/// Message shown for a login error code.
fn login_error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Incorrect username or password.",
        "session" => "Your session could not be saved, please try again.",
        _ => "Login failed, please try again.",
    }
}

/// Message shown for a login success code.
fn login_success_message(code: &str) -> &'static str {
    match code {
        "registered" => "Your account was created, you can now log in.",
        "logged_out" => "You have been logged out.",
        _ => "Done.",
    }
}

/// Only same-site relative paths are followed after login.
fn safe_next(next: &str) -> Option<&str> {
    (next.starts_with('/') && !next.starts_with("//") && !next.contains('\\')).then_some(next)
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: LayoutView,
    pub error: Option<String>,
    pub success: Option<String>,
    pub username: String,
    pub next: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: LayoutView,
    pub form: RegisterForm,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

async fn layout(
    state: &AppState,
    session: &Session,
    customer: Option<&CurrentCustomer>,
) -> Result<LayoutView> {
    let cart = cart_service::load(session).await?;
    Ok(LayoutView::new(state, customer, &cart))
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
#[instrument(skip(state, session, customer))]
pub async fn login_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Query(query): Query<LoginQuery>,
) -> Result<Response> {
    if customer.is_some() {
        return Ok(Redirect::to("/account").into_response());
    }

    Ok(LoginTemplate {
        layout: layout(&state, &session, None).await?,
        error: query.error.as_deref().map(|c| login_error_message(c).to_string()),
        success: query
            .success
            .as_deref()
            .map(|c| login_success_message(c).to_string()),
        username: String::new(),
        next: query.next.unwrap_or_default(),
    }
    .into_response())
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
            warn!(error = %e, "Login rejected");
            return Ok(LoginTemplate {
                layout: layout(&state, &session, None).await?,
                error: Some(login_error_message("credentials").to_string()),
                success: None,
                username: credentials.username,
                next: form.next,
            }
            .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let profile = state.api().me(tokens.access()).await?;
    let customer = CurrentCustomer::from(&profile);

    if let Err(e) = set_current_customer(&session, &customer).await {
        tracing::error!("Failed to set session: {e}");
        return Ok(Redirect::to("/auth/login?error=session").into_response());
    }

    set_sentry_user(&customer.id, &customer.username);
    add_breadcrumb("auth", "Customer logged in", &[]);

    let target = safe_next(&form.next).unwrap_or("/account");
    Ok(Redirect::to(target).into_response())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip(state, session))]
pub async fn register_page(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse> {
    Ok(RegisterTemplate {
        layout: layout(&state, &session, None).await?,
        form: RegisterForm::default(),
        errors: FieldErrors::new(),
        error: None,
    })
}

/// Handle registration form submission.
///
/// A successful registration logs the customer straight in.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let registration = match form.validate() {
        Ok(registration) => registration,
        Err(errors) => {
            return Ok(RegisterTemplate {
                layout: layout(&state, &session, None).await?,
                form: RegisterForm {
                    password: String::new(),
                    password_confirm: String::new(),
                    ..form
                },
                errors,
                error: None,
            }
            .into_response());
        }
    };

    if let Err(e) = state.api().register(&registration).await {
        if !e.is_validation() {
            return Err(e.into());
        }
        warn!(error = %e, "Registration rejected by backend");
        return Ok(RegisterTemplate {
            layout: layout(&state, &session, None).await?,
            form: RegisterForm {
                password: String::new(),
                password_confirm: String::new(),
                ..form
            },
            errors: FieldErrors::new(),
            error: Some("This username or email is already in use.".to_string()),
        }
        .into_response());
    }

    add_breadcrumb("auth", "Customer registered", &[]);

    let credentials = Credentials {
        username: registration.username,
        password: registration.password,
    };
    let logged_in = match state.api().login(&credentials, &session).await {
        Ok(tokens) => state.api().me(tokens.access()).await.ok(),
        Err(e) => {
            warn!(error = %e, "Automatic login after registration failed");
            None
        }
    };

    let Some(profile) = logged_in else {
        return Ok(Redirect::to("/auth/login?success=registered").into_response());
    };

    let customer = CurrentCustomer::from(&profile);
    set_current_customer(&session, &customer).await?;
    set_sentry_user(&customer.id, &customer.username);

    Ok(Redirect::to("/account").into_response())
}

// =============================================================================
// Logout
// =============================================================================

/// Log out: forget the tokens and the customer, keep the cart.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    state.api().logout(&session).await?;
    clear_current_customer(&session).await?;
    clear_sentry_user();

    Ok(Redirect::to("/auth/login?success=logged_out"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_form() -> RegisterForm {
        RegisterForm {
            username: "karim".to_string(),
            email: "karim@example.dz".to_string(),
            first_name: " Karim ".to_string(),
            last_name: "Benali".to_string(),
            phone: "0550 12 34 56".to_string(),
            password: "chaudiere16".to_string(),
            password_confirm: "chaudiere16".to_string(),
        }
    }

    #[test]
    fn test_valid_registration() {
        let registration = valid_form().validate().unwrap();
        assert_eq!(registration.username, "karim");
        assert_eq!(registration.first_name, "Karim");
        assert!(registration.phone.is_some());
    }

    #[test]
    fn test_registration_errors_per_field() {
        let form = RegisterForm {
            username: "  ".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            password_confirm: "other".to_string(),
            ..valid_form()
        };

        let errors = form.validate().unwrap_err();
        assert!(errors.has("username"));
        assert!(errors.has("email"));
        assert!(errors.has("password"));
        assert!(errors.has("password_confirm"));
        assert!(!errors.has("phone"));
    }

    #[test]
    fn test_phone_is_optional() {
        let form = RegisterForm {
            phone: String::new(),
            ..valid_form()
        };
        assert!(form.validate().unwrap().phone.is_none());
    }

    #[test]
    fn test_safe_next_rejects_external_targets() {
        assert_eq!(safe_next("/account"), Some("/account"));
        assert_eq!(safe_next("//evil.example"), None);
        assert_eq!(safe_next("https://evil.example"), None);
        assert_eq!(safe_next(""), None);
    }
}
