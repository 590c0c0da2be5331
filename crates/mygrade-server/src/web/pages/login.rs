//! Administrator sign-in and sign-out pages

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use maud::{html, Markup};
use tower_sessions::Session;

use crate::api::AppState;
use crate::error::AppResult;
use crate::features::auth::commands::sign_in::{self, SignInCommand};
use crate::features::auth::commands::sign_out::{self, SignOutCommand};
use crate::features::auth::gate::{arm_admin_watchdog, ADMIN_HOME_PATH, LOGIN_PATH};
use crate::session;
use crate::web::layout::{message, page, PageOptions};

/// `/admin-login`, with any pending notice (e.g. inactivity expiry)
pub async fn login_page(session: Session) -> AppResult<Markup> {
    let notice = session::take_notice(&session).await?;
    Ok(render_login("", notice.as_deref(), None))
}

#[tracing::instrument(skip(state, session, command))]
pub async fn login_submit(
    State(state): State<AppState>,
    session: Session,
    Form(command): Form<SignInCommand>,
) -> AppResult<Response> {
    let email = command.email.clone();
    match sign_in::handle(state.identity.as_ref(), command).await {
        Ok(auth) => {
            session::set_admin_token(&session, &auth.token).await?;
            arm_admin_watchdog(&state, &auth.token);
            Ok(Redirect::to(ADMIN_HOME_PATH).into_response())
        },
        Err(e) => Ok(render_login(&email, None, Some(&e.to_string())).into_response()),
    }
}

fn render_login(email: &str, notice: Option<&str>, error: Option<&str>) -> Markup {
    page(
        "Admin Login",
        &PageOptions::default(),
        html! {
            @if let Some(notice) = notice {
                div.notice role="alertdialog" {
                    p { (notice) }
                    a.button href=(LOGIN_PATH) { "OK" }
                }
            }
            h1 { "Admin Login" }
            form.stack method="post" action=(LOGIN_PATH) {
                input type="email" name="email" placeholder="Email" value=(email);
                input type="password" name="password" placeholder="Password";
                button type="submit" { "Sign In" }
            }
            (message(error, "error"))
        },
    )
}

/// `/admin/logout`
#[tracing::instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> AppResult<Redirect> {
    if let Some(token) = session::clear_admin_token(&session).await? {
        if let Err(e) = sign_out::handle(
            state.identity.as_ref(),
            &state.activity,
            SignOutCommand { token },
        )
        .await
        {
            tracing::warn!("Sign-out failed: {}", e);
        }
    }
    Ok(Redirect::to(LOGIN_PATH))
}

/// `/admin` lands on the dashboard
pub async fn admin_home() -> Redirect {
    Redirect::to("/admin/dashboard")
}
