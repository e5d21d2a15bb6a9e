//! Session command handlers.

use anyhow::{Context, Result, bail};
use wac_core::app::Route;
use wac_core::auth::Settled;
use wac_core::validation::{LoginForm, RegisterForm};

use super::{App, secret_or_stdin};

pub async fn register(
    app: &App,
    name: &str,
    email: &str,
    password: Option<String>,
    password_confirmation: Option<String>,
) -> Result<()> {
    let password = secret_or_stdin(password, "Password")?;
    let form = RegisterForm {
        name: name.to_string(),
        email: email.to_string(),
        password_confirmation: password_confirmation.unwrap_or_else(|| password.clone()),
        password,
    };
    form.validate()?;

    match app
        .auth()
        .register(&form.name, &form.email, &form.password, &form.password_confirmation)
        .await
    {
        Settled::Fulfilled(_) => {
            println!("✓ Registered {}", form.email);
            if let Some(notice) = app.auth().snapshot().message {
                println!("{notice}");
            }
            println!("Run `wac login --email {}` to sign in.", form.email);
            Ok(())
        }
        Settled::Rejected(message) => bail!("Registration failed: {message}"),
    }
}

pub async fn login(app: &App, email: &str, password: Option<String>) -> Result<()> {
    let form = LoginForm {
        email: email.to_string(),
        password: secret_or_stdin(password, "Password")?,
    };
    form.validate()?;

    match app.auth().login(&form.email, &form.password).await {
        Settled::Fulfilled(user) => {
            println!("✓ Logged in as {}", user.display_name());
            Ok(())
        }
        Settled::Rejected(message) => bail!("Login failed: {message}"),
    }
}

pub fn logout(app: &App) -> Result<()> {
    if !app.auth().is_logged_in() {
        println!("Not logged in.");
        return Ok(());
    }
    app.root.log_out().context("Logout failed")?;
    println!("✓ Logged out");
    Ok(())
}

pub fn profile(app: &App) {
    let state = app.auth().snapshot();
    let Some(user) = state.user else {
        println!("Not logged in.");
        return;
    };

    println!("Name:  {}", user.name.as_deref().unwrap_or("-"));
    println!("Email: {}", user.email.as_deref().unwrap_or("-"));
    if let Some(id) = user.user_id {
        println!("User:  {id}");
    }
    println!("Token: {}", user.masked_token());
}

pub fn nav(app: &App, route: Option<&str>) {
    println!("{}", app.root.navigation());

    if let Some(raw) = route {
        let route = Route::parse(raw);
        let page = match &route {
            Route::Login => "login".to_string(),
            Route::Register => "register".to_string(),
            Route::Profile => "profile".to_string(),
            Route::Reminders(None) => "reminders".to_string(),
            Route::Reminders(Some(rest)) => format!("reminders ({rest})"),
            Route::NotFound(path) => format!("not found ({path})"),
        };
        println!("Route: {page}");
    }
}
