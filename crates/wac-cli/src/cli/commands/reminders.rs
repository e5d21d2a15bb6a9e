//! Reminder command handlers.

use anyhow::Result;
use chrono::Utc;
use wac_core::api::ApiError;
use wac_core::validation::ReminderForm;

use super::App;

/// Turns an API failure into the user-facing error.
///
/// A 401 has already logged the session out through the bus by now.
fn report(err: ApiError) -> anyhow::Error {
    if err.is_unauthorized() && err.status.is_some() {
        anyhow::anyhow!("Session expired: {err}. Log in again with `wac login`.")
    } else {
        anyhow::Error::new(err)
    }
}

pub async fn list(app: &App) -> Result<()> {
    let reminders = app.reminders.list().await.map_err(report)?;
    if reminders.is_empty() {
        println!("No reminders.");
        return Ok(());
    }

    for reminder in reminders {
        println!(
            "#{:<4} {}  {}  ({}, {})",
            reminder.id,
            reminder.datetime,
            reminder.description,
            reminder.city,
            reminder.location_coordinates
        );
    }
    Ok(())
}

pub async fn add(app: &App, form: &ReminderForm) -> Result<()> {
    let offset = app.config.reminder_offset()?;
    let reminder = form.validate(Utc::now(), offset)?;

    let body = app.reminders.create(&reminder).await.map_err(report)?;
    match body.get("id") {
        Some(id) => println!("✓ Reminder {id} created for {}", reminder.datetime),
        None => println!("✓ Reminder created for {}", reminder.datetime),
    }
    Ok(())
}

pub async fn delete(app: &App, id: u64) -> Result<()> {
    app.reminders.delete(id).await.map_err(report)?;
    println!("✓ Deleted reminder {id}");
    Ok(())
}
