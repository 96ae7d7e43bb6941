use agendum_core::config::Settings;
use agendum_provider_caldav::{CalDavRemote, RemoteEvent};
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use owo_colors::OwoColorize;

use crate::utils::tui::create_spinner;

pub async fn run(settings: &Settings, days: u32) -> Result<()> {
    let Some(caldav) = &settings.caldav else {
        anyhow::bail!(
            "CalDAV is not configured.\n\n\
            Set an account and password in the config file or with:\n  \
            AGENDUM_CALDAV__ACCOUNT=you@example.com\n  \
            AGENDUM_CALDAV__PASSWORD=..."
        );
    };

    let remote = CalDavRemote::new(caldav)?;

    let spinner = create_spinner(format!("Fetching events for the next {} day(s)", days))?;
    let result = remote.upcoming(days).await;
    spinner.finish_and_clear();
    let events = result?;

    if events.is_empty() {
        println!("{}", format!("No events in the next {} day(s)", days).dimmed());
        return Ok(());
    }

    let today = Utc::now().with_timezone(&settings.timezone).date_naive();
    let mut current_day = None;

    for remote_event in &events {
        let start = remote_event.event.start.with_timezone(&settings.timezone);
        let day = start.date_naive();

        if current_day != Some(day) {
            if current_day.is_some() {
                println!();
            }
            println!("{}", day_label(day, today).bold());
            current_day = Some(day);
        }

        println!("{}", format_line(remote_event, settings.timezone));
    }

    Ok(())
}

fn day_label(day: NaiveDate, today: NaiveDate) -> String {
    match (day - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => day.format("%a %b %-d").to_string(),
    }
}

fn format_line(remote_event: &RemoteEvent, timezone: Tz) -> String {
    let event = &remote_event.event;
    let mut line = format!(
        "  {} {} {}",
        event.start.with_timezone(&timezone).format("%H:%M"),
        event.summary,
        format!("[{}]", remote_event.calendar).dimmed()
    );
    if let Some(location) = &event.location {
        line.push_str(&format!(" @ {}", location));
    }
    line
}
