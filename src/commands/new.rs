use agendum_core::config::Settings;
use agendum_core::when::{parse_date, parse_time};
use agendum_core::{DecisionLog, EventCreator, EventRequest, Outcome};
use agendum_provider_caldav::CalDavRemote;
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use dialoguer::Input;
use owo_colors::OwoColorize;

use crate::utils::tui::{create_spinner, prompt_optional, prompt_with_retry};

/// Event fields as given on the command line.
pub struct NewEvent {
    pub title: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl NewEvent {
    /// Whether anything has to be asked for.
    fn is_complete(&self) -> bool {
        self.title.is_some() && self.date.is_some() && self.time.is_some()
    }
}

pub async fn run(settings: &Settings, input: NewEvent) -> Result<()> {
    let request = resolve_request(settings, input)?;

    let remote = settings
        .caldav
        .as_ref()
        .map(CalDavRemote::new)
        .transpose()?;
    let store = settings.open_store()?;
    let creator = EventCreator::new(remote, store, settings.build_options());

    let decisions_path = settings.decisions_path();
    let mut log = DecisionLog::load(&decisions_path)?;

    let spinner = create_spinner("Creating event".to_string())?;
    let result = creator.create(&request, &mut log).await;
    spinner.finish_and_clear();

    // The log has an entry for this attempt even when the store failed.
    log.save(&decisions_path)?;

    let creation = result.context("Event could not be stored anywhere")?;

    match &creation.outcome {
        Outcome::Synced { .. } => println!("{}", creation.message.green()),
        Outcome::FallenBack { stored_at, .. } => {
            println!("{}", creation.message.yellow());
            println!("{}", format!("Stored in {}", stored_at.display()).dimmed());
        }
        Outcome::ParseError(_) => anyhow::bail!("{}", creation.message),
    }

    Ok(())
}

/// Fill in missing fields interactively. Given fields are passed through
/// as-is and validated when the event is built.
fn resolve_request(settings: &Settings, input: NewEvent) -> Result<EventRequest> {
    let interactive = !input.is_complete();
    let today = Utc::now().with_timezone(&settings.timezone).date_naive();

    let title = match input.title {
        Some(t) => t,
        None => Input::<String>::new()
            .with_prompt("  Title")
            .interact_text()?,
    };

    let date = match input.date {
        Some(d) => d,
        None => prompt_with_retry("  Which day?", |s| check_date(s, today))?,
    };

    let time = match input.time {
        Some(t) => t,
        None => prompt_with_retry("  What time?", |s| parse_time(s).map(|_| ()))?,
    };

    let location = match input.location {
        Some(l) => Some(l),
        None if interactive => prompt_optional("  Where? (skip)")?,
        None => None,
    };

    let description = match input.description {
        Some(d) => Some(d),
        None if interactive => prompt_optional("  Notes? (skip)")?,
        None => None,
    };

    let mut request = EventRequest::new(title, date, time);
    if let Some(location) = location {
        request = request.with_location(location);
    }
    if let Some(description) = description {
        request = request.with_description(description);
    }

    if interactive {
        println!();
    }

    Ok(request)
}

fn check_date(input: &str, today: NaiveDate) -> Result<(), agendum_core::ParseError> {
    parse_date(input, today).map(|_| ())
}
