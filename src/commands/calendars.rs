use agendum_core::config::Settings;
use agendum_provider_caldav::CalDavRemote;
use anyhow::Result;
use owo_colors::OwoColorize;

use crate::utils::tui::create_spinner;

pub async fn run(settings: &Settings) -> Result<()> {
    let Some(caldav) = &settings.caldav else {
        anyhow::bail!(
            "CalDAV is not configured.\n\n\
            Set an account and password in the config file or with:\n  \
            AGENDUM_CALDAV__ACCOUNT=you@example.com\n  \
            AGENDUM_CALDAV__PASSWORD=..."
        );
    };

    let remote = CalDavRemote::new(caldav)?;

    let spinner = create_spinner(format!("Discovering calendars on {}", remote.base_url()))?;
    let result = remote.calendars().await;
    spinner.finish_and_clear();
    let calendars = result?;

    if calendars.is_empty() {
        println!("{}", "No calendars found".dimmed());
        return Ok(());
    }

    for calendar in &calendars {
        let name = calendar.name.as_deref().unwrap_or("(unnamed)");
        if calendar.read_only {
            println!("  {} {}", name, "(read-only)".yellow());
        } else {
            println!("  {}", name.green());
        }
        println!("    {}", calendar.url.as_str().dimmed());
    }

    Ok(())
}
