use agendum_core::config::Settings;
use anyhow::Result;
use owo_colors::OwoColorize;

pub fn run(settings: &Settings) -> Result<()> {
    let config_path = Settings::config_path()?;

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    println!("  Events:     {}", settings.store_dir().display());
    println!("  Decisions:  {}", settings.decisions_path().display());

    println!();
    println!("{}", "Events".bold());
    println!("  Timezone:   {}", settings.timezone.name());
    println!(
        "  Duration:   {} min",
        settings.default_duration.num_minutes()
    );

    println!();
    println!("{}", "CalDAV".bold());
    match &settings.caldav {
        Some(caldav) => {
            println!("  URL:        {}", caldav.url);
            println!("  Account:    {}", caldav.account);
            println!("  Password:   {}", "********".dimmed());
            println!("  Timeout:    {}s", caldav.request_timeout.as_secs());
        }
        None => println!("  {}", "not configured (events are stored locally)".yellow()),
    }

    Ok(())
}
