use agendum_core::config::Settings;
use agendum_core::StoredEvent;
use anyhow::Result;
use owo_colors::OwoColorize;

pub fn run(settings: &Settings, export: Option<&str>) -> Result<()> {
    let store = settings.open_store()?;

    if let Some(uid) = export {
        let Some(document) = store.export_ics(uid)? else {
            anyhow::bail!("No stored event with uid '{}'", uid);
        };
        print!("{}", document);
        return Ok(());
    }

    let events = store.list()?;

    if events.is_empty() {
        println!("{}", "No events stored locally".dimmed());
        return Ok(());
    }

    println!(
        "{}",
        format!("{} event(s) waiting in {}", events.len(), store.path().display()).bold()
    );

    for stored in &events {
        println!("{}", format_line(stored));
        println!("    {}", stored.reason.dimmed());
    }

    Ok(())
}

fn format_line(stored: &StoredEvent) -> String {
    let event = &stored.event;
    let mut line = format!(
        "  {} {}",
        event.start().format("%a %b %-d %H:%M"),
        event.summary()
    );
    if let Some(location) = event.location() {
        line.push_str(&format!(" @ {}", location));
    }
    line.push_str(&format!(" {}", format!("[{}]", event.uid()).dimmed()));
    line
}
