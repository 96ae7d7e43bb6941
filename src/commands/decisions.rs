use agendum_core::DecisionLog;
use agendum_core::config::Settings;
use anyhow::Result;
use owo_colors::OwoColorize;

pub fn run(settings: &Settings, clear: bool) -> Result<()> {
    let path = settings.decisions_path();

    if clear {
        DecisionLog::new().save(&path)?;
        println!("{}", "Decision log cleared".green());
        return Ok(());
    }

    let log = DecisionLog::load(&path)?;

    if log.is_empty() {
        println!("{}", "No decisions recorded".dimmed());
        return Ok(());
    }

    for decision in log.entries() {
        println!(
            "{} {}",
            decision.timestamp.format("%Y-%m-%d %H:%M:%S").dimmed(),
            decision.action.bold()
        );
        println!("  {}", decision.reasoning);
    }

    Ok(())
}
