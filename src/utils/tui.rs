use anyhow::Result;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

pub fn create_spinner(message: String) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["-", "\\", "|", "/"])
            .template("{msg} {spinner}")?,
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    Ok(spinner)
}

/// Prompt until `validate` accepts the input; errors are shown and the prompt repeats.
pub fn prompt_with_retry<E: std::fmt::Display>(
    prompt: &str,
    validate: impl Fn(&str) -> std::result::Result<(), E>,
) -> Result<String> {
    loop {
        let input: String = Input::new().with_prompt(prompt).interact_text()?;
        match validate(&input) {
            Ok(()) => return Ok(input),
            Err(e) => eprintln!("  {}", e.to_string().red()),
        }
    }
}

/// Optional free-text prompt; an empty answer means "skip".
pub fn prompt_optional(prompt: &str) -> Result<Option<String>> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .default(String::new())
        .show_default(false)
        .interact_text()?;
    Ok(if input.trim().is_empty() { None } else { Some(input) })
}
