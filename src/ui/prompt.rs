//! Input prompts for the chat client.

use anyhow::Result;
use console::style;
use dialoguer::Input;

/// Read one line of chat input. Empty input is allowed (the session treats
/// it as a no-op).
pub fn chat_input() -> Result<String> {
    let value: String = Input::new()
        .with_prompt(format!("{}", style("you").bold().cyan()))
        .allow_empty(true)
        .interact_text()?;
    Ok(value)
}
