//! Interactive terminal chat client.
//!
//! Drives a [`SessionState`] against a running relay. One request is in
//! flight at a time: the input loop blocks on each relay call, which is the
//! terminal equivalent of the busy flag disabling the send button.

use std::path::Path;

use anyhow::Result;
use console::style;

use crate::config::Config;
use crate::mentor::MentorRegistry;
use crate::relay::HttpRelay;
use crate::session::{self, SessionState};
use crate::ui::{self, StatusLine, ThinkingSpinner};

const HELP: &str = "\
/mentor <id>        Switch mentor (resets the conversation)
/mentors            List available mentors
/challenge          Start the three-phase Excel challenge
/submit <path>      Submit a work file for review of the current phase
/curriculum <path>  Load a markdown curriculum for contextual guidance
/status             Show mentor, challenge, and curriculum state
/help               Show this help
/quit               Leave the chat";

/// Run the chat client until the user quits.
pub async fn run(config: &Config) -> Result<()> {
    let registry = MentorRegistry::from_config(&config.mentors)?;
    let relay = HttpRelay::new(&config.server.relay_url);
    let mut state = SessionState::new(registry.resolve(None));

    println!();
    println!(
        "{} {}",
        style("DataMentor AI").bold(),
        style(format!("(relay: {})", config.server.relay_url)).dim()
    );
    println!("{}", style("Type /help for commands.").dim());

    let mut shown = 0;
    render_new(&state, &mut shown);

    loop {
        let line = ui::prompt::chat_input()?;
        let line = line.trim();

        if let Some(command) = line.strip_prefix('/') {
            if !handle_command(command, &relay, &registry, &mut state, &mut shown).await? {
                break;
            }
            continue;
        }

        if line.is_empty() {
            continue;
        }

        let spinner = ThinkingSpinner::new(&state.mentor.display_name);
        session::send_message(&mut state, &relay, line).await;
        spinner.clear();
        render_new(&state, &mut shown);
    }

    Ok(())
}

/// Handle a slash command. Returns `false` when the user quits.
async fn handle_command(
    command: &str,
    relay: &HttpRelay,
    registry: &MentorRegistry,
    state: &mut SessionState,
    shown: &mut usize,
) -> Result<bool> {
    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(n, a)| (n, a.trim()));

    match name {
        "quit" | "exit" => return Ok(false),
        "help" => println!("{HELP}"),
        "mentors" => {
            for mentor in registry.all() {
                println!(
                    "  {} - {} ({})",
                    style(&mentor.id).bold(),
                    mentor.display_name,
                    mentor.expertise
                );
            }
        }
        "mentor" => {
            if registry.get(arg).is_none() {
                StatusLine::warn(format!("Unknown mentor '{arg}' - try /mentors")).print();
            } else {
                state.switch_mentor(registry, arg);
                *shown = 0;
                render_new(state, shown);
            }
        }
        "challenge" => {
            state.start_challenge();
            *shown = 0;
            render_new(state, shown);
        }
        "submit" => {
            if arg.is_empty() {
                StatusLine::warn("No file selected - usage: /submit <path>").print();
            } else if !Path::new(arg).exists() {
                StatusLine::warn(format!("File not found: {arg}")).print();
            } else {
                let spinner = ThinkingSpinner::new(&state.mentor.display_name);
                let result = session::submit_work(state, relay, Path::new(arg)).await;
                spinner.clear();
                if let Err(e) = result {
                    StatusLine::warn(format!("{e}")).print();
                }
                render_new(state, shown);
            }
        }
        "curriculum" => {
            if arg.is_empty() {
                StatusLine::warn("No file selected - usage: /curriculum <path>").print();
            } else {
                let spinner = ThinkingSpinner::new(&state.mentor.display_name);
                let result = session::load_curriculum(state, relay, Path::new(arg)).await;
                spinner.clear();
                match result {
                    Ok(title) => {
                        StatusLine::ok(format!("Curriculum loaded: {title}")).print();
                        *shown = 0;
                        render_new(state, shown);
                    }
                    Err(e) => StatusLine::error(format!("{e}")).print(),
                }
            }
        }
        "status" => print_status(state),
        _ => StatusLine::warn(format!("Unknown command '/{name}' - try /help")).print(),
    }

    Ok(true)
}

/// Print transcript entries added since the last render. A shrunken
/// transcript means it was reset (mentor switch, challenge start), so the
/// whole thing is re-rendered.
fn render_new(state: &SessionState, shown: &mut usize) {
    if state.transcript.len() < *shown {
        *shown = 0;
    }

    for entry in &state.transcript[*shown..] {
        match entry.role {
            session::Role::User => {}
            session::Role::Assistant => {
                println!();
                println!("{}", style(&state.mentor.display_name).bold().green());
                println!("{}", entry.content);
                println!();
            }
        }
    }

    *shown = state.transcript.len();
}

fn print_status(state: &SessionState) {
    println!();
    println!(
        "  Mentor: {} ({})",
        state.mentor.display_name, state.mentor.expertise
    );

    match state.challenge.active_phase {
        None => println!("  Challenge: not started"),
        Some(phase) if state.challenge.is_complete() => {
            println!("  Challenge: complete (finished phase {phase})");
        }
        Some(phase) => {
            let done = state.challenge.completed.iter().filter(|&&c| c).count();
            println!("  Challenge: phase {phase} of 3 ({done} complete)");
        }
    }

    match &state.curriculum {
        Some(c) => println!("  Curriculum: {}", c.title),
        None => println!("  Curriculum: none"),
    }
    println!();
}
