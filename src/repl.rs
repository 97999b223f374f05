//! Line-oriented front end: parse user input into intents and dispatch them.

use std::path::PathBuf;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use crate::analyzer::SearchType;
use crate::commands::{self, AppState};
use crate::view::{render_history, render_result};

pub const HELP_TEXT: &str = "\
Commands:
  open <path>      Analyze a new image (discards the current one)
  focus | yes      It's one of these: narrow the search to the shown candidates
  exclude | no     None of these: never suggest the shown candidates again
  back <n>         Return to step n (0 = original result)
  original         Return to the original result and clear exclusions
  new              Forget the current image
  show             Show the current result
  history          Show the refinement steps
  health           Check the recognition service
  help             Show this help
  quit             Exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Open(PathBuf),
    Refine(SearchType),
    /// Step number as displayed; 0 is the original.
    Back(usize),
    New,
    Show,
    History,
    Health,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

/// Map one input line to an intent.
pub fn parse_intent(line: &str) -> Intent {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Intent::Empty;
    }

    let (command, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (trimmed, ""),
    };

    match command.to_ascii_lowercase().as_str() {
        "open" | "analyze" if !arg.is_empty() => Intent::Open(PathBuf::from(unquote(arg))),
        "focus" | "yes" | "y" => Intent::Refine(SearchType::Focus),
        "exclude" | "no" | "n" => Intent::Refine(SearchType::Exclude),
        "back" | "step" => match arg.parse::<usize>() {
            Ok(step) => Intent::Back(step),
            Err(_) => Intent::Unknown(trimmed.to_string()),
        },
        "original" | "reset" => Intent::Back(0),
        "new" => Intent::New,
        "show" => Intent::Show,
        "history" => Intent::History,
        "health" => Intent::Health,
        "help" | "?" => Intent::Help,
        "quit" | "exit" | "q" => Intent::Quit,
        _ => Intent::Unknown(trimmed.to_string()),
    }
}

fn unquote(arg: &str) -> &str {
    arg.strip_prefix('"')
        .and_then(|a| a.strip_suffix('"'))
        .or_else(|| arg.strip_prefix('\'').and_then(|a| a.strip_suffix('\'')))
        .unwrap_or(arg)
}

/// Line shown while a network call for `intent` is outstanding.
pub fn progress_message(intent: &Intent) -> Option<&'static str> {
    match intent {
        Intent::Open(_) => Some("Analyzing..."),
        Intent::Refine(_) => Some("Re-examining..."),
        Intent::Health => Some("Checking service..."),
        _ => None,
    }
}

/// Result view followed by the step navigator, if any.
fn render_state(state: &AppState) -> String {
    let snapshot = state.snapshot();
    let history = render_history(&snapshot);
    if history.is_empty() {
        render_result(&snapshot)
    } else {
        format!("{}\n\n{}", render_result(&snapshot), history)
    }
}

/// Apply one intent. Returns `None` when the user asked to quit.
pub async fn dispatch(state: &AppState, intent: Intent) -> Option<String> {
    debug!("Dispatching {:?}", intent);
    let output = match intent {
        Intent::Open(path) => match commands::analyze_image(state, path).await {
            Ok(_) => render_state(state),
            Err(e) => e,
        },
        Intent::Refine(search_type) => match commands::refine(state, search_type).await {
            Ok(_) => render_state(state),
            Err(e) => e,
        },
        Intent::Back(0) => match commands::rollback_to_original(state) {
            Ok(()) => render_state(state),
            Err(e) => e,
        },
        Intent::Back(step) => match commands::rollback_to_step(state, step - 1) {
            Ok(()) => render_state(state),
            Err(e) => e,
        },
        Intent::New => {
            commands::start_over(state);
            "Ready for a new image. Use `open <path>`.".to_string()
        }
        Intent::Show => render_state(state),
        Intent::History => {
            let history = render_history(&state.snapshot());
            if history.is_empty() {
                "No re-examinations yet.".to_string()
            } else {
                history
            }
        }
        Intent::Health => match commands::check_health(state).await {
            Ok(health) => format!(
                "Service {}: {}",
                health.service.as_deref().unwrap_or("recognition API"),
                health.status
            ),
            Err(e) => format!("Health check failed: {}", e),
        },
        Intent::Help => HELP_TEXT.to_string(),
        Intent::Quit => return None,
        Intent::Empty => String::new(),
        Intent::Unknown(input) => format!("Unknown command: '{}'. Type `help`.", input),
    };
    Some(output)
}

/// Read intents from stdin until `quit` or end of input.
pub async fn run_interactive(state: &AppState, initial: Option<PathBuf>) -> Result<()> {
    let mut stdout = tokio::io::stdout();

    if let Some(path) = initial {
        stdout.write_all(b"Analyzing...\n").await?;
        stdout.flush().await?;
        if let Some(output) = dispatch(state, Intent::Open(path)).await {
            stdout.write_all(format!("{}\n", output).as_bytes()).await?;
        }
    } else {
        stdout.write_all(format!("{}\n", HELP_TEXT).as_bytes()).await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let intent = parse_intent(&line);
        if let Some(progress) = progress_message(&intent) {
            stdout.write_all(format!("{}\n", progress).as_bytes()).await?;
            stdout.flush().await?;
        }
        match dispatch(state, intent).await {
            Some(output) if output.is_empty() => {}
            Some(output) => stdout.write_all(format!("{}\n", output).as_bytes()).await?,
            None => break,
        }
    }
    stdout.flush().await?;
    Ok(())
}
