//! Interactive chat console.
//!
//! Drives a [`ChatSession`] through its two phases on plain stdin/stdout:
//! a numbered provider menu with masked key entry while configuring, then a
//! prompt/response loop while chatting.  `/model` drops back to the menu,
//! `/quit` (or EOF) exits.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use crossterm::terminal;
use tracing::debug;

use crate::backend::ChatBackend;
use crate::commands::{CommandAction, handle_command};
use crate::credentials::CredentialStore;
use crate::providers::PROVIDERS;
use crate::session::{ChatSession, SessionError, SessionPhase};
use crate::theme as t;
use crate::transcript::{Role, TranscriptEntry};

/// Run the console until the user quits.  Returns on /quit or EOF.
pub async fn run_chat<S, B>(session: &mut ChatSession<S>, backend: &B) -> Result<()>
where
    S: CredentialStore,
    B: ChatBackend + Sync,
{
    let stdin = io::stdin();
    let mut reader = stdin.lock();

    println!();
    t::print_header("ragchat");

    // Tracks how much of the transcript has been printed so far.
    let mut printed = 0usize;

    loop {
        match session.phase() {
            SessionPhase::Configuring => {
                if !configure(session, &mut reader)? {
                    return Ok(());
                }
                printed = 0;
            }
            SessionPhase::Chatting => {
                printed = print_new_entries(session.transcript(), printed);

                let line = match prompt_line(&mut reader, &t::accent("You ❯ "))? {
                    Some(line) => line,
                    None => return Ok(()), // EOF
                };

                if line.trim().starts_with('/') {
                    let response = handle_command(&line);
                    for msg in &response.messages {
                        println!("  {}", t::muted(msg));
                    }
                    match response.action {
                        CommandAction::Quit => return Ok(()),
                        CommandAction::ChangeModel => {
                            session.change_model();
                        }
                        CommandAction::None => {}
                    }
                    continue;
                }

                match session.send(&line, backend).await {
                    Ok(()) => {}
                    Err(err) => {
                        // WrongPhase/TurnInFlight cannot happen in this loop,
                        // but surface it rather than swallowing.
                        println!("  {}", t::icon_warn(&err.to_string()));
                        debug!(%err, "send rejected");
                    }
                }
            }
        }
    }
}

/// One pass through the configuration phase: pick a provider, supply a key,
/// start the chat.  Returns `false` on EOF.
fn configure<S: CredentialStore>(
    session: &mut ChatSession<S>,
    reader: &mut impl BufRead,
) -> Result<bool> {
    println!();
    println!("{}", t::heading("Select a model provider:"));
    println!();
    for (i, p) in PROVIDERS.iter().enumerate() {
        let marker = if p.id == session.provider().id {
            t::accent_bright("●")
        } else {
            t::muted("○")
        };
        println!(
            "  {} {}. {}",
            marker,
            t::accent_bright(&format!("{}", i + 1)),
            p.display
        );
    }
    println!();

    loop {
        let prompt = format!(
            "{} ",
            t::accent(&format!("Provider [1-{}, Enter keeps current]:", PROVIDERS.len()))
        );
        let Some(choice) = prompt_line(reader, &prompt)? else {
            return Ok(false);
        };
        let choice = choice.trim();
        if choice.is_empty() {
            break;
        }
        if let Ok(n) = choice.parse::<usize>() {
            if n >= 1 && n <= PROVIDERS.len() {
                // The menu only offers catalogue providers, so this cannot fail.
                let _ = session.select_provider(PROVIDERS[n - 1].id);
                break;
            }
        }
        println!(
            "  {}",
            t::warn(&format!("Please enter a number between 1 and {}.", PROVIDERS.len()))
        );
    }

    let display = session.provider().display;
    println!();
    println!("  {}", t::icon_ok(&format!("Selected: {}", t::accent_bright(display))));

    loop {
        let state = session.render_state();
        let key_input = if state.credential_input_visible {
            println!();
            if let Some(stored) = state.credential_prefill {
                println!(
                    "  {}",
                    t::muted(&format!(
                        "A stored key ending in …{} was found — press Enter to reuse it.",
                        tail(stored)
                    ))
                );
            } else if let Some(hint) = session.provider().key_hint {
                println!("  {}", t::muted(&format!("e.g. {hint}")));
            }
            let Some(entered) =
                prompt_secret(reader, &format!("{} ", t::accent("API key:")))?
            else {
                return Ok(false);
            };
            if entered.trim().is_empty() {
                session
                    .credential_prefill()
                    .map(str::to_string)
                    .unwrap_or_default()
            } else {
                entered
            }
        } else {
            String::new()
        };

        match session.start_chat(&key_input) {
            Ok(()) => {
                println!();
                return Ok(true);
            }
            Err(SessionError::MissingCredential(provider)) => {
                println!(
                    "  {}",
                    t::icon_warn(&format!("An API key is required for {provider}."))
                );
            }
            Err(err) => {
                println!("  {}", t::icon_warn(&err.to_string()));
            }
        }
    }
}

/// Print transcript entries appended since the last call; returns the new
/// watermark.
fn print_new_entries(entries: &[TranscriptEntry], printed: usize) -> usize {
    for entry in &entries[printed..] {
        match entry.role {
            Role::User => println!("{} {}", t::accent("▶"), entry.text),
            Role::Bot => println!("{} {}", t::accent_bright("◀"), entry.text),
            Role::System => println!("  {}", t::info(&entry.text)),
        }
    }
    entries.len()
}

/// Last few characters of a stored key, for the reuse hint.
fn tail(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let start = chars.len().saturating_sub(4);
    chars[start..].iter().collect()
}

// ── Prompt helpers ──────────────────────────────────────────────────────────

/// Read one line; `None` on EOF.
fn prompt_line(reader: &mut impl BufRead, prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut buf = String::new();
    if reader.read_line(&mut buf)? == 0 {
        println!();
        return Ok(None);
    }
    Ok(Some(
        buf.trim_end_matches('\n').trim_end_matches('\r').to_string(),
    ))
}

/// Read a line without echoing it (for API keys); `None` on Ctrl-C.
fn prompt_secret(_reader: &mut impl BufRead, prompt: &str) -> Result<Option<String>> {
    use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

    print!("{prompt}");
    io::stdout().flush()?;

    // Enable raw mode to suppress echo and line buffering.
    terminal::enable_raw_mode()?;

    let result = (|| -> Result<Option<String>> {
        let mut buf = String::new();
        loop {
            if let Event::Key(KeyEvent { code, modifiers, .. }) = event::read()? {
                match code {
                    KeyCode::Enter => break,
                    KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(None);
                    }
                    KeyCode::Backspace => {
                        buf.pop();
                    }
                    KeyCode::Char(c) => {
                        buf.push(c);
                    }
                    _ => {}
                }
            }
        }
        Ok(Some(buf))
    })();

    // Always restore cooked mode, even on error.
    let _ = terminal::disable_raw_mode();
    // Print newline since Enter was consumed without echo.
    println!();

    result
}
