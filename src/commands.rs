//! Slash commands available inside the chat console.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    None,
    /// Leave the chat and return to provider configuration
    ChangeModel,
    Quit,
}

#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub messages: Vec<String>,
    pub action: CommandAction,
}

pub fn handle_command(input: &str) -> CommandResponse {
    // Strip the leading '/' if present
    let trimmed = input.trim().trim_start_matches('/');
    if trimmed.is_empty() {
        return CommandResponse {
            messages: Vec::new(),
            action: CommandAction::None,
        };
    }

    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    match parts[0] {
        "help" => CommandResponse {
            messages: vec![
                "Available commands:".to_string(),
                "  /help   - Show this help".to_string(),
                "  /model  - Change the model provider (clears the conversation)".to_string(),
                "  /quit   - Quit".to_string(),
            ],
            action: CommandAction::None,
        },
        "model" => CommandResponse {
            messages: vec!["Returning to model selection…".to_string()],
            action: CommandAction::ChangeModel,
        },
        "q" | "quit" | "exit" => CommandResponse {
            messages: Vec::new(),
            action: CommandAction::Quit,
        },
        _ => CommandResponse {
            messages: vec![
                format!("Unknown command: /{}", parts[0]),
                "Type /help for available commands".to_string(),
            ],
            action: CommandAction::None,
        },
    }
}
