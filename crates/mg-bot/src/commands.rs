//! Message-text parsing into typed commands.
//!
//! Telegram delivers commands as plain text (`/chat hello`, possibly as
//! `/chat@botname hello` in groups). Arguments for the add commands are
//! split with `shell-words` so quoted descriptions survive as one field.

/// A parsed incoming message.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Help,
    /// Forward text to the model (`/chat`, `/ask`, `/predict`).
    Chat { text: String },
    Info,
    Models,
    /// Load a different model (privileged).
    Switch { identifier: String },
    /// Look up a saved URL by name.
    Url { name: String },
    /// Look up a saved contract by name.
    Contract { name: String },
    AddUrl {
        name: String,
        url: String,
        description: Option<String>,
    },
    AddContract {
        name: String,
        address: String,
        network: Option<String>,
        description: Option<String>,
    },
    /// A `/command` we do not know.
    Unknown { command: String },
    /// Free text without a leading slash.
    Plain { text: String },
    /// A command addressed to a different bot; produce no reply.
    Ignored,
}

/// Parse one message. `bot_username` is this bot's own username (from
/// `getMe`) used to recognize `/cmd@botname` forms.
pub fn parse(text: &str, bot_username: Option<&str>) -> Command {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return Command::Plain {
            text: trimmed.to_string(),
        };
    }

    let (head, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (trimmed, ""),
    };

    let (command, mention) = match head.split_once('@') {
        Some((command, mention)) => (command, Some(mention)),
        None => (head, None),
    };
    if let Some(mention) = mention
        && !bot_username.is_some_and(|own| own.eq_ignore_ascii_case(mention))
    {
        return Command::Ignored;
    }

    match command.to_lowercase().as_str() {
        "/start" => Command::Start,
        "/help" => Command::Help,
        "/chat" | "/ask" | "/predict" => Command::Chat {
            text: rest.to_string(),
        },
        "/info" => Command::Info,
        "/models" => Command::Models,
        "/switch" => Command::Switch {
            identifier: rest.split_whitespace().next().unwrap_or("").to_string(),
        },
        "/url" => Command::Url {
            name: rest.to_string(),
        },
        "/contract" => Command::Contract {
            name: rest.to_string(),
        },
        "/add_url" => parse_add_url(rest),
        "/add_contract" => parse_add_contract(rest),
        other => Command::Unknown {
            command: other.to_string(),
        },
    }
}

/// `/add_url <name> <url> [description..]`. Missing fields come back
/// empty; the dispatcher renders usage help for those.
fn parse_add_url(args: &str) -> Command {
    let parts = shell_words::split(args).unwrap_or_default();
    let name = parts.first().cloned().unwrap_or_default();
    let url = parts.get(1).cloned().unwrap_or_default();
    let description = (parts.len() > 2).then(|| parts[2..].join(" "));
    Command::AddUrl {
        name,
        url,
        description,
    }
}

/// `/add_contract <name> <address> [network] [description..]`.
fn parse_add_contract(args: &str) -> Command {
    let parts = shell_words::split(args).unwrap_or_default();
    let name = parts.first().cloned().unwrap_or_default();
    let address = parts.get(1).cloned().unwrap_or_default();
    let network = parts.get(2).cloned();
    let description = (parts.len() > 3).then(|| parts[3..].join(" "));
    Command::AddContract {
        name,
        address,
        network,
        description,
    }
}
