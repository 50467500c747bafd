//! Line commands for the interactive session

/// Per-thread verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadVerb {
    Open,
    Click,
    Close,
    Star,
    Archive,
    Trash,
    Restore,
    Hover,
    Leave,
}

/// Parsed command from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    Show,
    Help,
    Quit,
    Undo,
    Flush,
    Thread {
        verb: ThreadVerb,
        column: String,
        index: usize,
    },
    Drag {
        column: String,
        index: usize,
        target: String,
    },
}

/// Help information for a command
#[derive(Debug, Clone)]
pub struct CommandHelp {
    pub name: &'static str,
    pub description: &'static str,
}

/// Parse a command line. Returns `None` for anything unrecognised.
pub fn parse_command(input: &str) -> Option<ParsedCommand> {
    let mut words = input.split_whitespace();
    let head = words.next()?;

    let verb = match head {
        "show" | "ls" => return only(words, ParsedCommand::Show),
        "help" | "h" | "?" => return only(words, ParsedCommand::Help),
        "q" | "quit" => return only(words, ParsedCommand::Quit),
        "u" | "undo" => return only(words, ParsedCommand::Undo),
        "flush" => return only(words, ParsedCommand::Flush),
        "drag" => {
            let column = words.next()?.to_string();
            let index = words.next()?.parse().ok()?;
            let target = words.next()?.to_string();
            return only(
                words,
                ParsedCommand::Drag {
                    column,
                    index,
                    target,
                },
            );
        }
        "open" => ThreadVerb::Open,
        "click" => ThreadVerb::Click,
        "close" => ThreadVerb::Close,
        "star" | "s" => ThreadVerb::Star,
        "archive" | "a" => ThreadVerb::Archive,
        "trash" | "t" => ThreadVerb::Trash,
        "restore" | "r" => ThreadVerb::Restore,
        "hover" => ThreadVerb::Hover,
        "leave" => ThreadVerb::Leave,
        _ => return None,
    };

    let column = words.next()?.to_string();
    let index = words.next()?.parse().ok()?;
    only(
        words,
        ParsedCommand::Thread {
            verb,
            column,
            index,
        },
    )
}

fn only<'a>(mut rest: impl Iterator<Item = &'a str>, command: ParsedCommand) -> Option<ParsedCommand> {
    rest.next().is_none().then_some(command)
}

/// Get all available commands for help display
pub fn available_commands() -> Vec<CommandHelp> {
    vec![
        CommandHelp {
            name: "show",
            description: "Print the board",
        },
        CommandHelp {
            name: "open|click|close <column> <n>",
            description: "Open, toggle or close a thread",
        },
        CommandHelp {
            name: "star <column> <n>",
            description: "Toggle the star on a thread",
        },
        CommandHelp {
            name: "archive|trash|restore <column> <n>",
            description: "Move a thread (undoable)",
        },
        CommandHelp {
            name: "hover|leave <column> <n>",
            description: "Move the pointer onto or off a thread",
        },
        CommandHelp {
            name: "drag <column> <n> <target>",
            description: "Drag a thread onto another column (undoable)",
        },
        CommandHelp {
            name: "undo",
            description: "Undo the pending action",
        },
        CommandHelp {
            name: "flush",
            description: "Commit the pending action now",
        },
        CommandHelp {
            name: "quit",
            description: "Commit pending actions and exit",
        },
    ]
}
