//! Composer command parsing.
//!
//! Anything not starting with `/` is a chat message.
//!
//! | Input | Command |
//! |---|---|
//! | `/image <path>` | [`Command::Image`] |
//! | `/view [n]` | [`Command::View`] |
//! | `/quit` | [`Command::Quit`] |

use std::path::PathBuf;

/// Parsed composer line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain chat message
    Message {
        /// Text as typed
        text: String,
    },
    /// Send a file as an attachment
    Image {
        /// File to read
        path: PathBuf,
    },
    /// Open the attachment viewer
    View {
        /// 1-based attachment number; latest if `None`
        index: Option<usize>,
    },
    /// Leave
    Quit,
    /// Unrecognized `/command`
    Unknown {
        /// Command name without the slash
        input: String,
    },
    /// Recognized command with bad arguments
    InvalidArgs {
        /// Command name without the slash
        command: &'static str,
        /// What was wrong
        error: String,
    },
}

/// Parse a composer line.
pub fn parse(line: &str) -> Command {
    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return Command::Message { text: line.to_string() };
    };

    let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let args = args.trim();

    match name {
        "image" | "img" => {
            if args.is_empty() {
                Command::InvalidArgs { command: "image", error: "usage: /image <path>".into() }
            } else {
                Command::Image { path: PathBuf::from(args) }
            }
        },
        "view" => {
            if args.is_empty() {
                return Command::View { index: None };
            }
            match args.parse::<usize>() {
                Ok(n) if n > 0 => Command::View { index: Some(n) },
                _ => Command::InvalidArgs {
                    command: "view",
                    error: format!("expected a positive number, got {args:?}"),
                },
            }
        },
        "quit" | "q" => Command::Quit,
        other => Command::Unknown { input: other.to_string() },
    }
}
