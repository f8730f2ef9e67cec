pub mod chat_view;
pub mod login;
pub mod main_window;
pub mod sidebar;

use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::error::{ClientError, Result};

/// Line-oriented terminal input shared by every view.
pub struct Console {
    lines: Lines<BufReader<Stdin>>,
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// `None` at end of input. Cancel-safe, so it can sit in a `select!`.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.next_line().await?)
    }

    /// Prints `label` and waits for an answer; end of input is an
    /// `UnexpectedEof` I/O error.
    pub async fn ask(&mut self, label: &str) -> Result<String> {
        print_prompt(label);
        match self.next_line().await? {
            Some(line) => Ok(line),
            None => Err(ClientError::Io(std::io::ErrorKind::UnexpectedEof.into())),
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

pub fn print_prompt(label: &str) {
    print!("{}", label);
    let _ = std::io::stdout().flush();
}

pub fn is_eof(err: &ClientError) -> bool {
    matches!(err, ClientError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
}
