//! Interactive command-line input loop.
//!
//! Reads lines from stdin and sends each one to the multicast group as a
//! chat message. The loop ends on the exit command or on end-of-input
//! (Ctrl-D / closed pipe). It runs on its own blocking thread; `main`
//! spawns it and waits for it to finish.

use std::io::{self, BufRead};

use lanchat_core::ChatMessage;
use tracing::error;

use crate::network::MulticastTransport;

/// Typing this (case-insensitive, surrounding whitespace ignored) ends the
/// session.
pub const EXIT_COMMAND: &str = "/exit";

/// Returns `true` if a typed line is the exit command.
pub fn is_exit_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(EXIT_COMMAND)
}

/// Runs the blocking input loop until the exit command or end-of-input.
///
/// Every other line — including an empty one — becomes a `Chat` message
/// from `username`. Send failures are logged and the loop continues; a
/// flaky network should not end the session.
pub fn run_input_loop(username: &str, transport: &MulticastTransport) {
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // end of input
            Ok(_) => {
                if is_exit_command(&line) {
                    break;
                }

                let text = line.trim_end_matches(['\r', '\n']);
                if let Err(e) = transport.send(&ChatMessage::chat(username, text)) {
                    error!("failed to send message: {e}");
                }
            }
            Err(e) => {
                error!("stdin read error: {e}");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_command_matches_exactly() {
        assert!(is_exit_command("/exit"));
    }

    #[test]
    fn test_exit_command_is_case_insensitive() {
        assert!(is_exit_command("/EXIT"));
        assert!(is_exit_command("/Exit"));
    }

    #[test]
    fn test_exit_command_ignores_surrounding_whitespace() {
        assert!(is_exit_command("  /exit  \n"));
    }

    #[test]
    fn test_ordinary_lines_are_not_exit_commands() {
        assert!(!is_exit_command("hello"));
        assert!(!is_exit_command("/exit now"));
        assert!(!is_exit_command(""));
    }
}
