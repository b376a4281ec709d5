//! Zenv REPL
//!
//! Interactive shell that transpiles dialect lines as they are typed. The
//! session persists across lines, so an open `/*` keeps commenting until it
//! is closed.

use std::io::{self, BufRead, Write};

use crate::{
    engine::{Engine, Transpiler},
    errors::{print_error, ZenvError},
};

const SOURCE_NAME: &str = "<repl>";

/// REPL state that persists across lines
pub struct ReplState<'e> {
    engine: &'e Engine,
    session: Transpiler<'e>,
}

impl<'e> ReplState<'e> {
    pub fn new(engine: &'e Engine) -> Self {
        Self {
            engine,
            session: engine.session_named(SOURCE_NAME),
        }
    }

    /// Transpiles one line in the persistent session.
    pub fn eval_line(&mut self, input: &str) -> Result<String, ZenvError> {
        self.session.feed_line(input)
    }

    /// Everything transpiled since the last clear.
    pub fn transcript(&self) -> String {
        self.session.output()
    }

    pub fn clear(&mut self) {
        self.session = self.engine.session_named(SOURCE_NAME);
    }
}

/// Main REPL entry point
pub fn run_repl(engine: &Engine) -> io::Result<()> {
    println!("Zenv REPL v{}", crate::VERSION);
    println!("Type :help for help, :quit to exit, :clear to reset the session");
    println!();

    let mut state = ReplState::new(engine);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("zenv> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!("\nGoodbye!");
            return Ok(());
        }
        let line = line.trim_end();

        if line.trim_start().starts_with(':') || line.trim() == "exit" {
            match handle_repl_command(line.trim(), &mut state) {
                ReplCommand::Continue => continue,
                ReplCommand::Quit => return Ok(()),
            }
        }

        match state.eval_line(line) {
            Ok(target) => println!("{target}"),
            Err(e) => print_error(e),
        }
    }
}

/// REPL command results
enum ReplCommand {
    Continue,
    Quit,
}

/// Handle special REPL commands that start with ':'
fn handle_repl_command(command: &str, state: &mut ReplState<'_>) -> ReplCommand {
    match command.to_ascii_lowercase().as_str() {
        ":help" | ":h" => {
            println!("Zenv REPL Commands:");
            println!("  :help, :h     Show this help");
            println!("  :show, :s     Print the Python produced so far");
            println!("  :clear, :c    Start a fresh session");
            println!("  :quit, :q     Exit the REPL");
            println!();
            println!("Each line is transpiled as soon as it is entered.");
            ReplCommand::Continue
        }
        ":show" | ":s" => {
            print!("{}", state.transcript());
            ReplCommand::Continue
        }
        ":clear" | ":c" => {
            state.clear();
            println!("Session cleared.");
            ReplCommand::Continue
        }
        ":quit" | ":q" | "exit" => {
            println!("Goodbye!");
            ReplCommand::Quit
        }
        _ => {
            println!(
                "Unknown command: {}. Type :help for available commands.",
                command
            );
            ReplCommand::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_persists_between_lines() {
        let engine = Engine::new();
        let mut state = ReplState::new(&engine);
        assert_eq!(state.eval_line("/* notes").unwrap(), "# notes");
        assert_eq!(state.eval_line("x ==> 1").unwrap(), "# x ==> 1");
        assert_eq!(state.eval_line("*/").unwrap(), "#");
        assert_eq!(state.eval_line("x ==> 1").unwrap(), "x = 1");
        assert_eq!(state.transcript(), "# notes\n# x ==> 1\n#\nx = 1\n");
    }

    #[test]
    fn test_error_does_not_end_session() {
        let engine = Engine::new();
        let mut state = ReplState::new(&engine);
        let err = state.eval_line("42lol ==> 1").unwrap_err();
        assert_eq!(err.line(), Some(1));
        assert_eq!(state.eval_line("y ==> true").unwrap(), "y = True");
    }

    #[test]
    fn test_rejected_line_leaves_comment_mode_alone() {
        let engine = Engine::new();
        let mut state = ReplState::new(&engine);
        assert!(state.eval_line("x ==> /* c").is_err());
        assert_eq!(state.eval_line("y ==> 2").unwrap(), "y = 2");
    }

    #[test]
    fn test_clear_resets_block_comment() {
        let engine = Engine::new();
        let mut state = ReplState::new(&engine);
        state.eval_line("/*").unwrap();
        state.clear();
        assert_eq!(state.eval_line("x ==> 2").unwrap(), "x = 2");
        assert_eq!(state.transcript(), "x = 2\n");
    }
}
