use std::io::{self, Write};

use colored::Colorize;

/// Narrow prompt/display surface for every interactive flow. The import
/// pipeline only ever talks to a `Console`, so it can be driven by a scripted
/// implementation in tests instead of a terminal.
pub trait Console {
    fn message(&mut self, text: &str);
    fn warn(&mut self, text: &str);
    fn error(&mut self, text: &str);
    fn menu_item(&mut self, index: usize, text: &str);
    fn prompt(&mut self, text: &str) -> String;
}

/// Blocking stdin/stdout console.
pub struct StdConsole;

impl Console for StdConsole {
    fn message(&mut self, text: &str) {
        println!("{text}");
    }

    fn warn(&mut self, text: &str) {
        println!("{}", format!("Warning: {text}").yellow());
    }

    fn error(&mut self, text: &str) {
        eprintln!("{}", format!("Error: {text}").red());
    }

    fn menu_item(&mut self, index: usize, text: &str) {
        println!("{index}. {text}");
    }

    fn prompt(&mut self, text: &str) -> String {
        print!("{text}");
        let _ = io::stdout().flush();
        let mut line = String::new();
        if io::stdin().read_line(&mut line).is_err() {
            return String::new();
        }
        line.trim().to_string()
    }
}
