//! Terminal output for the text2sql-server CLI.
//!
//! Every line is built by a `format_*` function and printed by the matching
//! method, so the plain (uncolored) rendering can be checked in tests. Status
//! lines go to stdout except errors, which go to stderr. Answers are printed
//! unindented so that `text2sql-server ask ... | other-tool` works.

use crate::agents::orchestrator::{Subtask, SubtaskResult};
use owo_colors::OwoColorize;

/// Leading mark of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Ok,
    Note,
    Warn,
    Fail,
    Wrote,
    Kept,
}

impl Mark {
    fn plain(self) -> &'static str {
        match self {
            Mark::Ok => "ok:",
            Mark::Note => "note:",
            Mark::Warn => "warning:",
            Mark::Fail => "error:",
            Mark::Wrote => "wrote",
            Mark::Kept => "kept",
        }
    }

    fn glyph(self) -> String {
        match self {
            Mark::Ok | Mark::Wrote => "✓".green().bold().to_string(),
            Mark::Note => "•".blue().to_string(),
            Mark::Warn => "!".yellow().bold().to_string(),
            Mark::Fail => "✗".red().bold().to_string(),
            Mark::Kept => "○".yellow().to_string(),
        }
    }
}

/// Terminal writer, colored unless built with [`Output::no_color`].
pub struct Output {
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    fn format_status(&self, mark: Mark, message: &str) -> String {
        if self.colored {
            let message = match mark {
                Mark::Ok => message.green().to_string(),
                Mark::Warn => message.yellow().to_string(),
                Mark::Fail => message.red().to_string(),
                _ => message.to_string(),
            };
            format!("  {} {}", mark.glyph(), message)
        } else {
            format!("  {} {}", mark.plain(), message)
        }
    }

    pub fn banner(&self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        if self.colored {
            println!(
                "\n   {} {}\n",
                "text2sql-server".bright_cyan().bold(),
                version.dimmed()
            );
        } else {
            println!("\n   text2sql-server {}\n", version);
        }
    }

    pub fn success(&self, message: &str) {
        println!("{}", self.format_status(Mark::Ok, message));
    }

    pub fn info(&self, message: &str) {
        println!("{}", self.format_status(Mark::Note, message));
    }

    pub fn warning(&self, message: &str) {
        println!("{}", self.format_status(Mark::Warn, message));
    }

    pub fn error(&self, message: &str) {
        eprintln!("{}", self.format_status(Mark::Fail, message));
    }

    fn format_file(&self, mark: Mark, path: &str, detail: &str) -> String {
        if self.colored {
            format!("  {} {} {}", mark.glyph(), path.bright_white(), detail.dimmed())
        } else {
            format!("  {} {} {}", mark.plain(), path, detail)
        }
    }

    /// A file `init` wrote, with what it holds.
    pub fn wrote(&self, path: &str, what: &str) {
        println!("{}", self.format_file(Mark::Wrote, path, &format!("({})", what)));
    }

    /// A file `init` left alone, with the reason.
    pub fn kept(&self, path: &str, reason: &str) {
        println!("{}", self.format_file(Mark::Kept, path, &format!("({})", reason)));
    }

    fn format_header(&self, title: &str) -> String {
        if self.colored {
            format!("\n  {}", title.bright_white().bold().underline())
        } else {
            format!("\n  {}\n  {}", title, "-".repeat(title.chars().count()))
        }
    }

    pub fn header(&self, title: &str) {
        println!("{}", self.format_header(title));
    }

    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {:<12} {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {:<12} {}", key, value);
        }
    }

    fn format_plan_step(&self, subtask: &Subtask) -> String {
        if self.colored {
            format!(
                "    {} {} {}",
                subtask.id.dimmed(),
                format!("[{}]", subtask.assigned_agent).cyan(),
                subtask.description
            )
        } else {
            format!(
                "    {} [{}] {}",
                subtask.id, subtask.assigned_agent, subtask.description
            )
        }
    }

    /// One planned subtask for `ask --show-plan`.
    pub fn plan_step(&self, subtask: &Subtask) {
        println!("{}", self.format_plan_step(subtask));
    }

    fn format_subtask_result(&self, result: &SubtaskResult) -> String {
        let (mark, detail) = if result.is_completed() {
            (Mark::Ok, result.result.as_deref().unwrap_or_default())
        } else {
            (Mark::Fail, result.error.as_deref().unwrap_or_default())
        };
        let message = format!("{} ({}) {}", result.subtask_id, result.agent, detail);

        if self.colored {
            format!("    {} {}", mark.glyph(), message)
        } else {
            format!("    {} {}", mark.plain(), message)
        }
    }

    /// Outcome of one executed subtask for `ask --show-plan`.
    pub fn subtask_result(&self, result: &SubtaskResult) {
        println!("{}", self.format_subtask_result(result));
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.dimmed().italic());
        } else {
            println!("\n  hint: {}", message);
        }
    }

    /// A shell command the user can copy.
    pub fn command(&self, cmd: &str) {
        if self.colored {
            println!("     {}", format!("$ {}", cmd).bright_cyan());
        } else {
            println!("     $ {}", cmd);
        }
    }

    pub fn answer(&self, text: &str) {
        if self.colored {
            println!("{}", text.bright_white());
        } else {
            println!("{}", text);
        }
    }
}
