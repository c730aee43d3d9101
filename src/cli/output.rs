use colored::Colorize;
use std::fmt;

/// Message categories used by the console output helpers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
    Prompt,
    Section,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutputPreferences {
    /// No colors or bold; used for scripts and piped output.
    pub plain: bool,
}

fn build_label(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Info | MessageKind::Section => "",
        MessageKind::Success => "[ok]",
        MessageKind::Warning => "[!]",
        MessageKind::Error => "[x]",
        MessageKind::Prompt => ">",
    }
}

/// Formats one console line for `kind`.
pub fn style(kind: MessageKind, message: impl fmt::Display, prefs: OutputPreferences) -> String {
    let text = message.to_string();
    let base = match kind {
        MessageKind::Section => format!("=== {} ===", text.trim()),
        _ => {
            let label = build_label(kind);
            if label.is_empty() {
                text
            } else {
                format!("{label} {text}")
            }
        }
    };

    if prefs.plain {
        return base;
    }

    match kind {
        MessageKind::Success => base.bright_green().to_string(),
        MessageKind::Warning => base.bright_yellow().to_string(),
        MessageKind::Error => base.bright_red().to_string(),
        MessageKind::Prompt => base.bright_cyan().to_string(),
        MessageKind::Section => base.bold().to_string(),
        MessageKind::Info => base,
    }
}

pub fn print(kind: MessageKind, message: impl fmt::Display, prefs: OutputPreferences) {
    let formatted = style(kind, message, prefs);
    match kind {
        MessageKind::Section => println!("\n{}", formatted),
        _ => println!("{}", formatted),
    }
}

pub fn info(message: impl fmt::Display, prefs: OutputPreferences) {
    print(MessageKind::Info, message, prefs);
}

pub fn warning(message: impl fmt::Display, prefs: OutputPreferences) {
    print(MessageKind::Warning, message, prefs);
}

pub fn error(message: impl fmt::Display, prefs: OutputPreferences) {
    print(MessageKind::Error, message, prefs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_output_keeps_labels_only() {
        let prefs = OutputPreferences { plain: true };
        assert_eq!(style(MessageKind::Warning, "careful", prefs), "[!] careful");
        assert_eq!(style(MessageKind::Section, " Stats ", prefs), "=== Stats ===");
        assert_eq!(style(MessageKind::Info, "hello", prefs), "hello");
    }
}
