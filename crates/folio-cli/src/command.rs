//! Shell command parsing.
//!
//! One command per line. Indices refer to the rows printed by `ls`.
//! Free text (block content, paths) runs to the end of the line.

use std::path::PathBuf;

use folio_client::InputContext;
use folio_types::TextStyle;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    AddText { style: TextStyle, content: String },
    AddImage {
        url: String,
        width: Option<u32>,
        height: Option<u32>,
    },
    Upload { path: PathBuf },
    Edit { index: usize, content: String },
    Style { index: usize, style: TextStyle },
    Size { index: usize, width: u32, height: u32 },
    Move { from: usize, to: usize },
    DragStart(usize),
    DragOver(usize),
    Drop,
    Cancel,
    Undo,
    Redo,
    /// Caret-notation key chord such as `^z`.
    Chord(String),
    Focus(InputContext),
    Reload,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("not a number: {0}")]
    BadNumber(String),
    #[error("unknown style: {0} (h1, h2, h3, p)")]
    BadStyle(String),
}

/// First word and the rest with leading whitespace removed.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (s, ""),
    }
}

fn parse_number<T: std::str::FromStr>(s: &str) -> Result<T, CommandError> {
    s.parse().map_err(|_| CommandError::BadNumber(s.to_string()))
}

fn parse_style(s: &str) -> Result<TextStyle, CommandError> {
    TextStyle::from_str(s).ok_or_else(|| CommandError::BadStyle(s.to_string()))
}

/// Exactly `N` whitespace-separated numbers.
fn numbers<const N: usize>(args: &str, usage: &'static str) -> Result<[usize; N], CommandError> {
    let words: Vec<&str> = args.split_whitespace().collect();
    if words.len() != N {
        return Err(CommandError::Usage(usage));
    }
    let mut out = [0; N];
    for (slot, word) in out.iter_mut().zip(words) {
        *slot = parse_number(word)?;
    }
    Ok(out)
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CommandError::Empty);
        }
        if line.starts_with('^') {
            return Ok(Command::Chord(line.to_string()));
        }

        let (word, rest) = split_word(line);
        match word {
            "ls" | "list" => Ok(Command::List),
            "add" => parse_add(rest),
            "upload" => {
                if rest.is_empty() {
                    return Err(CommandError::Usage("upload <path>"));
                }
                Ok(Command::Upload {
                    path: PathBuf::from(rest),
                })
            }
            "edit" => {
                let (index, content) = split_word(rest);
                if index.is_empty() {
                    return Err(CommandError::Usage("edit <index> <content>"));
                }
                Ok(Command::Edit {
                    index: parse_number(index)?,
                    content: content.to_string(),
                })
            }
            "style" => {
                let (index, style) = split_word(rest);
                if style.is_empty() {
                    return Err(CommandError::Usage("style <index> <style>"));
                }
                Ok(Command::Style {
                    index: parse_number(index)?,
                    style: parse_style(style)?,
                })
            }
            "size" => match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
                [index, width, height] => Ok(Command::Size {
                    index: parse_number(index)?,
                    width: parse_number(width)?,
                    height: parse_number(height)?,
                }),
                _ => Err(CommandError::Usage("size <index> <w> <h>")),
            },
            "mv" | "move" => {
                let [from, to] = numbers(rest, "mv <from> <to>")?;
                Ok(Command::Move { from, to })
            }
            "drag" => {
                let [index] = numbers(rest, "drag <index>")?;
                Ok(Command::DragStart(index))
            }
            "over" => {
                let [index] = numbers(rest, "over <index>")?;
                Ok(Command::DragOver(index))
            }
            "drop" => Ok(Command::Drop),
            "cancel" => Ok(Command::Cancel),
            "undo" => Ok(Command::Undo),
            "redo" => Ok(Command::Redo),
            "focus" => match rest {
                "doc" | "document" => Ok(Command::Focus(InputContext::Document)),
                "text" | "input" => Ok(Command::Focus(InputContext::TextInput)),
                _ => Err(CommandError::Usage("focus doc|text")),
            },
            "reload" => Ok(Command::Reload),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_add(rest: &str) -> Result<Command, CommandError> {
    let (kind, rest) = split_word(rest);
    match kind {
        "text" => {
            let (style, content) = split_word(rest);
            if style.is_empty() {
                return Err(CommandError::Usage("add text <style> <content>"));
            }
            Ok(Command::AddText {
                style: parse_style(style)?,
                content: content.to_string(),
            })
        }
        "image" => {
            let words: Vec<&str> = rest.split_whitespace().collect();
            match words.as_slice() {
                [url] => Ok(Command::AddImage {
                    url: url.to_string(),
                    width: None,
                    height: None,
                }),
                [url, w, h] => Ok(Command::AddImage {
                    url: url.to_string(),
                    width: Some(parse_number(w)?),
                    height: Some(parse_number(h)?),
                }),
                _ => Err(CommandError::Usage("add image <url> [w h]")),
            }
        }
        _ => Err(CommandError::Usage("add text|image ...")),
    }
}
