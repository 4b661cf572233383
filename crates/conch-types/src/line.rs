//! Line context produced by a [`LineParser`].
//!
//! Parsers are external collaborators: the console core consumes these
//! types but never tokenizes input itself.

use crate::error::Result;

/// A tokenized line with the cursor's word position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLine {
    /// Raw text.
    pub line: String,
    /// Cursor offset in bytes.
    pub cursor: usize,
    /// Words in order. A trailing separator yields a trailing empty word.
    pub words: Vec<String>,
    /// Index of the word under the cursor.
    pub word_index: usize,
}

impl ParsedLine {
    /// Build a parsed line whose cursor sits at the end of the last word.
    pub fn from_words(words: &[&str]) -> Self {
        let words: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        let line = words.join(" ");
        Self {
            cursor: line.len(),
            line,
            word_index: words.len().saturating_sub(1),
            words,
        }
    }

    /// The (possibly partial) word under the cursor.
    pub fn word(&self) -> &str {
        self.words
            .get(self.word_index)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// The first word, if any.
    pub fn head(&self) -> Option<&str> {
        self.words.first().map(String::as_str)
    }

    /// Arguments after the head word.
    pub fn args(&self) -> &[String] {
        self.words.get(1..).unwrap_or(&[])
    }

    /// A one-word line with the cursor at its end.
    ///
    /// Used to ask a sub-completer about an earlier word in isolation.
    pub fn single_word(word: &str) -> Self {
        Self {
            line: word.to_string(),
            cursor: word.len(),
            words: vec![word.to_string()],
            word_index: 0,
        }
    }
}

/// How the tool-tip should treat the text typed so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptionType {
    /// Input starts with a command word.
    Command,
    /// Input ends inside an open call expression, e.g. `obj.method(`.
    Method,
    /// Input is malformed (e.g. an unmatched closing bracket).
    Syntax,
}

/// Context handed to the description resolver on every edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdLine {
    /// Text typed so far (up to the cursor).
    pub line: String,
    /// For [`DescriptionType::Method`]: the text before the open bracket.
    /// Otherwise the whole line.
    pub head: String,
    /// Text after the open bracket, empty for other kinds.
    pub tail: String,
    /// Words parsed so far.
    pub args: Vec<String>,
    pub kind: DescriptionType,
}

impl CmdLine {
    /// A command-kind line with the given words.
    pub fn command(line: &str, args: Vec<String>) -> Self {
        Self {
            line: line.to_string(),
            head: line.to_string(),
            tail: String::new(),
            args,
            kind: DescriptionType::Command,
        }
    }
}

/// Line parser collaborator.
pub trait LineParser {
    /// Parse a submitted line. Fails on malformed or unfinished input.
    fn parse(&self, line: &str) -> Result<ParsedLine>;

    /// Parse text that is still being edited. Never fails: an unfinished
    /// quote simply becomes the current word.
    fn parse_partial(&self, line: &str) -> ParsedLine;

    /// Resolve the head word to the command name it invokes.
    fn command_name(&self, word: &str) -> String;

    /// Classify the text typed so far for the tool-tip.
    fn cmd_line(&self, line: &str) -> CmdLine;
}
