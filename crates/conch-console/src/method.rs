//! Tool-tip descriptions for in-progress call expressions.
//!
//! Signature discovery is pluggable through [`SignatureLookup`]. The
//! [`MethodResolver`] wraps every lookup in a fail-safe boundary: an error
//! or a panic from the lookup becomes an error-styled description instead
//! of reaching the interactive loop.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use conch_types::{CmdDesc, CmdLine, ConchError, Result, StyledLine};

/// Control-flow keywords that never introduce a method call.
pub const DEFAULT_KEYWORDS: &[&str] = &["if", "while", "for"];

/// Finds call signatures for the text typed before an open bracket.
pub trait SignatureLookup {
    fn signatures(&self, line: &CmdLine) -> Result<Vec<String>>;
}

impl<F> SignatureLookup for F
where
    F: Fn(&CmdLine) -> Result<Vec<String>>,
{
    fn signatures(&self, line: &CmdLine) -> Result<Vec<String>> {
        self(line)
    }
}

/// Fixed signatures with a size guard on the analysed source.
///
/// Lines longer than `max_source_len` characters are rejected as too
/// involved to analyse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSignatures {
    pub max_source_len: usize,
    pub signatures: Vec<String>,
}

impl Default for StaticSignatures {
    fn default() -> Self {
        Self {
            max_source_len: 20,
            signatures: vec![
                "method1(int arg1, List<String> arg2)".to_string(),
                "method1(int arg1, Map<String,Object> arg2)".to_string(),
            ],
        }
    }
}

impl SignatureLookup for StaticSignatures {
    fn signatures(&self, line: &CmdLine) -> Result<Vec<String>> {
        if line.line.chars().count() > self.max_source_len {
            return Err(ConchError::Introspection(format!(
                "Failed to create object from source: {}",
                line.line
            )));
        }
        Ok(self.signatures.clone())
    }
}

/// Resolves descriptions for [`DescriptionType::Method`] lines.
///
/// [`DescriptionType::Method`]: conch_types::DescriptionType::Method
pub struct MethodResolver {
    keywords: Vec<String>,
    lookup: Box<dyn SignatureLookup>,
}

impl Default for MethodResolver {
    fn default() -> Self {
        Self::new(StaticSignatures::default())
    }
}

impl fmt::Debug for MethodResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodResolver")
            .field("keywords", &self.keywords)
            .finish_non_exhaustive()
    }
}

impl MethodResolver {
    pub fn new(lookup: impl SignatureLookup + 'static) -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            lookup: Box::new(lookup),
        }
    }

    /// Replace the keyword set.
    pub fn keywords<S: AsRef<str>>(mut self, keywords: &[S]) -> Self {
        self.keywords = keywords.iter().map(|k| k.as_ref().to_string()).collect();
        self
    }

    /// Describe the call being typed.
    ///
    /// Returns `None` when the head ends in a control-flow keyword: there is
    /// no call to describe and the tool-tip stays hidden. Never panics and
    /// never fails; lookup failures are rendered as red lines.
    pub fn describe(&self, line: &CmdLine) -> Option<CmdDesc> {
        if self.ends_with_keyword(&line.head) {
            return None;
        }
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.lookup.signatures(line)));
        let main = match outcome {
            Ok(Ok(signatures)) => signatures.into_iter().map(StyledLine::plain).collect(),
            Ok(Err(e)) => error_lines(&e.to_string()),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::warn!("signature lookup panicked: {message}");
                error_lines(&message)
            },
        };
        Some(CmdDesc::from_main(main))
    }

    /// True if `head` ends with a keyword as a whole word, ignoring trailing
    /// whitespace.
    fn ends_with_keyword(&self, head: &str) -> bool {
        let trimmed = head.trim_end();
        self.keywords.iter().any(|kw| {
            trimmed.strip_suffix(kw.as_str()).is_some_and(|before| {
                !before
                    .chars()
                    .next_back()
                    .is_some_and(|c| c.is_alphanumeric() || c == '_')
            })
        })
    }
}

fn error_lines(message: &str) -> Vec<StyledLine> {
    message.split('\n').map(StyledLine::error).collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "signature lookup panicked".to_string()
    }
}
