//! Completion building blocks.
//!
//! Completers only produce candidates. Matching candidates against the
//! partially typed word is left to the line editor.

use std::fmt;
use std::sync::Arc;

use conch_types::ParsedLine;

/// A single completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Text inserted into the line.
    pub value: String,
    /// Text shown in the candidate list.
    pub display: String,
    /// Optional one-line description shown beside the candidate.
    pub description: Option<String>,
}

impl Candidate {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            display: value.clone(),
            value,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Produces completion candidates for a parsed line.
pub trait Completer: Send + Sync {
    fn complete(&self, line: &ParsedLine, candidates: &mut Vec<Candidate>);
}

/// Candidates produced by `completer` for `line`, in order.
pub fn candidates_for(completer: &dyn Completer, line: &ParsedLine) -> Vec<Candidate> {
    let mut out = Vec::new();
    completer.complete(line, &mut out);
    out
}

/// Completes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCompleter;

impl Completer for NullCompleter {
    fn complete(&self, _line: &ParsedLine, _candidates: &mut Vec<Candidate>) {}
}

/// Shared [`NullCompleter`] for completer factories.
pub fn null() -> Arc<dyn Completer> {
    Arc::new(NullCompleter)
}

type Supplier = Arc<dyn Fn() -> Vec<String> + Send + Sync>;

/// Completes a fixed word list, or a list computed on each request.
#[derive(Clone)]
pub struct StringsCompleter {
    source: StringsSource,
}

#[derive(Clone)]
enum StringsSource {
    Fixed(Vec<Candidate>),
    Supplier(Supplier),
}

impl StringsCompleter {
    pub fn new<S: AsRef<str>>(words: &[S]) -> Self {
        Self {
            source: StringsSource::Fixed(
                words.iter().map(|w| Candidate::new(w.as_ref())).collect(),
            ),
        }
    }

    /// Complete prepared candidates (with descriptions, display text, ...).
    pub fn from_candidates(candidates: Vec<Candidate>) -> Self {
        Self {
            source: StringsSource::Fixed(candidates),
        }
    }

    /// Compute the word list on every completion request.
    pub fn from_supplier(supplier: impl Fn() -> Vec<String> + Send + Sync + 'static) -> Self {
        Self {
            source: StringsSource::Supplier(Arc::new(supplier)),
        }
    }
}

impl fmt::Debug for StringsCompleter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            StringsSource::Fixed(c) => f.debug_tuple("StringsCompleter").field(c).finish(),
            StringsSource::Supplier(_) => f.write_str("StringsCompleter(<supplier>)"),
        }
    }
}

impl Completer for StringsCompleter {
    fn complete(&self, _line: &ParsedLine, candidates: &mut Vec<Candidate>) {
        match &self.source {
            StringsSource::Fixed(fixed) => candidates.extend(fixed.iter().cloned()),
            StringsSource::Supplier(supplier) => {
                candidates.extend(supplier().into_iter().map(Candidate::new));
            },
        }
    }
}

/// Positional completer: the word at index `i` is completed by the `i`-th
/// completer, words past the end by the last one.
///
/// Every earlier word must be one of its completer's candidates, so
/// alternative argument shapes can be expressed as several argument
/// completers side by side. The command word (index 0) is exempt: the name
/// dispatcher has already matched it.
#[derive(Clone)]
pub struct ArgumentCompleter {
    completers: Vec<Arc<dyn Completer>>,
}

impl ArgumentCompleter {
    pub fn new(completers: Vec<Arc<dyn Completer>>) -> Self {
        Self { completers }
    }

    fn completer_at(&self, index: usize) -> &Arc<dyn Completer> {
        let idx = index.min(self.completers.len() - 1);
        &self.completers[idx]
    }

    fn previous_words_match(&self, line: &ParsedLine) -> bool {
        for i in 1..line.word_index {
            let word = line.words.get(i).map(String::as_str).unwrap_or("");
            let sub = candidates_for(
                self.completer_at(i).as_ref(),
                &ParsedLine::single_word(word),
            );
            if !sub.iter().any(|c| c.value == word) {
                return false;
            }
        }
        true
    }
}

impl Completer for ArgumentCompleter {
    fn complete(&self, line: &ParsedLine, candidates: &mut Vec<Candidate>) {
        if self.completers.is_empty() {
            return;
        }
        if !self.previous_words_match(line) {
            return;
        }
        self.completer_at(line.word_index).complete(line, candidates);
    }
}

/// One level of a [`TreeCompleter`].
#[derive(Debug, Clone)]
pub struct Node {
    value: String,
    children: Vec<Node>,
}

impl Node {
    pub fn leaf(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            children: Vec::new(),
        }
    }

    pub fn branch(value: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            value: value.into(),
            children,
        }
    }

    /// Several sibling leaves.
    pub fn leaves(values: &[&str]) -> Vec<Node> {
        values.iter().map(|v| Node::leaf(*v)).collect()
    }
}

/// Completes by walking a tree of words from the start of the line.
#[derive(Debug, Clone)]
pub struct TreeCompleter {
    roots: Vec<Node>,
}

impl TreeCompleter {
    pub fn new(roots: Vec<Node>) -> Self {
        Self { roots }
    }
}

impl Completer for TreeCompleter {
    fn complete(&self, line: &ParsedLine, candidates: &mut Vec<Candidate>) {
        let mut level = &self.roots;
        for word in line.words.iter().take(line.word_index) {
            match level.iter().find(|n| n.value == *word) {
                Some(node) => level = &node.children,
                None => return,
            }
        }
        candidates.extend(level.iter().map(|n| Candidate::new(&n.value)));
    }
}

/// Adapts a closure into a [`Completer`].
pub struct FnCompleter<F>(pub F);

impl<F> Completer for FnCompleter<F>
where
    F: Fn(&ParsedLine, &mut Vec<Candidate>) + Send + Sync,
{
    fn complete(&self, line: &ParsedLine, candidates: &mut Vec<Candidate>) {
        (self.0)(line, candidates)
    }
}

/// Union of several completers, in order.
#[derive(Clone, Default)]
pub struct AggregateCompleter {
    completers: Vec<Arc<dyn Completer>>,
}

impl AggregateCompleter {
    pub fn new(completers: Vec<Arc<dyn Completer>>) -> Self {
        Self { completers }
    }

    pub fn push(&mut self, completer: Arc<dyn Completer>) {
        self.completers.push(completer);
    }

    pub fn len(&self) -> usize {
        self.completers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completers.is_empty()
    }
}

impl Completer for AggregateCompleter {
    fn complete(&self, line: &ParsedLine, candidates: &mut Vec<Candidate>) {
        for completer in &self.completers {
            completer.complete(line, candidates);
        }
    }
}
