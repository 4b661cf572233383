//! Name-dispatching completer and the completion compiler.
//!
//! Aliases are resolved when the completer is compiled, not when it is
//! consulted: after any alias change the completer must be rebuilt with
//! [`compile_completers`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use conch_types::ParsedLine;

use crate::completer::{AggregateCompleter, Candidate, Completer};
use crate::registry::Registry;

/// Completes command names at word 0 and dispatches later words to the
/// completers registered for the head word.
#[derive(Clone, Default)]
pub struct SystemCompleter {
    completers: BTreeMap<String, Vec<Arc<dyn Completer>>>,
    aliases: BTreeMap<String, String>,
    compiled: bool,
}

impl SystemCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach completers to `command`, after any already attached.
    pub fn add(&mut self, command: &str, completers: Vec<Arc<dyn Completer>>) {
        self.completers
            .entry(command.to_string())
            .or_default()
            .extend(completers);
        self.compiled = false;
    }

    /// Record aliases to route to their targets at compile time.
    pub fn add_aliases(&mut self, aliases: &BTreeMap<String, String>) {
        for (alias, target) in aliases {
            self.aliases.insert(alias.clone(), target.clone());
        }
        self.compiled = false;
    }

    /// Route every alias to its target's completers.
    ///
    /// A token that already has completers keeps them. An alias whose target
    /// is unknown is dropped.
    pub fn compile(mut self) -> Self {
        let aliases = std::mem::take(&mut self.aliases);
        for (alias, target) in &aliases {
            if self.completers.contains_key(alias) {
                log::debug!("alias '{alias}' shadowed by an existing command");
                continue;
            }
            match self.completers.get(target).cloned() {
                Some(branch) => {
                    self.completers.insert(alias.clone(), branch);
                },
                None => log::debug!("alias '{alias}' points at unknown command '{target}'"),
            }
        }
        self.compiled = true;
        self
    }

    /// Merge a compiled completer; tokens already present win.
    pub fn merge_first_wins(&mut self, other: SystemCompleter) {
        for (token, completers) in other.completers {
            self.completers.entry(token).or_insert(completers);
        }
        for (alias, target) in other.aliases {
            self.aliases.entry(alias).or_insert(target);
        }
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Tokens that complete at word 0 (commands and resolved aliases).
    pub fn names(&self) -> Vec<&str> {
        self.completers.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.completers.contains_key(token)
    }
}

impl fmt::Debug for SystemCompleter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemCompleter")
            .field("names", &self.names())
            .field("aliases", &self.aliases)
            .field("compiled", &self.compiled)
            .finish()
    }
}

impl Completer for SystemCompleter {
    fn complete(&self, line: &ParsedLine, candidates: &mut Vec<Candidate>) {
        if line.word_index == 0 {
            candidates.extend(self.completers.keys().map(Candidate::new));
            return;
        }
        let Some(head) = line.head() else {
            return;
        };
        if let Some(branch) = self.completers.get(head) {
            for completer in branch {
                completer.complete(line, candidates);
            }
        }
    }
}

/// Build the final completer for a set of registries.
///
/// Each registry's completers are compiled on their own (so its aliases
/// route within that registry), then merged in order with the first
/// registry claiming a token winning, matching dispatch precedence. The
/// result is combined with `external`: registry candidates first, then the
/// external ones.
pub fn compile_completers<'a>(
    registries: impl IntoIterator<Item = &'a dyn Registry>,
    external: Option<Arc<dyn Completer>>,
) -> AggregateCompleter {
    let mut merged = SystemCompleter::new();
    for registry in registries {
        let compiled = registry.compile_completers().compile();
        log::debug!(
            "compiled {} completer branches for {}",
            compiled.names().len(),
            registry.name()
        );
        merged.merge_first_wins(compiled);
    }
    let merged = merged.compile();
    let mut out = AggregateCompleter::new(vec![Arc::new(merged)]);
    if let Some(external) = external {
        out.push(external);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completer::{ArgumentCompleter, NullCompleter, StringsCompleter, candidates_for, null};

    fn values(c: &dyn Completer, words: &[&str]) -> Vec<String> {
        candidates_for(c, &ParsedLine::from_words(words))
            .into_iter()
            .map(|c| c.value)
            .collect()
    }

    fn tput_branch() -> Vec<Arc<dyn Completer>> {
        vec![Arc::new(ArgumentCompleter::new(vec![
            null(),
            Arc::new(StringsCompleter::new(&["clear", "bel"])),
        ]))]
    }

    #[test]
    fn word_zero_lists_names() {
        let mut sys = SystemCompleter::new();
        sys.add("tput", tput_branch());
        sys.add("clear", vec![null()]);
        let sys = sys.compile();
        assert_eq!(values(&sys, &["t"]), vec!["clear", "tput"]);
    }

    #[test]
    fn dispatches_on_head_word() {
        let mut sys = SystemCompleter::new();
        sys.add("tput", tput_branch());
        sys.add("clear", vec![Arc::new(NullCompleter)]);
        let sys = sys.compile();
        assert_eq!(values(&sys, &["tput", ""]), vec!["clear", "bel"]);
        assert!(values(&sys, &["clear", ""]).is_empty());
        assert!(values(&sys, &["nope", ""]).is_empty());
    }

    #[test]
    fn aliases_resolved_at_compile() {
        let mut sys = SystemCompleter::new();
        sys.add("tput", tput_branch());
        let mut aliases = BTreeMap::new();
        aliases.insert("tp".to_string(), "tput".to_string());
        aliases.insert("dangling".to_string(), "missing".to_string());
        sys.add_aliases(&aliases);

        assert!(!sys.is_compiled());
        assert!(values(&sys, &["tp", ""]).is_empty());

        let sys = sys.compile();
        assert!(sys.is_compiled());
        assert_eq!(values(&sys, &["tp", ""]), values(&sys, &["tput", ""]));
        assert!(!sys.contains("dangling"));
    }

    #[test]
    fn alias_never_overrides_command() {
        let mut sys = SystemCompleter::new();
        sys.add("tput", tput_branch());
        sys.add("clear", vec![null()]);
        let mut aliases = BTreeMap::new();
        aliases.insert("clear".to_string(), "tput".to_string());
        sys.add_aliases(&aliases);
        let sys = sys.compile();
        assert!(values(&sys, &["clear", ""]).is_empty());
    }

    #[test]
    fn merge_keeps_first() {
        let mut first = SystemCompleter::new();
        first.add("x", vec![Arc::new(StringsCompleter::new(&["one"]))]);
        let mut second = SystemCompleter::new();
        second.add("x", vec![Arc::new(StringsCompleter::new(&["two"]))]);
        second.add("y", vec![null()]);

        let mut merged = SystemCompleter::new();
        merged.merge_first_wins(first.compile());
        merged.merge_first_wins(second.compile());
        let merged = merged.compile();
        assert_eq!(values(&merged, &["x", ""]), vec!["one"]);
        assert_eq!(merged.names(), vec!["x", "y"]);
    }
}
