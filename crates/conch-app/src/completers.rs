//! Externally supplied completers, selected by `completer` in the config.

use std::sync::Arc;

use conch_console::{Candidate, Completer, FnCompleter, Node, StringsCompleter, TreeCompleter};
use conch_types::{ExternalCompleter, ParsedLine, ShellConfig};

/// The external completer selected by `config`, if any.
pub fn external_completer(config: &ShellConfig) -> Option<Arc<dyn Completer>> {
    match config.completer {
        ExternalCompleter::None => None,
        ExternalCompleter::Simple => Some(Arc::new(StringsCompleter::new(&config.simple_words))),
        ExternalCompleter::Tree => Some(Arc::new(tree())),
        ExternalCompleter::Param => Some(Arc::new(FnCompleter(param))),
    }
}

fn tree() -> TreeCompleter {
    TreeCompleter::new(vec![Node::branch(
        "Command1",
        vec![
            Node::branch("Option1", Node::leaves(&["Param1", "Param2"])),
            Node::leaf("Option2"),
            Node::leaf("Option3"),
        ],
    )])
}

/// `Command1 [Option1 Param1|Param2] [Option2] [Option3]`, offering each
/// option only once.
fn param(line: &ParsedLine, candidates: &mut Vec<Candidate>) {
    if line.word_index == 0 {
        candidates.push(Candidate::new("Command1"));
        return;
    }
    if line.head() != Some("Command1") {
        return;
    }
    let previous = line.words.get(line.word_index - 1).map(String::as_str);
    if previous == Some("Option1") {
        candidates.push(Candidate::new("Param1"));
        candidates.push(Candidate::new("Param2"));
        return;
    }
    if line.word_index == 1 {
        candidates.push(Candidate::new("Option1"));
    }
    for option in ["Option2", "Option3"] {
        if !line.words.iter().any(|w| w == option) {
            candidates.push(Candidate::new(option));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conch_console::completer::candidates_for;

    fn values(config: &ShellConfig, words: &[&str]) -> Vec<String> {
        let completer = external_completer(config).unwrap();
        candidates_for(completer.as_ref(), &ParsedLine::from_words(words))
            .into_iter()
            .map(|c| c.value)
            .collect()
    }

    fn config(kind: ExternalCompleter) -> ShellConfig {
        ShellConfig {
            completer: kind,
            ..ShellConfig::default()
        }
    }

    #[test]
    fn none_selects_nothing() {
        assert!(external_completer(&ShellConfig::default()).is_none());
    }

    #[test]
    fn simple_uses_configured_words() {
        let config = config(ExternalCompleter::Simple);
        assert_eq!(values(&config, &[""]), vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn tree_walks_nodes() {
        let config = config(ExternalCompleter::Tree);
        assert_eq!(values(&config, &[""]), vec!["Command1"]);
        assert_eq!(
            values(&config, &["Command1", ""]),
            vec!["Option1", "Option2", "Option3"]
        );
        assert_eq!(
            values(&config, &["Command1", "Option1", ""]),
            vec!["Param1", "Param2"]
        );
        assert!(values(&config, &["Command1", "Option2", ""]).is_empty());
    }

    #[test]
    fn param_offers_each_option_once() {
        let config = config(ExternalCompleter::Param);
        assert_eq!(values(&config, &[""]), vec!["Command1"]);
        assert_eq!(
            values(&config, &["Command1", ""]),
            vec!["Option1", "Option2", "Option3"]
        );
        assert_eq!(
            values(&config, &["Command1", "Option1", ""]),
            vec!["Param1", "Param2"]
        );
        assert_eq!(
            values(&config, &["Command1", "Option1", "Param1", ""]),
            vec!["Option2", "Option3"]
        );
        assert_eq!(
            values(&config, &["Command1", "Option2", ""]),
            vec!["Option3"]
        );
        assert!(values(&config, &["Other", ""]).is_empty());
    }
}
