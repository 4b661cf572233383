//! Default line parser: quote-aware word splitting plus bracket tracking.

use conch_types::{CmdLine, ConchError, DescriptionType, LineParser, ParsedLine, Result};

/// Result of one pass over a line.
#[derive(Debug, Default)]
struct Scan {
    words: Vec<String>,
    /// Quote character left open at end of input.
    open_quote: Option<char>,
    /// Unclosed opening brackets with their byte offsets, innermost last.
    open_brackets: Vec<(char, usize)>,
    /// First closing bracket with no matching opener.
    unmatched_close: Option<char>,
    /// Input ended on a separator (or was empty), so a new word has begun.
    trailing_separator: bool,
}

fn closer_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

fn scan(input: &str) -> Scan {
    let mut out = Scan {
        trailing_separator: true,
        ..Scan::default()
    };
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        if let Some(quote) = out.open_quote {
            if ch == quote {
                out.open_quote = None;
            } else if ch == '\\' && quote == '"' {
                match chars.peek() {
                    Some(&(_, next @ ('"' | '\\'))) => {
                        current.push(next);
                        chars.next();
                    },
                    _ => current.push('\\'),
                }
            } else {
                current.push(ch);
            }
            continue;
        }
        match ch {
            '\'' | '"' => {
                out.open_quote = Some(ch);
                in_word = true;
            },
            '\\' => {
                if let Some((_, next)) = chars.next() {
                    current.push(next);
                }
                in_word = true;
            },
            c if c.is_whitespace() => {
                if in_word {
                    out.words.push(std::mem::take(&mut current));
                    in_word = false;
                }
                out.trailing_separator = true;
                continue;
            },
            '(' | '[' | '{' => {
                out.open_brackets.push((ch, pos));
                current.push(ch);
                in_word = true;
            },
            ')' | ']' | '}' => {
                match out.open_brackets.last() {
                    Some(&(open, _)) if closer_for(open) == ch => {
                        out.open_brackets.pop();
                    },
                    _ => {
                        out.unmatched_close.get_or_insert(ch);
                    },
                }
                current.push(ch);
                in_word = true;
            },
            _ => {
                current.push(ch);
                in_word = true;
            },
        }
        out.trailing_separator = false;
    }
    if in_word {
        out.words.push(current);
        out.trailing_separator = false;
    }
    out
}

fn is_command_name(word: &str) -> bool {
    let rest = word.strip_prefix(':').unwrap_or(word);
    let mut chars = rest.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn is_variable_name(word: &str) -> bool {
    let mut chars = word.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Whitespace-splitting parser with single/double quotes, backslash
/// escapes, and `()`/`[]`/`{}` tracking.
///
/// By default an unclosed quote or bracket is accepted as-is. With the
/// `eof_on_*` flags set, [`LineParser::parse`] reports
/// [`ConchError::Incomplete`] instead so the caller can read a
/// continuation line.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParser {
    pub eof_on_unclosed_quote: bool,
    pub eof_on_unclosed_bracket: bool,
}

impl DefaultParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eof_on_unclosed_quote(mut self, on: bool) -> Self {
        self.eof_on_unclosed_quote = on;
        self
    }

    pub fn eof_on_unclosed_bracket(mut self, on: bool) -> Self {
        self.eof_on_unclosed_bracket = on;
        self
    }
}

impl LineParser for DefaultParser {
    fn parse(&self, line: &str) -> Result<ParsedLine> {
        let scan = scan(line);
        if let Some(close) = scan.unmatched_close {
            return Err(ConchError::Parse(format!("unmatched '{close}'")));
        }
        if let Some(quote) = scan.open_quote
            && self.eof_on_unclosed_quote
        {
            return Err(ConchError::Incomplete(format!("closing {quote}")));
        }
        if let Some(&(open, _)) = scan.open_brackets.last()
            && self.eof_on_unclosed_bracket
        {
            return Err(ConchError::Incomplete(format!("closing {}", closer_for(open))));
        }
        Ok(ParsedLine {
            line: line.to_string(),
            cursor: line.len(),
            word_index: scan.words.len().saturating_sub(1),
            words: scan.words,
        })
    }

    fn parse_partial(&self, line: &str) -> ParsedLine {
        let mut scan = scan(line);
        if scan.trailing_separator {
            scan.words.push(String::new());
        }
        ParsedLine {
            line: line.to_string(),
            cursor: line.len(),
            word_index: scan.words.len().saturating_sub(1),
            words: scan.words,
        }
    }

    /// The command a line invokes: the first word, or the command in a
    /// leading `var=command` assignment. Empty if it is not a valid name.
    fn command_name(&self, line: &str) -> String {
        let trimmed = line.trim_start();
        let first = trimmed.split_whitespace().next().unwrap_or("");
        if let Some((var, cmd)) = first.split_once('=')
            && is_variable_name(var)
            && is_command_name(cmd)
        {
            return cmd.to_string();
        }
        if is_command_name(first) {
            first.to_string()
        } else {
            String::new()
        }
    }

    fn cmd_line(&self, line: &str) -> CmdLine {
        let scan = scan(line);
        let args = scan.words;
        if scan.unmatched_close.is_some() {
            return CmdLine {
                line: line.to_string(),
                head: line.to_string(),
                tail: String::new(),
                args,
                kind: DescriptionType::Syntax,
            };
        }
        match scan.open_brackets.iter().rev().find(|(open, _)| *open == '(') {
            Some(&(_, pos)) => CmdLine {
                line: line.to_string(),
                head: line[..pos].to_string(),
                tail: line[pos + 1..].to_string(),
                args,
                kind: DescriptionType::Method,
            },
            None => CmdLine::command(line, args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<String> {
        DefaultParser::new().parse(line).unwrap().words
    }

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(words("tput  clear "), vec!["tput", "clear"]);
        assert!(words("").is_empty());
    }

    #[test]
    fn quotes_group_words() {
        assert_eq!(words("echo 'a b' \"c d\""), vec!["echo", "a b", "c d"]);
        assert_eq!(words(r#"say "x \"y\"""#), vec!["say", r#"x "y""#]);
        assert_eq!(words("empty ''"), vec!["empty", ""]);
    }

    #[test]
    fn backslash_escapes_space() {
        assert_eq!(words(r"a\ b c"), vec!["a b", "c"]);
    }

    #[test]
    fn unclosed_quote_accepted_by_default() {
        assert_eq!(words("say 'hello"), vec!["say", "hello"]);
    }

    #[test]
    fn unclosed_quote_incomplete_when_enabled() {
        let parser = DefaultParser::new().eof_on_unclosed_quote(true);
        assert!(matches!(
            parser.parse("say 'hello"),
            Err(ConchError::Incomplete(_))
        ));
        assert!(parser.parse("say 'hello'").is_ok());
    }

    #[test]
    fn unclosed_bracket_incomplete_when_enabled() {
        let parser = DefaultParser::new().eof_on_unclosed_bracket(true);
        let err = parser.parse("call(a, [b").unwrap_err();
        assert_eq!(format!("{err}"), "incomplete input: missing closing ]");
        assert!(parser.parse("call(a, [b])").is_ok());
        assert!(DefaultParser::new().parse("call(a").is_ok());
    }

    #[test]
    fn unmatched_closer_is_parse_error() {
        let parser = DefaultParser::new();
        assert!(matches!(parser.parse("foo)"), Err(ConchError::Parse(_))));
        assert!(matches!(parser.parse("(foo]"), Err(ConchError::Parse(_))));
        assert!(parser.parse("'foo)'").is_ok());
    }

    #[test]
    fn partial_trailing_space_starts_new_word() {
        let parser = DefaultParser::new();
        let pl = parser.parse_partial("zle ");
        assert_eq!(pl.words, vec!["zle", ""]);
        assert_eq!(pl.word_index, 1);
        assert_eq!(pl.word(), "");

        let pl = parser.parse_partial("tput cl");
        assert_eq!(pl.word(), "cl");

        let pl = parser.parse_partial("");
        assert_eq!(pl.words, vec![""]);
        assert_eq!(pl.word_index, 0);
    }

    #[test]
    fn partial_open_quote_is_current_word() {
        let pl = DefaultParser::new().parse_partial("say 'hello wor");
        assert_eq!(pl.words, vec!["say", "hello wor"]);
        assert_eq!(pl.word_index, 1);
    }

    #[test]
    fn command_name_rules() {
        let parser = DefaultParser::new();
        assert_eq!(parser.command_name("  widget -l"), "widget");
        assert_eq!(parser.command_name(":alias x y"), ":alias");
        assert_eq!(parser.command_name("out=tput clear"), "tput");
        assert_eq!(parser.command_name("obj.method("), "");
        assert_eq!(parser.command_name("1abc"), "");
        assert_eq!(parser.command_name(""), "");
    }

    #[test]
    fn classifies_command_lines() {
        let cl = DefaultParser::new().cmd_line("widget -N ");
        assert_eq!(cl.kind, DescriptionType::Command);
        assert_eq!(cl.args, vec!["widget", "-N"]);
        assert_eq!(cl.head, "widget -N ");
    }

    #[test]
    fn classifies_method_lines() {
        let cl = DefaultParser::new().cmd_line("if (");
        assert_eq!(cl.kind, DescriptionType::Method);
        assert_eq!(cl.head, "if ");
        assert_eq!(cl.tail, "");

        let cl = DefaultParser::new().cmd_line("a.b(1, c.d(x");
        assert_eq!(cl.kind, DescriptionType::Method);
        assert_eq!(cl.head, "a.b(1, c.d");
        assert_eq!(cl.tail, "x");

        let cl = DefaultParser::new().cmd_line("a.b(1)");
        assert_eq!(cl.kind, DescriptionType::Command);
    }

    #[test]
    fn classifies_syntax_errors() {
        let cl = DefaultParser::new().cmd_line("foo)");
        assert_eq!(cl.kind, DescriptionType::Syntax);
        let cl = DefaultParser::new().cmd_line("f(x]");
        assert_eq!(cl.kind, DescriptionType::Syntax);
    }
}
