//! The read-eval loop.
//!
//! Besides ordinary commands the loop understands these meta commands that
//! stand in for the line editor's interactive features:
//!
//! - `:complete <text>` lists completion candidates for `<text>`
//! - `:describe <text>` shows the tool-tip for `<text>`
//! - `:alias <alias> <command>` adds an alias and recompiles completion
//! - `:unalias <alias>` removes an alias and recompiles completion

use std::collections::HashSet;
use std::io::{self, BufRead};
use std::rc::Rc;
use std::sync::Arc;

use conch_console::completer::candidates_for;
use conch_console::{
    AggregateCompleter, Builtins, Candidate, Completer, DefaultParser, MasterRegistry, Registry,
    Session, ShellState, StaticSignatures, TaskBoard,
};
use conch_types::{ConchError, LineParser, Result, ShellConfig};

use crate::commands::{Modes, example_commands};
use crate::completers::external_completer;

/// Whether the loop keeps reading after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Shell {
    master: MasterRegistry,
    parser: Rc<DefaultParser>,
    session: Session,
    state: ShellState,
    tasks: TaskBoard,
    modes: Modes,
    external: Option<Arc<dyn Completer>>,
    completer: AggregateCompleter,
    prompt: String,
    tip_lines: usize,
}

impl Shell {
    /// Wire the built-in and demo registries into a ready shell.
    pub fn build(config: &ShellConfig, session: Session) -> Result<Self> {
        let parser = Rc::new(
            DefaultParser::new()
                .eof_on_unclosed_quote(config.multiline)
                .eof_on_unclosed_bracket(config.multiline),
        );

        let mut builtins = Builtins::new();
        builtins.rename("ttop", "top")?;
        builtins.alias("zle", "widget")?;
        builtins.alias("bindkey", "keymap")?;
        let state = builtins.state();
        let tasks = builtins.tasks();

        let modes = Modes::default();
        let examples = example_commands(&modes, config.sleep_secs)?;

        let master = MasterRegistry::builder()
            .registry(builtins)
            .registry(examples)
            .parser(&parser)
            .signature_lookup(StaticSignatures {
                max_source_len: config.method_source_limit,
                signatures: config.method_signatures.clone(),
            })
            .control_keywords(&config.control_keywords)
            .tips(config.tip_table())
            .build()?;

        let external = external_completer(config);
        let completer = master.compile_completers(external.clone());

        Ok(Self {
            master,
            parser,
            session,
            state,
            tasks,
            modes,
            external,
            completer,
            prompt: prompt_text(config),
            tip_lines: config.tip_lines,
        })
    }

    /// Task board shared with `top`.
    pub fn tasks(&self) -> &TaskBoard {
        &self.tasks
    }

    /// Read and handle lines until `quit`, `exit` or end of input.
    pub fn run(&mut self, input: impl BufRead) -> Result<()> {
        self.session.write_line("help: list available commands")?;
        let mut lines = input.lines();
        loop {
            self.session.show_prompt(&self.prompt)?;
            let Some(line) = self.read_line(&mut lines)? else {
                break;
            };
            if self.handle(&line)? == Flow::Exit {
                break;
            }
        }
        Ok(())
    }

    /// Next input line. Once read, the prompt it answered is closed.
    fn next_line(
        &self,
        lines: &mut impl Iterator<Item = io::Result<String>>,
    ) -> Result<Option<String>> {
        let line = lines.next().transpose()?;
        self.session.end_prompt();
        Ok(line)
    }

    /// Next logical line, joining continuation lines while the parser
    /// reports unfinished input.
    fn read_line(
        &self,
        lines: &mut impl Iterator<Item = io::Result<String>>,
    ) -> Result<Option<String>> {
        let Some(mut buffer) = self.next_line(lines)? else {
            return Ok(None);
        };
        while let Err(ConchError::Incomplete(missing)) = self.parser.parse(&buffer) {
            log::debug!("continuation line needed: missing {missing}");
            self.session.show_prompt("> ")?;
            match self.next_line(lines)? {
                Some(next) => {
                    buffer.push('\n');
                    buffer.push_str(&next);
                },
                None => break,
            }
        }
        Ok(Some(buffer))
    }

    /// Handle one submitted line. Command failures are reported and the
    /// loop continues; only output errors are returned.
    pub fn handle(&mut self, raw: &str) -> Result<Flow> {
        let line = raw.trim();
        self.session.write_line(&format!("======>\"{line}\""))?;
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            return Ok(Flow::Exit);
        }
        if line.is_empty() {
            return Ok(Flow::Continue);
        }
        self.state.push_history(line);

        let outcome = if let Some(text) = meta_argument(raw, ":complete") {
            self.show_completions(text)
        } else if let Some(text) = meta_argument(raw, ":describe") {
            self.show_description(text)
        } else if let Some(text) = meta_argument(raw, ":alias") {
            self.add_alias(text)
        } else if let Some(text) = meta_argument(raw, ":unalias") {
            self.remove_alias(text)
        } else {
            self.master.execute_line(&self.session, line)
        };
        match outcome {
            Ok(()) => {},
            Err(ConchError::Io(e)) => return Err(ConchError::Io(e)),
            Err(e) => {
                log::debug!("'{line}' failed: {e}");
                self.session.write_line(&e.to_string())?;
            },
        }
        Ok(Flow::Continue)
    }

    /// Candidates for the last word of `text`, in completer order.
    pub fn completions(&self, text: &str) -> Vec<Candidate> {
        let parsed = self.parser.parse_partial(text);
        let word = parsed.word();
        let mut seen = HashSet::new();
        candidates_for(&self.completer, &parsed)
            .into_iter()
            .filter(|c| c.value.starts_with(word) && seen.insert(c.value.clone()))
            .collect()
    }

    fn show_completions(&self, text: &str) -> Result<()> {
        let candidates = self.completions(text);
        if candidates.is_empty() {
            return self.session.write_line("(no candidates)");
        }
        let mut out = String::new();
        for c in &candidates {
            match &c.description {
                Some(desc) => out.push_str(&format!("{}  -- {desc}\n", c.display)),
                None => out.push_str(&format!("{}\n", c.display)),
            }
        }
        self.session.write_str(&out)
    }

    fn show_description(&self, text: &str) -> Result<()> {
        if !self.modes.tailtip_enabled() {
            return self
                .session
                .write_line("(tail-tip is off: run 'autosuggestion tailtip')");
        }
        let line = self.parser.cmd_line(text);
        let Some(desc) = self.master.describe(&line) else {
            return self.session.write_line("(no description)");
        };
        let mut out = String::new();
        for styled in desc.render(self.tip_lines) {
            out.push_str(&styled.to_ansi());
            out.push('\n');
        }
        self.session.write_str(&out)
    }

    fn add_alias(&mut self, text: &str) -> Result<()> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let [alias, command] = words[..] else {
            return Err(ConchError::Usage("Usage: :alias <alias> <command>".into()));
        };
        self.master.alias(alias, command)?;
        self.completer = self.master.compile_completers(self.external.clone());
        log::info!("aliased '{alias}' to '{command}'");
        Ok(())
    }

    fn remove_alias(&mut self, text: &str) -> Result<()> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let [alias] = words[..] else {
            return Err(ConchError::Usage("Usage: :unalias <alias>".into()));
        };
        self.master.unalias(alias)?;
        self.completer = self.master.compile_completers(self.external.clone());
        log::info!("removed alias '{alias}'");
        Ok(())
    }

    #[cfg(test)]
    fn owner(&self, token: &str) -> Option<String> {
        self.master.resolve_owner(token).map(|r| r.name().to_string())
    }
}

/// Left prompt, with the right prompt drawn flush against the right edge
/// when one is configured.
fn prompt_text(config: &ShellConfig) -> String {
    match &config.right_prompt {
        Some(right) => {
            let width = right.chars().count();
            format!("\x1b7\x1b[999C\x1b[{width}D{right}\x1b8{}", config.prompt)
        },
        None => config.prompt.clone(),
    }
}

/// Text after a meta command, or `None` if `raw` is not that command.
/// Trailing whitespace is kept: it starts a new word for completion.
fn meta_argument<'a>(raw: &'a str, name: &str) -> Option<&'a str> {
    let rest = raw.trim_start().strip_prefix(name)?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.strip_prefix(' ')
}
