//! The master registry: one dispatch, help, completion and description
//! surface over an ordered list of registries.
//!
//! Registry order is precedence. When two registries claim the same token
//! (as a command or an alias), the first one in order owns it for dispatch,
//! description and completion alike.

use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use conch_types::{
    CmdDesc, CmdLine, ConchError, DescriptionType, LineParser, ParsedLine, Result, StyledLine,
};

use crate::completer::{AggregateCompleter, Candidate, Completer, FnCompleter};
use crate::method::{MethodResolver, SignatureLookup};
use crate::registry::Registry;
use crate::session::Session;
use crate::system;

const HELP_COMMANDS: &[&str] = &["help", "?"];

/// Assembles a fully wired [`MasterRegistry`].
#[derive(Default)]
pub struct MasterRegistryBuilder {
    registries: Vec<Box<dyn Registry>>,
    parser: Option<Weak<dyn LineParser>>,
    methods: Option<MethodResolver>,
    keywords: Option<Vec<String>>,
    tips: HashMap<String, CmdDesc>,
}

impl MasterRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a registry. Earlier registries take precedence.
    pub fn registry(mut self, registry: impl Registry + 'static) -> Self {
        self.registries.push(Box::new(registry));
        self
    }

    /// Line parser used to resolve head words. Held weakly: the hosting
    /// loop owns it.
    pub fn parser<P: LineParser + 'static>(mut self, parser: &Rc<P>) -> Self {
        let weak: Weak<P> = Rc::downgrade(parser);
        self.parser = Some(weak);
        self
    }

    pub fn method_resolver(mut self, resolver: MethodResolver) -> Self {
        self.methods = Some(resolver);
        self
    }

    /// Shorthand for a [`MethodResolver`] over `lookup`.
    pub fn signature_lookup(self, lookup: impl SignatureLookup + 'static) -> Self {
        self.method_resolver(MethodResolver::new(lookup))
    }

    /// Keywords that suppress method descriptions.
    pub fn control_keywords<S: AsRef<str>>(mut self, keywords: &[S]) -> Self {
        self.keywords = Some(keywords.iter().map(|k| k.as_ref().to_string()).collect());
        self
    }

    /// Static tool-tips that override registry descriptions by name.
    pub fn tips(mut self, tips: HashMap<String, CmdDesc>) -> Self {
        self.tips = tips;
        self
    }

    pub fn build(self) -> Result<MasterRegistry> {
        let parser = self
            .parser
            .ok_or_else(|| ConchError::Config("master registry needs a line parser".into()))?;
        let mut methods = self.methods.unwrap_or_default();
        if let Some(keywords) = self.keywords {
            methods = methods.keywords(&keywords);
        }
        for (i, later) in self.registries.iter().enumerate() {
            for earlier in &self.registries[..i] {
                for name in later.command_names() {
                    if earlier.has_command(&name) {
                        log::debug!(
                            "'{name}' in {} is shadowed by {}",
                            later.name(),
                            earlier.name()
                        );
                    }
                }
            }
        }
        log::debug!("master registry wired with {} registries", self.registries.len());
        Ok(MasterRegistry {
            registries: self.registries,
            parser,
            methods,
            tips: self.tips,
        })
    }
}

/// Router over an ordered list of registries. Owns no command state.
pub struct MasterRegistry {
    registries: Vec<Box<dyn Registry>>,
    parser: Weak<dyn LineParser>,
    methods: MethodResolver,
    tips: HashMap<String, CmdDesc>,
}

impl fmt::Debug for MasterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.registries.iter().map(|r| r.name()).collect();
        f.debug_struct("MasterRegistry")
            .field("registries", &names)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

impl MasterRegistry {
    pub fn builder() -> MasterRegistryBuilder {
        MasterRegistryBuilder::new()
    }

    pub fn registries(&self) -> impl Iterator<Item = &dyn Registry> {
        self.registries.iter().map(|r| r.as_ref())
    }

    /// First registry, in order, that knows `token`.
    pub fn resolve_owner(&self, token: &str) -> Option<&dyn Registry> {
        self.registries().find(|r| r.has_command(token))
    }

    /// Help listing: each registry's canonical commands, sorted, with their
    /// first info line. Aliases are not listed.
    pub fn help(&self) -> String {
        let mut out = String::from("List of available commands:\n");
        for registry in self.registries() {
            out.push_str(&format!("  {}:\n", registry.name()));
            for name in registry.command_names() {
                let info = registry
                    .command_info(&name)
                    .and_then(|lines| lines.into_iter().next())
                    .unwrap_or_default();
                out.push_str(&format!("    {name:<15} {info}\n"));
            }
        }
        out.push_str("  Additional help:\n");
        out.push_str("    <command> --help\n");
        out
    }

    fn parser(&self) -> Option<Rc<dyn LineParser>> {
        let parser = self.parser.upgrade();
        if parser.is_none() {
            log::warn!("line parser has been dropped");
        }
        parser
    }

    /// Canonical command for a head word, via the parser when available.
    fn command_name(&self, head: &str) -> String {
        match self.parser() {
            Some(parser) => parser.command_name(head),
            None => head.to_string(),
        }
    }

    /// Structured description for the text typed so far.
    ///
    /// `None` means "no description": the tool-tip stays hidden. An invalid
    /// [`CmdDesc`] means the input names no known command or is malformed.
    pub fn describe(&self, line: &CmdLine) -> Option<CmdDesc> {
        match line.kind {
            DescriptionType::Command => {
                let head = line.args.first()?;
                let cmd = self.command_name(head);
                if let Some(tip) = self.tips.get(&cmd) {
                    return Some(tip.clone());
                }
                if HELP_COMMANDS.contains(&head.as_str()) {
                    return Some(CmdDesc::from_main(vec![StyledLine::plain(
                        "help: list available commands",
                    )]));
                }
                match self.resolve_owner(&cmd) {
                    Some(owner) => Some(owner.command_description(&cmd)),
                    None => Some(CmdDesc::invalid()),
                }
            },
            DescriptionType::Method => self.methods.describe(line),
            DescriptionType::Syntax => Some(CmdDesc::invalid()),
        }
    }

    /// Parse and run one submitted line.
    ///
    /// `help` and `?` print the listing. Any other head word is dispatched
    /// to its owning registry; unknown words fail with
    /// [`ConchError::UnknownCommand`].
    pub fn execute_line(&self, session: &Session, line: &str) -> Result<()> {
        let parser = self
            .parser()
            .ok_or_else(|| ConchError::Command("line parser is no longer available".into()))?;
        let parsed = parser.parse(line)?;
        let Some(head) = parsed.head() else {
            return Ok(());
        };
        if HELP_COMMANDS.contains(&head) {
            return session.write_str(&self.help());
        }
        let cmd = parser.command_name(head);
        match self.resolve_owner(&cmd) {
            Some(owner) => owner.execute(session, &cmd, parsed.args()),
            None => Err(ConchError::UnknownCommand(head.to_string())),
        }
    }

    /// Add an alias in the registry owning `command`.
    pub fn alias(&mut self, alias: &str, command: &str) -> Result<()> {
        let index = self
            .registries
            .iter()
            .position(|r| r.has_command(command))
            .ok_or_else(|| ConchError::UnknownCommand(command.to_string()))?;
        if let Some(shadow) = self.registries[..index].iter().find(|r| r.has_command(alias)) {
            log::warn!("alias '{alias}' is shadowed by {}", shadow.name());
        }
        self.registries[index].alias(alias, command)
    }

    /// Remove an alias from the first registry that defines it.
    pub fn unalias(&mut self, alias: &str) -> Result<()> {
        let registry = self
            .registries
            .iter_mut()
            .find(|r| r.command_aliases().contains_key(alias))
            .ok_or_else(|| ConchError::Command(format!("{alias}: not aliased")))?;
        registry.unalias(alias)
    }

    /// Completer over every registry plus `help`, followed by `external`.
    ///
    /// Must be rebuilt after any alias change.
    pub fn compile_completers(&self, external: Option<Arc<dyn Completer>>) -> AggregateCompleter {
        let mut out = system::compile_completers(self.registries(), None);
        out.push(Arc::new(FnCompleter(
            |line: &ParsedLine, candidates: &mut Vec<Candidate>| {
                if line.word_index == 0 {
                    candidates.push(Candidate::new("help"));
                }
            },
        )));
        if let Some(external) = external {
            out.push(external);
        }
        out
    }
}
