//! Shared fixtures for conch-console tests.
//!
//! Two small registries mirror a typical shell: `Terminal` owns `tput`,
//! `Widgets` owns `widget` with the alias `zle`.

use std::rc::Rc;
use std::sync::Arc;

use conch_types::{ArgDesc, CmdDesc, ConchError, ParsedLine, StyledLine};

use crate::command::Command;
use crate::completer::{ArgumentCompleter, Completer, StringsCompleter, candidates_for, null};
use crate::master::MasterRegistry;
use crate::parser::DefaultParser;
use crate::registry::{Registry, TableRegistry};

pub const CAPABILITIES: &[&str] = &["bel", "clear", "cup", "smso"];

/// Registry A: `tput <capability>`.
pub fn terminal_registry() -> TableRegistry {
    TableRegistry::new("Terminal")
        .with_command(
            Command::new("tput", |input| match input.args {
                [cap] if CAPABILITIES.contains(&cap.as_str()) => {
                    input.session.write_line(&format!("<{cap}>"))
                },
                [_] => input.session.write_line("Unknown capability"),
                _ => Err(ConchError::Usage("Usage: tput <capability>".into())),
            })
            .info("set terminal capability")
            .completer(|_| {
                vec![Arc::new(ArgumentCompleter::new(vec![
                    null(),
                    Arc::new(StringsCompleter::new(CAPABILITIES)),
                ]))]
            }),
        )
        .and_then(|r| {
            r.with_command(
                Command::new("fail", |_| Err(ConchError::Command("always fails".into())))
                    .info("fail on purpose"),
            )
        })
        .unwrap()
}

/// Registry B: `widget` aliased as `zle`.
pub fn widget_registry() -> TableRegistry {
    let mut reg = TableRegistry::new("Widgets")
        .with_command(
            Command::new("widget", |input| {
                input.session.write_line(&format!("widget {}", input.args.join(" ")))
            })
            .info("manipulate widgets")
            .completer(|_| {
                let flags: Arc<dyn Completer> =
                    Arc::new(StringsCompleter::new(&["-N", "-D", "-A", "-l"]));
                vec![Arc::new(ArgumentCompleter::new(vec![null(), flags, null()]))]
            })
            .description(CmdDesc::new(
                vec![StyledLine::plain("widget -N new-widget [function-name]")],
                ArgDesc::names(&["[pN...]"]),
                Default::default(),
            )),
        )
        .unwrap();
    reg.alias("zle", "widget").unwrap();
    reg
}

/// Master over both fixtures with the default parser.
pub fn master() -> (MasterRegistry, Rc<DefaultParser>) {
    let parser = Rc::new(DefaultParser::new());
    let master = MasterRegistry::builder()
        .registry(terminal_registry())
        .registry(widget_registry())
        .parser(&parser)
        .build()
        .unwrap();
    (master, parser)
}

/// Candidate values for a line typed so far.
pub fn complete(completer: &dyn Completer, parser: &DefaultParser, line: &str) -> Vec<String> {
    use conch_types::LineParser;
    let parsed: ParsedLine = parser.parse_partial(line);
    candidates_for(completer, &parsed)
        .into_iter()
        .map(|c| c.value)
        .collect()
}
