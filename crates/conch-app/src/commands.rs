//! The demo command registry: terminal capabilities, screen clearing,
//! sleeping, and the line-editor mode switches.

use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use conch_console::completer::null;
use conch_console::{
    ArgumentCompleter, Command, CommandInput, Completer, StringsCompleter, TableRegistry,
};
use conch_types::{ArgDesc, CmdDesc, Result, StyledLine};

/// Terminal capabilities understood by `tput`, with their ANSI sequences.
const CAPABILITIES: &[(&str, &str)] = &[
    ("bel", "\x07"),
    ("blink", "\x1b[5m"),
    ("bold", "\x1b[1m"),
    ("civis", "\x1b[?25l"),
    ("clear", "\x1b[H\x1b[2J"),
    ("cnorm", "\x1b[?25h"),
    ("dim", "\x1b[2m"),
    ("ed", "\x1b[J"),
    ("el", "\x1b[K"),
    ("home", "\x1b[H"),
    ("rc", "\x1b8"),
    ("rev", "\x1b[7m"),
    ("rmcup", "\x1b[?1049l"),
    ("rmso", "\x1b[27m"),
    ("rmul", "\x1b[24m"),
    ("sc", "\x1b7"),
    ("sgr0", "\x1b[0m"),
    ("smcup", "\x1b[?1049h"),
    ("smso", "\x1b[7m"),
    ("smul", "\x1b[4m"),
];

fn capability(name: &str) -> Option<&'static str> {
    CAPABILITIES
        .iter()
        .find(|(cap, _)| *cap == name)
        .map(|(_, seq)| *seq)
}

/// How the tail-tip widget presents descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipType {
    TailTip,
    Completer,
    Combined,
}

impl fmt::Display for TipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TipType::TailTip => "TAIL_TIP",
            TipType::Completer => "COMPLETER",
            TipType::Combined => "COMBINED",
        })
    }
}

/// Line-editor autosuggestion source when the tail-tip is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suggestion {
    None,
    History,
    Completer,
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Suggestion::None => "NONE",
            Suggestion::History => "HISTORY",
            Suggestion::Completer => "COMPLETER",
        })
    }
}

#[derive(Debug)]
struct ModeState {
    suggestion: Suggestion,
    tailtip: bool,
    tip_type: TipType,
    autopair: bool,
}

/// Modal line-editor state toggled by `autopair` and `autosuggestion` and
/// read by the read-eval loop.
#[derive(Debug, Clone)]
pub struct Modes {
    inner: Rc<RefCell<ModeState>>,
}

impl Default for Modes {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ModeState {
                suggestion: Suggestion::None,
                tailtip: false,
                tip_type: TipType::Completer,
                autopair: false,
            })),
        }
    }
}

impl Modes {
    pub fn tailtip_enabled(&self) -> bool {
        self.inner.borrow().tailtip
    }

    pub fn tip_type(&self) -> TipType {
        self.inner.borrow().tip_type
    }

    pub fn suggestion(&self) -> Suggestion {
        self.inner.borrow().suggestion
    }

    pub fn autopair(&self) -> bool {
        self.inner.borrow().autopair
    }

    fn toggle_autopair(&self) {
        let mut state = self.inner.borrow_mut();
        state.autopair = !state.autopair;
    }

    fn set_suggestion(&self, suggestion: Suggestion) {
        let mut state = self.inner.borrow_mut();
        state.tailtip = false;
        state.suggestion = suggestion;
    }

    fn enable_tailtip(&self, tip_type: Option<TipType>) {
        let mut state = self.inner.borrow_mut();
        state.suggestion = Suggestion::None;
        state.tailtip = true;
        if let Some(tip_type) = tip_type {
            state.tip_type = tip_type;
        }
    }

    fn status(&self) -> String {
        if self.tailtip_enabled() {
            format!("Autosuggestion: tailtip/{}", self.tip_type())
        } else {
            format!("Autosuggestion: {}", self.suggestion())
        }
    }
}

fn strings(words: &[&str]) -> Arc<dyn Completer> {
    Arc::new(StringsCompleter::new(words))
}

/// Build the demo registry. `sleep` waits for `sleep_secs`.
pub fn example_commands(modes: &Modes, sleep_secs: u64) -> Result<TableRegistry> {
    let autopair_modes = modes.clone();
    let suggestion_modes = modes.clone();

    TableRegistry::new("ExampleCommands")
        .with_command(
            Command::new("tput", tput)
                .info("set terminal capability")
                .completer(|_| {
                    let names: Vec<&str> = CAPABILITIES.iter().map(|(name, _)| *name).collect();
                    vec![Arc::new(ArgumentCompleter::new(vec![null(), strings(&names)]))]
                })
                .description(CmdDesc::new(
                    vec![StyledLine::plain("tput <capability>")],
                    ArgDesc::names(&["capability"]),
                    Default::default(),
                )),
        )?
        .with_command(Command::new("clear", clear).info("clear screen"))?
        .with_command(
            Command::new("sleep", move |_| {
                std::thread::sleep(Duration::from_secs(sleep_secs));
                Ok(())
            })
            .info(format!("sleep {sleep_secs} seconds")),
        )?
        .with_command(
            Command::new("autopair", move |input| {
                autopair_modes.toggle_autopair();
                let state = if autopair_modes.autopair() {
                    "enabled"
                } else {
                    "disabled"
                };
                input
                    .session
                    .write_line(&format!("Autopair widgets are {state}."))
            })
            .info("toggle brackets/quotes autopair key bindings"),
        )?
        .with_command(
            Command::new("autosuggestion", move |input| {
                autosuggestion(&suggestion_modes, input)
            })
            .info("set autosuggestion modality: history, completer, tailtip or none")
            .completer(|_| {
                vec![
                    Arc::new(ArgumentCompleter::new(vec![
                        null(),
                        strings(&["history", "completer", "none"]),
                        null(),
                    ])),
                    Arc::new(ArgumentCompleter::new(vec![
                        null(),
                        strings(&["tailtip"]),
                        strings(&["tailtip", "completer", "combined"]),
                        null(),
                    ])),
                ]
            }),
        )
}

fn tput(input: &CommandInput<'_>) -> Result<()> {
    match input.args {
        [cap] if cap != "--help" && cap != "-?" => match capability(cap) {
            Some(seq) => {
                input.session.write_str(seq)?;
                input.session.flush()
            },
            None => input.session.write_line("Unknown capability"),
        },
        _ => input.session.write_line("Usage: tput <capability>"),
    }
}

fn clear(input: &CommandInput<'_>) -> Result<()> {
    input.session.critical(|w| {
        w.write_all(b"\x1b[H\x1b[2J")?;
        w.flush()
    })
}

fn autosuggestion(modes: &Modes, input: &CommandInput<'_>) -> Result<()> {
    let Some(kind) = input.args.first() else {
        return input.session.write_line(&modes.status());
    };
    let kind = kind.to_lowercase();
    if kind.starts_with("his") {
        modes.set_suggestion(Suggestion::History);
    } else if kind.starts_with("tai") {
        let tip_type = input.args.get(1).and_then(|mode| {
            let mode = mode.to_lowercase();
            if mode.starts_with("tai") {
                Some(TipType::TailTip)
            } else if mode.starts_with("comp") {
                Some(TipType::Completer)
            } else if mode.starts_with("comb") {
                Some(TipType::Combined)
            } else {
                None
            }
        });
        modes.enable_tailtip(tip_type);
    } else if kind.starts_with("com") {
        modes.set_suggestion(Suggestion::Completer);
    } else if kind.starts_with("non") {
        modes.set_suggestion(Suggestion::None);
    } else {
        return input
            .session
            .write_line("Usage: autosuggestion history|completer|tailtip|none");
    }
    log::debug!("{}", modes.status());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use conch_console::{Registry, Session};

    fn run(registry: &TableRegistry, line: &[&str]) -> String {
        let (session, out) = Session::capture();
        let args: Vec<String> = line[1..].iter().map(|s| s.to_string()).collect();
        registry.execute(&session, line[0], &args).unwrap();
        out.contents()
    }

    #[test]
    fn registry_lists_demo_commands() {
        let registry = example_commands(&Modes::default(), 0).unwrap();
        let names: Vec<String> = registry.command_names().into_iter().collect();
        assert_eq!(
            names,
            vec!["autopair", "autosuggestion", "clear", "sleep", "tput"]
        );
        assert_eq!(
            registry.command_info("sleep").unwrap(),
            vec!["sleep 0 seconds"]
        );
    }

    #[test]
    fn tput_writes_capability() {
        let registry = example_commands(&Modes::default(), 0).unwrap();
        assert_eq!(run(&registry, &["tput", "bel"]), "\x07");
        assert_eq!(run(&registry, &["tput", "nope"]), "Unknown capability\n");
        assert_eq!(run(&registry, &["tput"]), "Usage: tput <capability>\n");
        assert_eq!(run(&registry, &["tput", "--help"]), "Usage: tput <capability>\n");
    }

    #[test]
    fn clear_writes_sequence() {
        let registry = example_commands(&Modes::default(), 0).unwrap();
        assert_eq!(run(&registry, &["clear"]), "\x1b[H\x1b[2J");
    }

    #[test]
    fn autopair_toggles() {
        let modes = Modes::default();
        let registry = example_commands(&modes, 0).unwrap();
        assert_eq!(run(&registry, &["autopair"]), "Autopair widgets are enabled.\n");
        assert!(modes.autopair());
        assert_eq!(run(&registry, &["autopair"]), "Autopair widgets are disabled.\n");
        assert!(!modes.autopair());
    }

    #[test]
    fn autosuggestion_modes() {
        let modes = Modes::default();
        let registry = example_commands(&modes, 0).unwrap();
        assert_eq!(run(&registry, &["autosuggestion"]), "Autosuggestion: NONE\n");

        run(&registry, &["autosuggestion", "History"]);
        assert_eq!(modes.suggestion(), Suggestion::History);
        assert!(!modes.tailtip_enabled());

        run(&registry, &["autosuggestion", "tailtip", "comb"]);
        assert!(modes.tailtip_enabled());
        assert_eq!(modes.tip_type(), TipType::Combined);
        assert_eq!(
            run(&registry, &["autosuggestion"]),
            "Autosuggestion: tailtip/COMBINED\n"
        );

        run(&registry, &["autosuggestion", "tailtip"]);
        assert_eq!(modes.tip_type(), TipType::Combined);

        run(&registry, &["autosuggestion", "completer"]);
        assert!(!modes.tailtip_enabled());
        assert_eq!(modes.suggestion(), Suggestion::Completer);

        assert_eq!(
            run(&registry, &["autosuggestion", "bogus"]),
            "Usage: autosuggestion history|completer|tailtip|none\n"
        );
    }

    #[test]
    fn tput_has_static_description() {
        let registry = example_commands(&Modes::default(), 0).unwrap();
        let desc = registry.command_description("tput");
        assert_eq!(desc.arg_desc()[0].name, "capability");
        let desc = registry.command_description("clear");
        assert_eq!(desc.main_desc()[0].text, "clear screen");
    }
}
