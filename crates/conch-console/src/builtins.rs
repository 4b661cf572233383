//! Built-in shell commands.
//!
//! These commands operate on shell state (history, variables, line-editor
//! options, widgets, key bindings, background tasks) that the hosting loop
//! also reads, so the state lives behind a shared [`ShellState`] handle.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use conch_types::{ArgDesc, CmdDesc, ConchError, Result, StyledLine};

use crate::command::{Command, CommandInput, CommandTable};
use crate::completer::{ArgumentCompleter, Candidate, Completer, StringsCompleter, null};
use crate::registry::Registry;
use crate::session::Session;
use crate::system::SystemCompleter;
use crate::ticker::TaskBoard;

/// Maximum number of history entries to retain.
const MAX_HISTORY: usize = 100;

/// Line-editor options and their defaults.
const OPTIONS: &[(&str, bool)] = &[
    ("auto-list", true),
    ("auto-menu", true),
    ("case-insensitive", false),
    ("disable-history", false),
    ("empty-word-options", false),
    ("history-ignore-dups", true),
    ("insert-bracket", true),
    ("mouse", false),
];

/// Widgets every session starts with, bound to themselves.
const BUILTIN_WIDGETS: &[&str] = &[
    "accept-line",
    "backward-char",
    "beginning-of-line",
    "clear-screen",
    "complete-word",
    "end-of-line",
    "forward-char",
    "redisplay",
];

const DEFAULT_BINDINGS: &[(&str, &str)] = &[
    ("^A", "beginning-of-line"),
    ("^B", "backward-char"),
    ("^E", "end-of-line"),
    ("^F", "forward-char"),
    ("^I", "complete-word"),
    ("^L", "clear-screen"),
    ("^M", "accept-line"),
];

const HISTORY_FLAGS: &[(&str, &str)] = &[("-c", "Clear the history")];

const WIDGET_FLAGS: &[(&str, &str)] = &[
    ("-N", "Create new widget"),
    ("-D", "Delete widgets"),
    ("-A", "Create alias to widget"),
    ("-l", "List widgets"),
];

const KEYMAP_FLAGS: &[(&str, &str)] = &[("-l", "List key bindings"), ("-d", "Remove a binding")];

#[derive(Debug)]
struct StateInner {
    history: VecDeque<String>,
    variables: BTreeMap<String, String>,
    options: BTreeMap<String, bool>,
    widgets: BTreeMap<String, String>,
    bindings: BTreeMap<String, String>,
}

/// Shell state shared between the built-in commands, their completers and
/// the hosting loop.
///
/// Completers read it when candidates are requested, so names created
/// during a session complete without recompiling.
#[derive(Debug, Clone)]
pub struct ShellState {
    inner: Arc<Mutex<StateInner>>,
}

impl Default for ShellState {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellState {
    pub fn new() -> Self {
        let inner = StateInner {
            history: VecDeque::new(),
            variables: BTreeMap::new(),
            options: OPTIONS
                .iter()
                .map(|(name, on)| (name.to_string(), *on))
                .collect(),
            widgets: BUILTIN_WIDGETS
                .iter()
                .map(|w| (w.to_string(), w.to_string()))
                .collect(),
            bindings: DEFAULT_BINDINGS
                .iter()
                .map(|(k, w)| (k.to_string(), w.to_string()))
                .collect(),
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StateInner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    // -- History --

    /// Record an accepted line, honoring `disable-history` and
    /// `history-ignore-dups`.
    pub fn push_history(&self, line: &str) {
        let line = line.trim();
        if line.is_empty() || self.option("disable-history") {
            return;
        }
        let ignore_dups = self.option("history-ignore-dups");
        let mut inner = self.lock();
        if ignore_dups && inner.history.back().is_some_and(|last| last == line) {
            return;
        }
        inner.history.push_back(line.to_string());
        if inner.history.len() > MAX_HISTORY {
            inner.history.pop_front();
        }
    }

    pub fn history(&self) -> Vec<String> {
        self.lock().history.iter().cloned().collect()
    }

    // -- Variables --

    pub fn set_variable(&self, name: &str, value: &str) {
        self.lock()
            .variables
            .insert(name.to_string(), value.to_string());
    }

    pub fn variable(&self, name: &str) -> Option<String> {
        self.lock().variables.get(name).cloned()
    }

    // -- Options --

    /// Whether an option is on. Unknown options are off.
    pub fn option(&self, name: &str) -> bool {
        self.lock()
            .options
            .get(name)
            .copied()
            .unwrap_or(false)
    }

    /// Returns false if the option is unknown.
    fn set_option(&self, name: &str, on: bool) -> bool {
        match self.lock().options.get_mut(name) {
            Some(value) => {
                *value = on;
                true
            },
            None => false,
        }
    }

    // -- Widgets and key bindings --

    pub fn widget_names(&self) -> Vec<String> {
        self.lock().widgets.keys().cloned().collect()
    }

    /// Widget bound to a key sequence.
    pub fn binding(&self, key: &str) -> Option<String> {
        self.lock().bindings.get(key).cloned()
    }

    fn bound_keys(&self) -> Vec<String> {
        self.lock().bindings.keys().cloned().collect()
    }

    fn variable_names(&self) -> Vec<String> {
        self.lock().variables.keys().cloned().collect()
    }
}

/// The built-in command registry.
#[derive(Debug)]
pub struct Builtins {
    table: CommandTable,
    state: ShellState,
    tasks: TaskBoard,
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

impl Builtins {
    /// Built-ins over fresh shell state and an empty task board.
    pub fn new() -> Self {
        Self::with_state(ShellState::new(), TaskBoard::new())
    }

    pub fn with_state(state: ShellState, tasks: TaskBoard) -> Self {
        let mut table = CommandTable::new();
        for command in builtin_commands(&state, &tasks) {
            // Names are unique and no aliases exist yet.
            if let Err(e) = table.register(command) {
                log::error!("failed to register builtin: {e}");
            }
        }
        Self {
            table,
            state,
            tasks,
        }
    }

    /// Handle to the shared shell state.
    pub fn state(&self) -> ShellState {
        self.state.clone()
    }

    /// Task board listed by `ttop`.
    pub fn tasks(&self) -> TaskBoard {
        self.tasks.clone()
    }
}

impl Registry for Builtins {
    fn name(&self) -> &str {
        "Builtins"
    }

    fn command_names(&self) -> BTreeSet<String> {
        self.table.command_names()
    }

    fn command_aliases(&self) -> BTreeMap<String, String> {
        self.table.aliases()
    }

    fn command_info(&self, command: &str) -> Option<Vec<String>> {
        self.table.command_info(command)
    }

    fn has_command(&self, command: &str) -> bool {
        self.table.has_command(command)
    }

    fn compile_completers(&self) -> SystemCompleter {
        self.table.compile_completers()
    }

    fn execute(&self, session: &Session, command: &str, args: &[String]) -> Result<()> {
        self.table.execute(session, command, args)
    }

    fn command_description(&self, command: &str) -> CmdDesc {
        self.table.command_description(command)
    }

    fn alias(&mut self, alias: &str, command: &str) -> Result<()> {
        self.table.alias(alias, command)
    }

    fn unalias(&mut self, alias: &str) -> Result<()> {
        self.table.unalias(alias)
    }

    fn rename(&mut self, command: &str, new_name: &str) -> Result<()> {
        self.table.rename(command, new_name)
    }
}

// ---------------------------------------------------------------------------
// Command table
// ---------------------------------------------------------------------------

fn strings(words: &[&str]) -> Arc<dyn Completer> {
    Arc::new(StringsCompleter::new(words))
}

/// Completer offering one flag of `table`, described.
fn flag(table: &[(&str, &str)], name: &str) -> Arc<dyn Completer> {
    let candidates = table
        .iter()
        .filter(|(flag, _)| *flag == name)
        .map(|(flag, desc)| Candidate::new(*flag).with_description(*desc))
        .collect();
    Arc::new(StringsCompleter::from_candidates(candidates))
}

/// Completer over names read from shell state on every request.
fn live(supplier: impl Fn() -> Vec<String> + Send + Sync + 'static) -> Arc<dyn Completer> {
    Arc::new(StringsCompleter::from_supplier(supplier))
}

fn args(completers: Vec<Arc<dyn Completer>>) -> Arc<dyn Completer> {
    Arc::new(ArgumentCompleter::new(completers))
}

fn widget_completer(state: &ShellState) -> Arc<dyn Completer> {
    let state = state.clone();
    live(move || state.widget_names())
}

fn plain(lines: &[&str]) -> Vec<StyledLine> {
    lines.iter().map(|l| StyledLine::plain(*l)).collect()
}

fn options_desc(entries: &[(&str, &str)]) -> HashMap<String, Vec<StyledLine>> {
    entries
        .iter()
        .map(|(opt, desc)| (opt.to_string(), plain(&[*desc])))
        .collect()
}

fn builtin_commands(state: &ShellState, tasks: &TaskBoard) -> Vec<Command> {
    let history_state = state.clone();
    let setvar_state = state.clone();
    let setopt_state = state.clone();
    let unsetopt_state = state.clone();
    let widget_state = state.clone();
    let keymap_state = state.clone();
    let tasks = tasks.clone();

    let option_names: Vec<&'static str> = OPTIONS.iter().map(|(name, _)| *name).collect();

    vec![
        Command::new("history", move |input| history(&history_state, input))
            .info("list or clear the command history")
            .completer(|_| vec![args(vec![null(), flag(HISTORY_FLAGS, "-c"), null()])])
            .description(CmdDesc::new(
                plain(&["history [-c] [count]"]),
                ArgDesc::names(&["[count]"]),
                options_desc(HISTORY_FLAGS),
            )),
        Command::new("setvar", move |input| setvar(&setvar_state, input))
            .info("set or list shell variables")
            .completer({
                let state = state.clone();
                move |_| {
                    let state = state.clone();
                    vec![args(vec![null(), live(move || state.variable_names()), null()])]
                }
            })
            .description(CmdDesc::new(
                plain(&["setvar [name [value ...]]", "setvar name=value"]),
                ArgDesc::names(&["[name]", "[value...]"]),
                HashMap::new(),
            )),
        Command::new("setopt", move |input| set_options(&setopt_state, input, true))
            .info("turn line-editor options on")
            .completer({
                let names = option_names.clone();
                move |_| vec![args(vec![null(), strings(&names)])]
            })
            .description(CmdDesc::new(
                plain(&["setopt [option ...]"]),
                ArgDesc::names(&["[option...]"]),
                HashMap::new(),
            )),
        Command::new("unsetopt", move |input| set_options(&unsetopt_state, input, false))
            .info("turn line-editor options off")
            .completer(move |_| vec![args(vec![null(), strings(&option_names)])])
            .description(CmdDesc::new(
                plain(&["unsetopt [option ...]"]),
                ArgDesc::names(&["[option...]"]),
                HashMap::new(),
            )),
        Command::new("widget", move |input| widget(&widget_state, input))
            .info("manipulate line-editor widgets")
            .completer({
                let state = state.clone();
                move |_| {
                    let widgets = widget_completer(&state);
                    vec![
                        args(vec![null(), flag(WIDGET_FLAGS, "-N"), null()]),
                        args(vec![null(), flag(WIDGET_FLAGS, "-D"), Arc::clone(&widgets)]),
                        args(vec![null(), flag(WIDGET_FLAGS, "-A"), widgets, null()]),
                        args(vec![null(), flag(WIDGET_FLAGS, "-l"), null()]),
                    ]
                }
            })
            .description(CmdDesc::new(
                plain(&[
                    "widget -N new-widget [function-name]",
                    "widget -D widget ...",
                    "widget -A old-widget new-widget",
                    "widget -l",
                ]),
                ArgDesc::names(&["[pN...]"]),
                options_desc(WIDGET_FLAGS),
            )),
        Command::new("keymap", move |input| keymap(&keymap_state, input))
            .info("list, bind, or unbind key sequences")
            .completer({
                let state = state.clone();
                move |_| {
                    let keys = {
                        let state = state.clone();
                        live(move || state.bound_keys())
                    };
                    vec![
                        args(vec![null(), flag(KEYMAP_FLAGS, "-l"), null()]),
                        args(vec![null(), flag(KEYMAP_FLAGS, "-d"), Arc::clone(&keys), null()]),
                        args(vec![null(), keys, widget_completer(&state), null()]),
                    ]
                }
            })
            .description(CmdDesc::new(
                plain(&["keymap [-l]", "keymap key widget", "keymap -d key"]),
                ArgDesc::names(&["[key]", "[widget]"]),
                options_desc(KEYMAP_FLAGS),
            )),
        Command::new("ttop", move |input| ttop(&tasks, input))
            .info("display background tasks"),
    ]
}

// ---------------------------------------------------------------------------
// Executors
// ---------------------------------------------------------------------------

fn usage(lines: &[&str]) -> ConchError {
    ConchError::Usage(format!("Usage: {}", lines.join("\n       ")))
}

fn history(state: &ShellState, input: &CommandInput<'_>) -> Result<()> {
    let entries = state.history();
    let shown: &[String] = match input.args {
        [] => &entries,
        [flag] if flag == "-c" => {
            state.lock().history.clear();
            return input.session.write_line("History cleared.");
        },
        [count] => {
            let n: usize = count
                .parse()
                .map_err(|_| usage(&["history [-c] [count]"]))?;
            &entries[entries.len().saturating_sub(n)..]
        },
        _ => return Err(usage(&["history [-c] [count]"])),
    };
    if shown.is_empty() {
        return input.session.write_line("(no history)");
    }
    let first = entries.len() - shown.len();
    let mut out = String::new();
    for (i, entry) in shown.iter().enumerate() {
        out.push_str(&format!("  {:4}  {entry}\n", first + i + 1));
    }
    input.session.write_str(&out)
}

fn setvar(state: &ShellState, input: &CommandInput<'_>) -> Result<()> {
    match input.args {
        [] => {
            let vars = state.lock().variables.clone();
            if vars.is_empty() {
                return input.session.write_line("(no variables)");
            }
            let mut out = String::new();
            for (k, v) in &vars {
                out.push_str(&format!("{k}={v}\n"));
            }
            input.session.write_str(&out)
        },
        [single] => match single.split_once('=') {
            Some((name, value)) => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(usage(&["setvar name=value"]));
                }
                state.set_variable(name, value.trim());
                Ok(())
            },
            None => match state.variable(single) {
                Some(val) => input.session.write_line(&format!("{single}={val}")),
                None => input.session.write_line(&format!("{single}: not set")),
            },
        },
        [name, value @ ..] => {
            state.set_variable(name, &value.join(" "));
            Ok(())
        },
    }
}

fn set_options(state: &ShellState, input: &CommandInput<'_>, on: bool) -> Result<()> {
    if input.args.is_empty() {
        let names: Vec<String> = state
            .lock()
            .options
            .iter()
            .filter(|(_, value)| **value == on)
            .map(|(name, _)| name.clone())
            .collect();
        if names.is_empty() {
            return input.session.write_line("(none)");
        }
        return input.session.write_line(&names.join("\n"));
    }
    for name in input.args {
        if !state.set_option(name, on) {
            return Err(ConchError::Command(format!(
                "{}: unknown option: {name}",
                input.command
            )));
        }
    }
    Ok(())
}

fn widget(state: &ShellState, input: &CommandInput<'_>) -> Result<()> {
    const USAGE: &[&str] = &[
        "widget -N new-widget [function-name]",
        "widget -D widget ...",
        "widget -A old-widget new-widget",
        "widget -l",
    ];
    let args = input.args;
    match args.first().map(String::as_str) {
        Some("-l") if args.len() == 1 => {
            let widgets = state.lock().widgets.clone();
            let mut out = String::new();
            for (name, function) in &widgets {
                if name == function {
                    out.push_str(&format!("{name}\n"));
                } else {
                    out.push_str(&format!("{name} ({function})\n"));
                }
            }
            input.session.write_str(&out)
        },
        Some("-N") if (2..=3).contains(&args.len()) => {
            let name = &args[1];
            let function = args.get(2).unwrap_or(name);
            let mut inner = state.lock();
            if inner.widgets.contains_key(name) {
                return Err(ConchError::Command(format!("widget {name} already exists")));
            }
            inner.widgets.insert(name.clone(), function.clone());
            Ok(())
        },
        Some("-D") if args.len() >= 2 => {
            let mut inner = state.lock();
            for name in &args[1..] {
                if inner.widgets.remove(name).is_none() {
                    return Err(ConchError::Command(format!("no such widget: {name}")));
                }
                inner.bindings.retain(|_, bound| bound != name);
            }
            Ok(())
        },
        Some("-A") if args.len() == 3 => {
            let (old, new) = (&args[1], &args[2]);
            let mut inner = state.lock();
            let Some(function) = inner.widgets.get(old).cloned() else {
                return Err(ConchError::Command(format!("no such widget: {old}")));
            };
            if inner.widgets.contains_key(new) {
                return Err(ConchError::Command(format!("widget {new} already exists")));
            }
            inner.widgets.insert(new.clone(), function);
            Ok(())
        },
        _ => Err(usage(USAGE)),
    }
}

fn keymap(state: &ShellState, input: &CommandInput<'_>) -> Result<()> {
    const USAGE: &[&str] = &["keymap [-l]", "keymap key widget", "keymap -d key"];
    match input.args {
        [] => list_bindings(state, input.session),
        [flag] if flag == "-l" => list_bindings(state, input.session),
        [flag, key] if flag == "-d" => {
            let removed = state.lock().bindings.remove(key);
            match removed {
                Some(_) => Ok(()),
                None => Err(ConchError::Command(format!("{key}: not bound"))),
            }
        },
        [key, widget] => {
            let mut inner = state.lock();
            if !inner.widgets.contains_key(widget) {
                return Err(ConchError::Command(format!("no such widget: {widget}")));
            }
            inner.bindings.insert(key.clone(), widget.clone());
            Ok(())
        },
        _ => Err(usage(USAGE)),
    }
}

fn list_bindings(state: &ShellState, session: &Session) -> Result<()> {
    let bindings = state.lock().bindings.clone();
    if bindings.is_empty() {
        return session.write_line("(no bindings)");
    }
    let mut out = String::new();
    for (key, widget) in &bindings {
        out.push_str(&format!("{key:<8} {widget}\n"));
    }
    session.write_str(&out)
}

fn ttop(tasks: &TaskBoard, input: &CommandInput<'_>) -> Result<()> {
    if !input.args.is_empty() {
        return Err(usage(&[input.command]));
    }
    let snapshot = tasks.snapshot();
    if snapshot.is_empty() {
        return input.session.write_line("(no background tasks)");
    }
    let mut out = format!(
        "{:<12} {:>10} {:>8} {:>8}\n",
        "NAME", "INTERVAL", "TICKS", "FAILED"
    );
    for task in &snapshot {
        out.push_str(&format!(
            "{:<12} {:>8}ms {:>8} {:>8}\n",
            task.name,
            task.interval.as_millis(),
            task.ticks,
            task.failures
        ));
    }
    input.session.write_str(&out)
}
