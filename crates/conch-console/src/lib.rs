//! Command registries, completion and context-aware help for the conch shell.
//!
//! Commands live in independently authored registries. A [`MasterRegistry`]
//! composes them into one help listing, one dispatch path, one compiled
//! completer and one tool-tip resolver that classifies the line being typed.

pub mod builtins;
pub mod command;
pub mod completer;
pub mod master;
pub mod method;
pub mod parser;
pub mod registry;
pub mod session;
pub mod system;
pub mod ticker;

#[cfg(test)]
pub(crate) mod test_utils;

/// Built-in registry and its shared shell state.
pub use builtins::{Builtins, ShellState};
pub use command::{Command, CommandInput, CommandTable};
pub use completer::{
    AggregateCompleter, ArgumentCompleter, Candidate, Completer, FnCompleter, Node,
    NullCompleter, StringsCompleter, TreeCompleter,
};
/// Aggregator over registries, built in one step.
pub use master::{MasterRegistry, MasterRegistryBuilder};
pub use method::{MethodResolver, SignatureLookup, StaticSignatures};
pub use parser::DefaultParser;
/// The contract every command set implements.
pub use registry::{Registry, TableRegistry};
pub use session::{Capture, Session};
pub use system::{SystemCompleter, compile_completers};
pub use ticker::{TaskBoard, TaskStatus, Ticker};
