//! Foundation types for conch.
//!
//! This crate holds the types shared by the console core and the shell
//! binary: the error enum, styled text, structured command descriptions,
//! the line context handed around by parsers, and the shell configuration.

pub mod config;
pub mod desc;
pub mod error;
pub mod line;
pub mod style;

pub use config::{ExternalCompleter, ShellConfig, TickerConfig, TipConfig};
pub use desc::{ArgDesc, CmdDesc};
pub use error::{ConchError, Result};
pub use line::{CmdLine, DescriptionType, LineParser, ParsedLine};
pub use style::{Color, Style, StyledLine};
