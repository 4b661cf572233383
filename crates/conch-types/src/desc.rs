//! Structured command descriptions for the tool-tip display.

use std::collections::HashMap;

use crate::style::StyledLine;

/// Description of one positional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgDesc {
    pub name: String,
    pub description: Vec<StyledLine>,
}

impl ArgDesc {
    pub fn new(name: impl Into<String>, description: Vec<StyledLine>) -> Self {
        Self {
            name: name.into(),
            description,
        }
    }

    /// Argument descriptors carrying only names.
    pub fn names(names: &[&str]) -> Vec<ArgDesc> {
        names
            .iter()
            .map(|name| ArgDesc::new(*name, Vec::new()))
            .collect()
    }
}

/// Structured help payload for a command or method call.
///
/// `valid == false` means "no structured help applies" and is shown as a
/// syntax marker. It is distinct from a valid description with no lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdDesc {
    main_desc: Vec<StyledLine>,
    arg_desc: Vec<ArgDesc>,
    opt_desc: HashMap<String, Vec<StyledLine>>,
    valid: bool,
}

impl CmdDesc {
    pub fn new(
        main_desc: Vec<StyledLine>,
        arg_desc: Vec<ArgDesc>,
        opt_desc: HashMap<String, Vec<StyledLine>>,
    ) -> Self {
        Self {
            main_desc,
            arg_desc,
            opt_desc,
            valid: true,
        }
    }

    /// Description with argument names only.
    pub fn from_args(arg_desc: Vec<ArgDesc>) -> Self {
        Self::new(Vec::new(), arg_desc, HashMap::new())
    }

    /// Description with summary lines only.
    pub fn from_main(main_desc: Vec<StyledLine>) -> Self {
        Self::new(main_desc, Vec::new(), HashMap::new())
    }

    /// The "invalid / syntax error" marker.
    pub fn invalid() -> Self {
        Self {
            main_desc: Vec::new(),
            arg_desc: Vec::new(),
            opt_desc: HashMap::new(),
            valid: false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn main_desc(&self) -> &[StyledLine] {
        &self.main_desc
    }

    pub fn arg_desc(&self) -> &[ArgDesc] {
        &self.arg_desc
    }

    pub fn opt_desc(&self) -> &HashMap<String, Vec<StyledLine>> {
        &self.opt_desc
    }

    /// True if a valid description has nothing to show.
    pub fn is_empty(&self) -> bool {
        self.main_desc.is_empty() && self.arg_desc.is_empty() && self.opt_desc.is_empty()
    }

    /// Flatten into at most `max_lines` display lines.
    ///
    /// Summary lines come first, then the argument names on one line, then
    /// options sorted by token.
    pub fn render(&self, max_lines: usize) -> Vec<StyledLine> {
        if !self.valid {
            return vec![StyledLine::error("Invalid command syntax")];
        }
        let mut out: Vec<StyledLine> = self.main_desc.clone();
        if !self.arg_desc.is_empty() {
            let names: Vec<&str> = self.arg_desc.iter().map(|a| a.name.as_str()).collect();
            out.push(StyledLine::plain(names.join(" ")));
            for arg in &self.arg_desc {
                for (i, line) in arg.description.iter().enumerate() {
                    let label = if i == 0 { arg.name.as_str() } else { "" };
                    out.push(StyledLine::new(
                        format!("  {label:<10} {}", line.text),
                        line.style,
                    ));
                }
            }
        }
        let mut opts: Vec<&String> = self.opt_desc.keys().collect();
        opts.sort();
        for opt in opts {
            let lines = &self.opt_desc[opt];
            if lines.is_empty() {
                out.push(StyledLine::plain(format!("  {opt}")));
            }
            for (i, line) in lines.iter().enumerate() {
                let label = if i == 0 { opt.as_str() } else { "" };
                out.push(StyledLine::new(
                    format!("  {label:<10} {}", line.text),
                    line.style,
                ));
            }
        }
        out.truncate(max_lines);
        out
    }
}
