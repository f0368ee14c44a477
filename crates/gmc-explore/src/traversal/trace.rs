//! Trace files: the integer guides that let a replay reconstruct a path.
//!
//! ```text
//! Session: demo            <- optional, application-defined preamble
//! Steps: 3
//! == Begin Trace ==
//! 1
//! 0
//! == End Trace ==
//! ```
//!
//! Each integer is the 0-based rank, among all transitions enabled at that
//! state, of the transition taken at a choice point. States with a single
//! enabled transition never appear in the guide.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

pub const BEGIN_TRACE: &str = "== Begin Trace ==";
pub const END_TRACE: &str = "== End Trace ==";
/// Preamble key carrying the number of transitions on the recorded path.
pub const STEPS_KEY: &str = "Steps:";

#[derive(Debug, thiserror::Error)]
pub enum GuideError {
    #[error("I/O error reading trace: {0}")]
    Io(#[from] io::Error),

    #[error("malformed trace file, line {line}: transition index is negative: {value}")]
    NegativeIndex { line: usize, value: i64 },

    #[error("malformed trace file, line {line}: expected integer, saw '{token}'")]
    NotAnInteger { line: usize, token: String },
}

/// Something that holds a path which can be written out as a guide.
pub trait TraceSource {
    /// Length of the trace, measured in states on the path.
    fn depth(&self) -> usize;

    /// Number of transitions on the recorded path.
    fn steps(&self) -> usize;

    /// Choice indices along the path, one per nondeterministic state.
    fn guide(&self) -> Vec<usize>;

    fn write_trace(&self, out: &mut dyn Write, preamble: &[String]) -> io::Result<()> {
        write_trace(out, preamble, &self.guide())
    }
}

/// A parsed trace file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guide {
    preamble: Vec<String>,
    choices: Vec<usize>,
}

impl Guide {
    pub fn new(choices: Vec<usize>) -> Self {
        Self {
            preamble: Vec::new(),
            choices,
        }
    }

    /// Parse a guide. Lines before `== Begin Trace ==` are preamble; when
    /// the sentinel is absent the whole input is the integer body. The body
    /// ends at `== End Trace ==` or end of input; blank lines are skipped.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, GuideError> {
        let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;
        let begin = lines.iter().position(|l| l.trim() == BEGIN_TRACE);
        let (preamble, body_start) = match begin {
            Some(i) => (lines[..i].to_vec(), i + 1),
            None => (Vec::new(), 0),
        };

        let mut choices = Vec::new();
        for (offset, raw) in lines[body_start..].iter().enumerate() {
            let line = raw.trim();
            if line == END_TRACE {
                break;
            }
            if line.is_empty() {
                continue;
            }
            let line_no = body_start + offset + 1;
            let value: i64 = line.parse().map_err(|_| GuideError::NotAnInteger {
                line: line_no,
                token: line.to_string(),
            })?;
            let index = usize::try_from(value).map_err(|_| GuideError::NegativeIndex {
                line: line_no,
                value,
            })?;
            choices.push(index);
        }

        Ok(Self { preamble, choices })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GuideError> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }

    pub fn choices(&self) -> &[usize] {
        &self.choices
    }

    pub fn into_choices(self) -> Vec<usize> {
        self.choices
    }

    pub fn preamble(&self) -> &[String] {
        &self.preamble
    }

    /// The `Steps: N` value from the preamble, if one was written.
    pub fn declared_steps(&self) -> Option<usize> {
        self.preamble.iter().find_map(|line| {
            line.trim()
                .strip_prefix(STEPS_KEY)
                .and_then(|rest| rest.trim().parse().ok())
        })
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}

/// Write a trace file: preamble lines, then the sentinel-wrapped guide.
pub fn write_trace(out: &mut dyn Write, preamble: &[String], choices: &[usize]) -> io::Result<()> {
    for line in preamble {
        writeln!(out, "{line}")?;
    }
    writeln!(out, "{BEGIN_TRACE}")?;
    for choice in choices {
        writeln!(out, "{choice}")?;
    }
    writeln!(out, "{END_TRACE}")?;
    out.flush()
}
