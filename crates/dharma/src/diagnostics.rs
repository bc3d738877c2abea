//! The diagnostic taxonomy (SPEC_FULL §7) and its ANSI-decorated rendering
//! (SPEC_FULL §4.7). A `Diagnostic` is a structured, renderer-agnostic value
//! first — the coloring and caret-drawing live only in `render`, the single
//! place that ever paints ANSI escapes.

use std::fmt;

use crate::source_map::SourceMap;

const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const WHITE: &str = "\x1b[37m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone)]
pub struct SyntaxError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ParseError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub line: u32,
    pub column: u32,
    pub message: String,
    pub width: u32,
}

impl RuntimeError {
    pub fn new(line: u32, column: u32, width: u32, message: impl Into<String>) -> Self {
        RuntimeError {
            line,
            column,
            width: width.max(1),
            message: message.into(),
        }
    }
}

/// Warnings never halt anything, so they live outside `DharmaError`
/// entirely (SPEC_FULL §7) — callers accumulate them in a side channel.
#[derive(Debug, Clone)]
pub enum Warning {
    SemiColon {
        line: u32,
        column: u32,
    },
    ImplicitConversion {
        line: u32,
        column: u32,
        from: &'static str,
        to: &'static str,
    },
}

impl Warning {
    fn message(&self) -> String {
        match self {
            Warning::SemiColon { .. } => "Implicit semicolon inserted.".to_owned(),
            Warning::ImplicitConversion { from, to, .. } => {
                format!("Implicit conversion from '{from}' to '{to}'.")
            }
        }
    }

    fn position(&self) -> (u32, u32) {
        match self {
            Warning::SemiColon { line, column } | Warning::ImplicitConversion { line, column, .. } => {
                (*line, *column)
            }
        }
    }
}

/// The three error kinds, unified at the crate's public API boundary
/// (grounded on `repl_error.rs`'s hand-written error-enum pattern: manual
/// `Display`, one `From` impl per source variant, no `thiserror`).
#[derive(Debug, Clone)]
pub enum DharmaError {
    Syntax(SyntaxError),
    Parse(ParseError),
    Runtime(RuntimeError),
}

impl fmt::Display for DharmaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DharmaError::Syntax(e) => write!(f, "SyntaxError: {}", e.message),
            DharmaError::Parse(e) => write!(f, "ParseError: {}", e.message),
            DharmaError::Runtime(e) => write!(f, "RuntimeError: {}", e.message),
        }
    }
}

impl From<SyntaxError> for DharmaError {
    fn from(e: SyntaxError) -> Self {
        DharmaError::Syntax(e)
    }
}

impl From<ParseError> for DharmaError {
    fn from(e: ParseError) -> Self {
        DharmaError::Parse(e)
    }
}

impl From<RuntimeError> for DharmaError {
    fn from(e: RuntimeError) -> Self {
        DharmaError::Runtime(e)
    }
}

/// A diagnostic reduced to exactly what rendering needs: a label, a
/// message, a position, and a caret width. Errors and warnings both
/// convert into this before being printed, so the rendering path doesn't
/// need to match on the richer source types.
pub struct Diagnostic {
    pub label: &'static str,
    pub message: String,
    pub line: u32,
    pub column: u32,
    pub caret_width: u32,
    pub is_warning: bool,
}

impl Diagnostic {
    pub fn render(&self, source: &SourceMap) -> String {
        let color = if self.is_warning { YELLOW } else { RED };
        let mut out = format!(
            "{color}[line {}, column {}] {}:{RESET} {WHITE}{}{RESET}\n\n",
            self.line, self.column, self.label, self.message
        );
        if let Some(context) = source.line(self.line) {
            out.push_str("\t\t");
            out.push_str(context);
            out.push('\n');
            out.push_str("\t\t");
            let indent = " ".repeat(self.column.saturating_sub(1) as usize);
            out.push_str(&indent);
            out.push_str(color);
            let width = if self.is_warning { 1 } else { self.caret_width.max(1) };
            out.push_str(&"^".repeat(width as usize));
            out.push_str(RESET);
            out.push('\n');
        }
        out
    }
}

impl From<&SyntaxError> for Diagnostic {
    fn from(e: &SyntaxError) -> Self {
        Diagnostic {
            label: "SyntaxError",
            message: e.message.clone(),
            line: e.line,
            column: e.column,
            caret_width: 1,
            is_warning: false,
        }
    }
}

impl From<&ParseError> for Diagnostic {
    fn from(e: &ParseError) -> Self {
        Diagnostic {
            label: "ParseError",
            message: e.message.clone(),
            line: e.line,
            column: e.column,
            caret_width: 1,
            is_warning: false,
        }
    }
}

impl From<&RuntimeError> for Diagnostic {
    fn from(e: &RuntimeError) -> Self {
        Diagnostic {
            label: "RuntimeError",
            message: e.message.clone(),
            line: e.line,
            column: e.column,
            caret_width: e.width,
            is_warning: false,
        }
    }
}

impl From<&Warning> for Diagnostic {
    fn from(w: &Warning) -> Self {
        let (line, column) = w.position();
        Diagnostic {
            label: match w {
                Warning::SemiColon { .. } => "SemiColonWarning",
                Warning::ImplicitConversion { .. } => "ImplicitConversionWarning",
            },
            message: w.message(),
            line,
            column,
            caret_width: 1,
            is_warning: true,
        }
    }
}

impl From<&DharmaError> for Diagnostic {
    fn from(e: &DharmaError) -> Self {
        match e {
            DharmaError::Syntax(e) => e.into(),
            DharmaError::Parse(e) => e.into(),
            DharmaError::Runtime(e) => e.into(),
        }
    }
}
