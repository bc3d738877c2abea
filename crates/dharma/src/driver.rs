//! The pipeline that wires lexer → parser → resolver → interpreter
//! together, and the two front ends built on it: run a whole source file,
//! or keep one interpreter alive across a REPL session (SPEC_FULL §4.8).

use std::io::Write;

use crate::config::Config;
use crate::diagnostics::{Diagnostic, Warning};
use crate::interpreter::Interpreter;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::source_map::SourceMap;

/// Everything produced by running one chunk of source: the rendered
/// diagnostics (if any halted execution) and the warnings collected along
/// the way, already rendered against that chunk's own `SourceMap`.
pub struct RunOutcome {
    pub ok: bool,
    pub rendered: Vec<String>,
}

/// Runs a complete, self-contained program: one lexer/parser/resolver pass
/// followed by a fresh `Interpreter`. Used for `karma script.dh`.
pub fn run_source(source: &str, config: Config, out: Box<dyn Write>) -> RunOutcome {
    let map = SourceMap::new(source);
    let mut rendered = Vec::new();

    let (tokens, lex_errors) = Lexer::new(source).scan_tokens();
    if !lex_errors.is_empty() {
        for e in &lex_errors {
            rendered.push(Diagnostic::from(e).render(&map));
        }
        return RunOutcome { ok: false, rendered };
    }

    let outcome = Parser::new(tokens, config).parse();
    render_warnings(&outcome.warnings, &map, &mut rendered);
    if !outcome.errors.is_empty() {
        for e in &outcome.errors {
            rendered.push(Diagnostic::from(e).render(&map));
        }
        return RunOutcome { ok: false, rendered };
    }

    let resolved = Resolver::new().resolve(&outcome.statements);
    if !resolved.errors.is_empty() {
        for e in &resolved.errors {
            rendered.push(Diagnostic::from(e).render(&map));
        }
        return RunOutcome { ok: false, rendered };
    }

    let mut interpreter = Interpreter::new(resolved.depths, config, out);
    let result = interpreter.run(&outcome.statements);
    render_warnings(&interpreter.warnings, &map, &mut rendered);
    match result {
        Ok(()) => RunOutcome { ok: true, rendered },
        Err(e) => {
            rendered.push(Diagnostic::from(&e).render(&map));
            RunOutcome { ok: false, rendered }
        }
    }
}

fn render_warnings(warnings: &[Warning], map: &SourceMap, rendered: &mut Vec<String>) {
    for w in warnings {
        rendered.push(Diagnostic::from(w).render(map));
    }
}

/// A session that keeps one `Interpreter` (and therefore one `globals`
/// environment) alive across repeated `feed` calls, so bindings persist
/// from one REPL line to the next (SPEC_FULL §4.8, §9 — a deliberate
/// departure from the source's per-line fresh-interpreter REPL, recorded
/// in DESIGN.md).
pub struct Repl {
    interpreter: Interpreter,
    config: Config,
}

impl Repl {
    pub fn new(config: Config, out: Box<dyn Write>) -> Self {
        Repl { interpreter: Interpreter::new(Default::default(), config, out), config }
    }

    /// Lexes, parses, resolves, and evaluates one line (or block) of
    /// input against the session's running interpreter state. Resolver
    /// depths are recomputed fresh each call and merged in, since each
    /// line's `NodeId`s are only unique within that line's own parse.
    pub fn feed(&mut self, line: &str) -> RunOutcome {
        let map = SourceMap::new(line);
        let mut rendered = Vec::new();

        let (tokens, lex_errors) = Lexer::new(line).scan_tokens();
        if !lex_errors.is_empty() {
            for e in &lex_errors {
                rendered.push(Diagnostic::from(e).render(&map));
            }
            return RunOutcome { ok: false, rendered };
        }

        let outcome = Parser::new(tokens, self.config).parse();
        render_warnings(&outcome.warnings, &map, &mut rendered);
        if !outcome.errors.is_empty() {
            for e in &outcome.errors {
                rendered.push(Diagnostic::from(e).render(&map));
            }
            return RunOutcome { ok: false, rendered };
        }

        let resolved = Resolver::new().resolve(&outcome.statements);
        if !resolved.errors.is_empty() {
            for e in &resolved.errors {
                rendered.push(Diagnostic::from(e).render(&map));
            }
            return RunOutcome { ok: false, rendered };
        }

        self.interpreter.merge_depths(resolved.depths);
        let result = self.interpreter.run(&outcome.statements);
        render_warnings(&self.interpreter.warnings, &map, &mut rendered);
        self.interpreter.warnings.clear();
        match result {
            Ok(()) => RunOutcome { ok: true, rendered },
            Err(e) => {
                rendered.push(Diagnostic::from(&e).render(&map));
                RunOutcome { ok: false, rendered }
            }
        }
    }
}
