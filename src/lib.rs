//! Translator from the stack-based VM language to Hack assembly.
//!
//! - `parser` turns source text into validated [`Command`]s.
//! - `translator` emits assembly per command, threading a [`GeneratorContext`].
//! - `bootstrap` emits the prologue that starts a program.
//!
//! A [`Run`] ties these together: every unit translated through one run shares
//! a single context, so generated labels never collide between units, and the
//! bootstrap is written exactly once.

macro_rules! svec {
    ($($x:expr),* $(,)?) => (vec![$($x.to_string()),*]);
}

pub mod ast;
pub mod bootstrap;
pub mod error;
pub mod parser;
pub mod translator;

use log::debug;

pub use ast::{Command, Statement};
pub use bootstrap::Bootstrap;
pub use error::{ParseError, SemanticError, TranslateError};
pub use translator::{generate, generate_statements, GeneratorContext};

/// One translation run: a bootstrap plus any number of units.
///
/// The run boundary is the reset point for label numbering. Units added to the
/// same `Run` continue each other's counters; a new `Run` starts from zero.
#[derive(Debug, Default)]
pub struct Run {
    bootstrap: Option<Bootstrap>,
    ctx: GeneratorContext,
    output: String,
}

impl Run {
    pub fn new(bootstrap: Option<Bootstrap>) -> Self {
        Run {
            bootstrap,
            ctx: GeneratorContext::new(),
            output: String::new(),
        }
    }

    pub fn context(&self) -> &GeneratorContext {
        &self.ctx
    }

    /// Parses and translates one unit, appending its assembly to the run.
    ///
    /// On error the run must be abandoned; its output is incomplete.
    pub fn translate_unit(&mut self, unit: &str, source: &str) -> Result<(), TranslateError> {
        let statements = parser::parse_statements(source).map_err(|source| TranslateError::Parse {
            unit: unit.to_string(),
            source,
        })?;
        let text = generate_statements(&statements, unit, &mut self.ctx)?;
        debug!(
            "translated unit {} ({} commands, {} comparisons, {} call sites so far)",
            unit,
            statements.len(),
            self.ctx.comparisons(),
            self.ctx.call_sites()
        );
        self.output.push_str(&text);
        Ok(())
    }

    /// Bootstrap (if any) followed by every unit in the order they were added.
    pub fn finish(self) -> String {
        match self.bootstrap {
            Some(bootstrap) => bootstrap.emit() + &self.output,
            None => self.output,
        }
    }
}

/// Translates `(unit name, source)` pairs as a single run.
pub fn translate(units: &[(&str, &str)], bootstrap: Option<Bootstrap>) -> Result<String, TranslateError> {
    let mut run = Run::new(bootstrap);
    for (unit, source) in units {
        run.translate_unit(unit, source)?;
    }
    Ok(run.finish())
}
