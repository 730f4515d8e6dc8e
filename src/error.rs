use thiserror::Error;

/// A source line that matched none of the command forms.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: invalid command `{text}`")]
pub struct ParseError {
    /// 1-based line number within the unit.
    pub line: usize,
    pub text: String,
}

/// A well-formed command the target machine cannot express.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticError {
    #[error("cannot pop into the constant segment")]
    PopConstant,

    #[error("pointer index {0} is out of range (expected 0 or 1)")]
    PointerIndex(u32),

    #[error("temp index {0} is out of range (expected 0..=7)")]
    TempIndex(u32),

    #[error("constant {0} does not fit in an A-instruction (max 32767)")]
    ConstantOutOfRange(u32),

    #[error("index {0} does not fit in an A-instruction (max 32767)")]
    IndexOutOfRange(u32),

    #[error("count {0} does not fit in an A-instruction (max 32767)")]
    CountOutOfRange(u32),
}

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("{unit}: {source}")]
    Parse {
        unit: String,
        #[source]
        source: ParseError,
    },

    #[error("{unit}: `{command}`: {source}")]
    Semantic {
        unit: String,
        command: String,
        #[source]
        source: SemanticError,
    },
}
