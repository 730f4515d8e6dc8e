use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Segment {
    Constant,
    Local,
    Static,
    Argument,
    This,
    That,
    Pointer,
    Temp,
}

impl Segment {
    pub fn name(self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::Argument => "argument",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StackOp {
    Push,
    Pop,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ArithOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl ArithOp {
    pub fn name(self) -> &'static str {
        match self {
            ArithOp::Add => "add",
            ArithOp::Sub => "sub",
            ArithOp::Neg => "neg",
            ArithOp::Eq => "eq",
            ArithOp::Gt => "gt",
            ArithOp::Lt => "lt",
            ArithOp::And => "and",
            ArithOp::Or => "or",
            ArithOp::Not => "not",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BranchKind {
    Label,
    Goto,
    IfGoto,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum FunctionKind {
    /// `function name nLocals`
    Function { name: String, locals: u32 },
    /// `call name nArgs`
    Call { name: String, args: u32 },
    Return,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Command {
    // Stack Basics
    Arithmetic(ArithOp),
    Memory(StackOp, Segment, u32),

    // Control
    Branch(BranchKind, String),
    Function(FunctionKind),
}

/// Renders the command the way it would be written in a `.vm` file.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Arithmetic(op) => write!(f, "{}", op.name()),
            Command::Memory(StackOp::Push, seg, index) => write!(f, "push {} {}", seg.name(), index),
            Command::Memory(StackOp::Pop, seg, index) => write!(f, "pop {} {}", seg.name(), index),
            Command::Branch(BranchKind::Label, label) => write!(f, "label {}", label),
            Command::Branch(BranchKind::Goto, label) => write!(f, "goto {}", label),
            Command::Branch(BranchKind::IfGoto, label) => write!(f, "if-goto {}", label),
            Command::Function(FunctionKind::Function { name, locals }) => {
                write!(f, "function {} {}", name, locals)
            }
            Command::Function(FunctionKind::Call { name, args }) => write!(f, "call {} {}", name, args),
            Command::Function(FunctionKind::Return) => write!(f, "return"),
        }
    }
}

/// A parsed command together with the source text it came from.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Statement<'a> {
    /// 1-based line number within the unit.
    pub line: usize,
    /// The line with its comment and surrounding whitespace removed.
    pub text: &'a str,
    pub command: Command,
}
