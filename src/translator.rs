use log::trace;

use crate::ast::{ArithOp, BranchKind, Command, FunctionKind, Segment, Statement, StackOp};
use crate::error::{SemanticError, TranslateError};

/// Largest value an A-instruction can load.
const MAX_CONSTANT: u32 = 0x7fff;
const TEMP_BASE: u32 = 5;
const TEMP_SIZE: u32 = 8;

pub(crate) fn at_c(arg: u32) -> String {
    format!("@{arg}", arg = arg)
}

pub(crate) fn at_s(arg: &str) -> String {
    format!("@{arg}", arg = arg)
}

fn label(sym: &str) -> String {
    format!("({})", sym)
}

/// D -> *SP, SP++
fn push_d() -> Vec<String> {
    svec!["@SP", "A=M", "M=D", "@SP", "M=M+1"]
}

/// SP--, D <- *SP
fn pop_d() -> Vec<String> {
    svec!["@SP", "AM=M-1", "D=M"]
}

/// Indices that end up in an `@n` instruction.
fn encodable(index: u32) -> Result<u32, SemanticError> {
    if index > MAX_CONSTANT {
        return Err(SemanticError::IndexOutOfRange(index));
    }
    Ok(index)
}

fn pointer_register(index: u32) -> Result<&'static str, SemanticError> {
    match index {
        0 => Ok("THIS"),
        1 => Ok("THAT"),
        _ => Err(SemanticError::PointerIndex(index)),
    }
}

fn temp_register(index: u32) -> Result<String, SemanticError> {
    if index >= TEMP_SIZE {
        return Err(SemanticError::TempIndex(index));
    }
    Ok(format!("R{}", TEMP_BASE + index))
}

/// Push microcode for the four based segments
fn seg_push(base: &str, index: u32) -> Vec<String> {
    let mut out = svec![
        at_s(base),
        "D=M",
        at_c(index),
        "A=D+A", // A = base+index
        "D=M"
    ];
    out.extend(push_d());
    out
}

fn seg_pop(base: &str, index: u32) -> Vec<String> {
    let mut out = pop_d();
    out.extend(svec![
        "@R13",
        "M=D", // popped value
        at_s(base),
        "D=M",
        at_c(index),
        "D=D+A",
        "@R14",
        "M=D", // destination address
        "@R13",
        "D=M",
        "@R14",
        "A=M",
        "M=D"
    ]);
    out
}

/// Segments that live at a fixed symbol: static, temp and pointer.
fn seg_push_direct(sym: &str) -> Vec<String> {
    let mut out = svec![at_s(sym), "D=M"];
    out.extend(push_d());
    out
}

fn seg_pop_direct(sym: &str) -> Vec<String> {
    let mut out = pop_d();
    out.extend(svec![at_s(sym), "M=D"]);
    out
}

fn simple_un_op(op: char) -> Vec<String> {
    svec!["@SP", "A=M-1", format!("M={}M", op)]
}

/// Leaves the right operand in D and A pointing at the left operand, which becomes the new top.
fn pop_operands() -> Vec<String> {
    let mut out = pop_d();
    out.extend(svec!["@SP", "AM=M-1"]);
    out
}

// i.e. no conditions or jumps, just pop and run
fn simple_bin_op(comp: &str) -> Vec<String> {
    let mut out = pop_operands();
    out.extend(svec![format!("M={}", comp), "@SP", "M=M+1"]);
    out
}

/// Mutable state shared by every unit of one translation run.
///
/// Comparison and call-site counters only ever grow, so the labels they name stay
/// unique across all units translated with the same context. Start a new context
/// for each independent run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GeneratorContext {
    current_function: Option<String>,
    comparisons: usize,
    call_sites: usize,
}

impl GeneratorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_function(&self) -> Option<&str> {
        self.current_function.as_deref()
    }

    /// Number of `eq`/`gt`/`lt` commands emitted so far.
    pub fn comparisons(&self) -> usize {
        self.comparisons
    }

    /// Number of `call` commands emitted so far.
    pub fn call_sites(&self) -> usize {
        self.call_sites
    }

    fn next_comparison(&mut self) -> usize {
        let tmp = self.comparisons;
        self.comparisons += 1;
        tmp
    }

    fn next_call_site(&mut self) -> usize {
        let tmp = self.call_sites;
        self.call_sites += 1;
        tmp
    }
}

/// Code generator for one unit, borrowing the run's context.
pub struct Translator<'a> {
    unit: &'a str,
    ctx: &'a mut GeneratorContext,
}

impl<'a> Translator<'a> {
    pub fn new(unit: &'a str, ctx: &'a mut GeneratorContext) -> Self {
        Translator { unit, ctx }
    }

    fn push(&self, segment: Segment, index: u32) -> Result<Vec<String>, SemanticError> {
        Ok(match segment {
            Segment::Constant => {
                if index > MAX_CONSTANT {
                    return Err(SemanticError::ConstantOutOfRange(index));
                }
                let mut out = svec![at_c(index), "D=A"];
                out.extend(push_d());
                out
            }
            Segment::Local => seg_push("LCL", encodable(index)?),
            Segment::Argument => seg_push("ARG", encodable(index)?),
            Segment::This => seg_push("THIS", encodable(index)?),
            Segment::That => seg_push("THAT", encodable(index)?),
            Segment::Static => seg_push_direct(&self.static_sym(index)),
            Segment::Temp => seg_push_direct(&temp_register(index)?),
            Segment::Pointer => seg_push_direct(pointer_register(index)?),
        })
    }

    fn pop(&self, segment: Segment, index: u32) -> Result<Vec<String>, SemanticError> {
        Ok(match segment {
            Segment::Constant => return Err(SemanticError::PopConstant),
            Segment::Local => seg_pop("LCL", encodable(index)?),
            Segment::Argument => seg_pop("ARG", encodable(index)?),
            Segment::This => seg_pop("THIS", encodable(index)?),
            Segment::That => seg_pop("THAT", encodable(index)?),
            Segment::Static => seg_pop_direct(&self.static_sym(index)),
            Segment::Temp => seg_pop_direct(&temp_register(index)?),
            Segment::Pointer => seg_pop_direct(pointer_register(index)?),
        })
    }

    fn static_sym(&self, index: u32) -> String {
        format!("{}.{}", self.unit, index)
    }

    fn compare(&mut self, jump: &str) -> Vec<String> {
        let n = self.ctx.next_comparison();
        let false_sym = format!("FALSE_{}", n);
        let true_sym = format!("TRUE_{}", n);
        let end_sym = format!("ENDIF_{}", n);
        let mut out = pop_operands();
        out.extend(svec![
            "D=M-D", // left - right
            at_s(&true_sym),
            format!("D;J{}", jump),
            label(&false_sym),
            "@SP",
            "A=M",
            "M=0",
            at_s(&end_sym),
            "0;JMP",
            label(&true_sym),
            "@SP",
            "A=M",
            "M=-1",
            label(&end_sym),
            "@SP",
            "M=M+1"
        ]);
        out
    }

    fn arithmetic(&mut self, op: ArithOp) -> Vec<String> {
        match op {
            ArithOp::Add => simple_bin_op("D+M"),
            ArithOp::Sub => simple_bin_op("M-D"),
            ArithOp::And => simple_bin_op("D&M"),
            ArithOp::Or => simple_bin_op("D|M"),
            ArithOp::Neg => simple_un_op('-'),
            ArithOp::Not => simple_un_op('!'),
            ArithOp::Eq => self.compare("EQ"),
            ArithOp::Gt => self.compare("GT"),
            ArithOp::Lt => self.compare("LT"),
        }
    }

    /// Labels inside a function are private to it; top-level labels are global.
    fn label_to_sym(&self, label: &str) -> String {
        match self.ctx.current_function() {
            Some(function) => format!("{}.{}${}", self.unit, function, label),
            None => label.to_string(),
        }
    }

    fn branch(&self, kind: BranchKind, target: &str) -> Vec<String> {
        let sym = self.label_to_sym(target);
        match kind {
            BranchKind::Label => svec![label(&sym)],
            BranchKind::Goto => svec![at_s(&sym), "0;JMP"],
            BranchKind::IfGoto => {
                let mut out = pop_d();
                out.extend(svec![at_s(&sym), "D;JNE"]); // false is 0
                out
            }
        }
    }

    /// Entry label, then a runtime loop pushing `locals` zeros with R13 as the counter.
    fn function(&mut self, name: &str, locals: u32) -> Result<Vec<String>, SemanticError> {
        if locals > MAX_CONSTANT {
            return Err(SemanticError::CountOutOfRange(locals));
        }
        self.ctx.current_function = Some(name.to_string());
        let entry = format!("{}.{}", self.unit, name);
        let loop_sym = format!("{}$__LOCALS_LOOP__", entry);
        let end_sym = format!("{}$__LOCALS_END__", entry);

        let mut out = svec![
            label(&entry),
            label(name),
            "@R13",
            "M=0",
            label(&loop_sym),
            at_c(locals),
            "D=A",
            "@R13",
            "D=D-M",
            at_s(&end_sym),
            "D;JEQ",
            "D=0"
        ];
        out.extend(push_d());
        out.extend(svec!["@R13", "M=M+1", at_s(&loop_sym), "0;JMP", label(&end_sym)]);
        Ok(out)
    }

    fn call(&mut self, name: &str, args: u32) -> Result<Vec<String>, SemanticError> {
        if args > MAX_CONSTANT {
            return Err(SemanticError::CountOutOfRange(args));
        }
        let return_sym = format!("{}.{}$ret.{}", self.unit, name, self.ctx.next_call_site());

        let mut out = svec![at_s(&return_sym), "D=A"];
        out.extend(push_d());
        for register in ["LCL", "ARG", "THIS", "THAT"] {
            out.extend(svec![at_s(register), "D=M"]);
            out.extend(push_d());
        }
        out.extend(svec![
            // ARG = SP - 5 - args
            "@SP",
            "D=M",
            "@5",
            "D=D-A",
            at_c(args),
            "D=D-A",
            "@ARG",
            "M=D",
            // LCL = SP
            "@SP",
            "D=M",
            "@LCL",
            "M=D",
            at_s(name),
            "0;JMP",
            label(&return_sym)
        ]);
        Ok(out)
    }

    /// The frame is anchored at the callee's LCL, saved in R13; the return address goes to R14.
    fn ret(&mut self) -> Vec<String> {
        self.ctx.current_function = None;

        let mut out = svec![
            "@LCL",
            "D=M",
            "@R13",
            "M=D",
            // R14 = *(frame - 5)
            "@5",
            "A=D-A",
            "D=M",
            "@R14",
            "M=D"
        ];
        out.extend(pop_d());
        out.extend(svec!["@ARG", "A=M", "M=D", "@ARG", "D=M+1", "@SP", "M=D"]);
        for (register, offset) in [("THAT", 1), ("THIS", 2), ("ARG", 3), ("LCL", 4)] {
            out.extend(svec![
                "@R13",
                "D=M",
                at_c(offset),
                "A=D-A",
                "D=M",
                at_s(register),
                "M=D"
            ]);
        }
        out.extend(svec!["@R14", "A=M", "0;JMP"]);
        out
    }

    fn emit(&mut self, command: &Command) -> Result<Vec<String>, SemanticError> {
        Ok(match command {
            Command::Arithmetic(op) => self.arithmetic(*op),
            Command::Memory(StackOp::Push, seg, index) => self.push(*seg, *index)?,
            Command::Memory(StackOp::Pop, seg, index) => self.pop(*seg, *index)?,
            Command::Branch(kind, target) => self.branch(*kind, target),
            Command::Function(FunctionKind::Function { name, locals }) => self.function(name, *locals)?,
            Command::Function(FunctionKind::Call { name, args }) => self.call(name, *args)?,
            Command::Function(FunctionKind::Return) => self.ret(),
        })
    }

    /// Emits `command` preceded by a `// text` comment line.
    fn translate_one(
        &mut self,
        command: &Command,
        text: &str,
        instructions: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        trace!("{}: {}", self.unit, text);
        let translated = self.emit(command).map_err(|source| TranslateError::Semantic {
            unit: self.unit.to_string(),
            command: text.to_string(),
            source,
        })?;

        instructions.push(format!("// {}", text));
        instructions.extend(translated);
        Ok(())
    }

    /// Comments echo each command in its canonical form.
    pub fn translate(&mut self, commands: &[Command]) -> Result<Vec<String>, TranslateError> {
        let mut instructions: Vec<String> = vec![];
        for command in commands {
            self.translate_one(command, &command.to_string(), &mut instructions)?;
        }
        Ok(instructions)
    }

    /// Comments echo each command as it was written in the source.
    pub fn translate_statements(&mut self, statements: &[Statement]) -> Result<Vec<String>, TranslateError> {
        let mut instructions: Vec<String> = vec![];
        for statement in statements {
            self.translate_one(&statement.command, statement.text, &mut instructions)?;
        }
        Ok(instructions)
    }
}

fn into_text(lines: Vec<String>) -> String {
    let mut text = lines.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    text
}

/// Translates one unit's commands to newline-terminated assembly text.
pub fn generate(
    commands: &[Command],
    unit: &str,
    ctx: &mut GeneratorContext,
) -> Result<String, TranslateError> {
    Translator::new(unit, ctx).translate(commands).map(into_text)
}

/// Like [`generate`], but comment lines keep the source spelling of each command.
pub fn generate_statements(
    statements: &[Statement],
    unit: &str,
    ctx: &mut GeneratorContext,
) -> Result<String, TranslateError> {
    Translator::new(unit, ctx).translate_statements(statements).map(into_text)
}
