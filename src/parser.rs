use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{digit1, satisfy, space1},
    combinator::{all_consuming, map, map_res, recognize, value},
    sequence::{pair, tuple},
    IResult,
};

use crate::ast::{ArithOp, BranchKind, Command, FunctionKind, Segment, Statement, StackOp};
use crate::error::ParseError;

fn integer(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |c: &str| c.parse())(input)
}

fn segment(input: &str) -> IResult<&str, Segment> {
    alt((
        value(Segment::Constant, tag("constant")),
        value(Segment::Local, tag("local")),
        value(Segment::Static, tag("static")),
        value(Segment::Argument, tag("argument")),
        value(Segment::This, tag("this")),
        value(Segment::That, tag("that")),
        value(Segment::Pointer, tag("pointer")),
        value(Segment::Temp, tag("temp")),
    ))(input)
}

fn stack_op(input: &str) -> IResult<&str, StackOp> {
    alt((value(StackOp::Push, tag("push")), value(StackOp::Pop, tag("pop"))))(input)
}

fn memory(input: &str) -> IResult<&str, Command> {
    map(
        tuple((stack_op, space1, segment, space1, integer)),
        |(op, _, segment, _, index)| Command::Memory(op, segment, index),
    )(input)
}

#[test]
fn test_memory() {
    assert_eq!(
        memory("push  pointer  1"),
        Ok(("", Command::Memory(StackOp::Push, Segment::Pointer, 1)))
    );
    // pop constant is well-formed; the translator rejects it
    assert_eq!(
        memory("pop constant 3"),
        Ok(("", Command::Memory(StackOp::Pop, Segment::Constant, 3)))
    );
}

fn arithmetic(input: &str) -> IResult<&str, Command> {
    map(
        alt((
            value(ArithOp::Add, tag("add")),
            value(ArithOp::Sub, tag("sub")),
            value(ArithOp::Neg, tag("neg")),
            value(ArithOp::Eq, tag("eq")),
            value(ArithOp::Gt, tag("gt")),
            value(ArithOp::Lt, tag("lt")),
            value(ArithOp::And, tag("and")),
            value(ArithOp::Or, tag("or")),
            value(ArithOp::Not, tag("not")),
        )),
        Command::Arithmetic,
    )(input)
}

#[test]
fn test_arithmetic() {
    assert_eq!(arithmetic("neg"), Ok(("", Command::Arithmetic(ArithOp::Neg))));
}

fn is_symbol_start(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '_' | '.' | ':')
}

/// Letters, `_`, `.` and `:`, with digits and `$` allowed after the first character.
fn symbol(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            satisfy(is_symbol_start),
            take_while(|c: char| is_symbol_start(c) || c.is_ascii_digit() || c == '$'),
        )),
        |sym: &str| sym.to_string(),
    )(input)
}

#[test]
fn test_symbol() {
    assert_eq!(symbol("Main.loop_1:x"), Ok(("", "Main.loop_1:x".to_string())));
    assert_eq!(symbol("Foo.bar$ret.0"), Ok(("", "Foo.bar$ret.0".to_string())));
    assert!(symbol("1abc").is_err());
    assert!(symbol("$abc").is_err());
}

fn branching(input: &str) -> IResult<&str, Command> {
    map(
        tuple((
            alt((
                value(BranchKind::Label, tag("label")),
                value(BranchKind::Goto, tag("goto")),
                value(BranchKind::IfGoto, tag("if-goto")),
            )),
            space1,
            symbol,
        )),
        |(kind, _, sym)| Command::Branch(kind, sym),
    )(input)
}

fn function(input: &str) -> IResult<&str, Command> {
    alt((
        value(Command::Function(FunctionKind::Return), tag("return")),
        map(
            tuple((tag("function"), space1, symbol, space1, integer)),
            |(_, _, name, _, locals)| Command::Function(FunctionKind::Function { name, locals }),
        ),
        map(
            tuple((tag("call"), space1, symbol, space1, integer)),
            |(_, _, name, _, args)| Command::Function(FunctionKind::Call { name, args }),
        ),
    ))(input)
}

#[test]
fn test_function() {
    assert_eq!(
        function("call Math.multiply 2"),
        Ok((
            "",
            Command::Function(FunctionKind::Call {
                name: "Math.multiply".to_string(),
                args: 2
            })
        ))
    );
}

/// Each form must consume the whole line; a keyword followed by junk is an error, not a prefix match.
fn command(line: &str) -> Option<Command> {
    alt((
        all_consuming(arithmetic),
        all_consuming(memory),
        all_consuming(branching),
        all_consuming(function),
    ))(line)
    .ok()
    .map(|(_, command)| command)
}

/// Strips the trailing `//` comment and surrounding whitespace.
fn strip(line: &str) -> &str {
    line.split_once("//").map(|(s, _)| s).unwrap_or(line).trim()
}

pub fn parse_statements(input: &str) -> Result<Vec<Statement<'_>>, ParseError> {
    let mut statements = vec![];

    for (number, line) in input.lines().enumerate() {
        let text = strip(line);
        if text.is_empty() {
            continue;
        }

        match command(text) {
            Some(command) => statements.push(Statement {
                line: number + 1,
                text,
                command,
            }),
            None => {
                return Err(ParseError {
                    line: number + 1,
                    text: text.to_string(),
                })
            }
        }
    }

    Ok(statements)
}

pub fn parse(input: &str) -> Result<Vec<Command>, ParseError> {
    Ok(parse_statements(input)?
        .into_iter()
        .map(|statement| statement.command)
        .collect())
}
