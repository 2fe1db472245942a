//! Three-Address Code

use std::fmt::{self, Display, Formatter};

use log::trace;

use crate::listing::{Listing, Position};

pub type TargetSize = i64;

/// The instruction stream produced by a generation run.
pub type TacListing = Listing<Quadruple>;

/// Name of the frame base register that [`Addr`] offsets are relative to.
pub const FRAME_POINTER: &str = "fp";

/// A constant value. Booleans are encoded as the integers `0` and `1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Const {
    Int(TargetSize),
    Str(String),
    Null,
}
impl Const {
    /// Returns the truth value of a constant, if it has one.
    pub fn truthiness(&self) -> Option<bool> {
        match self {
            Const::Int(i) => Some(*i != 0),
            Const::Null => Some(false),
            Const::Str(_) => None,
        }
    }
}
impl From<TargetSize> for Const {
    fn from(value: TargetSize) -> Self {
        Const::Int(value)
    }
}
impl From<i32> for Const {
    fn from(value: i32) -> Self {
        Const::Int(value.into())
    }
}
impl From<bool> for Const {
    fn from(value: bool) -> Self {
        Const::Int(value as TargetSize)
    }
}
impl From<&str> for Const {
    fn from(value: &str) -> Self {
        Const::Str(value.to_string())
    }
}
impl Display for Const {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Const::Int(i) => write!(f, "{}", i),
            Const::Str(s) => write!(f, "\"{}\"", s),
            Const::Null => f.write_str("null"),
        }
    }
}

/// A compiler-introduced scratch value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Temp(String);
impl Temp {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}
impl Display for Temp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A jump target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(String);
impl Label {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}
impl Display for Label {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An address relative to a base, such as a frame slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Addr {
    pub base: String,
    pub offset: isize,
}
impl Addr {
    pub fn new<S: Into<String>>(base: S, offset: isize) -> Self {
        Self {
            base: base.into(),
            offset,
        }
    }
}
impl Display for Addr {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "&({}+{})", self.base, self.offset)
    }
}

/// A TAC operand. Operands are never mutated after construction and compare by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    Const(Const),
    /// A named source-level binding, resolved by name rather than by address.
    Var(String),
    Temp(Temp),
    Label(Label),
    Addr(Addr),
}
impl Operand {
    pub fn var<S: Into<String>>(name: S) -> Self {
        Operand::Var(name.into())
    }

    pub fn as_temp(&self) -> Option<&Temp> {
        match self {
            Operand::Temp(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_const(&self) -> Option<&Const> {
        match self {
            Operand::Const(c) => Some(c),
            _ => None,
        }
    }
}
impl Display for Operand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Operand::Const(c) => c.fmt(f),
            Operand::Var(name) => f.write_str(name),
            Operand::Temp(t) => t.fmt(f),
            Operand::Label(l) => l.fmt(f),
            Operand::Addr(a) => a.fmt(f),
        }
    }
}
impl From<Const> for Operand {
    fn from(value: Const) -> Self {
        Operand::Const(value)
    }
}
impl From<Temp> for Operand {
    fn from(value: Temp) -> Self {
        Operand::Temp(value)
    }
}
impl From<Label> for Operand {
    fn from(value: Label) -> Self {
        Operand::Label(value)
    }
}
impl From<Addr> for Operand {
    fn from(value: Addr) -> Self {
        Operand::Addr(value)
    }
}

/// The operator vocabulary understood by backends consuming the instruction stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// `dst := a`
    Copy,
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Equal,
    NotEqual,
    Label,
    Goto,
    /// Jump to `dst` if `a` is non-zero.
    IfGoto,
    Param,
    /// Call the function named by `a` with `b` arguments, binding the result to `dst`.
    Call,
    Return,
    Print,
    AddrIndex,
    AddrField,
    Load,
    Store,
}
impl Op {
    pub fn symbol(&self) -> &'static str {
        match self {
            Op::Copy => ":=",
            Op::Add => "+",
            Op::Subtract => "-",
            Op::Multiply => "*",
            Op::Divide => "/",
            Op::Remainder => "%",
            Op::LessThan => "<",
            Op::LessThanEqual => "<=",
            Op::GreaterThan => ">",
            Op::GreaterThanEqual => ">=",
            Op::Equal => "==",
            Op::NotEqual => "!=",
            Op::Label => "label",
            Op::Goto => "goto",
            Op::IfGoto => "ifgoto",
            Op::Param => "param",
            Op::Call => "call",
            Op::Return => "ret",
            Op::Print => "print",
            Op::AddrIndex => "addr_index",
            Op::AddrField => "addr_field",
            Op::Load => "load",
            Op::Store => "store",
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            Op::Add
                | Op::Subtract
                | Op::Multiply
                | Op::Divide
                | Op::Remainder
                | Op::LessThan
                | Op::LessThanEqual
                | Op::GreaterThan
                | Op::GreaterThanEqual
                | Op::Equal
                | Op::NotEqual
        )
    }
}
impl Display for Op {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single TAC instruction: an operator with up to two sources and one destination.
/// The meaning of each slot depends on the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quadruple {
    pub op: Op,
    pub a: Option<Operand>,
    pub b: Option<Operand>,
    pub dst: Option<Operand>,
}
impl Quadruple {
    pub fn new(op: Op, a: Option<Operand>, b: Option<Operand>, dst: Option<Operand>) -> Self {
        Self { op, a, b, dst }
    }

    /// Returns the label this instruction defines or jumps to.
    pub fn target(&self) -> Option<&Label> {
        match (&self.op, &self.dst) {
            (Op::Label | Op::Goto | Op::IfGoto, Some(Operand::Label(lbl))) => Some(lbl),
            _ => None,
        }
    }
}
impl Display for Quadruple {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let a = Slot(&self.a);
        let b = Slot(&self.b);
        let dst = Slot(&self.dst);
        match self.op {
            Op::Label => write!(f, "{}:", dst),
            Op::Goto => write!(f, "goto {}", dst),
            Op::IfGoto => write!(f, "if {} goto {}", a, dst),
            Op::Param => write!(f, "param {}", a),
            Op::Call => match &self.a {
                Some(Operand::Const(Const::Str(name))) => {
                    write!(f, "call {}, nargs={} -> {}", name, b, dst)
                }
                _ => write!(f, "call {}, nargs={} -> {}", a, b, dst),
            },
            Op::Return => write!(f, "ret {}", a),
            Op::Print => write!(f, "print {}", a),
            Op::Copy => write!(f, "{} := {}", dst, a),
            op => {
                write!(f, "{} {}", op, a)?;
                if self.b.is_some() {
                    write!(f, ", {}", b)?;
                }
                if self.dst.is_some() {
                    write!(f, " -> {}", dst)?;
                }
                Ok(())
            }
        }
    }
}

/// Renders an operand slot, with empty slots shown as `null`.
struct Slot<'a>(&'a Option<Operand>);
impl Display for Slot<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.0 {
            Some(operand) => operand.fmt(f),
            None => f.write_str("null"),
        }
    }
}

impl Listing<Quadruple> {
    /// Append an instruction to the stream.
    pub fn emit(
        &mut self,
        op: Op,
        a: Option<Operand>,
        b: Option<Operand>,
        dst: Option<Operand>,
    ) -> &Quadruple {
        let quad = Quadruple::new(op, a, b, dst);
        trace!("emit {}", quad);
        self.push(quad)
    }

    /// Mark the current position with a label.
    pub fn label(&mut self, label: Label) -> &Quadruple {
        self.emit(Op::Label, None, None, Some(Operand::Label(label)))
    }

    /// Returns the position at which `label` is defined.
    pub fn position_of(&self, label: &Label) -> Option<Position> {
        self.iter_lines()
            .find(|(_, quad)| quad.op == Op::Label && quad.target() == Some(label))
            .map(|(position, _)| position)
    }

    /// Renders the stream with one instruction per line, without a trailing newline.
    pub fn dump(&self) -> String {
        self.iter_instructions()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(op: Op, a: Option<Operand>, b: Option<Operand>, dst: Option<Operand>) -> String {
        Quadruple::new(op, a, b, dst).to_string()
    }

    #[test]
    fn renders_fixed_text_grammar() {
        let t0 = || Some(Operand::Temp(Temp::new("t0")));
        let t1 = || Some(Operand::Temp(Temp::new("t1")));
        let l0 = || Some(Operand::Label(Label::new("L0")));
        let x = || Some(Operand::var("x"));

        assert_eq!("L0:", quad(Op::Label, None, None, l0()));
        assert_eq!("goto L0", quad(Op::Goto, None, None, l0()));
        assert_eq!("if x goto L0", quad(Op::IfGoto, x(), None, l0()));
        assert_eq!("param x", quad(Op::Param, x(), None, None));
        assert_eq!(
            "call add, nargs=2 -> t0",
            quad(
                Op::Call,
                Some(Const::from("add").into()),
                Some(Const::Int(2).into()),
                t0()
            )
        );
        assert_eq!("ret x", quad(Op::Return, x(), None, None));
        assert_eq!("print x", quad(Op::Print, x(), None, None));
        assert_eq!("x := t0", quad(Op::Copy, t0(), None, x()));
        assert_eq!("+ x, t0 -> t1", quad(Op::Add, x(), t0(), t1()));
        assert_eq!("load t0 -> t1", quad(Op::Load, t0(), None, t1()));
        assert_eq!("store x, t0", quad(Op::Store, x(), t0(), None));
    }

    #[test]
    fn constants_render_by_kind() {
        assert_eq!("7", Const::Int(7).to_string());
        assert_eq!("1", Const::from(true).to_string());
        assert_eq!("0", Const::from(false).to_string());
        assert_eq!("\"hi\"", Const::from("hi").to_string());
        assert_eq!("null", Const::Null.to_string());
        assert_eq!("&(fp+-2)", Addr::new(FRAME_POINTER, -2).to_string());
    }

    #[test]
    fn operands_compare_structurally() {
        assert_eq!(Operand::var("x"), Operand::var("x"));
        assert_eq!(
            Operand::Temp(Temp::new("t3")),
            Operand::Temp(Temp::new("t3"))
        );
        assert_ne!(Operand::var("t3"), Operand::Temp(Temp::new("t3")));
    }

    #[test]
    fn emit_appends_and_returns_instruction() {
        let mut listing = TacListing::new();
        let emitted = listing
            .emit(Op::Print, Some(Const::Int(1).into()), None, None)
            .clone();
        listing.label(Label::new("L0"));

        assert_eq!(2, listing.len());
        assert_eq!(Some(&emitted), listing.iter_instructions().next());
        assert_eq!(Some(Position(1)), listing.position_of(&Label::new("L0")));
        assert_eq!("print 1\nL0:", listing.dump());
    }
}
