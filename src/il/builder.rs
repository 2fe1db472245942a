//! The instruction-emission API.
//!
//! Every expression operation returns an [`ExprResult`]. When its `is_temp` flag is set, the
//! value is a temporary owned by the caller, who must hand it to exactly one consuming
//! operation. The consuming operation frees it. Operands that are evaluated lazily (the
//! right-hand side of `&&`/`||`, loop bodies, conditions) are passed as closures that receive
//! the builder, so their instructions are emitted exactly where control reaches them.
use crate::symbols::THIS;

use super::{
    error::GenerateError, label_manager::LabelManager, tac::*, temp_allocator::TempAllocator,
};

pub type GenResult<T> = Result<T, GenerateError>;

/// A statement body emitted at a position chosen by the builder.
pub type Body<'a> = Box<dyn FnOnce(&mut TacBuilder) -> GenResult<()> + 'a>;

pub fn body<'a, F>(f: F) -> Body<'a>
where
    F: FnOnce(&mut TacBuilder) -> GenResult<()> + 'a,
{
    Box::new(f)
}

/// The value of an emitted expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprResult {
    pub value: Operand,
    /// Whether `value` is a temporary allocated for this result.
    pub is_temp: bool,
}
impl ExprResult {
    pub fn temp(temp: Temp) -> Self {
        Self {
            value: Operand::Temp(temp),
            is_temp: true,
        }
    }

    /// Wraps an operand the caller does not own.
    pub fn operand(value: Operand) -> Self {
        Self {
            value,
            is_temp: false,
        }
    }

    pub fn var<S: Into<String>>(name: S) -> Self {
        Self::operand(Operand::var(name))
    }

    /// An inline constant, used without a copy into a temporary.
    pub fn constant<C: Into<Const>>(value: C) -> Self {
        Self::operand(Operand::Const(value.into()))
    }
}

/// A `case` arm of a switch statement.
pub struct SwitchCase<'a> {
    pub value: Const,
    pub body: Body<'a>,
}
impl<'a> SwitchCase<'a> {
    pub fn new<C, F>(value: C, body: F) -> Self
    where
        C: Into<Const>,
        F: FnOnce(&mut TacBuilder) -> GenResult<()> + 'a,
    {
        Self {
            value: value.into(),
            body: Box::new(body),
        }
    }
}

pub struct TacBuilder {
    listing: TacListing,
    temps: TempAllocator,
    labels: LabelManager,
}

impl TacBuilder {
    pub fn new() -> Self {
        Self {
            listing: TacListing::new(),
            temps: TempAllocator::new(),
            labels: LabelManager::new(),
        }
    }

    pub fn listing(&self) -> &TacListing {
        &self.listing
    }

    /// Returns the instruction stream.
    pub fn finish(self) -> TacListing {
        self.listing
    }

    pub fn loop_depth(&self) -> usize {
        self.labels.loop_depth()
    }

    // Expressions

    /// Copies a literal into a new temporary.
    pub fn literal<C: Into<Const>>(&mut self, value: C) -> ExprResult {
        let temp = self.temps.next_temp();
        self.copy(Operand::Const(value.into()), Operand::Temp(temp.clone()));
        ExprResult::temp(temp)
    }

    /// References a named variable. Reading a variable emits no code.
    pub fn var<S: Into<String>>(&self, name: S) -> ExprResult {
        ExprResult::var(name)
    }

    /// Emits `op lhs, rhs -> t` for an arithmetic or relational operator.
    pub fn binary(&mut self, op: Op, lhs: ExprResult, rhs: ExprResult) -> ExprResult {
        debug_assert!(op.is_binary(), "'{}' is not a binary operator", op);
        let result = self.temps.next_temp();
        self.listing.emit(
            op,
            Some(lhs.value.clone()),
            Some(rhs.value.clone()),
            Some(Operand::Temp(result.clone())),
        );
        self.free(&lhs);
        self.free(&rhs);
        ExprResult::temp(result)
    }

    /// Logical negation, emitted as `operand == 0`.
    pub fn not(&mut self, operand: ExprResult) -> ExprResult {
        self.binary(Op::Equal, operand, ExprResult::constant(0))
    }

    /// Arithmetic negation, emitted as `0 - operand`.
    pub fn negate(&mut self, operand: ExprResult) -> ExprResult {
        self.binary(Op::Subtract, ExprResult::constant(0), operand)
    }

    /// Short-circuiting `lhs && rhs`, producing `0` or `1`. `rhs` is only invoked when `lhs`
    /// is not a constant that already decides the result.
    pub fn and<F>(&mut self, lhs: ExprResult, rhs: F) -> GenResult<ExprResult>
    where
        F: FnOnce(&mut Self) -> GenResult<ExprResult>,
    {
        if lhs.value.as_const().and_then(Const::truthiness) == Some(false) {
            return Ok(self.literal(0));
        }

        let result = self.temps.next_temp();
        let check_rhs = self.labels.next_label();
        let false_lbl = self.labels.next_label();
        let end = self.labels.next_label();

        self.if_goto(&lhs.value, &check_rhs);
        self.goto(&false_lbl);

        self.listing.label(check_rhs);
        let rhs = rhs(self)?;
        let true_lbl = self.labels.next_label();
        self.if_goto(&rhs.value, &true_lbl);
        self.goto(&false_lbl);

        self.listing.label(true_lbl);
        self.copy(Const::Int(1).into(), Operand::Temp(result.clone()));
        self.goto(&end);

        self.listing.label(false_lbl);
        self.copy(Const::Int(0).into(), Operand::Temp(result.clone()));

        self.listing.label(end);

        self.free(&lhs);
        self.free(&rhs);
        Ok(ExprResult::temp(result))
    }

    /// Short-circuiting `lhs || rhs`, producing `0` or `1`. `rhs` is only invoked when `lhs`
    /// is not a constant that already decides the result.
    pub fn or<F>(&mut self, lhs: ExprResult, rhs: F) -> GenResult<ExprResult>
    where
        F: FnOnce(&mut Self) -> GenResult<ExprResult>,
    {
        if lhs.value.as_const().and_then(Const::truthiness) == Some(true) {
            return Ok(self.literal(1));
        }

        let result = self.temps.next_temp();
        let true_lbl = self.labels.next_label();
        let check_rhs = self.labels.next_label();
        let end = self.labels.next_label();

        self.if_goto(&lhs.value, &true_lbl);
        self.goto(&check_rhs);

        self.listing.label(check_rhs);
        let rhs = rhs(self)?;
        self.if_goto(&rhs.value, &true_lbl);
        self.copy(Const::Int(0).into(), Operand::Temp(result.clone()));
        self.goto(&end);

        self.listing.label(true_lbl);
        self.copy(Const::Int(1).into(), Operand::Temp(result.clone()));
        self.listing.label(end);

        self.free(&lhs);
        self.free(&rhs);
        Ok(ExprResult::temp(result))
    }

    /// The conditional expression `condition ? then : otherwise`. Only the selected arm is
    /// evaluated at run time.
    pub fn conditional<F, G>(
        &mut self,
        condition: ExprResult,
        then: F,
        otherwise: G,
    ) -> GenResult<ExprResult>
    where
        F: FnOnce(&mut Self) -> GenResult<ExprResult>,
        G: FnOnce(&mut Self) -> GenResult<ExprResult>,
    {
        let result = Operand::Temp(self.temps.next_temp());
        let then_lbl = self.labels.next_label();
        let else_lbl = self.labels.next_label();
        let end = self.labels.next_label();

        self.if_goto(&condition.value, &then_lbl);
        self.goto(&else_lbl);
        self.free(&condition);

        self.listing.label(then_lbl);
        let value = then(self)?;
        self.assign(result.clone(), value);
        self.goto(&end);

        self.listing.label(else_lbl);
        let value = otherwise(self)?;
        self.assign(result.clone(), value);

        self.listing.label(end);
        Ok(ExprResult {
            value: result,
            is_temp: true,
        })
    }

    /// Emits `dst := src`.
    pub fn assign(&mut self, dst: Operand, src: ExprResult) {
        self.copy(src.value.clone(), dst);
        self.free(&src);
    }

    /// Drops the value of an expression evaluated only for its side effects.
    pub fn discard(&mut self, value: ExprResult) {
        self.free(&value);
    }

    pub fn array_load(&mut self, base: ExprResult, index: ExprResult) -> ExprResult {
        let addr = self.address(Op::AddrIndex, &base, index.value.clone());
        let result = self.temps.next_temp();
        self.listing.emit(
            Op::Load,
            Some(Operand::Temp(addr.clone())),
            None,
            Some(Operand::Temp(result.clone())),
        );
        self.free(&index);
        self.free(&base);
        self.temps.free(&addr);
        ExprResult::temp(result)
    }

    pub fn array_store(&mut self, base: ExprResult, index: ExprResult, value: ExprResult) {
        let addr = self.address(Op::AddrIndex, &base, index.value.clone());
        self.store(&value, &addr);
        self.free(&index);
        self.free(&value);
        self.free(&base);
        self.temps.free(&addr);
    }

    /// Loads the field at `offset` of the object `base`.
    pub fn field_load(&mut self, base: ExprResult, offset: usize) -> ExprResult {
        let addr = self.address(Op::AddrField, &base, Self::offset(offset));
        let result = self.temps.next_temp();
        self.listing.emit(
            Op::Load,
            Some(Operand::Temp(addr.clone())),
            None,
            Some(Operand::Temp(result.clone())),
        );
        self.free(&base);
        self.temps.free(&addr);
        ExprResult::temp(result)
    }

    /// Stores `value` into the field at `offset` of the object `base`.
    pub fn field_store(&mut self, base: ExprResult, offset: usize, value: ExprResult) {
        let addr = self.address(Op::AddrField, &base, Self::offset(offset));
        self.store(&value, &addr);
        self.free(&value);
        self.free(&base);
        self.temps.free(&addr);
    }

    pub fn this_field_load(&mut self, offset: usize) -> ExprResult {
        self.field_load(ExprResult::var(THIS), offset)
    }

    pub fn this_field_store(&mut self, offset: usize, value: ExprResult) {
        self.field_store(ExprResult::var(THIS), offset, value)
    }

    /// Emits one `param` per argument, left to right, followed by the call. The result is
    /// always bound to a new temporary.
    pub fn call(&mut self, function: &str, args: Vec<ExprResult>) -> ExprResult {
        let count = args.len();
        for arg in args {
            self.listing
                .emit(Op::Param, Some(arg.value.clone()), None, None);
            self.free(&arg);
        }

        let result = self.temps.next_temp();
        self.listing.emit(
            Op::Call,
            Some(Const::from(function).into()),
            Some(Const::Int(count as TargetSize).into()),
            Some(Operand::Temp(result.clone())),
        );
        ExprResult::temp(result)
    }

    // Statements

    pub fn print(&mut self, value: ExprResult) {
        self.listing
            .emit(Op::Print, Some(value.value.clone()), None, None);
        self.free(&value);
    }

    pub fn if_then<F>(&mut self, condition: ExprResult, then: F) -> GenResult<()>
    where
        F: FnOnce(&mut Self) -> GenResult<()>,
    {
        let then_lbl = self.labels.next_label();
        let end = self.labels.next_label();

        self.if_goto(&condition.value, &then_lbl);
        self.goto(&end);
        self.free(&condition);

        self.listing.label(then_lbl);
        then(self)?;
        self.listing.label(end);
        Ok(())
    }

    pub fn if_then_else<F, G>(&mut self, condition: ExprResult, then: F, otherwise: G) -> GenResult<()>
    where
        F: FnOnce(&mut Self) -> GenResult<()>,
        G: FnOnce(&mut Self) -> GenResult<()>,
    {
        let then_lbl = self.labels.next_label();
        let end = self.labels.next_label();
        let else_lbl = self.labels.next_label();

        self.if_goto(&condition.value, &then_lbl);
        self.goto(&else_lbl);
        self.free(&condition);

        self.listing.label(then_lbl);
        then(self)?;
        self.goto(&end);

        self.listing.label(else_lbl);
        otherwise(self)?;
        self.listing.label(end);
        Ok(())
    }

    /// A pre-tested loop. The condition is re-evaluated at the top of every iteration, and
    /// `continue` jumps back to it.
    pub fn while_loop<C, B>(&mut self, condition: C, body: B) -> GenResult<()>
    where
        C: FnOnce(&mut Self) -> GenResult<ExprResult>,
        B: FnOnce(&mut Self) -> GenResult<()>,
    {
        let start = self.labels.next_label();
        let body_lbl = self.labels.next_label();
        let end = self.labels.next_label();

        self.listing.label(start.clone());
        let cond = condition(self)?;
        self.if_goto(&cond.value, &body_lbl);
        self.free(&cond);
        self.goto(&end);

        self.listing.label(body_lbl);
        self.labels.push_loop(start.clone(), end.clone());
        body(self)?;
        self.goto(&start);
        self.labels.pop_loop();

        self.listing.label(end);
        Ok(())
    }

    /// A post-tested loop. The body runs at least once, and `continue` jumps to the condition.
    pub fn do_while<B, C>(&mut self, body: B, condition: C) -> GenResult<()>
    where
        B: FnOnce(&mut Self) -> GenResult<()>,
        C: FnOnce(&mut Self) -> GenResult<ExprResult>,
    {
        let body_lbl = self.labels.next_label();
        let cond_lbl = self.labels.next_label();
        let end = self.labels.next_label();

        self.listing.label(body_lbl.clone());
        self.labels.push_loop(cond_lbl.clone(), end.clone());
        body(self)?;

        self.listing.label(cond_lbl);
        let cond = condition(self)?;
        self.if_goto(&cond.value, &body_lbl);
        self.free(&cond);
        self.labels.pop_loop();

        self.listing.label(end);
        Ok(())
    }

    /// A C-style `for` loop. `init` runs once before the loop, and `continue` runs `step`
    /// before the condition is tested again.
    pub fn for_loop<I, C, S, B>(&mut self, init: I, condition: C, step: S, body: B) -> GenResult<()>
    where
        I: FnOnce(&mut Self) -> GenResult<()>,
        C: FnOnce(&mut Self) -> GenResult<ExprResult>,
        S: FnOnce(&mut Self) -> GenResult<()>,
        B: FnOnce(&mut Self) -> GenResult<()>,
    {
        let cond_lbl = self.labels.next_label();
        let body_lbl = self.labels.next_label();
        let step_lbl = self.labels.next_label();
        let end = self.labels.next_label();

        init(self)?;

        self.listing.label(cond_lbl.clone());
        let cond = condition(self)?;
        self.if_goto(&cond.value, &body_lbl);
        self.free(&cond);
        self.goto(&end);

        self.listing.label(body_lbl);
        self.labels.push_loop(step_lbl.clone(), end.clone());
        body(self)?;

        self.listing.label(step_lbl);
        step(self)?;
        self.goto(&cond_lbl);
        self.labels.pop_loop();

        self.listing.label(end);
        Ok(())
    }

    /// # Panics
    /// When no loop or switch is active.
    pub fn break_loop(&mut self) {
        let target = self.labels.current_break().clone();
        self.goto(&target);
    }

    /// # Panics
    /// When no loop is active.
    pub fn continue_loop(&mut self) {
        let target = self.labels.current_continue().clone();
        self.goto(&target);
    }

    /// Compares the scrutinee against each case in order and jumps to the first match, or
    /// to the default arm. Case bodies are laid out back to back: without an explicit
    /// `break`, execution falls through into the next case.
    pub fn switch(
        &mut self,
        scrutinee: ExprResult,
        cases: Vec<SwitchCase<'_>>,
        default: Option<Body<'_>>,
    ) -> GenResult<()> {
        let case_labels: Vec<_> = cases.iter().map(|_| self.labels.next_label()).collect();
        let default_lbl = default.as_ref().map(|_| self.labels.next_label());
        let end = self.labels.next_label();

        for (case, label) in cases.iter().zip(&case_labels) {
            let matches = self.temps.next_temp();
            self.listing.emit(
                Op::Equal,
                Some(scrutinee.value.clone()),
                Some(Operand::Const(case.value.clone())),
                Some(Operand::Temp(matches.clone())),
            );
            self.if_goto(&Operand::Temp(matches.clone()), label);
            self.temps.free(&matches);
        }
        self.free(&scrutinee);
        self.goto(default_lbl.as_ref().unwrap_or(&end));

        self.labels.push_switch(end.clone());
        for (case, label) in cases.into_iter().zip(case_labels) {
            self.listing.label(label);
            (case.body)(self)?;
        }
        if let (Some(body), Some(label)) = (default, default_lbl) {
            self.listing.label(label);
            body(self)?;
        }
        self.labels.pop_loop();

        self.listing.label(end);
        Ok(())
    }

    /// Emits `body` behind an unconditional jump, so that control reaching this point passes
    /// over it. The skipped code is only entered through its own labels.
    pub fn skip<F>(&mut self, body: F) -> GenResult<()>
    where
        F: FnOnce(&mut Self) -> GenResult<()>,
    {
        let end = self.labels.next_label();
        self.goto(&end);
        body(self)?;
        self.listing.label(end);
        Ok(())
    }

    /// Returns from the current function. A missing value returns `null`.
    pub fn ret(&mut self, value: Option<ExprResult>) {
        match value {
            Some(value) => {
                self.listing
                    .emit(Op::Return, Some(value.value.clone()), None, None);
                self.free(&value);
            }
            None => {
                self.listing
                    .emit(Op::Return, Some(Const::Null.into()), None, None);
            }
        }
    }

    // Functions

    /// Marks the entry of a function. Temporaries are numbered per function.
    pub fn function_begin(&mut self, name: &str) {
        self.temps.reset();
        self.listing.label(Self::entry_label(name));
    }

    /// Marks the end of a function, followed by a `ret null` for control that falls off the
    /// end of the body.
    pub fn function_end(&mut self, name: &str) {
        self.listing.label(Self::end_label(name));
        self.ret(None);
    }

    pub fn entry_label(name: &str) -> Label {
        Label::new(format!("func_{}_entry", name))
    }

    pub fn end_label(name: &str) -> Label {
        Label::new(format!("func_{}_end", name))
    }

    // Helpers

    fn free(&mut self, value: &ExprResult) {
        if let (true, Some(temp)) = (value.is_temp, value.value.as_temp()) {
            self.temps.free(temp);
        }
    }

    fn copy(&mut self, src: Operand, dst: Operand) {
        self.listing.emit(Op::Copy, Some(src), None, Some(dst));
    }

    fn goto(&mut self, label: &Label) {
        self.listing
            .emit(Op::Goto, None, None, Some(Operand::Label(label.clone())));
    }

    fn if_goto(&mut self, condition: &Operand, label: &Label) {
        self.listing.emit(
            Op::IfGoto,
            Some(condition.clone()),
            None,
            Some(Operand::Label(label.clone())),
        );
    }

    /// Computes an address into a new temporary, which the caller must free.
    fn address(&mut self, op: Op, base: &ExprResult, index: Operand) -> Temp {
        let addr = self.temps.next_temp();
        self.listing.emit(
            op,
            Some(base.value.clone()),
            Some(index),
            Some(Operand::Temp(addr.clone())),
        );
        addr
    }

    fn store(&mut self, value: &ExprResult, addr: &Temp) {
        self.listing.emit(
            Op::Store,
            Some(value.value.clone()),
            Some(Operand::Temp(addr.clone())),
            None,
        );
    }

    fn offset(offset: usize) -> Operand {
        Operand::Const(Const::Int(offset as TargetSize))
    }
}

impl Default for TacBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::test_utils::init_logging;

    use super::*;

    fn lines(builder: &TacBuilder) -> Vec<String> {
        builder
            .listing()
            .iter_instructions()
            .map(ToString::to_string)
            .collect()
    }

    macro_rules! assert_emits {
        ($builder:expr, $il:expr) => {{
            let expected: Vec<&str> = $il.to_vec();
            assert_eq!(expected, lines(&$builder));
        }};
    }

    #[test]
    fn add_assign_and_print() {
        init_logging();
        let mut b = TacBuilder::new();

        let two = b.literal(2);
        let three = b.literal(3);
        let sum = b.binary(Op::Add, two, three);
        b.assign(Operand::var("x"), sum);
        let x = b.var("x");
        b.print(x);

        assert_emits!(b, ["t0 := 2", "t1 := 3", "+ t0, t1 -> t2", "x := t2", "print x"]);
    }

    #[test]
    fn binary_emits_one_instruction_into_fresh_temp() {
        let mut b = TacBuilder::new();

        let result = b.binary(Op::Multiply, ExprResult::var("a"), ExprResult::constant(4));

        assert_eq!(ExprResult::temp(Temp::new("t0")), result);
        assert_emits!(b, ["* a, 4 -> t0"]);
    }

    #[test]
    fn binary_result_never_aliases_its_operands() {
        let mut b = TacBuilder::new();

        let lhs = b.literal(1);
        let rhs = b.literal(2);
        let first = b.binary(Op::LessThan, lhs, rhs);
        let again = b.literal(3);

        assert_eq!(Operand::Temp(Temp::new("t2")), first.value);
        assert_eq!(Operand::Temp(Temp::new("t1")), again.value);
    }

    #[test]
    fn not_and_negate_compare_against_zero() {
        let mut b = TacBuilder::new();

        let n = b.not(ExprResult::var("x"));
        b.discard(n);
        let m = b.negate(ExprResult::var("y"));
        b.discard(m);

        assert_emits!(b, ["== x, 0 -> t0", "- 0, y -> t0"]);
    }

    #[test]
    fn and_short_circuits_through_labels() -> Result<()> {
        let mut b = TacBuilder::new();

        let result = b.and(ExprResult::var("x"), |b| Ok(b.var("y")))?;

        assert_eq!(Operand::Temp(Temp::new("t0")), result.value);
        assert_emits!(
            b,
            [
                "if x goto L0",
                "goto L1",
                "L0:",
                "if y goto L3",
                "goto L1",
                "L3:",
                "t0 := 1",
                "goto L2",
                "L1:",
                "t0 := 0",
                "L2:",
            ]
        );
        Ok(())
    }

    #[test]
    fn or_short_circuits_through_labels() -> Result<()> {
        let mut b = TacBuilder::new();

        let result = b.or(ExprResult::var("c"), |b| Ok(b.var("d")))?;
        b.assign(Operand::var("x"), result);

        assert_emits!(
            b,
            [
                "if c goto L0",
                "goto L1",
                "L1:",
                "if d goto L0",
                "t0 := 0",
                "goto L2",
                "L0:",
                "t0 := 1",
                "L2:",
                "x := t0",
            ]
        );
        Ok(())
    }

    #[test]
    fn decisive_constant_skips_right_operand() -> Result<()> {
        let mut b = TacBuilder::new();
        let mut invoked = false;

        let and = b.and(ExprResult::constant(0), |b| {
            invoked = true;
            Ok(b.literal(99))
        })?;
        assert!(!invoked);
        b.discard(and);

        let or = b.or(ExprResult::constant(true), |b| {
            invoked = true;
            Ok(b.literal(99))
        })?;
        assert!(!invoked);
        b.discard(or);

        assert_emits!(b, ["t0 := 0", "t0 := 1"]);
        Ok(())
    }

    #[test]
    fn undecisive_constant_evaluates_right_operand() -> Result<()> {
        let mut b = TacBuilder::new();
        let mut invoked = false;

        b.and(ExprResult::constant(1), |b| {
            invoked = true;
            Ok(b.var("y"))
        })?;

        assert!(invoked);
        assert!(lines(&b).contains(&"if y goto L3".to_string()));
        Ok(())
    }

    #[test]
    fn conditional_assigns_selected_arm() -> Result<()> {
        let mut b = TacBuilder::new();

        b.conditional(ExprResult::var("c"), |b| Ok(b.literal(1)), |b| Ok(b.var("y")))?;

        assert_emits!(
            b,
            [
                "if c goto L0",
                "goto L1",
                "L0:",
                "t1 := 1",
                "t0 := t1",
                "goto L2",
                "L1:",
                "t0 := y",
                "L2:",
            ]
        );
        Ok(())
    }

    #[test]
    fn if_else_with_and_condition() -> Result<()> {
        let mut b = TacBuilder::new();

        let cond = b.and(ExprResult::var("a"), |b| Ok(b.var("b")))?;
        b.if_then_else(
            cond,
            |b| Ok(b.print(ExprResult::constant(1))),
            |b| Ok(b.print(ExprResult::constant(0))),
        )?;

        assert_eq!(
            vec!["if t0 goto L4", "goto L6", "L4:", "print 1", "goto L5", "L6:", "print 0", "L5:"],
            lines(&b)[11..].to_vec()
        );
        Ok(())
    }

    #[test]
    fn if_without_else_jumps_to_end() -> Result<()> {
        let mut b = TacBuilder::new();

        b.if_then(ExprResult::var("c"), |b| Ok(b.print(ExprResult::var("x"))))?;

        assert_emits!(b, ["if c goto L0", "goto L1", "L0:", "print x", "L1:"]);
        Ok(())
    }

    #[test]
    fn while_continue_jumps_to_start() -> Result<()> {
        init_logging();
        let mut b = TacBuilder::new();

        b.while_loop(
            |b| Ok(b.var("flag")),
            |b| {
                b.print(ExprResult::var("i"));
                b.continue_loop();
                Ok(())
            },
        )?;

        assert_emits!(
            b,
            [
                "L0:",
                "if flag goto L1",
                "goto L2",
                "L1:",
                "print i",
                "goto L0",
                "goto L0",
                "L2:",
            ]
        );
        assert_eq!(0, b.loop_depth());
        Ok(())
    }

    #[test]
    fn while_break_jumps_to_end() -> Result<()> {
        let mut b = TacBuilder::new();

        b.while_loop(
            |_| Ok(ExprResult::constant(1)),
            |b| {
                b.print(ExprResult::constant(10));
                b.break_loop();
                Ok(())
            },
        )?;

        assert_emits!(
            b,
            ["L0:", "if 1 goto L1", "goto L2", "L1:", "print 10", "goto L2", "goto L0", "L2:"]
        );
        Ok(())
    }

    #[test]
    fn nested_while_resolves_innermost_loop() -> Result<()> {
        let mut b = TacBuilder::new();

        b.while_loop(
            |b| Ok(b.var("a")),
            |b| {
                b.while_loop(
                    |b| Ok(b.var("b")),
                    |b| {
                        b.break_loop();
                        b.continue_loop();
                        Ok(())
                    },
                )?;
                b.break_loop();
                Ok(())
            },
        )?;

        assert_emits!(
            b,
            [
                "L0:",
                "if a goto L1",
                "goto L2",
                "L1:",
                "L3:",
                "if b goto L4",
                "goto L5",
                "L4:",
                "goto L5",
                "goto L3",
                "goto L3",
                "L5:",
                "goto L2",
                "goto L0",
                "L2:",
            ]
        );
        Ok(())
    }

    #[test]
    fn do_while_inside_for_resolves_own_targets() -> Result<()> {
        let mut b = TacBuilder::new();

        b.for_loop(
            |_| Ok(()),
            |b| Ok(b.var("c")),
            |b| Ok(b.print(ExprResult::var("s"))),
            |b| {
                b.do_while(
                    |b| {
                        b.continue_loop();
                        b.break_loop();
                        Ok(())
                    },
                    |b| Ok(b.var("d")),
                )?;
                b.continue_loop();
                Ok(())
            },
        )?;

        assert_emits!(
            b,
            [
                "L0:",
                "if c goto L1",
                "goto L3",
                "L1:",
                "L4:",
                "goto L5",
                "goto L6",
                "L5:",
                "if d goto L4",
                "L6:",
                "goto L2",
                "L2:",
                "print s",
                "goto L0",
                "L3:",
            ]
        );
        Ok(())
    }

    #[test]
    fn do_while_runs_body_before_condition() -> Result<()> {
        let mut b = TacBuilder::new();

        b.do_while(
            |b| Ok(b.print(ExprResult::constant(1))),
            |_| Ok(ExprResult::constant(0)),
        )?;

        assert_emits!(b, ["L0:", "print 1", "L1:", "if 0 goto L0", "L2:"]);
        Ok(())
    }

    #[test]
    fn for_loop_runs_step_before_condition() -> Result<()> {
        let mut b = TacBuilder::new();

        b.for_loop(
            |b| Ok(b.assign(Operand::var("i"), ExprResult::constant(0))),
            |b| Ok(b.binary(Op::LessThan, ExprResult::var("i"), ExprResult::constant(3))),
            |b| {
                let next = b.binary(Op::Add, ExprResult::var("i"), ExprResult::constant(1));
                b.assign(Operand::var("i"), next);
                Ok(())
            },
            |b| Ok(b.print(ExprResult::var("i"))),
        )?;

        assert_emits!(
            b,
            [
                "i := 0",
                "L0:",
                "< i, 3 -> t0",
                "if t0 goto L1",
                "goto L3",
                "L1:",
                "print i",
                "L2:",
                "+ i, 1 -> t0",
                "i := t0",
                "goto L0",
                "L3:",
            ]
        );
        Ok(())
    }

    #[test]
    #[should_panic(expected = "no active loop")]
    fn break_outside_loop_panics() {
        TacBuilder::new().break_loop();
    }

    #[test]
    #[should_panic(expected = "no active loop")]
    fn continue_outside_loop_panics() {
        TacBuilder::new().continue_loop();
    }

    #[test]
    fn switch_falls_through_between_cases() -> Result<()> {
        let mut b = TacBuilder::new();

        b.switch(
            ExprResult::var("k"),
            vec![
                SwitchCase::new(0, |b| Ok(b.print(ExprResult::constant(0)))),
                SwitchCase::new(1, |b| Ok(b.print(ExprResult::constant(1)))),
            ],
            Some(body(|b| Ok(b.print(ExprResult::constant(9))))),
        )?;

        assert_emits!(
            b,
            [
                "== k, 0 -> t0",
                "if t0 goto L0",
                "== k, 1 -> t0",
                "if t0 goto L1",
                "goto L2",
                "L0:",
                "print 0",
                "L1:",
                "print 1",
                "L2:",
                "print 9",
                "L3:",
            ]
        );
        Ok(())
    }

    #[test]
    fn switch_break_leaves_switch_and_continue_targets_loop() -> Result<()> {
        let mut b = TacBuilder::new();

        b.while_loop(
            |b| Ok(b.var("run")),
            |b| {
                let k = b.literal(2);
                b.switch(
                    k,
                    vec![
                        SwitchCase::new(1, |b| {
                            b.continue_loop();
                            Ok(())
                        }),
                        SwitchCase::new(2, |b| {
                            b.break_loop();
                            Ok(())
                        }),
                    ],
                    None,
                )
            },
        )?;

        assert_emits!(
            b,
            [
                "L0:",
                "if run goto L1",
                "goto L2",
                "L1:",
                "t0 := 2",
                "== t0, 1 -> t1",
                "if t1 goto L3",
                "== t0, 2 -> t1",
                "if t1 goto L4",
                "goto L5",
                "L3:",
                "goto L0",
                "L4:",
                "goto L5",
                "L5:",
                "goto L0",
                "L2:",
            ]
        );
        Ok(())
    }

    #[test]
    fn return_with_and_without_value() {
        let mut b = TacBuilder::new();

        b.ret(Some(ExprResult::constant(123)));
        b.ret(None);

        assert_emits!(b, ["ret 123", "ret null"]);
    }

    #[test]
    fn functions_have_canonical_entry_and_exit() {
        let mut b = TacBuilder::new();

        b.function_begin("f");
        let sum = b.binary(Op::Add, ExprResult::var("a"), ExprResult::var("b"));
        b.ret(Some(sum));
        b.function_end("f");

        b.function_begin("g");
        b.print(ExprResult::constant(1));
        b.function_end("g");

        assert_emits!(
            b,
            [
                "func_f_entry:",
                "+ a, b -> t0",
                "ret t0",
                "func_f_end:",
                "ret null",
                "func_g_entry:",
                "print 1",
                "func_g_end:",
                "ret null",
            ]
        );
    }

    #[test]
    fn skipped_code_is_jumped_over() -> Result<()> {
        let mut b = TacBuilder::new();

        b.print(ExprResult::constant(1));
        b.skip(|b| {
            b.function_begin("f");
            b.function_end("f");
            Ok(())
        })?;

        assert_emits!(
            b,
            ["print 1", "goto L0", "func_f_entry:", "func_f_end:", "ret null", "L0:"]
        );
        Ok(())
    }

    #[test]
    fn call_queues_params_left_to_right() {
        let mut b = TacBuilder::new();

        let result = b.call("add", vec![ExprResult::var("a"), ExprResult::var("b")]);
        b.print(result);
        let ignored = b.call("log", vec![ExprResult::constant(1)]);
        b.discard(ignored);

        assert_emits!(
            b,
            [
                "param a",
                "param b",
                "call add, nargs=2 -> t0",
                "print t0",
                "param 1",
                "call log, nargs=1 -> t0",
            ]
        );
    }

    #[test]
    fn call_frees_argument_temps() {
        let mut b = TacBuilder::new();

        let one = b.literal(1);
        let two = b.literal(2);
        let result = b.call("f", vec![one, two]);

        assert!(result.is_temp);
        assert_emits!(
            b,
            ["t0 := 1", "t1 := 2", "param t0", "param t1", "call f, nargs=2 -> t1"]
        );
    }

    #[test]
    fn array_store_then_load() {
        let mut b = TacBuilder::new();

        b.array_store(ExprResult::var("a"), ExprResult::var("i"), ExprResult::constant(7));
        let value = b.array_load(ExprResult::var("a"), ExprResult::var("i"));
        b.print(value);

        assert_emits!(
            b,
            [
                "addr_index a, i -> t0",
                "store 7, t0",
                "addr_index a, i -> t0",
                "load t0 -> t1",
                "print t1",
            ]
        );
    }

    #[test]
    fn field_access_uses_constant_offsets() {
        let mut b = TacBuilder::new();

        b.field_store(ExprResult::var("o"), 2, ExprResult::constant(7));
        let value = b.field_load(ExprResult::var("o"), 2);
        b.print(value);

        assert_emits!(
            b,
            [
                "addr_field o, 2 -> t0",
                "store 7, t0",
                "addr_field o, 2 -> t0",
                "load t0 -> t1",
                "print t1",
            ]
        );
    }

    #[test]
    fn this_field_uses_this_as_base() {
        let mut b = TacBuilder::new();

        b.this_field_store(2, ExprResult::constant(9));
        let value = b.this_field_load(2);
        b.print(value);

        assert_emits!(
            b,
            [
                "addr_field this, 2 -> t0",
                "store 9, t0",
                "addr_field this, 2 -> t0",
                "load t0 -> t1",
                "print t1",
            ]
        );
    }
}
