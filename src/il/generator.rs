use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use log::debug;

use crate::{ast::*, span::Span, symbols::*};

use super::{builder::*, error::*, tac::*};

/// Generate a three-address code listing for a checked program. Generation stops at the first
/// name that cannot be resolved, in which case no listing is produced.
///
/// Function and method bodies are emitted after the top-level code, behind a jump over them.
pub fn generate(program: &Program, symbols: &SymbolTable) -> Result<TacListing, GenerateError> {
    let mut builder = TacBuilder::new();
    let pending = RefCell::new(VecDeque::new());
    let lowerer = Lowerer {
        symbols,
        frame: None,
        class: None,
        pending: &pending,
    };

    lowerer.lower_stmts(&mut builder, &program.statements)?;
    if !pending.borrow().is_empty() {
        builder.skip(|b| {
            while let Some(function) = lowerer.next_pending() {
                lowerer.lower_function(b, function)?;
            }
            Ok(())
        })?;
    }

    let listing = builder.finish();
    debug!("Generated {} instructions", listing.len());
    Ok(listing)
}

/// A function whose body is being lowered, linked to the functions it is nested in.
struct Frame<'a> {
    /// Name used for the function's labels and call sites.
    label: String,
    function: &'a FuncSymbol,
    parent: Option<Rc<Frame<'a>>>,
}

/// A function body waiting to be emitted.
struct Pending<'a> {
    frame: Rc<Frame<'a>>,
    class: Option<&'a ClassSymbol>,
    body: &'a Block,
}

/// Lowers AST nodes in the context of the function (and class) being generated. The builder
/// is passed separately so lowering closures can borrow the lowerer while the builder hands
/// itself back to them.
struct Lowerer<'a> {
    symbols: &'a SymbolTable,
    frame: Option<Rc<Frame<'a>>>,
    class: Option<&'a ClassSymbol>,
    pending: &'a RefCell<VecDeque<Pending<'a>>>,
}

impl<'a> Lowerer<'a> {
    fn lower_stmts(&self, b: &mut TacBuilder, statements: &'a [Statement]) -> GenResult<()> {
        statements
            .iter()
            .try_for_each(|stmt| self.lower_stmt(b, stmt))
    }

    fn lower_block(&self, b: &mut TacBuilder, block: &'a Block) -> GenResult<()> {
        self.lower_stmts(b, &block.statements)
    }

    fn lower_stmt(&self, b: &mut TacBuilder, stmt: &'a Statement) -> GenResult<()> {
        match &stmt.stmt_kind {
            StmtKind::VarDecl(decl) => self.lower_var_decl(b, decl, stmt.span),
            StmtKind::Assign(assign) => self.lower_assign(b, assign),
            StmtKind::Evaluate(expr) => {
                let value = self.lower_expr(b, expr)?;
                b.discard(value);
                Ok(())
            }
            StmtKind::Print(expr) => {
                let value = self.lower_expr(b, expr)?;
                b.print(value);
                Ok(())
            }
            StmtKind::Block(block) => self.lower_block(b, block),
            StmtKind::If(if_stmt) => self.lower_if(b, if_stmt),
            StmtKind::While(while_stmt) => b.while_loop(
                |b| self.lower_expr(b, &while_stmt.condition),
                |b| self.lower_block(b, &while_stmt.body),
            ),
            StmtKind::DoWhile(do_while) => b.do_while(
                |b| self.lower_block(b, &do_while.body),
                |b| self.lower_expr(b, &do_while.condition),
            ),
            StmtKind::For(for_stmt) => self.lower_for(b, for_stmt),
            StmtKind::Break => {
                b.break_loop();
                Ok(())
            }
            StmtKind::Continue => {
                b.continue_loop();
                Ok(())
            }
            StmtKind::Switch(switch) => self.lower_switch(b, switch),
            StmtKind::Return(value) => {
                let value = value
                    .as_ref()
                    .map(|expr| self.lower_expr(b, expr))
                    .transpose()?;
                b.ret(value);
                Ok(())
            }
            StmtKind::FuncDef(func_def) => self.lower_func_def(func_def, stmt.span),
            StmtKind::ClassDef(class_def) => self.lower_class_def(class_def, stmt.span),
        }
    }

    /// Lower a declaration. Storage is laid out by the type checker, so only an initializer
    /// produces code.
    fn lower_var_decl(&self, b: &mut TacBuilder, decl: &VarDecl, span: Span) -> GenResult<()> {
        self.resolve_var(&decl.name, span)?;
        if let Some(initializer) = &decl.initializer {
            let value = self.lower_expr(b, initializer)?;
            b.assign(Operand::var(decl.name.as_str()), value);
        }
        Ok(())
    }

    /// Lower an assignment. Sub-expressions of the target are evaluated before the value.
    fn lower_assign(&self, b: &mut TacBuilder, assign: &Assign) -> GenResult<()> {
        let target = &assign.target;
        match &target.expr_kind {
            ExprKind::Identifier(name) => {
                self.resolve_var(name, target.span)?;
                let value = self.lower_expr(b, &assign.value)?;
                b.assign(Operand::var(name.as_str()), value);
            }
            ExprKind::Member(member) => {
                let offset = self.field_offset(member, target.span)?;
                if member.lhs.expr_kind == ExprKind::This {
                    self.this_class(member.lhs.span)?;
                    let value = self.lower_expr(b, &assign.value)?;
                    b.this_field_store(offset, value);
                } else {
                    let base = self.lower_expr(b, &member.lhs)?;
                    let value = self.lower_expr(b, &assign.value)?;
                    b.field_store(base, offset, value);
                }
            }
            ExprKind::Index(index) => {
                self.element_type(&index.lhs)?;
                let base = self.lower_expr(b, &index.lhs)?;
                let idx = self.lower_expr(b, &index.rhs)?;
                let value = self.lower_expr(b, &assign.value)?;
                b.array_store(base, idx, value);
            }
            _ => {
                return error(
                    GenerateErrorKind::InvalidAssignTarget(target.to_string()),
                    target.span,
                )
            }
        }
        Ok(())
    }

    fn lower_if(&self, b: &mut TacBuilder, if_stmt: &'a If) -> GenResult<()> {
        let condition = self.lower_expr(b, &if_stmt.condition)?;
        match &if_stmt.else_body {
            Some(else_body) => b.if_then_else(
                condition,
                |b| self.lower_block(b, &if_stmt.body),
                |b| self.lower_block(b, else_body),
            ),
            None => b.if_then(condition, |b| self.lower_block(b, &if_stmt.body)),
        }
    }

    /// Lower a for-loop. A missing condition is always true.
    fn lower_for(&self, b: &mut TacBuilder, for_stmt: &'a For) -> GenResult<()> {
        b.for_loop(
            |b| match &for_stmt.init {
                Some(init) => self.lower_stmt(b, init),
                None => Ok(()),
            },
            |b| match &for_stmt.condition {
                Some(condition) => self.lower_expr(b, condition),
                None => Ok(ExprResult::constant(1)),
            },
            |b| match &for_stmt.step {
                Some(step) => self.lower_stmt(b, step),
                None => Ok(()),
            },
            |b| self.lower_block(b, &for_stmt.body),
        )
    }

    fn lower_switch(&self, b: &mut TacBuilder, switch: &'a Switch) -> GenResult<()> {
        let scrutinee = self.lower_expr(b, &switch.scrutinee)?;
        let cases = switch
            .cases
            .iter()
            .map(|case| {
                SwitchCase::new(constant(&case.value), move |b: &mut TacBuilder| {
                    self.lower_stmts(b, &case.body)
                })
            })
            .collect();
        let default = switch
            .default
            .as_ref()
            .map(|stmts| body(move |b| self.lower_stmts(b, stmts)));

        b.switch(scrutinee, cases, default)
    }

    /// Queue a function definition. A function nested in another one is named
    /// `<outer>_<inner>` so equally named helpers of different functions stay apart.
    fn lower_func_def(&self, func_def: &'a FuncDef, span: Span) -> GenResult<()> {
        let (label, function) = self.resolve_function(&func_def.name, span)?;
        self.defer(Pending {
            frame: Rc::new(Frame {
                label,
                function,
                parent: self.frame.clone(),
            }),
            class: None,
            body: &func_def.body,
        });
        Ok(())
    }

    /// Queue every method of a class as a function named `<Class>_<method>`.
    fn lower_class_def(&self, class_def: &'a ClassDef, span: Span) -> GenResult<()> {
        let class = self.symbols.resolve_class(&class_def.name).add_span(span)?;
        debug!("Queueing methods of class {}", class.name);
        if class.base != class_def.base {
            return error(
                GenerateErrorKind::InconsistentBase {
                    class: class.name.clone(),
                    declared: class_def.base.clone(),
                    recorded: class.base.clone(),
                },
                span,
            );
        }

        for method_def in &class_def.methods {
            let method = class.method(&method_def.name).ok_or_else(|| {
                GenerateError::new(
                    LookupError::MethodNotFound {
                        class: class.name.clone(),
                        method: method_def.name.clone(),
                    }
                    .into(),
                    span,
                )
            })?;
            self.defer(Pending {
                frame: Rc::new(Frame {
                    label: qualified_name(&class.name, &method.name),
                    function: method,
                    parent: None,
                }),
                class: Some(class),
                body: &method_def.body,
            });
        }
        Ok(())
    }

    /// Emit a queued function body. Functions it declares are queued behind it.
    fn lower_function(&self, b: &mut TacBuilder, pending: Pending<'a>) -> GenResult<()> {
        let label = pending.frame.label.clone();
        debug!("Lowering function {}", label);

        let inner = Lowerer {
            symbols: self.symbols,
            frame: Some(pending.frame),
            class: pending.class,
            pending: self.pending,
        };
        b.function_begin(&label);
        inner.lower_block(b, pending.body)?;
        b.function_end(&label);
        Ok(())
    }

    fn defer(&self, pending: Pending<'a>) {
        self.pending.borrow_mut().push_back(pending);
    }

    fn next_pending(&self) -> Option<Pending<'a>> {
        self.pending.borrow_mut().pop_front()
    }

    fn lower_expr(&self, b: &mut TacBuilder, expr: &Expr) -> GenResult<ExprResult> {
        match &expr.expr_kind {
            ExprKind::Literal(lit) => Ok(b.literal(constant(lit))),
            ExprKind::Identifier(name) => {
                self.resolve_var(name, expr.span)?;
                Ok(b.var(name.as_str()))
            }
            ExprKind::This => {
                self.this_class(expr.span)?;
                Ok(b.var(THIS))
            }
            ExprKind::Member(member) => {
                let offset = self.field_offset(member, expr.span)?;
                if member.lhs.expr_kind == ExprKind::This {
                    self.this_class(member.lhs.span)?;
                    Ok(b.this_field_load(offset))
                } else {
                    let base = self.lower_expr(b, &member.lhs)?;
                    Ok(b.field_load(base, offset))
                }
            }
            ExprKind::Index(index) => {
                self.element_type(&index.lhs)?;
                let base = self.lower_expr(b, &index.lhs)?;
                let idx = self.lower_expr(b, &index.rhs)?;
                Ok(b.array_load(base, idx))
            }
            ExprKind::FunctionCall(call) => {
                let (label, _) = self.resolve_function(&call.name, call.name_span)?;
                let args = self.lower_args(b, &call.args)?;
                Ok(b.call(&label, args))
            }
            ExprKind::MethodCall(call) => {
                let class_name = self.class_of(&call.member.lhs)?;
                let (declaring, method) = self
                    .symbols
                    .find_method(&class_name, &call.member.rhs)
                    .add_span(expr.span)?;

                let mut args = vec![self.lower_expr(b, &call.member.lhs)?];
                args.extend(self.lower_args(b, &call.args)?);
                Ok(b.call(&qualified_name(&declaring.name, &method.name), args))
            }
            ExprKind::Unary(un) => {
                let operand = self.lower_expr(b, &un.rhs)?;
                Ok(match un.op {
                    UnOp::Not => b.not(operand),
                    UnOp::Negate => b.negate(operand),
                })
            }
            ExprKind::Binary(bin) => self.lower_binary(b, bin),
            ExprKind::Ternary(ter) => {
                let condition = self.lower_expr(b, &ter.condition)?;
                b.conditional(
                    condition,
                    |b| self.lower_expr(b, &ter.then),
                    |b| self.lower_expr(b, &ter.otherwise),
                )
            }
        }
    }

    fn lower_binary(&self, b: &mut TacBuilder, bin: &BinExpr) -> GenResult<ExprResult> {
        let op = match bin.op {
            BinOp::And => {
                let lhs = self.lower_logic_operand(b, &bin.lhs)?;
                return b.and(lhs, |b| self.lower_expr(b, &bin.rhs));
            }
            BinOp::Or => {
                let lhs = self.lower_logic_operand(b, &bin.lhs)?;
                return b.or(lhs, |b| self.lower_expr(b, &bin.rhs));
            }
            BinOp::Add => Op::Add,
            BinOp::Subtract => Op::Subtract,
            BinOp::Multiply => Op::Multiply,
            BinOp::Divide => Op::Divide,
            BinOp::Remainder => Op::Remainder,
            BinOp::LessThan => Op::LessThan,
            BinOp::GreaterThan => Op::GreaterThan,
            BinOp::LessThanEqual => Op::LessThanEqual,
            BinOp::GreaterThanEqual => Op::GreaterThanEqual,
            BinOp::Equal => Op::Equal,
            BinOp::NotEqual => Op::NotEqual,
        };

        let lhs = self.lower_expr(b, &bin.lhs)?;
        let rhs = self.lower_expr(b, &bin.rhs)?;
        Ok(b.binary(op, lhs, rhs))
    }

    /// The left operand of `&&` and `||`. Literals stay inline, so that a constant operand
    /// can decide the result without evaluating the right-hand side.
    fn lower_logic_operand(&self, b: &mut TacBuilder, expr: &Expr) -> GenResult<ExprResult> {
        match &expr.expr_kind {
            ExprKind::Literal(lit) => Ok(ExprResult::constant(constant(lit))),
            _ => self.lower_expr(b, expr),
        }
    }

    fn lower_args(&self, b: &mut TacBuilder, args: &[Expr]) -> GenResult<Vec<ExprResult>> {
        args.iter().map(|arg| self.lower_expr(b, arg)).collect()
    }

    // Name resolution

    /// Resolves a variable in the current function, falling back to the globals. A variable
    /// found in a function scope must have storage in its activation record.
    fn resolve_var(&self, name: &str, span: Span) -> GenResult<&'a VarSymbol> {
        let local = self
            .frame
            .as_deref()
            .and_then(|frame| frame.function.lookup(name));
        match local.or_else(|| self.symbols.resolve(name)) {
            Some(Symbol::Var(var)) if local.is_some() => {
                self.symbols.addr_of(var).add_span(span)?;
                Ok(var)
            }
            Some(Symbol::Var(var)) => Ok(var),
            _ => error(
                LookupError::UnknownIdentifier(name.to_string()).into(),
                span,
            ),
        }
    }

    /// Resolves a function in the current function and the functions enclosing it, falling
    /// back to the globals. Returns the name its labels are emitted under.
    fn resolve_function(&self, name: &str, span: Span) -> GenResult<(String, &'a FuncSymbol)> {
        let mut frame = self.frame.as_deref();
        while let Some(current) = frame {
            if let Some(function) = current.function.lookup(name).and_then(Symbol::as_func) {
                return Ok((qualified_name(&current.label, name), function));
            }
            frame = current.parent.as_deref();
        }
        let function = self.symbols.resolve_function(name).add_span(span)?;
        Ok((function.name.clone(), function))
    }

    fn this_class(&self, span: Span) -> GenResult<&'a ClassSymbol> {
        match self.class {
            Some(class) => Ok(class),
            None => error(GenerateErrorKind::ThisOutsideMethod, span),
        }
    }

    fn field_offset(&self, member: &MemberExpr, span: Span) -> GenResult<usize> {
        let class_name = self.class_of(&member.lhs)?;
        self.symbols
            .field_offset(&class_name, &member.rhs)
            .add_span(span)
    }

    // Static types

    /// Returns the name of the class an expression evaluates to an instance of.
    fn class_of(&self, expr: &Expr) -> GenResult<String> {
        match self.type_of(expr)? {
            Type::Class(name) => Ok(name),
            _ => error(GenerateErrorKind::NotAnObject(expr.to_string()), expr.span),
        }
    }

    fn element_type(&self, expr: &Expr) -> GenResult<Type> {
        match self.type_of(expr)? {
            Type::Array(elem) => Ok(*elem),
            _ => error(GenerateErrorKind::NotAnArray(expr.to_string()), expr.span),
        }
    }

    fn type_of(&self, expr: &Expr) -> GenResult<Type> {
        let ty = match &expr.expr_kind {
            ExprKind::Literal(Literal::Integer(_)) => Type::Integer,
            ExprKind::Literal(Literal::Boolean(_)) => Type::Boolean,
            ExprKind::Literal(Literal::String(_)) => Type::String,
            ExprKind::Literal(Literal::Null) => Type::Null,
            ExprKind::Identifier(name) => self.resolve_var(name, expr.span)?.ty.clone(),
            ExprKind::This => Type::class(self.this_class(expr.span)?.name.as_str()),
            ExprKind::Member(member) => {
                let class_name = self.class_of(&member.lhs)?;
                self.symbols
                    .field_type(&class_name, &member.rhs)
                    .add_span(expr.span)?
                    .clone()
            }
            ExprKind::Index(index) => self.element_type(&index.lhs)?,
            ExprKind::FunctionCall(call) => {
                self.resolve_function(&call.name, call.name_span)?.1.ret.clone()
            }
            ExprKind::MethodCall(call) => {
                let class_name = self.class_of(&call.member.lhs)?;
                let (_, method) = self
                    .symbols
                    .find_method(&class_name, &call.member.rhs)
                    .add_span(expr.span)?;
                method.ret.clone()
            }
            ExprKind::Unary(un) => match un.op {
                UnOp::Not => Type::Boolean,
                UnOp::Negate => Type::Integer,
            },
            ExprKind::Binary(bin) => match bin.op {
                BinOp::Add => self.type_of(&bin.lhs)?,
                BinOp::Subtract | BinOp::Multiply | BinOp::Divide | BinOp::Remainder => {
                    Type::Integer
                }
                _ => Type::Boolean,
            },
            ExprKind::Ternary(ter) => self.type_of(&ter.then)?,
        };
        Ok(ty)
    }
}

fn constant(lit: &Literal) -> Const {
    match lit {
        Literal::Integer(i) => Const::Int(*i),
        Literal::Boolean(b) => Const::from(*b),
        Literal::String(s) => Const::Str(s.clone()),
        Literal::Null => Const::Null,
    }
}

fn qualified_name(outer: &str, inner: &str) -> String {
    format!("{}_{}", outer, inner)
}
