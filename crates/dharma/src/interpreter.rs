//! The tree-walking evaluator (SPEC_FULL §4.6): tagged-enum dispatch over
//! `&Expr`/`&Stmt`, no visitor trait. Grounded on
//! `original_source/src/interpreter.hpp`'s operator dispatch and call
//! protocol, rebuilt around `Result`-propagated control flow instead of
//! C++ exceptions.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;

use crate::ast::{Expr, Stmt};
use crate::callable::{Callable, Class, NativeFunction, UserFunction};
use crate::config::Config;
use crate::diagnostics::{RuntimeError, Warning};
use crate::environment::Environment;
use crate::instance::Instance;
use crate::token::{Token, TokenKind};
use crate::types::{promote, BigDecimal, DeclaredType, Integer, LiteralValue};

/// What executing a statement produced: either nothing noteworthy, or a
/// `return` unwinding toward the call frame that will intercept it
/// (SPEC_FULL §4.6, §9 — the non-exception redesign of the source's
/// exception-based `Return`).
pub enum ExecSignal {
    Normal,
    Return(LiteralValue, DeclaredType, Token),
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    depths: AHashMap<u32, usize>,
    config: Config,
    return_type_stack: Vec<DeclaredType>,
    pub warnings: Vec<Warning>,
    out: Box<dyn std::io::Write>,
}

impl Interpreter {
    pub fn new(depths: AHashMap<u32, usize>, config: Config, out: Box<dyn std::io::Write>) -> Self {
        let globals = Environment::new_global();
        install_natives(&globals);
        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            depths,
            config,
            return_type_stack: Vec::new(),
            warnings: Vec::new(),
            out,
        }
    }

    /// Folds in another resolution pass's depth table (SPEC_FULL §4.8): a
    /// REPL feeds one line at a time, each with its own `NodeId` numbering
    /// starting back at zero, so depths from different lines never collide.
    pub fn merge_depths(&mut self, depths: AHashMap<u32, usize>) {
        self.depths.extend(depths);
    }

    pub fn run(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        for stmt in statements {
            self.execute(stmt)?;
        }
        Ok(())
    }

    // ===== statements =====

    fn execute(&mut self, stmt: &Stmt) -> Result<ExecSignal, RuntimeError> {
        match stmt {
            Stmt::Expr(expr) => {
                self.evaluate(expr)?;
                Ok(ExecSignal::Normal)
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", stringify(&value)).ok();
                Ok(ExecSignal::Normal)
            }
            Stmt::Var { name, declared_type, initializer } => {
                let declared = DeclaredType::normalize(&declared_type.lexeme).unwrap_or(DeclaredType::Variable);
                let value = match initializer {
                    Some(expr) => {
                        let raw = self.evaluate(expr)?;
                        self.coerce_for_binding(raw, declared, name)?
                    }
                    None => default_value(declared),
                };
                self.environment.borrow_mut().define(&name.lexeme, value, declared);
                Ok(ExecSignal::Normal)
            }
            Stmt::Block(body) => {
                let env = Environment::new_enclosed(&self.environment);
                self.execute_block(body, env)
            }
            Stmt::If { cond, then_branch, elif, else_branch } => {
                if self.evaluate(cond)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some((elif_cond, elif_branch)) = elif {
                    if self.evaluate(elif_cond)?.is_truthy() {
                        self.execute(elif_branch)
                    } else if let Some(else_branch) = else_branch {
                        self.execute(else_branch)
                    } else {
                        Ok(ExecSignal::Normal)
                    }
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(ExecSignal::Normal)
                }
            }
            Stmt::While { cond, body } => {
                while self.evaluate(cond)?.is_truthy() {
                    match self.execute(body)? {
                        ExecSignal::Normal => {}
                        signal => return Ok(signal),
                    }
                }
                Ok(ExecSignal::Normal)
            }
            Stmt::For { init, cond, step, body } => {
                let env = Environment::new_enclosed(&self.environment);
                let previous = std::mem::replace(&mut self.environment, env);
                let result = self.execute_for(init, cond, step, body);
                self.environment = previous;
                result
            }
            Stmt::Function(decl) => {
                let func = UserFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                let value = LiteralValue::Callable(Rc::new(Callable::Function(func)));
                self.environment.borrow_mut().define(&decl.name.lexeme, value, DeclaredType::Function);
                Ok(ExecSignal::Normal)
            }
            Stmt::Return { keyword, value, .. } => {
                let result = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => LiteralValue::Nil,
                };
                let declared = self.return_type_stack.last().copied().unwrap_or(DeclaredType::Variable);
                Ok(ExecSignal::Return(result, declared, keyword.clone()))
            }
            Stmt::Class { name, superclass, methods } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    fn execute_for(
        &mut self,
        init: &Option<Box<Stmt>>,
        cond: &Option<Expr>,
        step: &Option<Expr>,
        body: &Stmt,
    ) -> Result<ExecSignal, RuntimeError> {
        if let Some(init) = init {
            self.execute(init)?;
        }
        loop {
            if let Some(cond) = cond {
                if !self.evaluate(cond)?.is_truthy() {
                    break;
                }
            }
            match self.execute(body)? {
                ExecSignal::Normal => {}
                signal => return Ok(signal),
            }
            if let Some(step) = step {
                self.evaluate(step)?;
            }
        }
        Ok(ExecSignal::Normal)
    }

    fn execute_class(&mut self, name: &Token, superclass: Option<&Expr>, methods: &[Rc<crate::ast::FunctionDecl>]) -> Result<ExecSignal, RuntimeError> {
        let superclass_val = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                LiteralValue::Callable(c) => match c.as_ref() {
                    Callable::Class(cls) => Some(Rc::clone(cls)),
                    _ => return Err(self.err(expr.anchor(), "Superclass must be a class.")),
                },
                _ => return Err(self.err(expr.anchor(), "Superclass must be a class.")),
            },
            None => None,
        };

        let mut class_methods = AHashMap::new();
        for method in methods {
            let is_initializer = method.name.lexeme == "init";
            let func = UserFunction::new(Rc::clone(method), Rc::clone(&self.environment), is_initializer);
            class_methods.insert(method.name.lexeme.clone(), func);
        }

        let class = Rc::new(Class { name: name.lexeme.clone(), superclass: superclass_val, methods: class_methods });
        let value = LiteralValue::Callable(Rc::new(Callable::Class(class)));
        self.environment.borrow_mut().define(&name.lexeme, value, DeclaredType::Class);
        Ok(ExecSignal::Normal)
    }

    fn execute_block(&mut self, body: &[Stmt], env: Rc<RefCell<Environment>>) -> Result<ExecSignal, RuntimeError> {
        let previous = std::mem::replace(&mut self.environment, env);
        let result = self.execute_stmts(body);
        self.environment = previous;
        result
    }

    fn execute_stmts(&mut self, body: &[Stmt]) -> Result<ExecSignal, RuntimeError> {
        for stmt in body {
            match self.execute(stmt)? {
                ExecSignal::Normal => {}
                signal => return Ok(signal),
            }
        }
        Ok(ExecSignal::Normal)
    }

    // ===== expressions =====

    fn evaluate(&mut self, expr: &Expr) -> Result<LiteralValue, RuntimeError> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Variable { id, name } => self.look_up_variable(*id, name),
            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),
            Expr::Unary { op, operand } => self.eval_unary(op, operand),
            Expr::Binary { left, op, right } => self.eval_binary(left, op, right),
            Expr::Logical { left, op, right } => self.eval_logical(left, op, right),
            Expr::Assign { id, name, value } => {
                let v = self.evaluate(value)?;
                self.assign_variable(*id, name, v)
            }
            Expr::Call { callee, paren, args } => {
                let callee_val = self.evaluate(callee)?;
                if let Some(result) = self.try_eval_type_of(&callee_val, args)? {
                    return Ok(result);
                }
                let mut arg_vals = Vec::with_capacity(args.len());
                for arg in args {
                    arg_vals.push(self.evaluate(arg)?);
                }
                match callee_val {
                    LiteralValue::Callable(c) => self.call_callable(&c, paren, arg_vals),
                    other => Err(self.err(paren, format!("'{}' is not callable.", other.type_tag()))),
                }
            }
            Expr::Get { object, name } => {
                let obj = self.evaluate(object)?;
                match obj {
                    LiteralValue::Instance(inst) => inst.get(name),
                    other => Err(self.err(name, format!("Only instances have properties; got '{}'.", other.type_tag()))),
                }
            }
            Expr::Set { object, name, value } => {
                let obj = self.evaluate(object)?;
                match obj {
                    LiteralValue::Instance(inst) => {
                        let v = self.evaluate(value)?;
                        inst.set(name, v.clone());
                        Ok(v)
                    }
                    other => Err(self.err(name, format!("Only instances have fields; got '{}'.", other.type_tag()))),
                }
            }
        }
    }

    fn look_up_variable(&self, id: u32, name: &Token) -> Result<LiteralValue, RuntimeError> {
        if let Some(&depth) = self.depths.get(&id) {
            Environment::get_at(&self.environment, depth, &name.lexeme)
        } else {
            self.globals.borrow().get(&name.lexeme)
        }
        .ok_or_else(|| self.err(name, format!("Undefined variable '{}'.", name.lexeme)))
    }

    fn declared_type_of(&self, id: u32, name: &str) -> Option<DeclaredType> {
        if let Some(&depth) = self.depths.get(&id) {
            Environment::declared_type_at(&self.environment, depth, name)
        } else {
            self.globals.borrow().declared_type(name)
        }
    }

    /// `typeOf(x)` special-cases a bare identifier argument (SPEC_FULL §6):
    /// it reports the *declared* type of the binding rather than evaluating
    /// normally, appending the dynamic type only when the declared type is
    /// bare `variable`. Grounded on `TypeOfFunction::call`
    /// (`original_source/src/interpreter.hpp`), which special-cases
    /// `dynamic_cast<VariableExpr*>` the same way. Returns `None` when
    /// `callee` isn't the `typeOf` native or the argument isn't a bare
    /// variable, so the caller falls through to ordinary call evaluation.
    fn try_eval_type_of(&mut self, callee: &LiteralValue, args: &[Expr]) -> Result<Option<LiteralValue>, RuntimeError> {
        let LiteralValue::Callable(c) = callee else { return Ok(None) };
        let Callable::Native(native) = c.as_ref() else { return Ok(None) };
        if native.name != "typeOf" {
            return Ok(None);
        }
        let [Expr::Variable { id, name }] = args else { return Ok(None) };

        let dynamic = self.look_up_variable(*id, name)?;
        let declared = self.declared_type_of(*id, &name.lexeme).unwrap_or(DeclaredType::Variable);
        let mut type_name = declared.as_tag().to_owned();
        if declared == DeclaredType::Variable && dynamic.type_tag() != "nil" {
            type_name.push(' ');
            type_name.push_str(dynamic.type_tag());
        }
        Ok(Some(LiteralValue::Str(type_name)))
    }

    fn assign_variable(&mut self, id: u32, name: &Token, value: LiteralValue) -> Result<LiteralValue, RuntimeError> {
        let declared = self
            .declared_type_of(id, &name.lexeme)
            .ok_or_else(|| self.err(name, format!("Undefined variable '{}'.", name.lexeme)))?;
        let coerced = self.coerce_for_binding(value, declared, name)?;
        let assigned = if let Some(&depth) = self.depths.get(&id) {
            Environment::assign_at(&self.environment, depth, &name.lexeme, coerced.clone())
        } else {
            self.globals.borrow_mut().assign(&name.lexeme, coerced.clone())
        };
        assigned
            .map(|_| coerced)
            .ok_or_else(|| self.err(name, format!("Undefined variable '{}'.", name.lexeme)))
    }

    fn coerce_for_binding(&mut self, value: LiteralValue, declared: DeclaredType, at: &Token) -> Result<LiteralValue, RuntimeError> {
        if declared == DeclaredType::Variable || declared.accepts(value.type_tag()) {
            return Ok(value);
        }
        match promote(&value, declared.as_tag()) {
            Some((promoted, warned)) => {
                if warned {
                    self.warn(Warning::ImplicitConversion {
                        line: at.line,
                        column: at.column,
                        from: value.type_tag(),
                        to: declared.as_tag(),
                    });
                }
                Ok(promoted)
            }
            None => Err(self.err(
                at,
                format!("Cannot assign a value of type '{}' to a '{}' binding.", value.type_tag(), declared),
            )),
        }
    }

    fn warn(&mut self, warning: Warning) {
        if self.config.warnings_enabled {
            self.warnings.push(warning);
        }
    }

    fn err(&self, token: &Token, message: impl Into<String>) -> RuntimeError {
        RuntimeError::new(token.line, token.column, token.width(), message)
    }

    // ===== operators =====

    fn eval_unary(&mut self, op: &Token, operand: &Expr) -> Result<LiteralValue, RuntimeError> {
        match op.kind {
            TokenKind::Bang => {
                let v = self.evaluate(operand)?;
                Ok(LiteralValue::Boolean(!v.is_truthy()))
            }
            TokenKind::Minus => {
                let v = self.evaluate(operand)?;
                match v {
                    LiteralValue::Integer(i) => Ok(LiteralValue::Integer(i.neg())),
                    LiteralValue::Decimal(d) => Ok(LiteralValue::Decimal(-d)),
                    LiteralValue::BigDecimal(bd) => Ok(LiteralValue::BigDecimal(bd.neg())),
                    other => Err(self.err(op, format!("Cannot negate a value of type '{}'.", other.type_tag()))),
                }
            }
            TokenKind::PreIncr | TokenKind::PreDecr | TokenKind::PostIncr | TokenKind::PostDecr => {
                self.eval_incr_decr(op, operand)
            }
            other => unreachable!("unexpected unary operator {other:?}"),
        }
    }

    /// `++`/`--` on a `BigDecimal` operand (SPEC_FULL §4.1, §9, Open
    /// Question "`++` on a `BigDecimal` returns a value typed `decimal`"):
    /// the increment is computed correctly in `BigDecimal` arithmetic, but
    /// `++` specifically (not `--`) hands back the result downcast to an
    /// `f64` `decimal`, reproducing the source's mistagging bug at the
    /// expression's use site. Re-assigning the result into a
    /// `BigDecimal`-declared binding heals it back via the usual promotion
    /// table, so the bug is only observable in the immediate expression
    /// value, not the stored variable.
    fn eval_incr_decr(&mut self, op: &Token, operand: &Expr) -> Result<LiteralValue, RuntimeError> {
        let delta = if matches!(op.kind, TokenKind::PreIncr | TokenKind::PostIncr) { 1 } else { -1 };
        let retag_as_decimal = matches!(op.kind, TokenKind::PreIncr | TokenKind::PostIncr);
        let is_pre = matches!(op.kind, TokenKind::PreIncr | TokenKind::PreDecr);

        match operand {
            Expr::Variable { id, name } => {
                let old = self.look_up_variable(*id, name)?;
                let new = increment_value(&old, delta, retag_as_decimal)
                    .ok_or_else(|| self.err(op, format!("Cannot increment/decrement a value of type '{}'.", old.type_tag())))?;
                self.assign_variable(*id, name, new.clone())?;
                Ok(if is_pre { new } else { old })
            }
            Expr::Get { object, name } => {
                let obj = self.evaluate(object)?;
                let inst = match &obj {
                    LiteralValue::Instance(inst) => Rc::clone(inst),
                    other => return Err(self.err(name, format!("Only instances have properties; got '{}'.", other.type_tag()))),
                };
                let old = inst.get(name)?;
                let new = increment_value(&old, delta, retag_as_decimal)
                    .ok_or_else(|| self.err(op, format!("Cannot increment/decrement a value of type '{}'.", old.type_tag())))?;
                inst.set(name, new.clone());
                Ok(if is_pre { new } else { old })
            }
            other => Err(self.err(op, format!("Invalid increment/decrement target: {other:?}."))),
        }
    }

    /// `or`/`and` return whichever operand decided the outcome (value
    /// semantics); `||`/`&&` always collapse to a `Boolean` (SPEC_FULL §9,
    /// Open Question 1).
    fn eval_logical(&mut self, left: &Expr, op: &Token, right: &Expr) -> Result<LiteralValue, RuntimeError> {
        let lval = self.evaluate(left)?;
        let symbolic = matches!(op.kind, TokenKind::AmpAmp | TokenKind::PipePipe);
        match op.kind {
            TokenKind::Or | TokenKind::PipePipe if lval.is_truthy() => {
                return Ok(if symbolic { LiteralValue::Boolean(true) } else { lval });
            }
            TokenKind::And | TokenKind::AmpAmp if !lval.is_truthy() => {
                return Ok(if symbolic { LiteralValue::Boolean(false) } else { lval });
            }
            _ => {}
        }
        let rval = self.evaluate(right)?;
        Ok(if symbolic { LiteralValue::Boolean(rval.is_truthy()) } else { rval })
    }

    fn eval_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> Result<LiteralValue, RuntimeError> {
        let l = self.evaluate(left)?;
        let r = self.evaluate(right)?;
        if matches!(op.kind, TokenKind::EqualEqual | TokenKind::BangEqual) {
            return self.eval_equality(op, l, r);
        }
        self.eval_numeric_or_string(op, l, r)
    }

    fn eval_equality(&mut self, op: &Token, l: LiteralValue, r: LiteralValue) -> Result<LiteralValue, RuntimeError> {
        let equal = if is_numeric_ish(&l) && is_numeric_ish(&r) {
            let target = tag_for_priority(l.priority().max(r.priority()).max(1));
            let (lc, _) = self.coerce_operand(l, target, op)?;
            let (rc, _) = self.coerce_operand(r, target, op)?;
            lc == rc
        } else {
            l == r
        };
        Ok(LiteralValue::Boolean(if op.kind == TokenKind::EqualEqual { equal } else { !equal }))
    }

    fn eval_numeric_or_string(&mut self, op: &Token, l: LiteralValue, r: LiteralValue) -> Result<LiteralValue, RuntimeError> {
        if op.kind == TokenKind::Plus && (matches!(l, LiteralValue::Str(_)) || matches!(r, LiteralValue::Str(_))) {
            return Ok(LiteralValue::Str(format!("{}{}", stringify(&l), stringify(&r))));
        }
        if let (LiteralValue::Str(a), LiteralValue::Str(b)) = (&l, &r) {
            return Self::string_cmp(op, a, b);
        }
        if !is_numeric_ish(&l) || !is_numeric_ish(&r) {
            return Err(self.err(
                op,
                format!("Operator '{}' is not defined for '{}' and '{}'.", op.lexeme, l.type_tag(), r.type_tag()),
            ));
        }

        let target = tag_for_priority(l.priority().max(r.priority()).max(1));
        let (lc, _) = self.coerce_operand(l, target, op)?;
        let (rc, _) = self.coerce_operand(r, target, op)?;
        Self::apply_numeric(op, lc, rc)
    }

    fn coerce_operand(&mut self, value: LiteralValue, target: &'static str, op: &Token) -> Result<(LiteralValue, bool), RuntimeError> {
        if value.type_tag() == target {
            return Ok((value, false));
        }
        match promote(&value, target) {
            Some((promoted, warned)) => {
                if warned {
                    self.warn(Warning::ImplicitConversion { line: op.line, column: op.column, from: value.type_tag(), to: target });
                }
                Ok((promoted, warned))
            }
            None => Err(self.err(op, format!("Cannot apply operator '{}' to a value of type '{}'.", op.lexeme, value.type_tag()))),
        }
    }

    fn apply_numeric(op: &Token, l: LiteralValue, r: LiteralValue) -> Result<LiteralValue, RuntimeError> {
        match (l, r) {
            (LiteralValue::Integer(a), LiteralValue::Integer(b)) => Self::integer_op(op, &a, &b),
            (LiteralValue::Decimal(a), LiteralValue::Decimal(b)) => Self::f64_op(op, a, b),
            (LiteralValue::BigDecimal(a), LiteralValue::BigDecimal(b)) => Self::bigdecimal_op(op, &a, &b),
            (l, r) => unreachable!("operands coerced to mismatched tags: {} / {}", l.type_tag(), r.type_tag()),
        }
    }

    fn integer_op(op: &Token, a: &Integer, b: &Integer) -> Result<LiteralValue, RuntimeError> {
        use TokenKind::*;
        Ok(match op.kind {
            Plus => LiteralValue::Integer(Integer::add(a, b)),
            Minus => LiteralValue::Integer(Integer::sub(a, b)),
            Star => LiteralValue::Integer(Integer::mul(a, b)),
            Slash => LiteralValue::Integer(Integer::checked_div(a, b).ok_or_else(|| div_by_zero(op))?),
            Percent => LiteralValue::Integer(Integer::checked_rem(a, b).ok_or_else(|| div_by_zero(op))?),
            Greater => LiteralValue::Boolean(a > b),
            GreaterEqual => LiteralValue::Boolean(a >= b),
            Less => LiteralValue::Boolean(a < b),
            LessEqual => LiteralValue::Boolean(a <= b),
            other => unreachable!("unsupported integer operator {other:?}"),
        })
    }

    fn f64_op(op: &Token, a: f64, b: f64) -> Result<LiteralValue, RuntimeError> {
        use TokenKind::*;
        Ok(match op.kind {
            Plus => LiteralValue::Decimal(a + b),
            Minus => LiteralValue::Decimal(a - b),
            Star => LiteralValue::Decimal(a * b),
            Slash => {
                if b == 0.0 {
                    return Err(div_by_zero(op));
                }
                LiteralValue::Decimal(a / b)
            }
            Percent => {
                if b == 0.0 {
                    return Err(div_by_zero(op));
                }
                LiteralValue::Decimal(a % b)
            }
            Greater => LiteralValue::Boolean(a > b),
            GreaterEqual => LiteralValue::Boolean(a >= b),
            Less => LiteralValue::Boolean(a < b),
            LessEqual => LiteralValue::Boolean(a <= b),
            other => unreachable!("unsupported decimal operator {other:?}"),
        })
    }

    fn bigdecimal_op(op: &Token, a: &BigDecimal, b: &BigDecimal) -> Result<LiteralValue, RuntimeError> {
        use TokenKind::*;
        Ok(match op.kind {
            Plus => LiteralValue::BigDecimal(BigDecimal::add(a, b)),
            Minus => LiteralValue::BigDecimal(BigDecimal::sub(a, b)),
            Star => LiteralValue::BigDecimal(BigDecimal::mul(a, b)),
            Slash => LiteralValue::BigDecimal(BigDecimal::div(a, b).ok_or_else(|| div_by_zero(op))?),
            Percent => LiteralValue::BigDecimal(BigDecimal::rem(a, b).ok_or_else(|| div_by_zero(op))?),
            Greater => LiteralValue::Boolean(a > b),
            GreaterEqual => LiteralValue::Boolean(a >= b),
            Less => LiteralValue::Boolean(a < b),
            LessEqual => LiteralValue::Boolean(a <= b),
            other => unreachable!("unsupported BigDecimal operator {other:?}"),
        })
    }

    fn string_cmp(op: &Token, a: &str, b: &str) -> Result<LiteralValue, RuntimeError> {
        use TokenKind::*;
        Ok(match op.kind {
            Greater => LiteralValue::Boolean(a > b),
            GreaterEqual => LiteralValue::Boolean(a >= b),
            Less => LiteralValue::Boolean(a < b),
            LessEqual => LiteralValue::Boolean(a <= b),
            other => return Err(RuntimeError::new(op.line, op.column, op.width(), format!("Operator '{other:?}' is not defined for strings."))),
        })
    }

    // ===== calls =====

    fn call_callable(&mut self, callable: &Rc<Callable>, paren: &Token, args: Vec<LiteralValue>) -> Result<LiteralValue, RuntimeError> {
        if args.len() != callable.arity() {
            return Err(self.err(
                paren,
                format!("Expected {} argument(s) but got {}.", callable.arity(), args.len()),
            ));
        }
        match callable.as_ref() {
            Callable::Native(native) => Ok((native.func)(&args)),
            Callable::Class(class) => {
                let instance = Instance::new(Rc::clone(class));
                if let Some(init) = class.find_method("init") {
                    let bound = init.bind(Rc::clone(&instance));
                    self.call_user_function(&bound, paren, args)?;
                }
                Ok(LiteralValue::Instance(instance))
            }
            Callable::Function(f) => self.call_user_function(f, paren, args),
        }
    }

    fn call_user_function(&mut self, f: &Rc<UserFunction>, paren: &Token, args: Vec<LiteralValue>) -> Result<LiteralValue, RuntimeError> {
        let call_env = Environment::new_enclosed(&f.closure);
        for (param, arg) in f.decl.params.iter().zip(args) {
            let declared = DeclaredType::normalize(&param.declared_type.lexeme).unwrap_or(DeclaredType::Variable);
            // Argument binding is a strict type check, unlike the promotion
            // used for the return value below (SPEC_FULL §4.6).
            if !declared.accepts(arg.type_tag()) {
                return Err(self.err(
                    paren,
                    format!(
                        "No matching function call: parameter '{}' expects '{}' but got '{}'.",
                        param.name.lexeme,
                        declared,
                        arg.type_tag()
                    ),
                ));
            }
            call_env.borrow_mut().define(&param.name.lexeme, arg, declared);
        }

        let return_declared = DeclaredType::normalize(&f.decl.return_type.lexeme).unwrap_or(DeclaredType::Variable);
        self.return_type_stack.push(return_declared);
        let signal = self.execute_block(&f.decl.body, call_env);
        self.return_type_stack.pop();
        let signal = signal?;

        if f.is_initializer {
            return Ok(f.closure.borrow().get("this").unwrap_or(LiteralValue::Nil));
        }

        match signal {
            ExecSignal::Return(value, declared, token) => {
                if declared == DeclaredType::Variable || declared.accepts(value.type_tag()) {
                    return Ok(value);
                }
                match promote(&value, declared.as_tag()) {
                    Some((promoted, warned)) => {
                        if warned {
                            self.warn(Warning::ImplicitConversion {
                                line: token.line,
                                column: token.column,
                                from: value.type_tag(),
                                to: declared.as_tag(),
                            });
                        }
                        Ok(promoted)
                    }
                    None => Err(self.err(
                        &token,
                        format!("Cannot return a value of type '{}' from a function declared to return '{}'.", value.type_tag(), declared),
                    )),
                }
            }
            ExecSignal::Normal => Ok(LiteralValue::Nil),
        }
    }
}

fn is_numeric_ish(v: &LiteralValue) -> bool {
    matches!(
        v,
        LiteralValue::Integer(_) | LiteralValue::Decimal(_) | LiteralValue::BigDecimal(_) | LiteralValue::Boolean(_) | LiteralValue::Nil
    )
}

/// Maps a `LiteralValue::priority` back onto the conversion table's target
/// tag. Callers always clamp to at least `1` first, so a `boolean`-only
/// pairing computes as 0/1 integers rather than needing its own kernel
/// (SPEC_FULL §9, Open Question on `boolean`↔`integer` promotion).
fn tag_for_priority(priority: i8) -> &'static str {
    match priority {
        ..=1 => "integer",
        2 => "decimal",
        _ => "BigDecimal",
    }
}

fn default_value(declared: DeclaredType) -> LiteralValue {
    match declared {
        DeclaredType::Integer => LiteralValue::Integer(Integer::zero()),
        DeclaredType::Decimal => LiteralValue::Decimal(0.0),
        DeclaredType::BigDecimal => LiteralValue::BigDecimal(BigDecimal::zero()),
        DeclaredType::Str => LiteralValue::Str(String::new()),
        DeclaredType::Boolean => LiteralValue::Boolean(false),
        _ => LiteralValue::Nil,
    }
}

fn increment_value(value: &LiteralValue, delta: i32, retag_as_decimal: bool) -> Option<LiteralValue> {
    match value {
        LiteralValue::Integer(i) => Some(LiteralValue::Integer(Integer::add(i, &Integer::from_i32(delta)))),
        LiteralValue::Decimal(d) => Some(LiteralValue::Decimal(d + f64::from(delta))),
        LiteralValue::BigDecimal(bd) => {
            let result = BigDecimal::add(bd, &BigDecimal::from_integer(&Integer::from_i32(delta)));
            Some(if retag_as_decimal { LiteralValue::Decimal(result.to_f64()) } else { LiteralValue::BigDecimal(result) })
        }
        LiteralValue::Boolean(b) => Some(LiteralValue::Integer(Integer::add(&Integer::from_bool(*b), &Integer::from_i32(delta)))),
        _ => None,
    }
}

fn div_by_zero(op: &Token) -> RuntimeError {
    RuntimeError::new(op.line, op.column, op.width(), "Division by zero.")
}

/// Renders a value the way `print` does: strings get single-quoted,
/// everything else uses its own `Display` (SPEC_FULL §4.6).
pub fn stringify(value: &LiteralValue) -> String {
    match value {
        LiteralValue::Str(s) => format!("'{s}'"),
        other => other.to_string(),
    }
}

fn install_natives(globals: &Rc<RefCell<Environment>>) {
    let mut globals = globals.borrow_mut();
    globals.define(
        "clock",
        LiteralValue::Callable(Rc::new(Callable::Native(Rc::new(NativeFunction {
            name: "clock",
            arity: 0,
            func: |_args| {
                let secs = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_secs_f64())
                    .unwrap_or(0.0);
                LiteralValue::Decimal(secs)
            },
        })))),
        DeclaredType::Function,
    );
    globals.define(
        "typeOf",
        LiteralValue::Callable(Rc::new(Callable::Native(Rc::new(NativeFunction {
            name: "typeOf",
            arity: 1,
            func: |args| LiteralValue::Str(args[0].type_tag().to_owned()),
        })))),
        DeclaredType::Function,
    );
}
