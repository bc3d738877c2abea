//! Static scope resolution (SPEC_FULL §4.4). Walks the parsed tree once,
//! before evaluation, and records how many enclosing environments separate
//! each variable reference from its binding — the interpreter then jumps
//! straight to that environment instead of walking the chain looking for a
//! name. Grounded on `original_source/src/resolver.hpp`'s scope-stack
//! design, adapted to Dharma's tagged-enum AST.

use ahash::AHashMap;

use crate::ast::{Expr, FunctionDecl, NodeId, Stmt};
use crate::diagnostics::ParseError;
use crate::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

pub struct Resolver {
    scopes: Vec<AHashMap<String, bool>>,
    depths: AHashMap<NodeId, usize>,
    current_function: FunctionType,
    current_class: ClassType,
    errors: Vec<ParseError>,
}

pub struct ResolveOutcome {
    pub depths: AHashMap<NodeId, usize>,
    pub errors: Vec<ParseError>,
}

impl Resolver {
    pub fn new() -> Self {
        Resolver {
            scopes: Vec::new(),
            depths: AHashMap::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            errors: Vec::new(),
        }
    }

    pub fn resolve(mut self, statements: &[Stmt]) -> ResolveOutcome {
        self.resolve_stmts(statements);
        ResolveOutcome { depths: self.depths, errors: self.errors }
    }

    fn error(&mut self, token: &Token, message: impl Into<String>) {
        self.errors.push(ParseError {
            line: token.line,
            column: token.column,
            message: message.into(),
        });
    }

    fn begin_scope(&mut self) {
        self.scopes.push(AHashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                self.error(name, format!("Variable '{}' already declared in this scope.", name.lexeme));
            }
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_owned(), true);
        }
    }

    fn resolve_local(&mut self, id: NodeId, name: &str) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name) {
                self.depths.insert(id, depth);
                return;
            }
        }
        // Not found in any local scope: treated as global, resolved by
        // direct lookup in the interpreter's root environment.
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(e) | Stmt::Print(e) => self.resolve_expr(e),
            Stmt::Var { name, initializer, .. } => {
                self.declare(name);
                if let Some(init) = initializer {
                    self.resolve_expr(init);
                }
                self.define(&name.lexeme);
            }
            Stmt::Block(body) => {
                self.begin_scope();
                self.resolve_stmts(body);
                self.end_scope();
            }
            Stmt::If { cond, then_branch, elif, else_branch } => {
                self.resolve_expr(cond);
                self.resolve_stmt(then_branch);
                if let Some((elif_cond, elif_branch)) = elif {
                    self.resolve_expr(elif_cond);
                    self.resolve_stmt(elif_branch);
                }
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::While { cond, body } => {
                self.resolve_expr(cond);
                self.resolve_stmt(body);
            }
            Stmt::For { init, cond, step, body } => {
                self.begin_scope();
                if let Some(init) = init {
                    self.resolve_stmt(init);
                }
                if let Some(cond) = cond {
                    self.resolve_expr(cond);
                }
                if let Some(step) = step {
                    self.resolve_expr(step);
                }
                self.resolve_stmt(body);
                self.end_scope();
            }
            Stmt::Function(decl) => {
                self.declare(&decl.name);
                self.define(&decl.name.lexeme);
                self.resolve_function(decl, FunctionType::Function);
            }
            Stmt::Return { keyword, value, .. } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Cannot return from top-level code.");
                }
                if let Some(value) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Cannot return a value from an initializer.");
                    }
                    self.resolve_expr(value);
                }
            }
            Stmt::Class { name, superclass, methods } => {
                let enclosing_class = self.current_class;
                self.current_class = ClassType::Class;
                self.declare(name);
                self.define(&name.lexeme);

                if let Some(Expr::Variable { name: sc_name, .. }) = superclass {
                    if sc_name.lexeme == name.lexeme {
                        self.error(sc_name, "A class cannot extend itself.");
                    }
                    self.current_class = ClassType::Subclass;
                    self.resolve_expr(superclass.as_ref().unwrap());
                }

                self.begin_scope();
                self.scopes.last_mut().unwrap().insert("this".to_owned(), true);
                for method in methods {
                    let kind = if method.name.lexeme == "init" {
                        FunctionType::Initializer
                    } else {
                        FunctionType::Method
                    };
                    self.resolve_function(method, kind);
                }
                self.end_scope();

                self.current_class = enclosing_class;
            }
        }
    }

    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionType) {
        let enclosing_function = self.current_function;
        self.current_function = kind;
        self.begin_scope();
        for param in &decl.params {
            self.declare(&param.name);
            self.define(&param.name.lexeme);
        }
        self.resolve_stmts(&decl.body);
        self.end_scope();
        self.current_function = enclosing_function;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.error(name, "Cannot read local variable in its own initializer.");
                    }
                }
                self.resolve_local(*id, &name.lexeme);
            }
            Expr::Grouping(inner) => self.resolve_expr(inner),
            Expr::Unary { operand, op } => {
                if matches!(
                    op.kind,
                    crate::token::TokenKind::PreIncr
                        | crate::token::TokenKind::PreDecr
                        | crate::token::TokenKind::PostIncr
                        | crate::token::TokenKind::PostDecr
                ) && !matches!(operand.as_ref(), Expr::Variable { .. } | Expr::Get { .. })
                {
                    self.error(op, "Invalid increment/decrement target.");
                }
                self.resolve_expr(operand);
            }
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, &name.lexeme);
            }
            Expr::Call { callee, args, .. } => {
                self.resolve_expr(callee);
                for arg in args {
                    self.resolve_expr(arg);
                }
            }
            Expr::Get { object, .. } => self.resolve_expr(object),
            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }
            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Cannot use 'this' outside of a class method.");
                }
                self.resolve_local(*id, "this");
            }
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}
