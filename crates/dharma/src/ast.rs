//! The expression and statement trees, expressed as tagged `enum`s rather
//! than a visitor hierarchy (SPEC_FULL §9: "replace the visitor idiom with
//! a tagged-variant `enum` per AST kind and match expressions at evaluation
//! sites"). `Variable`/`Assign`/`This` carry a `NodeId`, giving the
//! resolver's side-table a stable integer key instead of node-pointer
//! identity.

use std::rc::Rc;

use crate::token::Token;
use crate::types::LiteralValue;

pub type NodeId = u32;

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(LiteralValue),
    Variable {
        id: NodeId,
        name: Token,
    },
    Grouping(Box<Expr>),
    Unary {
        op: Token,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: Token,
        right: Box<Expr>,
    },
    Logical {
        left: Box<Expr>,
        op: Token,
        right: Box<Expr>,
    },
    Assign {
        id: NodeId,
        name: Token,
        value: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        paren: Token,
        args: Vec<Expr>,
    },
    Get {
        object: Box<Expr>,
        name: Token,
    },
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },
    This {
        id: NodeId,
        keyword: Token,
    },
}

impl Expr {
    /// The line/column to anchor a diagnostic to when this expression is
    /// the offending node (e.g. an unassignable `++` target).
    pub fn anchor(&self) -> &Token {
        match self {
            Expr::Variable { name, .. }
            | Expr::Get { name, .. }
            | Expr::Set { name, .. } => name,
            Expr::This { keyword, .. } => keyword,
            Expr::Call { paren, .. } => paren,
            Expr::Unary { op, .. } | Expr::Binary { op, .. } | Expr::Logical { op, .. } => op,
            Expr::Assign { name, .. } => name,
            Expr::Grouping(inner) => inner.anchor(),
            Expr::Literal(_) => unreachable!("literal expressions are never used as an anchor"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Function,
    Method,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: Token,
    pub declared_type: Token,
}

#[derive(Debug)]
pub struct FunctionDecl {
    pub name: Token,
    pub kind: FunctionKind,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub return_type: Token,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expr(Expr),
    Print(Expr),
    Var {
        name: Token,
        declared_type: Token,
        initializer: Option<Expr>,
    },
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        elif: Option<(Expr, Box<Stmt>)>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    Function(Rc<FunctionDecl>),
    Return {
        keyword: Token,
        value: Option<Expr>,
        return_type: Token,
    },
    Class {
        name: Token,
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
    },
}
