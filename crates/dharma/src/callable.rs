//! Everything a Dharma value can be called as (SPEC_FULL §4.6, §9):
//! user-defined functions and methods, classes (called as constructors),
//! and the handful of natives the driver installs into the global scope.
//! A closed `enum` instead of a `dyn Trait` object, continuing the
//! tagged-variant redesign used for the AST.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

use crate::ast::FunctionDecl;
use crate::environment::Environment;
use crate::instance::Instance;
use crate::types::LiteralValue;

pub struct UserFunction {
    pub decl: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,
    pub is_initializer: bool,
}

impl UserFunction {
    pub fn new(decl: Rc<FunctionDecl>, closure: Rc<RefCell<Environment>>, is_initializer: bool) -> Rc<Self> {
        Rc::new(UserFunction { decl, closure, is_initializer })
    }

    /// Produces a bound copy of this method whose closure layers a fresh
    /// environment defining `this`, so the method body sees the instance it
    /// was looked up on without mutating the class's shared declaration.
    pub fn bind(self: &Rc<Self>, instance: Rc<Instance>) -> Rc<UserFunction> {
        let env = Environment::new_enclosed(&self.closure);
        env.borrow_mut().define(
            "this",
            LiteralValue::Instance(instance),
            crate::types::DeclaredType::Variable,
        );
        Rc::new(UserFunction { decl: Rc::clone(&self.decl), closure: env, is_initializer: self.is_initializer })
    }
}

pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[LiteralValue]) -> LiteralValue,
}

pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    pub methods: AHashMap<String, Rc<UserFunction>>,
}

impl Class {
    pub fn find_method(&self, name: &str) -> Option<Rc<UserFunction>> {
        self.methods
            .get(name)
            .cloned()
            .or_else(|| self.superclass.as_ref().and_then(|sc| sc.find_method(name)))
    }
}

pub enum Callable {
    Function(Rc<UserFunction>),
    Class(Rc<Class>),
    Native(Rc<NativeFunction>),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Function(f) => f.decl.params.len(),
            Callable::Class(c) => c.find_method("init").map_or(0, |init| init.decl.params.len()),
            Callable::Native(n) => n.arity,
        }
    }

    pub fn type_tag(&self) -> &'static str {
        match self {
            Callable::Class(_) => "class",
            Callable::Function(_) | Callable::Native(_) => "function",
        }
    }

    fn display_name(&self) -> &str {
        match self {
            Callable::Function(f) => &f.decl.name.lexeme,
            Callable::Class(c) => &c.name,
            Callable::Native(n) => n.name,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Class(_) => write!(f, "<class {}>", self.display_name()),
            Callable::Native(_) => write!(f, "<native fn>"),
            Callable::Function(_) => write!(f, "<fn {}>", self.display_name()),
        }
    }
}
