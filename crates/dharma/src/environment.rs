//! Lexical environments (SPEC_FULL §4.5), chained through `Rc<RefCell<_>>`
//! so a closure can share its defining scope with whatever created it.
//! Grounded on the teacher's environment-chain pattern, extended with the
//! per-binding declared type this language's variables carry.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;

use crate::types::{DeclaredType, LiteralValue};

struct Binding {
    value: LiteralValue,
    declared: DeclaredType,
}

pub struct Environment {
    values: AHashMap<String, Binding>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new_global() -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment { values: AHashMap::new(), enclosing: None }))
    }

    pub fn new_enclosed(enclosing: &Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment {
            values: AHashMap::new(),
            enclosing: Some(Rc::clone(enclosing)),
        }))
    }

    pub fn define(&mut self, name: &str, value: LiteralValue, declared: DeclaredType) {
        self.values.insert(name.to_owned(), Binding { value, declared });
    }

    pub fn get(&self, name: &str) -> Option<LiteralValue> {
        self.values.get(name).map(|b| b.value.clone()).or_else(|| {
            self.enclosing
                .as_ref()
                .and_then(|parent| parent.borrow().get(name))
        })
    }

    pub fn declared_type(&self, name: &str) -> Option<DeclaredType> {
        self.values.get(name).map(|b| b.declared).or_else(|| {
            self.enclosing
                .as_ref()
                .and_then(|parent| parent.borrow().declared_type(name))
        })
    }

    /// Assigns to an already-declared binding, returning the declared type
    /// it was checked against, or `None` if `name` is nowhere in the chain.
    pub fn assign(&mut self, name: &str, value: LiteralValue) -> Option<DeclaredType> {
        if let Some(binding) = self.values.get_mut(name) {
            let declared = binding.declared;
            binding.value = value;
            return Some(declared);
        }
        self.enclosing
            .as_ref()
            .and_then(|parent| parent.borrow_mut().assign(name, value))
    }

    fn ancestor(env: &Rc<RefCell<Environment>>, depth: usize) -> Rc<RefCell<Environment>> {
        let mut current = Rc::clone(env);
        for _ in 0..depth {
            let parent = current
                .borrow()
                .enclosing
                .clone()
                .expect("resolver-computed depth exceeds the environment chain");
            current = parent;
        }
        current
    }

    pub fn get_at(env: &Rc<RefCell<Environment>>, depth: usize, name: &str) -> Option<LiteralValue> {
        Environment::ancestor(env, depth).borrow().values.get(name).map(|b| b.value.clone())
    }

    pub fn declared_type_at(env: &Rc<RefCell<Environment>>, depth: usize, name: &str) -> Option<DeclaredType> {
        Environment::ancestor(env, depth).borrow().values.get(name).map(|b| b.declared)
    }

    pub fn assign_at(env: &Rc<RefCell<Environment>>, depth: usize, name: &str, value: LiteralValue) -> Option<DeclaredType> {
        let target = Environment::ancestor(env, depth);
        let mut target = target.borrow_mut();
        let binding = target.values.get_mut(name)?;
        let declared = binding.declared;
        binding.value = value;
        Some(declared)
    }
}
