//! Runtime class instances (SPEC_FULL §3, §9). An instance holds its class
//! by `Rc<Class>`, not by value — diverging from the original's
//! copy-the-class-into-the-instance layout, since a shared reference is
//! the only sound choice once classes can be reassigned or garbage
//! collected independently of their instances (DESIGN.md, Open Question 8).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

use crate::callable::Class;
use crate::diagnostics::RuntimeError;
use crate::token::Token;
use crate::types::LiteralValue;

pub struct Instance {
    pub class: Rc<Class>,
    fields: RefCell<AHashMap<String, LiteralValue>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Rc<Self> {
        Rc::new(Instance { class, fields: RefCell::new(AHashMap::new()) })
    }

    pub fn get(self: &Rc<Self>, name: &Token) -> Result<LiteralValue, RuntimeError> {
        if let Some(value) = self.fields.borrow().get(&name.lexeme) {
            return Ok(value.clone());
        }
        if let Some(method) = self.class.find_method(&name.lexeme) {
            let bound = method.bind(Rc::clone(self));
            return Ok(LiteralValue::Callable(Rc::new(crate::callable::Callable::Function(bound))));
        }
        Err(RuntimeError::new(
            name.line,
            name.column,
            name.width(),
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    pub fn set(&self, name: &Token, value: LiteralValue) {
        self.fields.borrow_mut().insert(name.lexeme.clone(), value);
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} instance>", self.class.name)
    }
}
