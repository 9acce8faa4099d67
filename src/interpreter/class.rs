use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Display;
use std::rc::Rc;

use super::func::{Callable, LoxFunction};
use super::interrupt::RuntimeInterrupt;
use super::Interpreter;
use crate::object::Object;
use crate::token::Token;

/// A bag of dynamic fields. Everything else an instance can do comes
/// from its class's method table.
#[derive(Debug, Clone)]
pub struct Instance {
    class: Rc<RefCell<Class>>,
    fields: HashMap<String, Object>,
}

impl Instance {
    /// Property read. Fields shadow methods; a method found on the
    /// class chain comes back bound to `receiver`.
    pub fn get(&self, field: &Token, receiver: &Object) -> Result<Object, RuntimeInterrupt> {
        if let Some(value) = self.fields.get(&field.lexeme) {
            return Ok(value.clone());
        }

        match self.class.borrow().find_method(&field.lexeme) {
            Some(method) => Ok(Object::Callable(method.bind(receiver.clone()))),
            None => Err(RuntimeInterrupt::error(
                field.line,
                format!("Undefined property '{}'.", field.lexeme),
            )),
        }
    }

    /// Property write. Always lands in the fields, even if it shadows
    /// a method.
    pub fn set(&mut self, field: &Token, value: Object) {
        self.fields.insert(field.lexeme.clone(), value);
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} instance", self.class.borrow())
    }
}

#[derive(Debug, Clone)]
pub struct Class {
    name: String,
    methods: HashMap<String, Rc<LoxFunction>>,
    superclass: Option<Rc<RefCell<Class>>>,
}

impl Class {
    pub fn new(
        name: &str,
        methods: HashMap<String, Rc<LoxFunction>>,
        superclass: Option<Rc<RefCell<Class>>>,
    ) -> Self {
        Self { name: name.to_owned(), methods, superclass }
    }

    /// Walk the inheritance chain outward from this class; the first
    /// class declaring `name` wins.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }

        let mut ancestor = self.superclass.clone();
        while let Some(class) = ancestor {
            let found = class.borrow().methods.get(name).cloned();
            if found.is_some() {
                return found;
            }

            let next = class.borrow().superclass.clone();
            ancestor = next;
        }

        None
    }

    /// Constructing takes as many arguments as `init` declares.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }

    /// `ClassName(args)`: make a blank instance, then let `init` run
    /// against it, bound, if any class in the chain declares one.
    pub fn construct(
        class: Rc<RefCell<Class>>,
        arguments: &[Object],
        interpreter: &mut Interpreter,
    ) -> Result<Object, RuntimeInterrupt> {
        let instance = Object::Instance(Rc::new(RefCell::new(Instance {
            class: class.clone(),
            fields: HashMap::new(),
        })));

        let initializer = class.borrow().find_method("init");
        if let Some(initializer) = initializer {
            initializer.bind(instance.clone()).call(interpreter, arguments)?;
        }

        Ok(instance)
    }
}

impl Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
