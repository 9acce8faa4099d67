use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::interrupt::RuntimeInterrupt;
use crate::object::Object;
use crate::token::Token;
use crate::Shared;

/// One lexical scope: a name→value table plus a link to the parent
/// scope. Scopes are shared (`Rc<RefCell>`) because closures keep
/// their defining scope alive past its textual extent.
///
/// Two access styles coexist. `get`/`assign` search the whole chain by
/// name and are only used for globals. `read_at`/`get_at`/`assign_at`
/// jump to the scope exactly `distance` hops up and look nowhere else;
/// the resolver has already proven the binding lives there.
#[derive(Debug)]
pub struct Environment {
    pub parent: Option<Shared<Environment>>,
    bindings: HashMap<String, Object>,
}

impl Environment {
    pub fn global() -> Shared<Environment> {
        Rc::new(RefCell::new(Environment { parent: None, bindings: HashMap::new() }))
    }

    pub fn nested(parent: Shared<Environment>) -> Shared<Environment> {
        Rc::new(RefCell::new(Environment { parent: Some(parent), bindings: HashMap::new() }))
    }

    /// Create or replace the binding in this scope unconditionally.
    pub fn define(&mut self, name: &str, value: Object) {
        self.bindings.insert(name.to_owned(), value);
    }

    /// Read a binding in this scope only.
    pub fn slot(&self, name: &str) -> Option<Object> {
        self.bindings.get(name).cloned()
    }

    /// Read a binding in the scope exactly `distance` hops up, by name.
    pub fn read_at(&self, distance: usize, name: &str) -> Option<Object> {
        if distance == 0 {
            return self.slot(name);
        }

        let frame = self.climb(distance)?;
        let value = frame.borrow().slot(name);
        value
    }

    pub fn get_at(&self, distance: usize, name: &Token) -> Result<Object, RuntimeInterrupt> {
        self.read_at(distance, &name.lexeme).ok_or_else(|| Self::undefined(name))
    }

    pub fn assign_at(
        &mut self,
        distance: usize,
        name: &Token,
        value: Object,
    ) -> Result<(), RuntimeInterrupt> {
        if distance == 0 {
            return self.set_slot(name, value);
        }

        match self.climb(distance) {
            Some(frame) => {
                let result = frame.borrow_mut().set_slot(name, value);
                result
            }
            None => Err(Self::undefined(name)),
        }
    }

    /// Chain-walking read, innermost scope outward. Globals go through
    /// here; resolved locals never do.
    pub fn get(&self, name: &Token) -> Result<Object, RuntimeInterrupt> {
        if let Some(value) = self.slot(&name.lexeme) {
            return Ok(value);
        }

        let mut frame = self.parent.clone();
        while let Some(scope) = frame {
            let found = scope.borrow().slot(&name.lexeme);
            if let Some(value) = found {
                return Ok(value);
            }

            let next = scope.borrow().parent.clone();
            frame = next;
        }

        Err(Self::undefined(name))
    }

    /// Chain-walking write. Updates the nearest scope that already has
    /// the name; never creates a binding.
    pub fn assign(&mut self, name: &Token, value: Object) -> Result<(), RuntimeInterrupt> {
        if self.try_set(&name.lexeme, &value) {
            return Ok(());
        }

        let mut frame = self.parent.clone();
        while let Some(scope) = frame {
            let mut guard = scope.borrow_mut();
            if guard.try_set(&name.lexeme, &value) {
                return Ok(());
            }

            let next = guard.parent.clone();
            drop(guard);
            frame = next;
        }

        Err(Self::undefined(name))
    }

    fn try_set(&mut self, name: &str, value: &Object) -> bool {
        match self.bindings.get_mut(name) {
            Some(slot) => {
                *slot = value.clone();
                true
            }
            None => false,
        }
    }

    fn set_slot(&mut self, name: &Token, value: Object) -> Result<(), RuntimeInterrupt> {
        if self.try_set(&name.lexeme, &value) {
            Ok(())
        } else {
            Err(Self::undefined(name))
        }
    }

    fn climb(&self, hops: usize) -> Option<Shared<Environment>> {
        let mut frame = self.parent.clone()?;
        let mut remaining = hops - 1;

        while remaining > 0 {
            let next = frame.borrow().parent.clone()?;
            frame = next;
            remaining -= 1;
        }

        Some(frame)
    }

    fn undefined(name: &Token) -> RuntimeInterrupt {
        RuntimeInterrupt::error(name.line, format!("Undefined variable '{}'.", name.lexeme))
    }
}
