use std::fmt::{Debug, Display};
use std::rc::Rc;

use super::environment::Environment;
use super::interrupt::RuntimeInterrupt;
use super::Interpreter;
use crate::ast::Stmt;
use crate::object::Object;
use crate::token::Token;
use crate::Shared;

/// The uniform calling capability: native functions, user functions and
/// (through construction) classes all go through `arity` + `call`.
pub trait Callable: Debug + Display {
    fn arity(&self) -> usize;
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: &[Object],
    ) -> Result<Object, RuntimeInterrupt>;
}

/// Initializers share almost everything with ordinary functions except
/// what a call evaluates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FnKind {
    Function,
    Initializer,
}

#[derive(Debug, Clone)]
pub struct LoxFunction {
    name: Token,
    params: Vec<Token>,
    body: Vec<Rc<Stmt>>,
    closure: Shared<Environment>,
    kind: FnKind,
}

impl LoxFunction {
    pub fn new(
        name: Token,
        params: Vec<Token>,
        body: &[Rc<Stmt>],
        closure: Shared<Environment>,
        kind: FnKind,
    ) -> Self {
        Self { name, params, body: body.to_vec(), closure, kind }
    }

    /// A copy of this function whose closure gains one scope binding
    /// `this` to the receiver. Method bodies then find `this` exactly
    /// one hop above their call frame, matching the resolver's layout.
    pub fn bind(&self, receiver: Object) -> Rc<LoxFunction> {
        let wrapper = Environment::nested(self.closure.clone());
        wrapper.borrow_mut().define("this", receiver);

        Rc::new(LoxFunction { closure: wrapper, ..self.clone() })
    }

    /// The receiver a bound initializer was given; its closure is the
    /// `this` scope itself.
    fn captured_this(&self) -> Result<Object, RuntimeInterrupt> {
        self.closure
            .borrow()
            .slot("this")
            .ok_or_else(|| RuntimeInterrupt::error(self.name.line, "Undefined variable 'this'."))
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: &[Object],
    ) -> Result<Object, RuntimeInterrupt> {
        // A fresh frame per call; recursive invocations each get their
        // own parameter bindings.
        let frame = Environment::nested(self.closure.clone());
        {
            let mut frame = frame.borrow_mut();
            for (param, argument) in self.params.iter().zip(arguments) {
                frame.define(&param.lexeme, argument.clone());
            }
        }

        let outcome = interpreter.execute_block(&self.body, frame);

        match outcome {
            // An initializer answers with its instance no matter how the
            // body finished, a bare 'return;' included.
            Ok(()) | Err(RuntimeInterrupt::Return { .. })
                if self.kind == FnKind::Initializer =>
            {
                self.captured_this()
            }
            Ok(()) => Ok(Object::Null),
            Err(RuntimeInterrupt::Return { value, .. }) => Ok(value),
            Err(interrupt) => Err(interrupt),
        }
    }
}

impl Display for LoxFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<fn {}>", self.name.lexeme)
    }
}
