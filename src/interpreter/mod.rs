mod class;
mod environment;
mod expr;
mod func;
mod interrupt;
mod native;

pub use class::{Class, Instance};
pub use environment::Environment;
pub use func::{Callable, FnKind, LoxFunction};
pub use interrupt::RuntimeInterrupt;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::ast::{Expr, NodeId, Stmt};
use crate::error::SharedErrorReporter;
use crate::object::Object;
use crate::token::Token;
use crate::Shared;

type InterpreterResult = Result<Object, RuntimeInterrupt>;

/// The tree walker. Owns the global scope, the current scope pointer
/// and the resolver's side table of binding distances.
pub struct Interpreter {
    pub globals: Shared<Environment>,
    environment: Shared<Environment>,
    locals: HashMap<NodeId, usize>,
    error_reporter: Option<SharedErrorReporter>,
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Environment::global();
        let environment = globals.clone();

        globals.borrow_mut().define("clock", Object::Callable(native::clock()));

        Self { globals, environment, locals: HashMap::new(), error_reporter: None }
    }

    pub fn with_error_reporting(self, error_reporter: SharedErrorReporter) -> Self {
        Self { error_reporter: Some(error_reporter), ..self }
    }

    /// Record a binding distance for an expression node. Called by the
    /// resolver; nodes without an entry are globals.
    pub fn resolve(&mut self, id: NodeId, depth: usize) {
        self.locals.insert(id, depth);
    }

    #[cfg(test)]
    pub(crate) fn resolved_depth(&self, id: NodeId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    /// Run a parsed and resolved program. Stops at the first runtime
    /// error, which is reported and flagged rather than propagated.
    pub fn interpret(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            if let Err(e) = self.execute(stmt) {
                self.runtime_error(e);
                break;
            }
        }
    }

    pub fn execute(&mut self, stmt: &Stmt) -> Result<(), RuntimeInterrupt> {
        match stmt {
            Stmt::Expression { expr } => {
                self.evaluate_expr(expr)?;
            }
            Stmt::Print { expr } => {
                let value = self.evaluate_expr(expr)?;
                println!("{value}");
            }
            Stmt::Var { name, initializer } => {
                let value = if let Some(expr) = initializer {
                    self.evaluate_expr(expr)?
                } else {
                    Object::Null
                };

                self.environment.borrow_mut().define(&name.lexeme, value);
            }
            Stmt::Block { statements } => {
                // Run the block in a fresh child scope
                let new_env = Environment::nested(self.environment.clone());

                self.execute_block(statements, new_env)?;
            }
            Stmt::If { condition, then_branch, else_branch } => {
                let condition_result = self.evaluate_expr(condition)?;

                if self.is_truthy(&condition_result) {
                    self.execute(then_branch.as_ref())?;
                } else if let Some(stmt) = else_branch {
                    self.execute(stmt.as_ref())?;
                }
            }
            Stmt::While { condition, body, increment } => {
                self.execute_while(condition, body, increment.as_ref())?
            }
            Stmt::Function { name, params, body } => {
                // self.environment is the active environment at declaration
                // time, NOT at call time. That scope is the function's
                // closure; inner functions capture their parent's frame.
                let env = self.environment.clone();
                let function =
                    LoxFunction::new(name.clone(), params.to_vec(), body, env, FnKind::Function);
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Object::Callable(Rc::new(function)));
            }
            Stmt::Return { keyword, value } => {
                let value = if let Some(expr) = value {
                    self.evaluate_expr(expr)?
                } else {
                    Object::Null
                };

                return Err(RuntimeInterrupt::Return { line: keyword.line, value });
            }
            Stmt::Class { name, superclass, methods } => {
                self.execute_class_decl(name, superclass, methods)?
            }
            Stmt::Break { token } => return Err(RuntimeInterrupt::Break { line: token.line }),
            Stmt::Continue { token } => {
                return Err(RuntimeInterrupt::Continue { line: token.line })
            }
        };
        Ok(())
    }

    pub fn execute_block<I, R>(
        &mut self,
        statements: I,
        environment: Shared<Environment>,
    ) -> Result<(), RuntimeInterrupt>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<Stmt>,
    {
        let prev_env = self.environment.clone();
        self.environment = environment;

        for s in statements {
            let result = self.execute(s.as_ref());
            // Restore the previous scope on every exit path, including
            // break/continue/return unwinds.
            if result.is_err() {
                self.environment = prev_env;
                return result;
            }
        }

        self.environment = prev_env;
        Ok(())
    }

    fn execute_while(
        &mut self,
        condition: &Expr,
        body: &Stmt,
        increment: Option<&Expr>,
    ) -> Result<(), RuntimeInterrupt> {
        loop {
            let value = self.evaluate_expr(condition)?;
            if !self.is_truthy(&value) {
                break;
            }

            match self.execute(body) {
                Ok(()) => {}
                // 'continue' abandons the body but still reaches the
                // increment below, so desugared for loops advance.
                Err(RuntimeInterrupt::Continue { .. }) => {}
                Err(RuntimeInterrupt::Break { .. }) => break,
                Err(other) => return Err(other),
            }

            if let Some(increment) = increment {
                self.evaluate_expr(increment)?;
            }
        }

        Ok(())
    }

    fn execute_class_decl(
        &mut self,
        name: &Token,
        superclass: &Option<Expr>,
        methods: &[Stmt],
    ) -> Result<(), RuntimeInterrupt> {
        let superclass = if let Some(expr) = superclass {
            match self.evaluate_expr(expr)? {
                Object::Class(c) => Some(c),
                _ => {
                    let line = match expr {
                        Expr::Variable { name, .. } => name.line,
                        _ => name.line,
                    };
                    return Err(RuntimeInterrupt::error(line, "Superclass must be a class."));
                }
            }
        } else {
            None
        };

        self.environment.borrow_mut().define(&name.lexeme, Object::Null);

        // Methods of a subclass close over an extra scope holding
        // 'super', one level outside the 'this' scope bind() adds later.
        if let Some(ref superclass) = superclass {
            self.environment = Environment::nested(self.environment.clone());

            self.environment.borrow_mut().define("super", Object::Class(superclass.clone()));
        }

        let mut method_funcs = HashMap::new();
        for method in methods {
            if let Stmt::Function { name, params, body } = method {
                let kind = if name.lexeme == "init" {
                    FnKind::Initializer
                } else {
                    FnKind::Function
                };

                method_funcs.insert(
                    name.lexeme.clone(),
                    Rc::new(LoxFunction::new(
                        name.clone(),
                        params.to_vec(),
                        body,
                        self.environment.clone(),
                        kind,
                    )),
                );
            }
        }

        debug!("declared class '{}' with {} methods", name.lexeme, method_funcs.len());
        let class =
            Rc::new(RefCell::new(Class::new(&name.lexeme, method_funcs, superclass.clone())));

        if superclass.is_some() {
            let enclosing = self.environment.borrow().parent.clone();
            if let Some(enclosing) = enclosing {
                self.environment = enclosing;
            }
        }

        self.environment.borrow_mut().assign(name, Object::Class(class))
    }

    fn runtime_error(&self, e: RuntimeInterrupt) {
        if let Some(reporter) = self.error_reporter.as_ref() {
            reporter.borrow_mut().runtime_error(&e);
        }
    }
}
