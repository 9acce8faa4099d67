use std::collections::HashMap;

use log::debug;

use crate::ast::{Expr, Stmt};
use crate::error::SharedErrorReporter;
use crate::interpreter::Interpreter;
use crate::token::Token;

#[derive(Debug, Clone, PartialEq, Copy)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Debug, Clone, PartialEq, Copy)]
enum ClassType {
    None,
    Class,
    SubClass,
}

/// Static analysis pass that binds every local variable occurrence to a
/// scope distance recorded in the interpreter's side table. Also
/// diagnoses the static errors the parser can't see: bad `return`,
/// `this`/`super` outside a class, shadowing in the same scope, and
/// reading a variable in its own initializer.
///
/// Errors go to the shared reporter and resolution continues, so a
/// single run surfaces every problem at once. The pass never mutates
/// the AST.
pub struct Resolver<'i> {
    interpreter: &'i mut Interpreter,
    scopes: Vec<HashMap<String, bool>>, // false = declared, true = defined
    current_function: FunctionType,
    current_class: ClassType,
    error_reporter: Option<SharedErrorReporter>,
}

impl<'i> Resolver<'i> {
    pub fn new(interpreter: &'i mut Interpreter) -> Self {
        Self {
            interpreter,
            scopes: vec![],
            current_function: FunctionType::None,
            current_class: ClassType::None,
            error_reporter: None,
        }
    }

    pub fn with_error_reporting(self, error_reporter: SharedErrorReporter) -> Self {
        Self { error_reporter: Some(error_reporter), ..self }
    }

    pub fn resolve<I, R>(&mut self, statements: I)
    where
        I: IntoIterator<Item = R>,
        R: AsRef<Stmt>,
    {
        for stmt in statements {
            self.resolve_stmt(stmt.as_ref());
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block { statements } => {
                self.begin_scope();
                self.resolve(statements);
                self.end_scope();
            }
            Stmt::Var { name, initializer } => {
                // Split into declare -> initializer -> define so the
                // initializer can't read the variable it defines.
                self.declare(name);
                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer);
                }
                self.define(name);
            }
            Stmt::Class { name, superclass, methods } => {
                let enclosing_class = self.current_class;
                self.current_class = ClassType::Class;

                self.declare(name);
                self.define(name);

                if let Some(superclass) = superclass {
                    if let Expr::Variable { name: super_name, .. } = superclass {
                        if super_name.lexeme == name.lexeme {
                            self.error(super_name, "A class can't inherit from itself.");
                        }
                    }

                    self.current_class = ClassType::SubClass;
                    self.resolve_expr(superclass);

                    self.begin_scope();
                    self.insert_into_scope("super");
                }

                self.begin_scope();
                self.insert_into_scope("this");

                for method in methods {
                    let func_type = match method {
                        Stmt::Function { name, .. } if name.lexeme == "init" => {
                            FunctionType::Initializer
                        }
                        _ => FunctionType::Method,
                    };

                    self.resolve_function(method, func_type);
                }

                self.end_scope();

                if superclass.is_some() {
                    self.end_scope();
                }

                self.current_class = enclosing_class;
            }
            Stmt::Function { name, .. } => {
                // Unlike variables, we declare and define functions before
                // processing their body. This way, functions can recursively
                // call themselves.
                self.declare(name);
                self.define(name);

                self.resolve_function(stmt, FunctionType::Function);
            }
            Stmt::Expression { expr } | Stmt::Print { expr } => self.resolve_expr(expr),
            Stmt::If { condition, then_branch, else_branch } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(stmt) = else_branch {
                    self.resolve_stmt(stmt);
                }
            }
            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Can't return a value from an initializer.");
                    }
                    self.resolve_expr(expr);
                }
            }
            Stmt::While { condition, body, increment } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
                if let Some(increment) = increment {
                    self.resolve_expr(increment);
                }
            }
            Stmt::Break { .. } | Stmt::Continue { .. } => {}
        }
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.error(name, "Can't read local variable in its own initializer.");
                    }
                }

                self.resolve_local(*id, name);
            }
            Expr::Assignment { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }
            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'this' outside of a class.");
                    return;
                }

                self.resolve_local(*id, keyword);
            }
            Expr::Super { id, keyword, .. } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'super' outside of a class.");
                } else if self.current_class != ClassType::SubClass {
                    self.error(keyword, "Can't use 'super' in a class with no superclass.");
                } else {
                    self.resolve_local(*id, keyword);
                }
            }
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Call { callee, arguments, .. } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }
            Expr::Get { object, .. } => self.resolve_expr(object),
            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }
            Expr::Grouping { expr } => self.resolve_expr(expr),
            Expr::Unary { right, .. } => self.resolve_expr(right),
            Expr::Literal { .. } => {}
        }
    }

    fn resolve_function(&mut self, stmt: &Stmt, func_type: FunctionType) {
        let Stmt::Function { params, body, .. } = stmt else {
            return;
        };

        let enclosing_func = self.current_function;
        self.current_function = func_type;

        self.begin_scope();
        for param in params {
            self.declare(param);
            self.define(param);
        }

        self.resolve(body);
        self.end_scope();
        self.current_function = enclosing_func;
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        // Globals are late-bound; nothing to track at depth zero.
        if self.scopes.is_empty() {
            return;
        }

        let already_declared =
            self.scopes.last().map(|scope| scope.contains_key(&name.lexeme)).unwrap_or(false);
        if already_declared {
            self.error(name, "Already a variable with this name in this scope.");
            return;
        }

        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    /// Insert a synthetic name (`this` or `super`) into the scope the
    /// interpreter will create at runtime for the same construct.
    fn insert_into_scope(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_owned(), true);
        }
    }

    fn resolve_local(&mut self, id: usize, name: &Token) {
        for (i, scope) in self.scopes.iter().enumerate().rev() {
            if scope.contains_key(&name.lexeme) {
                let distance = self.scopes.len() - i - 1;
                debug!("resolved '{}' at distance {}", name.lexeme, distance);
                self.interpreter.resolve(id, distance);
                return;
            }
        }

        // Not found in any scope: the interpreter will look it up in
        // the globals at runtime.
    }

    fn error(&mut self, token: &Token, message: &str) {
        if let Some(reporter) = self.error_reporter.as_ref() {
            reporter.borrow_mut().error_at(token, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorReporter;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn resolve_source(source: &str) -> bool {
        let reporter = ErrorReporter::new().as_shared();
        let tokens = Scanner::new(source).with_error_reporting(reporter.clone()).scan_tokens();
        let stmts = Parser::new(tokens).with_error_reporting(reporter.clone()).parse();
        assert!(!reporter.borrow().had_error, "source should parse cleanly");

        let mut interpreter = Interpreter::new();
        let mut resolver =
            Resolver::new(&mut interpreter).with_error_reporting(reporter.clone());
        resolver.resolve(&stmts);

        let had_error = reporter.borrow().had_error;
        had_error
    }

    fn depth_of_last_print_variable(source: &str) -> Option<usize> {
        let tokens = Scanner::new(source).scan_tokens();
        let stmts = Parser::new(tokens).parse();

        let mut interpreter = Interpreter::new();
        Resolver::new(&mut interpreter).resolve(&stmts);

        fn find_in_stmt(stmt: &Stmt) -> Option<usize> {
            match stmt {
                Stmt::Print { expr: Expr::Variable { id, .. } } => Some(*id),
                Stmt::Block { statements } => statements.iter().rev().find_map(find_in_stmt),
                Stmt::Function { body, .. } => {
                    body.iter().rev().find_map(|s| find_in_stmt(s.as_ref()))
                }
                _ => None,
            }
        }

        let id = stmts.iter().rev().find_map(find_in_stmt)?;
        interpreter.resolved_depth(id)
    }

    #[test]
    fn top_level_return_is_an_error() {
        assert!(resolve_source("return 1;"));
    }

    #[test]
    fn return_inside_function_is_fine() {
        assert!(!resolve_source("fun f() { return 1; }"));
    }

    #[test]
    fn initializer_cannot_return_a_value() {
        assert!(resolve_source("class A { init() { return 1; } }"));
    }

    #[test]
    fn initializer_bare_return_is_fine() {
        assert!(!resolve_source("class A { init() { return; } }"));
    }

    #[test]
    fn variable_cannot_read_itself_in_initializer() {
        assert!(resolve_source("{ var a = a; }"));
    }

    #[test]
    fn duplicate_declaration_in_one_scope_is_an_error() {
        assert!(resolve_source("{ var a = 1; var a = 2; }"));
    }

    #[test]
    fn duplicate_declaration_at_top_level_is_allowed() {
        assert!(!resolve_source("var a = 1; var a = 2;"));
    }

    #[test]
    fn class_cannot_inherit_from_itself() {
        assert!(resolve_source("class Oops < Oops {}"));
    }

    #[test]
    fn this_outside_class_is_an_error() {
        assert!(resolve_source("print this;"));
    }

    #[test]
    fn super_outside_class_is_an_error() {
        assert!(resolve_source("print super.x;"));
    }

    #[test]
    fn super_without_superclass_is_an_error() {
        assert!(resolve_source("class A { m() { return super.m(); } }"));
    }

    #[test]
    fn super_in_subclass_is_fine() {
        assert!(!resolve_source("class A { m() {} } class B < A { m() { return super.m(); } }"));
    }

    #[test]
    fn block_local_resolves_at_distance_zero() {
        assert_eq!(depth_of_last_print_variable("{ var a = 1; print a; }"), Some(0));
    }

    #[test]
    fn free_variable_resolves_through_enclosing_function_scope() {
        let source = "fun outer() { var a = 1; fun inner() { print a; } }";
        assert_eq!(depth_of_last_print_variable(source), Some(1));
    }

    #[test]
    fn global_reads_are_left_unresolved() {
        assert_eq!(depth_of_last_print_variable("var a = 1; print a;"), None);
    }

    #[test]
    fn resolution_errors_do_not_stop_the_pass() {
        let reporter = ErrorReporter::new().as_shared();
        let tokens = Scanner::new("return 1; return 2;").scan_tokens();
        let stmts = Parser::new(tokens).with_error_reporting(reporter.clone()).parse();

        let mut interpreter = Interpreter::new();
        let mut resolver =
            Resolver::new(&mut interpreter).with_error_reporting(reporter.clone());
        resolver.resolve(&stmts);

        assert!(reporter.borrow().had_error);
    }
}
