use super::class::Class;
use super::interrupt::RuntimeInterrupt;
use super::{Interpreter, InterpreterResult};
use crate::ast::{Expr, NodeId};
use crate::object::Object;
use crate::token::{Token, TokenType};

impl Interpreter {
    pub fn evaluate_expr(&mut self, expr: &Expr) -> InterpreterResult {
        match expr {
            Expr::Literal { value } => Ok(value.clone()),
            Expr::Grouping { expr: inner } => self.evaluate_expr(inner.as_ref()),
            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),
            Expr::Binary { left, operator, right } => self.evaluate_binary(left, operator, right),
            Expr::Variable { id, name } => self.lookup_variable(*id, name),
            Expr::Assignment { id, name, value } => {
                let value = self.evaluate_expr(value.as_ref())?;

                if let Some(&distance) = self.locals.get(id) {
                    self.environment.borrow_mut().assign_at(distance, name, value.clone())?;
                } else {
                    self.globals.borrow_mut().assign(name, value.clone())?;
                }

                Ok(value)
            }
            Expr::Logical { left, operator, right } => {
                let left_val = self.evaluate_expr(left)?;

                // Short-circuit on the left operand's truthiness and hand
                // back the deciding operand itself, not a coerced bool.
                if operator.token_type == TokenType::Or {
                    if self.is_truthy(&left_val) {
                        return Ok(left_val);
                    }
                } else if !self.is_truthy(&left_val) {
                    return Ok(left_val);
                }

                self.evaluate_expr(right)
            }
            Expr::Call { callee, paren, arguments } => {
                self.evaluate_call(callee, paren.line, arguments)
            }
            Expr::Get { object, name } => {
                let object = self.evaluate_expr(object)?;
                if let Object::Instance(ref instance) = object {
                    instance.borrow().get(name, &object)
                } else {
                    Err(RuntimeInterrupt::error(name.line, "Only instances have properties."))
                }
            }
            Expr::Set { object, name, value } => {
                let object = self.evaluate_expr(object)?;

                if let Object::Instance(instance) = object {
                    let value = self.evaluate_expr(value)?;
                    instance.borrow_mut().set(name, value.clone());
                    Ok(value)
                } else {
                    Err(RuntimeInterrupt::error(name.line, "Only instances have fields."))
                }
            }
            Expr::This { id, keyword } => self.lookup_variable(*id, keyword),
            Expr::Super { id, keyword, method } => self.evaluate_super(*id, keyword, method),
        }
    }

    pub(super) fn is_truthy(&self, value: &Object) -> bool {
        !matches!(value, Object::Null | Object::Boolean(false))
    }

    fn evaluate_call(&mut self, callee: &Expr, line: i32, arguments: &[Expr]) -> InterpreterResult {
        let callee = self.evaluate_expr(callee)?;

        // Arguments evaluate left to right before any checks
        let mut args = Vec::with_capacity(arguments.len());
        for arg in arguments {
            args.push(self.evaluate_expr(arg)?);
        }

        match callee {
            Object::Callable(callable) => {
                if callable.arity() != args.len() {
                    return Err(RuntimeInterrupt::error(
                        line,
                        format!("Expected {} arguments but got {}.", callable.arity(), args.len()),
                    ));
                }

                callable.call(self, &args)
            }
            Object::Class(class) => {
                let arity = class.borrow().arity();
                if arity != args.len() {
                    return Err(RuntimeInterrupt::error(
                        line,
                        format!("Expected {} arguments but got {}.", arity, args.len()),
                    ));
                }

                Class::construct(class, &args, self)
            }
            _ => Err(RuntimeInterrupt::error(line, "Can only call functions and classes.")),
        }
    }

    /// `super.METHOD` reads the superclass at the resolved distance and
    /// the receiver one scope below it, where bind() put `this`.
    fn evaluate_super(&mut self, id: NodeId, keyword: &Token, method_name: &Token) -> InterpreterResult {
        let distance = match self.locals.get(&id) {
            Some(&d) => d,
            None => {
                return Err(RuntimeInterrupt::error(
                    keyword.line,
                    "Can't use 'super' outside of a class.",
                ))
            }
        };

        let superclass = match self.environment.borrow().read_at(distance, "super") {
            Some(Object::Class(class)) => class,
            _ => {
                return Err(RuntimeInterrupt::error(keyword.line, "Superclass must be a class."))
            }
        };

        let receiver = match self.environment.borrow().read_at(distance - 1, "this") {
            Some(value) => value,
            None => {
                return Err(RuntimeInterrupt::error(keyword.line, "Undefined variable 'this'."))
            }
        };

        let result = match superclass.borrow().find_method(&method_name.lexeme) {
            Some(method) => Ok(Object::Callable(method.bind(receiver))),
            None => Err(RuntimeInterrupt::error(
                method_name.line,
                format!("Undefined property '{}'.", method_name.lexeme),
            )),
        };
        result
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> InterpreterResult {
        let value = self.evaluate_expr(right)?;
        match operator.token_type {
            TokenType::Minus => {
                if let Object::Number(n) = value {
                    Ok(Object::Number(-n))
                } else {
                    Err(RuntimeInterrupt::error(operator.line, "Operand must be a number."))
                }
            }
            TokenType::Bang => Ok(Object::Boolean(!self.is_truthy(&value))),

            // Unreachable; the parser only builds '!' and '-' unaries.
            _ => Ok(Object::Null),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> InterpreterResult {
        let left_value = self.evaluate_expr(left)?;
        let right_value = self.evaluate_expr(right)?;

        match operator.token_type {
            TokenType::Plus => {
                if let (Some(l), Some(r)) = (left_value.number(), right_value.number()) {
                    Ok(Object::Number(l + r))
                } else if let (Some(l), Some(r)) = (left_value.string(), right_value.string()) {
                    Ok(Object::String(format!("{l}{r}")))
                } else {
                    Err(RuntimeInterrupt::error(
                        operator.line,
                        "Operands must be numbers or strings.",
                    ))
                }
            }
            TokenType::Minus => self
                .check_number_operands(operator, &left_value, &right_value)
                .map(|(l, r)| Object::Number(l - r)),
            TokenType::Star => self
                .check_number_operands(operator, &left_value, &right_value)
                .map(|(l, r)| Object::Number(l * r)),
            TokenType::Slash => self
                .check_number_operands(operator, &left_value, &right_value)
                .map(|(l, r)| Object::Number(l / r)),
            TokenType::Greater => self
                .check_number_operands(operator, &left_value, &right_value)
                .map(|(l, r)| Object::Boolean(l > r)),
            TokenType::GreaterEqual => self
                .check_number_operands(operator, &left_value, &right_value)
                .map(|(l, r)| Object::Boolean(l >= r)),
            TokenType::Less => self
                .check_number_operands(operator, &left_value, &right_value)
                .map(|(l, r)| Object::Boolean(l < r)),
            TokenType::LessEqual => self
                .check_number_operands(operator, &left_value, &right_value)
                .map(|(l, r)| Object::Boolean(l <= r)),

            TokenType::EqualEqual => Ok(Object::Boolean(left_value == right_value)),
            TokenType::BangEqual => Ok(Object::Boolean(left_value != right_value)),

            // Unreachable
            _ => Ok(Object::Null),
        }
    }

    fn check_number_operands(
        &self,
        operator: &Token,
        left: &Object,
        right: &Object,
    ) -> Result<(f64, f64), RuntimeInterrupt> {
        if let (Some(l), Some(r)) = (left.number(), right.number()) {
            Ok((l, r))
        } else {
            Err(RuntimeInterrupt::error(operator.line, "Operands must be numbers."))
        }
    }

    fn lookup_variable(&self, id: NodeId, name: &Token) -> Result<Object, RuntimeInterrupt> {
        if let Some(&distance) = self.locals.get(&id) {
            self.environment.borrow().get_at(distance, name)
        } else {
            self.globals.borrow().get(name)
        }
    }
}
