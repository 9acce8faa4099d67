use crate::ast::{Expr, Stmt};

/// Prints the AST in a Lisp-ish prefix form. Mostly useful through the
/// `parse` CLI subcommand when debugging the parser.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print_expr(expr: &Expr) -> String {
        match expr {
            Expr::Binary { left, operator, right } => {
                format!("({} {} {})", operator.lexeme, Self::print_expr(left), Self::print_expr(right))
            }
            Expr::Logical { left, operator, right } => {
                format!("({} {} {})", operator.lexeme, Self::print_expr(left), Self::print_expr(right))
            }
            Expr::Grouping { expr } => format!("(group {})", Self::print_expr(expr)),
            Expr::Literal { value } => format!("{value}"),
            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print_expr(right))
            }
            Expr::Variable { name, .. } => name.lexeme.clone(),
            Expr::Assignment { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print_expr(value))
            }
            Expr::Call { callee, arguments, .. } => {
                let args = arguments.iter().map(Self::print_expr).collect::<Vec<_>>().join(" ");
                format!("(call {} {})", Self::print_expr(callee), args)
            }
            Expr::Get { object, name } => format!("(get {} {})", Self::print_expr(object), name.lexeme),
            Expr::Set { object, name, value } => {
                format!("(set {} {} {})", Self::print_expr(object), name.lexeme, Self::print_expr(value))
            }
            Expr::This { .. } => "this".to_owned(),
            Expr::Super { method, .. } => format!("(super {})", method.lexeme),
        }
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression { expr } => format!("(expr {})", Self::print_expr(expr)),
            Stmt::Print { expr } => format!("(print {})", Self::print_expr(expr)),
            Stmt::Var { name, initializer } => match initializer {
                Some(init) => format!("(var {} {})", name.lexeme, Self::print_expr(init)),
                None => format!("(var {})", name.lexeme),
            },
            Stmt::Block { statements } => {
                let inner = statements.iter().map(Self::print_stmt).collect::<Vec<_>>().join(" ");
                format!("(block {})", inner)
            }
            Stmt::If { condition, then_branch, else_branch } => match else_branch {
                Some(els) => format!(
                    "(if {} {} {})",
                    Self::print_expr(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(els)
                ),
                None => {
                    format!("(if {} {})", Self::print_expr(condition), Self::print_stmt(then_branch))
                }
            },
            Stmt::While { condition, body, increment } => match increment {
                Some(inc) => format!(
                    "(while {} {} :inc {})",
                    Self::print_expr(condition),
                    Self::print_stmt(body),
                    Self::print_expr(inc)
                ),
                None => {
                    format!("(while {} {})", Self::print_expr(condition), Self::print_stmt(body))
                }
            },
            Stmt::Function { name, params, body } => {
                let params = params.iter().map(|p| p.lexeme.clone()).collect::<Vec<_>>().join(" ");
                let body =
                    body.iter().map(|s| Self::print_stmt(s)).collect::<Vec<_>>().join(" ");
                format!("(fun {} ({}) {})", name.lexeme, params, body)
            }
            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", Self::print_expr(value)),
                None => "(return)".to_owned(),
            },
            Stmt::Class { name, superclass, methods } => {
                let methods = methods.iter().map(Self::print_stmt).collect::<Vec<_>>().join(" ");
                match superclass {
                    Some(superclass) => format!(
                        "(class {} < {} {})",
                        name.lexeme,
                        Self::print_expr(superclass),
                        methods
                    ),
                    None => format!("(class {} {})", name.lexeme, methods),
                }
            }
            Stmt::Break { .. } => "(break)".to_owned(),
            Stmt::Continue { .. } => "(continue)".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Token, TokenType};

    #[test]
    fn print_an_ast() {
        // This is '-123 * (45.67)'
        let expr = Expr::Binary {
            left: Box::new(Expr::Unary {
                operator: Token::new(TokenType::Minus, "-", None, 1),
                right: Box::new(Expr::int_literal(123.0)),
            }),
            operator: Token::new(TokenType::Star, "*", None, 1),
            right: Box::new(Expr::Grouping { expr: Box::new(Expr::int_literal(45.67)) }),
        };

        let res = AstPrinter::print_expr(&expr);
        assert_eq!(res, "(* (- 123) (group 45.67))".to_owned());
    }
}
