use thiserror::Error;

use crate::object::Object;

/// Everything that can unwind evaluation. Only `Error` is a real
/// runtime error; `Break`, `Continue` and `Return` are control flow
/// propagated through `Result` and caught at the loop or call
/// boundary, so they never reach the user.
#[derive(Debug, Error, PartialEq)]
pub enum RuntimeInterrupt {
    #[error("{msg}\n[line {line}]")]
    Error { line: i32, msg: String },

    #[error("Unexpected 'break' outside of a loop.\n[line {line}]")]
    Break { line: i32 },

    #[error("Unexpected 'continue' outside of a loop.\n[line {line}]")]
    Continue { line: i32 },

    #[error("Unexpected 'return' outside of a function.\n[line {line}]")]
    Return { line: i32, value: Object },
}

impl RuntimeInterrupt {
    pub fn error(line: i32, msg: impl AsRef<str>) -> Self {
        Self::Error { line, msg: msg.as_ref().to_owned() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_error_formats_message_then_line() {
        let e = RuntimeInterrupt::error(3, "Operand must be a number.");
        assert_eq!(e.to_string(), "Operand must be a number.\n[line 3]");
    }
}
