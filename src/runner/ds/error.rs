use std::fmt;

/// Coarse classification of a [`JErrorType`], handy for matching without caring about the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Type,
    Reference,
    Range,
    StackOverflow,
    Internal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JErrorType {
    ReferenceError(String),
    TypeError(String),
    RangeError(String),
    SyntaxError(String),
    /// Call depth exceeded the configured limit. Aborts the running script.
    StackOverflow(String),
    /// The engine refused to continue, e.g. on an over-long prototype chain.
    InternalError(String),
}

impl JErrorType {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JErrorType::ReferenceError(_) => ErrorKind::Reference,
            JErrorType::TypeError(_) => ErrorKind::Type,
            JErrorType::RangeError(_) => ErrorKind::Range,
            JErrorType::SyntaxError(_) => ErrorKind::Syntax,
            JErrorType::StackOverflow(_) => ErrorKind::StackOverflow,
            JErrorType::InternalError(_) => ErrorKind::Internal,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            JErrorType::ReferenceError(m)
            | JErrorType::TypeError(m)
            | JErrorType::RangeError(m)
            | JErrorType::SyntaxError(m)
            | JErrorType::StackOverflow(m)
            | JErrorType::InternalError(m) => m,
        }
    }
}

impl fmt::Display for JErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JErrorType::ReferenceError(m) => write!(f, "Uncaught reference error: {}.", m),
            JErrorType::TypeError(m) => write!(f, "Uncaught type error: {}.", m),
            JErrorType::RangeError(m) => write!(f, "Uncaught range error: {}.", m),
            JErrorType::SyntaxError(m) => write!(f, "Uncaught syntax error: {}.", m),
            JErrorType::StackOverflow(m) => write!(f, "Uncaught stack overflow: {}.", m),
            JErrorType::InternalError(m) => write!(f, "Internal error: {}.", m),
        }
    }
}

impl std::error::Error for JErrorType {}
