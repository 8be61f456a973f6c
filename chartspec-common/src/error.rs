use std::result;
use thiserror::Error;

pub type Result<T> = result::Result<T, ChartSpecError>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorContext {
    pub contexts: Vec<String>,
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (i, context) in self.contexts.iter().enumerate() {
            writeln!(f, "    Context[{i}]: {context}")?;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ChartSpecError {
    #[error("Spec parsing error: {0}\n{1}")]
    ParseError(String, ErrorContext),

    #[error("Spec compilation error: {0}\n{1}")]
    CompilationError(String, ErrorContext),

    #[error("Internal error: {0}\n{1}")]
    InternalError(String, ErrorContext),

    #[error("Specification error: {0}\n{1}")]
    SpecificationError(String, ErrorContext),

    #[error("IO Error: {0}\n{1}")]
    IOError(std::io::Error, ErrorContext),

    #[error("Serde JSON Error: {0}\n{1}")]
    SerdeJsonError(serde_json::Error, ErrorContext),

    #[error("Serde YAML Error: {0}\n{1}")]
    SerdeYamlError(serde_yaml::Error, ErrorContext),
}

impl ChartSpecError {
    /// Append a new context level to the error
    pub fn with_context<S, F>(self, context_fn: F) -> Self
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        use ChartSpecError::*;
        match self {
            ParseError(msg, mut context) => {
                context.contexts.push(context_fn().into());
                ChartSpecError::ParseError(msg, context)
            }
            CompilationError(msg, mut context) => {
                context.contexts.push(context_fn().into());
                ChartSpecError::CompilationError(msg, context)
            }
            InternalError(msg, mut context) => {
                context.contexts.push(context_fn().into());
                ChartSpecError::InternalError(msg, context)
            }
            SpecificationError(msg, mut context) => {
                context.contexts.push(context_fn().into());
                ChartSpecError::SpecificationError(msg, context)
            }
            IOError(err, mut context) => {
                context.contexts.push(context_fn().into());
                ChartSpecError::IOError(err, context)
            }
            SerdeJsonError(err, mut context) => {
                context.contexts.push(context_fn().into());
                ChartSpecError::SerdeJsonError(err, context)
            }
            SerdeYamlError(err, mut context) => {
                context.contexts.push(context_fn().into());
                ChartSpecError::SerdeYamlError(err, context)
            }
        }
    }

    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::ParseError(message.into(), Default::default())
    }

    pub fn compilation<S: Into<String>>(message: S) -> Self {
        Self::CompilationError(message.into(), Default::default())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::InternalError(message.into(), Default::default())
    }

    pub fn specification<S: Into<String>>(message: S) -> Self {
        Self::SpecificationError(message.into(), Default::default())
    }

    /// The bare message without context levels, suitable for an inline warning
    pub fn message(&self) -> String {
        use ChartSpecError::*;
        match self {
            ParseError(msg, _)
            | CompilationError(msg, _)
            | InternalError(msg, _)
            | SpecificationError(msg, _) => msg.clone(),
            IOError(err, _) => err.to_string(),
            SerdeJsonError(err, _) => err.to_string(),
            SerdeYamlError(err, _) => err.to_string(),
        }
    }
}

pub trait ResultWithContext<R> {
    fn with_context<S, F>(self, context_fn: F) -> Result<R>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<R, E> ResultWithContext<R> for result::Result<R, E>
where
    E: Into<ChartSpecError>,
{
    fn with_context<S, F>(self, context_fn: F) -> Result<R>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        match self {
            Ok(val) => Ok(val),
            Err(err) => {
                let chart_spec_error: ChartSpecError = err.into();
                Err(chart_spec_error.with_context(context_fn))
            }
        }
    }
}

impl<R> ResultWithContext<R> for Option<R> {
    fn with_context<S, F>(self, context_fn: F) -> Result<R>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        match self {
            Some(val) => Ok(val),
            None => Err(ChartSpecError::internal(context_fn().into())),
        }
    }
}

impl From<std::io::Error> for ChartSpecError {
    fn from(err: std::io::Error) -> Self {
        Self::IOError(err, Default::default())
    }
}

impl From<serde_json::Error> for ChartSpecError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerdeJsonError(err, Default::default())
    }
}

impl From<serde_yaml::Error> for ChartSpecError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerdeYamlError(err, Default::default())
    }
}
