//! Common error handling utilities
//!
//! Message-context chaining for custom error types, similar to anyhow's
//! `context()` but producing plain strings for error enum payloads.

use std::fmt;

/// Trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context<C>(self, context: C) -> Result<T, String>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Add context with a closure (lazy evaluation)
    fn with_context<C, F>(self, f: F) -> Result<T, String>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T, String>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| format!("{context}: {e}"))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, String>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| format!("{}: {}", f(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorContext;

    #[test]
    fn context_prefixes_the_message() {
        let result: Result<(), std::io::Error> = Err(std::io::Error::other("boom"));
        let err = result.context("reading config").unwrap_err();
        assert_eq!(err, "reading config: boom");
    }

    #[test]
    fn with_context_formats_on_error() {
        let result: Result<(), std::io::Error> = Err(std::io::Error::other("denied"));
        let err = result
            .with_context(|| format!("opening {}", "encoder.json"))
            .unwrap_err();
        assert_eq!(err, "opening encoder.json: denied");
    }
}
