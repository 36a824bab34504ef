//! Crate-wide error type.
//!
//! Every failure surfaces as an [`AppError`] carrying a process exit code and a
//! message. Library callers can branch on the code; the binary prints the
//! message and exits with it.

/// Missing or unreadable files, malformed artifacts/run files, bad option values.
pub const EXIT_INPUT: u8 = 2;
/// Shape or domain violations in data handed to the emulator or the sampler.
pub const EXIT_DATA: u8 = 3;
/// Numerical failures at run time (non-finite likelihoods, stuck sampler).
pub const EXIT_NUMERIC: u8 = 4;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Clone, PartialEq, Eq)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(EXIT_INPUT, message)
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::new(EXIT_DATA, message)
    }

    pub fn numeric(message: impl Into<String>) -> Self {
        Self::new(EXIT_NUMERIC, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_assign_exit_codes() {
        assert_eq!(AppError::input("x").exit_code(), EXIT_INPUT);
        assert_eq!(AppError::data("x").exit_code(), EXIT_DATA);
        assert_eq!(AppError::numeric("x").exit_code(), EXIT_NUMERIC);
    }

    #[test]
    fn display_is_the_bare_message() {
        let err = AppError::data("Input has 3 columns, expected 5.");
        assert_eq!(err.to_string(), "Input has 3 columns, expected 5.");
        assert_eq!(err.message(), "Input has 3 columns, expected 5.");
    }
}
