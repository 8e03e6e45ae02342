//! Custom error types with exit codes

use thiserror::Error;

/// Main error type for gitolite-conf operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GitoliteError {
    /// Configuration Error - missing or invalid settings
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Parse Error - a gitolite.conf line could not be compiled
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Permission Error - token outside the permission grammar
    #[error("Invalid permission: '{permission}'")]
    InvalidPermission { permission: String },

    /// Group Dependency Error - groups cannot be ordered for output
    #[error("Group dependency error: {message}")]
    GroupDependency { message: String },

    /// Key Error - malformed public key text or key path
    #[error("Invalid SSH key: {message}")]
    InvalidKey { message: String },

    /// Git Error - Git operation failed
    #[error("Git error: {message}")]
    Git { message: String },

    /// Filesystem Error - file operation failed
    #[error("Filesystem error: {message}")]
    Filesystem { message: String },

    /// Argument Error - a model was handed an unusable value
    #[error("Invalid argument: {message}")]
    Argument { message: String },

    /// Lock Error - the transaction lock could not be taken
    #[error("Lock error: {message}")]
    Lock { message: String },
}

/// Result alias used by the compiler and key APIs
pub type Result<T> = core::result::Result<T, GitoliteError>;

impl GitoliteError {
    /// Get the appropriate exit code for this error type
    #[must_use]
    #[inline]
    pub const fn exit_code(&self) -> i32 {
        match *self {
            Self::Configuration { .. } => 1,
            Self::Parse { .. } => 2,
            Self::InvalidPermission { .. } => 3,
            Self::GroupDependency { .. } => 4,
            Self::InvalidKey { .. } => 5,
            Self::Git { .. } => 6,
            Self::Filesystem { .. } => 7,
            Self::Argument { .. } => 8,
            Self::Lock { .. } => 9,
        }
    }

    /// Create a configuration error
    #[inline]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a parse error for a 1-based line number
    #[inline]
    pub fn parse<S: Into<String>>(line: usize, message: S) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid permission error
    #[inline]
    pub fn invalid_permission<S: Into<String>>(permission: S) -> Self {
        Self::InvalidPermission {
            permission: permission.into(),
        }
    }

    /// Create a group dependency error
    #[inline]
    pub fn group_dependency<S: Into<String>>(message: S) -> Self {
        Self::GroupDependency {
            message: message.into(),
        }
    }

    /// Create an invalid key error
    #[inline]
    pub fn invalid_key<S: Into<String>>(message: S) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Create a git error
    #[inline]
    pub fn git<S: Into<String>>(message: S) -> Self {
        Self::Git {
            message: message.into(),
        }
    }

    /// Create a filesystem error
    #[inline]
    pub fn filesystem<S: Into<String>>(message: S) -> Self {
        Self::Filesystem {
            message: message.into(),
        }
    }

    /// Create an argument error
    #[inline]
    pub fn argument<S: Into<String>>(message: S) -> Self {
        Self::Argument {
            message: message.into(),
        }
    }

    /// Create a lock error
    #[inline]
    pub fn lock<S: Into<String>>(message: S) -> Self {
        Self::Lock {
            message: message.into(),
        }
    }
}
