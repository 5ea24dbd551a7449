use crate::Error;

/// Integrity failure reported by the storage engine.
///
/// Drivers attach it to the [`Error`] they return, callers retrieve it with
/// [`ConstraintError::find`] regardless of the context added on top.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstraintError {
    /// A `CHECK` or `NOT NULL` constraint failed, for example a value longer than allowed.
    #[error("Constraint violation: {message}")]
    ConstraintViolation { message: String },
    /// A unique index or the primary key would contain a duplicate.
    #[error("Unique constraint violation: {message}")]
    UniqueConstraintViolation { message: String },
    /// A referenced row does not exist.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },
}

impl ConstraintError {
    /// First constraint error in the chain of `error`.
    pub fn find(error: &Error) -> Option<&ConstraintError> {
        error.chain().find_map(|e| e.downcast_ref::<ConstraintError>())
    }

    pub fn message(&self) -> &str {
        match self {
            ConstraintError::ConstraintViolation { message }
            | ConstraintError::UniqueConstraintViolation { message }
            | ConstraintError::ForeignKeyViolation { message } => message,
        }
    }

    pub fn is_constraint_violation(error: &Error) -> bool {
        matches!(
            Self::find(error),
            Some(ConstraintError::ConstraintViolation { .. })
        )
    }

    pub fn is_unique_violation(error: &Error) -> bool {
        matches!(
            Self::find(error),
            Some(ConstraintError::UniqueConstraintViolation { .. })
        )
    }

    pub fn is_foreign_key_violation(error: &Error) -> bool {
        matches!(
            Self::find(error),
            Some(ConstraintError::ForeignKeyViolation { .. })
        )
    }
}
