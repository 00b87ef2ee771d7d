use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::sync::Arc;

use thiserror::Error;

/// Every failure the engine reports.
///
/// Errors propagate synchronously to the top-level call; nothing is
/// retried. The type is `Clone` so a failed deferred load can report the
/// same error on every later access.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum ClassifyError {
    /// Invalid setup that does not depend on the data being processed.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A reference id that no referable element in the graph defines.
    #[error("unresolved reference `{id}`")]
    UnresolvedReference { id: String },
    /// The declassifier needs an instance it cannot create.
    #[error("cannot instantiate `{type_path}`: {reason}")]
    Uninstantiable { type_path: String, reason: String },
    /// A follow-id field was met without a unit store.
    #[error("field `{field}` is stored by id, but no base directory is configured")]
    MissingBaseDirectory { field: String },
    /// Element shape does not match the declared type.
    #[error("malformed element: {0}")]
    Malformed(String),
    /// A scalar cannot be converted without losing information.
    #[error("cannot convert `{value}` to `{type_path}` without loss")]
    Conversion { value: String, type_path: String },
    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch { expected: String, found: String },
    /// A shared value was mutably borrowed while the engine needed it.
    #[error("shared value is already borrowed")]
    AlreadyBorrowed,
    /// Context wrapper naming the field an error came from.
    #[error("in field `{type_path}::{field}`: {source}")]
    Field {
        type_path: String,
        field: String,
        #[source]
        source: Box<ClassifyError>,
    },
    #[error("i/o error: {0}")]
    Io(Arc<std::io::Error>),
}

impl ClassifyError {
    #[inline]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    #[inline]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    #[inline]
    pub fn uninstantiable(type_path: &str, reason: impl Into<String>) -> Self {
        Self::Uninstantiable {
            type_path: type_path.to_string(),
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn mismatch(expected: &str, found: &str) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Wrap `self` with the field it was raised in.
    pub fn in_field(self, type_path: &str, field: &str) -> Self {
        Self::Field {
            type_path: type_path.to_string(),
            field: field.to_string(),
            source: Box::new(self),
        }
    }

    /// Strip every [`ClassifyError::Field`] layer.
    pub fn root_cause(&self) -> &ClassifyError {
        let mut err = self;
        while let Self::Field { source, .. } = err {
            err = source;
        }
        err
    }
}

impl From<std::io::Error> for ClassifyError {
    #[inline]
    fn from(value: std::io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::ClassifyError;
    use alloc::string::ToString;

    #[test]
    fn field_context() {
        let err = ClassifyError::malformed("expected a list")
            .in_field("demo::Inner", "items")
            .in_field("demo::Outer", "inner");

        assert!(matches!(err.root_cause(), ClassifyError::Malformed(_)));
        assert_eq!(
            err.to_string(),
            "in field `demo::Outer::inner`: in field `demo::Inner::items`: \
             malformed element: expected a list",
        );
    }

    #[test]
    fn io_is_clone() {
        let err: ClassifyError = std::io::Error::other("disk").into();
        let copy = err.clone();
        assert!(matches!(copy, ClassifyError::Io(_)));
    }
}
