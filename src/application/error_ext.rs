//! Path context for I/O failures around tree files

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Converts `io::Result` into `ApplicationResult`, naming the file involved.
pub trait IoResultExt<T> {
    /// Wrap any I/O error as `OperationFailed` with `action: path` as context.
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;

    /// Like [`with_path_context`](Self::with_path_context), but a missing
    /// file becomes [`ApplicationError::TreeFileNotFound`].
    fn tree_file_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{}: {}", action, path.display()),
            source: Box::new(e),
        })
    }

    fn tree_file_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        match self {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ApplicationError::TreeFileNotFound(path.to_path_buf()))
            }
            other => other.with_path_context(action, path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_not_found_when_reading_tree_then_tree_file_not_found() {
        let result: io::Result<()> = Err(io::Error::new(io::ErrorKind::NotFound, "gone"));

        let err = result
            .tree_file_context("read tree", Path::new("plan.json"))
            .unwrap_err();

        assert!(matches!(err, ApplicationError::TreeFileNotFound(p) if p == Path::new("plan.json")));
    }

    #[test]
    fn given_permission_denied_when_reading_tree_then_operation_failed_with_path() {
        let result: io::Result<()> = Err(io::Error::new(io::ErrorKind::PermissionDenied, "no"));

        let err = result
            .tree_file_context("read tree", Path::new("plan.json"))
            .unwrap_err();

        assert_eq!(err.to_string(), "operation failed: read tree: plan.json");
    }
}
