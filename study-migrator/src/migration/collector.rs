use tracing::error;

use crate::errors::MigrationError;

/// Gathers the errors of a run so that one bad record does not stop it.
///
/// Every error is logged as it is recorded and kept until the end of the run.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Vec<MigrationError>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs and keeps `error`.
    pub fn record(&mut self, error: impl Into<MigrationError>) {
        let error = error.into();
        error!("{}", error);
        self.errors.push(error);
    }

    /// Returns the value of `result`, or records its error and returns `None`.
    pub fn collect<T, E>(&mut self, result: Result<T, E>) -> Option<T>
    where
        E: Into<MigrationError>,
    {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.record(e);
                None
            }
        }
    }

    pub fn errors(&self) -> &[MigrationError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Ends collection: `Ok` when nothing was recorded, every error otherwise.
    pub fn into_result(self) -> Result<(), Vec<MigrationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}
