//! Handler types and dependencies

use std::sync::Arc;

use pyqcore::QuizService;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub service: Arc<QuizService>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(service: Arc<QuizService>) -> Self {
        Self { service }
    }
}
