//! Limits for potentially exponential decision diagram construction.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Shared flag checked between construction steps.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Budget {
    /// Maximum size of an intermediate characteristic function.
    pub node_limit: Option<usize>,
    pub cancel: Option<CancellationToken>,
}

impl Budget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_node_limit(mut self, limit: usize) -> Self {
        self.node_limit = Some(limit);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Fails if cancellation was requested or `nodes` exceeds the limit.
    pub fn check(&self, nodes: usize) -> Result<()> {
        if self.cancel.as_ref().is_some_and(|token| token.is_cancelled()) {
            return Err(Error::Cancelled);
        }
        match self.node_limit {
            Some(limit) if nodes > limit => Err(Error::ResourceExhausted { nodes, limit }),
            _ => Ok(()),
        }
    }
}
