//! Engine limits.

/// Limits applied while scripts run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    /// Maximum number of nested function calls (native ones included) before a
    /// stack overflow error is raised. Each script call recurses through the VM on the
    /// host stack, so the default stays well below what a 2 MB thread stack holds in a
    /// debug build.
    pub max_call_depth: usize,
    /// Maximum number of prototype links a property lookup may follow.
    pub max_prototype_chain_depth: usize,
}

pub const DEFAULT_MAX_CALL_DEPTH: usize = 128;
pub const DEFAULT_MAX_PROTOTYPE_CHAIN_DEPTH: usize = 10_000;

impl RunnerConfig {
    pub fn new() -> Self {
        RunnerConfig {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_prototype_chain_depth: DEFAULT_MAX_PROTOTYPE_CHAIN_DEPTH,
        }
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_max_prototype_chain_depth(mut self, depth: usize) -> Self {
        self.max_prototype_chain_depth = depth;
        self
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::new()
    }
}
