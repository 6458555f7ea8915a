//! VM resource limits.

/// Limits enforced while executing.
///
/// Exceeding either limit faults the VM with `StackOverflow`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VmConfig {
    /// Maximum number of live frames, top-level frame included.
    pub max_call_depth: usize,
    /// Maximum operand-stack height of a single frame.
    pub max_operand_stack: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            max_call_depth: 256,
            max_operand_stack: 1024,
        }
    }
}

impl VmConfig {
    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    #[must_use]
    pub fn with_max_operand_stack(mut self, height: usize) -> Self {
        self.max_operand_stack = height;
        self
    }
}
