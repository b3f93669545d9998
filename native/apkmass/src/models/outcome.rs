/// Result of transferring or installing a single package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
    /// Reserved for an install that finds the package already present.
    /// Nothing produces this yet and summaries do not count it.
    AlreadyExists,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}
