use crate::models::Outcome;

/// Success and failure counts of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub success: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a Outcome>) -> Self {
        outcomes.into_iter().fold(Self::default(), |mut summary, outcome| {
            match outcome {
                Outcome::Success => summary.success += 1,
                Outcome::Failed => summary.failed += 1,
                Outcome::AlreadyExists => {}
            }
            summary
        })
    }

    /// `<label>:k |  Failed:m`
    pub fn line(&self, success_label: &str) -> String {
        format!("{success_label}:{} |  Failed:{}", self.success, self.failed)
    }
}
