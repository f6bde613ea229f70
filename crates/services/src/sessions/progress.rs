/// Aggregated view of session progress, useful for the console header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub correct: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

impl SessionProgress {
    /// 1-based number of the question being asked, e.g. `3` in "Question 3/5".
    #[must_use]
    pub fn current_number(&self) -> usize {
        (self.answered + 1).min(self.total)
    }
}
