/// Outcome of acknowledging/finalizing a single identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeResult {
    pub id: String,
    pub success: bool,
}

impl FinalizeResult {
    pub(crate) fn new(id: impl Into<String>, success: bool) -> Self {
        Self {
            id: id.into(),
            success,
        }
    }
}
