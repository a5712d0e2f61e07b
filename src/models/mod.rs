pub mod question;
pub mod subject;
pub mod test_question;
pub mod test_sheet;
pub mod unit;

/// Which soft-delete states a catalog read may see.
///
/// Reads pick one of these on purpose instead of relying on an implicit
/// default scope, so a forgotten filter is visible at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    KeptOnly,
    IncludeDiscarded,
}

impl Visibility {
    /// SQL predicate for a table aliased as `alias`.
    pub fn predicate(self, alias: &str) -> String {
        match self {
            Visibility::KeptOnly => format!("{alias}.discarded_at IS NULL"),
            Visibility::IncludeDiscarded => "1 = 1".to_string(),
        }
    }
}

/// A user-supplied string that names no variant of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {kind}: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl From<UnknownVariant> for crate::error::Error {
    fn from(err: UnknownVariant) -> Self {
        crate::error::Error::BadRequest(err.to_string())
    }
}
