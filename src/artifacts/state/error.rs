#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("{field}: value is required")]
    Required { field: String },
    #[error("reference {0} has appeared multiple times")]
    DuplicateReference(String),
    #[error("module name {0} has appeared multiple times")]
    DuplicateModule(String),
}

impl StateError {
    pub fn required(field: impl Into<String>) -> Self {
        StateError::Required {
            field: field.into(),
        }
    }
}
