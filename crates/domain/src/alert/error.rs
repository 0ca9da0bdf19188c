use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("alert field '{0}' must not be empty")]
    MissingField(&'static str),

    #[error("alert carries an attribute with an empty {field}: {attribute}")]
    InvalidAttribute {
        field: &'static str,
        attribute: String,
    },
}
