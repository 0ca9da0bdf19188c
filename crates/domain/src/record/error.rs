use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A conditional write found a live record at the same key.
    #[error("record already exists: {pkey}/{skey}")]
    AlreadyExists { pkey: String, skey: String },

    /// A stored row could not be decoded. `data` is the raw row, lossily
    /// converted to UTF-8.
    #[error("corrupt record at {key}: {reason} (data: {data})")]
    Corrupt {
        key: String,
        reason: String,
        data: String,
    },

    #[error("record store failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}
