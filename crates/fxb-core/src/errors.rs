/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the update
/// handler can tell a harmless "nothing changed" edit apart from a real fault.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("message is not modified")]
    MessageNotModified,

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// True when an edit was rejected only because the content is identical.
    pub fn is_not_modified(&self) -> bool {
        matches!(self, Error::MessageNotModified)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_not_modified_is_harmless() {
        assert!(Error::MessageNotModified.is_not_modified());
        assert!(!Error::External("boom".into()).is_not_modified());
        assert!(!Error::Config("x".into()).is_not_modified());
    }
}
