//! Error types for slide deck rendering.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a conversion.
///
/// Element-level problems (an unresolved relationship, an unknown theme slot,
/// a zero-size shape, an undecodable picture) never show up here: they are
/// logged and the element is skipped.
#[derive(Error, Debug)]
pub enum Error {
    /// The package has no slides, or a slide part it lists is missing.
    #[error("Malformed package: {0}")]
    MalformedPackage(String),

    /// A rendering capability is absent (surface allocation, font loading).
    #[error("Unsupported environment: {0}")]
    UnsupportedEnvironment(String),

    /// Surface-to-image or document serialization failed.
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// ZIP container error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error in a required part.
    #[error("XML parsing error: {0}")]
    XmlError(String),
}

impl Error {
    /// Whether this error means the input package itself is unusable.
    pub fn is_malformed_package(&self) -> bool {
        matches!(
            self,
            Error::MalformedPackage(_) | Error::ZipError(_) | Error::XmlError(_)
        )
    }
}
