use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_format(element: impl Into<String>, message: impl Into<String>) -> Error {
        ErrorKind::InvalidFormat {
            element: element.into(),
            message: message.into(),
        }
        .into()
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        ErrorKind::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
        .into()
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        ErrorKind::InvalidOperation { name: name.into() }.into()
    }

    pub fn not_implemented(message: impl Into<String>) -> Error {
        ErrorKind::NotImplemented {
            message: message.into(),
        }
        .into()
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        ErrorKind::Io {
            context: context.into(),
            source,
        }
        .into()
    }

    pub fn out_of_bounds(
        element: impl Into<String>,
        position: u64,
        requested: u64,
        remaining: u64,
    ) -> Error {
        ErrorKind::OutOfBounds {
            element: element.into(),
            position,
            requested,
            remaining,
        }
        .into()
    }

    pub fn size_mismatch(element: impl Into<String>, expected: u64, actual: u64) -> Error {
        ErrorKind::SizeMismatch {
            element: element.into(),
            expected,
            actual,
        }
        .into()
    }

    pub fn decompression_failed(element: impl Into<String>, message: impl Into<String>) -> Error {
        ErrorKind::DecompressionFailed {
            element: element.into(),
            message: message.into(),
        }
        .into()
    }

    pub fn unknown_tag(element: impl Into<String>, tag: u8) -> Error {
        ErrorKind::UnknownTag {
            element: element.into(),
            tag,
        }
        .into()
    }

    /// Wraps this error with the location it was raised in, e.g. the tile
    /// offset or the table and field being decoded.
    pub fn context(self, context: impl Into<String>) -> Error {
        ErrorKind::Context {
            context: context.into(),
            source: self,
        }
        .into()
    }

    /// Returns the kind of the innermost error, skipping `Context` wrappers.
    pub fn root_kind(&self) -> &ErrorKind {
        let mut kind = self.kind();
        while let ErrorKind::Context { source, .. } = kind {
            kind = source.kind();
        }
        kind
    }

    /// Returns `true` if this error was caused by reading past the end of a buffer
    /// or of the underlying object.
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self.root_kind(), ErrorKind::OutOfBounds { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("not yet implemented: {message}")]
    NotImplemented { message: String },

    #[error(
        "failed to resolve url '{url}' (relative: {}), reason: {reason}",
        relative.as_deref().unwrap_or_default())]
    ResolveUrl {
        url: String,
        relative: Option<String>,
        reason: String,
    },

    #[error("invalid storage format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error(
        "out of bounds read of '{element}' at position {position}: \
         requested {requested} bytes, {remaining} remaining"
    )]
    OutOfBounds {
        element: String,
        position: u64,
        requested: u64,
        remaining: u64,
    },

    #[error("short read at offset {offset}: expected {expected} bytes, got {actual}")]
    ShortRead {
        offset: u64,
        expected: u64,
        actual: u64,
    },

    #[error("corrupt footer: footer size {footer_size} does not fit in file of {file_size} bytes")]
    CorruptFooter { file_size: u64, footer_size: u64 },

    #[error("unsupported filter stage: chunk declares {metadata_parts} metadata parts")]
    UnsupportedFilterStage { metadata_parts: u32 },

    #[error("decompression failed for '{element}': {message}")]
    DecompressionFailed { element: String, message: String },

    #[error("size mismatch for '{element}': expected {expected}, actual {actual}")]
    SizeMismatch {
        element: String,
        expected: u64,
        actual: u64,
    },

    #[error("unknown {element} tag {tag}")]
    UnknownTag { element: String, tag: u8 },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Context { context: String, source: Error },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}
