// SPDX-License-Identifier: MIT

use core::fmt;

/// Result type for ImgIO operations.
pub type ImgIOResult<T = ()> = core::result::Result<T, ImgIOError>;

/// Error type for ImgIO operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImgIOError {
    Other(&'static str),
    OutOfBounds,
    ShortRead,
    ShortWrite,
    Unsupported,
    Invalid(&'static str),
    #[cfg(feature = "std")]
    Io(std::io::ErrorKind),
}

impl ImgIOError {
    pub fn msg(&self) -> &'static str {
        match self {
            ImgIOError::Other(msg) => msg,
            ImgIOError::OutOfBounds => "Access out of partition bounds",
            ImgIOError::ShortRead => "Unexpected end of image while reading",
            ImgIOError::ShortWrite => "Image accepted fewer bytes than written",
            ImgIOError::Unsupported => "Unsupported operation",
            ImgIOError::Invalid(msg) => msg,
            #[cfg(feature = "std")]
            ImgIOError::Io(_) => "I/O error",
        }
    }
}

impl From<&'static str> for ImgIOError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        ImgIOError::Other(msg)
    }
}

impl fmt::Display for ImgIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        #[cfg(feature = "std")]
        if let ImgIOError::Io(kind) = self {
            write!(f, " ({kind})")?;
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ImgIOError {}

#[cfg(feature = "std")]
impl From<std::io::Error> for ImgIOError {
    #[cold]
    #[inline(never)]
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::UnexpectedEof => ImgIOError::ShortRead,
            std::io::ErrorKind::WriteZero => ImgIOError::ShortWrite,
            kind => ImgIOError::Io(kind),
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_short_transfers() {
        let eof = std::io::Error::from(std::io::ErrorKind::UnexpectedEof);
        assert_eq!(ImgIOError::from(eof), ImgIOError::ShortRead);

        let wz = std::io::Error::from(std::io::ErrorKind::WriteZero);
        assert_eq!(ImgIOError::from(wz), ImgIOError::ShortWrite);

        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let err = ImgIOError::from(denied);
        assert_eq!(err, ImgIOError::Io(std::io::ErrorKind::PermissionDenied));
        assert!(err.to_string().starts_with("I/O error"));
    }
}
