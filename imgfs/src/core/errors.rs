// SPDX-License-Identifier: MIT

use core::fmt;

pub use imgio::errors::*;

/// On-disk structures that do not describe a valid volume, or names that
/// cannot be stored in one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsFormatError {
    BadJumpBoot,
    BadBootSignature,
    ZeroSectorSize,
    ZeroClusterSize,
    ZeroSectorCount,
    MediaMismatch(u16),
    EndMarkerMismatch(u16),
    BadTableSize,
    UnknownWidth(u32),
    BadName(&'static str),
    Invalid(&'static str),
    Other(&'static str),
}

impl FsFormatError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsFormatError::BadJumpBoot => "Missing boot jump instruction",
            FsFormatError::BadBootSignature => "Missing 0x55AA boot signature",
            FsFormatError::ZeroSectorSize => "Bytes per sector is zero",
            FsFormatError::ZeroClusterSize => "Sectors per cluster is zero",
            FsFormatError::ZeroSectorCount => "Total sector count is zero",
            FsFormatError::MediaMismatch(_) => "FAT[0] does not match the media descriptor",
            FsFormatError::EndMarkerMismatch(_) => "FAT[1] is not an end-of-chain marker",
            FsFormatError::BadTableSize => "Allocation table size is invalid",
            FsFormatError::UnknownWidth(_) => "Cluster count fits neither FAT12 nor FAT16",
            FsFormatError::BadName(msg) => msg,
            FsFormatError::Invalid(msg) => msg,
            FsFormatError::Other(msg) => msg,
        }
    }
}

impl fmt::Display for FsFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        match self {
            FsFormatError::MediaMismatch(v) | FsFormatError::EndMarkerMismatch(v) => {
                write!(f, " (found: {v:#05X})")
            }
            FsFormatError::UnknownWidth(n) => write!(f, " (clusters: {n})"),
            _ => Ok(()),
        }
    }
}

/// Out of room: no free cluster, a full root directory, or a file that
/// outgrew the 32-bit size field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsCapacityError {
    NoFreeCluster,
    RootFull,
    FileTooLarge,
    Other(&'static str),
}

impl FsCapacityError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsCapacityError::NoFreeCluster => "Not enough space",
            FsCapacityError::RootFull => "Root directory is full",
            FsCapacityError::FileTooLarge => "File exceeds the 4 GiB size limit",
            FsCapacityError::Other(msg) => msg,
        }
    }
}

impl fmt::Display for FsCapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())
    }
}

/// The operation is not valid for the entry, or a chain walk reached a
/// cluster it must never visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsStateError {
    ReadOnly,
    IsDirectory,
    Special,
    NotAFile,
    NameClash,
    ReservedCluster(u32),
    ClusterOutOfRange(u32),
    BadCluster(u32),
    ChainLoop,
    ChainTooShort,
    ClusterTooSmall,
    NotEmpty,
    Unsupported,
    Other(&'static str),
}

impl FsStateError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsStateError::ReadOnly => "Entry is read-only",
            FsStateError::IsDirectory => "Entry is a directory",
            FsStateError::Special => "Entry is a special file",
            FsStateError::NotAFile => "Entry is not a regular file",
            FsStateError::NameClash => "A file with the same name already exists",
            FsStateError::ReservedCluster(_) => "Chain visits a reserved cluster",
            FsStateError::ClusterOutOfRange(_) => "Chain visits a cluster out of range",
            FsStateError::BadCluster(_) => "Chain visits a bad cluster",
            FsStateError::ChainLoop => "Loop detected in cluster chain",
            FsStateError::ChainTooShort => "Cluster chain ends before the recorded file size",
            FsStateError::ClusterTooSmall => "Cluster too small for a directory",
            FsStateError::NotEmpty => "Directory is not empty",
            FsStateError::Unsupported => "Operation not supported by this image",
            FsStateError::Other(msg) => msg,
        }
    }
}

impl fmt::Display for FsStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        match self {
            FsStateError::ReservedCluster(c)
            | FsStateError::ClusterOutOfRange(c)
            | FsStateError::BadCluster(c) => write!(f, " (cluster: {c})"),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsPathError {
    NotFound,
    NotADirectory,
    NotAFile,
    Invalid(&'static str),
    Other(&'static str),
}

impl FsPathError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsPathError::NotFound => "Path not found",
            FsPathError::NotADirectory => "Path is not a directory",
            FsPathError::NotAFile => "Path is not a file",
            FsPathError::Invalid(msg) => msg,
            FsPathError::Other(msg) => msg,
        }
    }
}

impl fmt::Display for FsPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())
    }
}

/// Top-level error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    IO(ImgIOError),
    Format(FsFormatError),
    Capacity(FsCapacityError),
    State(FsStateError),
    Path(FsPathError),
    Other(&'static str),
}

impl FsError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsError::IO(e) => e.msg(),
            FsError::Format(e) => e.msg(),
            FsError::Capacity(e) => e.msg(),
            FsError::State(e) => e.msg(),
            FsError::Path(e) => e.msg(),
            FsError::Other(msg) => msg,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            FsError::IO(_) => "I/O error",
            FsError::Format(_) => "format error",
            FsError::Capacity(_) => "capacity error",
            FsError::State(_) => "state error",
            FsError::Path(_) => "path error",
            FsError::Other(_) => "error",
        }
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.category())?;
        match self {
            FsError::IO(e) => write!(f, "{e}"),
            FsError::Format(e) => write!(f, "{e}"),
            FsError::Capacity(e) => write!(f, "{e}"),
            FsError::State(e) => write!(f, "{e}"),
            FsError::Path(e) => write!(f, "{e}"),
            FsError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for FsError {}

// === type Fs*Result ===

pub type FsResult<T = ()> = Result<T, FsError>;
pub type FsFormatResult<T = ()> = Result<T, FsFormatError>;
pub type FsCapacityResult<T = ()> = Result<T, FsCapacityError>;
pub type FsStateResult<T = ()> = Result<T, FsStateError>;
pub type FsPathResult<T = ()> = Result<T, FsPathError>;

crate::fs_error_wiring! {
    top => FsError {
        ImgIOError      : IO,
        FsFormatError   : Format,
        FsCapacityError : Capacity,
        FsStateError    : State,
        FsPathError     : Path,
    },
    str_into => [
        FsFormatError,
        FsCapacityError,
        FsStateError,
        FsPathError,
    ],
}

impl From<std::io::Error> for FsError {
    #[cold]
    fn from(e: std::io::Error) -> Self {
        FsError::IO(ImgIOError::from(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fails_with_state() -> FsResult<u32> {
        crate::ensure!(false, FsStateError::ReadOnly);
        Ok(1)
    }

    #[test]
    fn test_display_carries_detail() {
        let e: FsError = FsStateError::BadCluster(0xFF7).into();
        assert_eq!(
            e.to_string(),
            "state error: Chain visits a bad cluster (cluster: 4087)"
        );

        let e: FsError = FsFormatError::MediaMismatch(0xF00).into();
        assert!(e.to_string().contains("0xF00"));
    }

    #[test]
    fn test_wiring() {
        assert_eq!(fails_with_state(), Err(FsError::State(FsStateError::ReadOnly)));

        let e: FsError = ImgIOError::OutOfBounds.into();
        assert!(matches!(e, FsError::IO(ImgIOError::OutOfBounds)));

        let e: FsCapacityError = "custom".into();
        assert_eq!(e.msg(), "custom");
    }
}
