// (c) Copyright 2026 golf-extract contributors
// SPDX-License-Identifier: MIT

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Errors that can occur while extracting golf courses from a PBF file.
///
/// Every variant is fatal: the pipeline has no resume points, and a run that
/// hits any of these aborts the whole process (see [`Error::exit_code`]).
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("cannot open {0}: {1}")]
    Open(PathBuf, Arc<io::Error>),

    #[error("io: {0}")]
    Io(Arc<io::Error>),

    #[error("malformed blob framing: {0}")]
    Malformed(String),

    #[error("could not decode blob header: {0}")]
    BlobDecode(Arc<protobuf::Error>),

    #[error("blob carries neither raw nor zlibData")]
    UnsupportedBlobStorage,

    #[error("zlibData is present without rawSize")]
    MissingRawSize,

    #[error("could not decode OSMHeader block: {0}")]
    HeaderDecode(Arc<protobuf::Error>),

    #[error("file requires unsupported feature(s): {0:?}")]
    UnsupportedFeature(Vec<String>),

    #[error("could not decode OSMData block: {0}")]
    DataDecode(Arc<protobuf::Error>),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

impl Error {
    /// Process exit status for this error, per the extraction tool's contract.
    ///
    /// `UnsupportedBlobStorage`/`MissingRawSize` land on 6 rather than 3:
    /// both only ever surface while a pass tries to make sense of an
    /// `OSMData` blob's payload (a header-carrying blob with the same
    /// defect is reported as `HeaderDecode`/5 instead), so they read as a
    /// data-decode failure, not a framing failure. `Malformed`/`BlobDecode`
    /// stay on 3: they're about the outer frame (length prefix, the
    /// `BlobHeader`/`Blob` messages themselves), before content is even
    /// inspected.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Open(..) => 1,
            Error::Io(_) | Error::ThreadPool(_) => 2,
            Error::Malformed(_) | Error::BlobDecode(_) => 3,
            Error::HeaderDecode(_) | Error::UnsupportedFeature(_) => 5,
            Error::UnsupportedBlobStorage | Error::MissingRawSize | Error::DataDecode(_) => 6,
        }
    }

    pub(crate) fn blob_decode(e: protobuf::Error) -> Self {
        Error::BlobDecode(Arc::new(e))
    }

    pub(crate) fn header_decode(e: protobuf::Error) -> Self {
        Error::HeaderDecode(Arc::new(e))
    }

    pub(crate) fn data_decode(e: protobuf::Error) -> Self {
        Error::DataDecode(Arc::new(e))
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(Arc::new(e))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
