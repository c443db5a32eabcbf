// (c) Copyright 2026 golf-extract contributors
// SPDX-License-Identifier: MIT

//! The PBF container format: length-prefixed blob framing, zlib
//! (de)compression, and the generated protobuf message types for
//! `BlobHeader`/`Blob`/`HeaderBlock`/`PrimitiveBlock`.
//!
//! Decompression of a blob's payload is deferred until [`RawBlob::inflate`]
//! is called, so the sequential reader in [`FramedBlobs`] can stay cheap and
//! single-threaded while the actual CPU-bound work happens on worker threads
//! (see [`crate::scanner`]).

pub mod block;
pub mod coord;
pub mod writer;

include!(concat!(env!("OUT_DIR"), "/pbf_proto/mod.rs"));

use crate::error::Error;
use protobuf::Message;
use std::io::{self, Read, Write};

/// Max permitted size for a serialized [`fileformat::BlobHeader`] — 64 KiB,
/// the upstream OSM PBF format's own documented limit for this field, not
/// the considerably larger bound that applies to an inflated blob's
/// payload (see [`MAX_BLOB_SIZE`]). A `BlobHeader` is a type string plus a
/// couple of integers; one anywhere near the payload-sized bound would
/// itself be a sign of a corrupt file.
const MAX_BLOB_HEADER_SIZE: u32 = 64 * 1024;

/// Max permitted size for an inflated [`fileformat::Blob`] payload — 64 MiB.
const MAX_BLOB_SIZE: u32 = 64 * 1024 * 1024;

/// Which kind of primitive block a [`RawBlob`] carries. Anything other than
/// `OSMHeader`/`OSMData` is skipped by every pass, but still counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobKind {
    Header,
    Data,
    Other,
}

/// One `(BlobHeader, Blob)` frame read from the file, still compressed.
pub struct RawBlob {
    pub kind: BlobKind,
    payload: Vec<u8>,
}

impl RawBlob {
    /// Decodes the wrapping [`fileformat::Blob`] message and inflates its
    /// payload, returning the raw `HeaderBlock`/`PrimitiveBlock` bytes.
    pub fn inflate(self) -> Result<Vec<u8>, Error> {
        decode_blob(&self.payload)
    }
}

/// Sequential iterator over every blob frame in a PBF file, in file order.
/// This is the "producer" of the parallel block scanner: it only performs
/// I/O, leaving inflate + protobuf parsing to the consumers.
pub struct FramedBlobs<R> {
    reader: R,
}

impl<R: Read> FramedBlobs<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read> Iterator for FramedBlobs<R> {
    type Item = Result<RawBlob, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match read_blob_header_size(&mut self.reader) {
            Ok(Some(size)) => Some(self.read_one(size)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl<R: Read> FramedBlobs<R> {
    fn read_one(&mut self, header_size: u32) -> Result<RawBlob, Error> {
        let header = read_blob_header(&mut self.reader, header_size)?;
        let kind = match header.type_() {
            "OSMHeader" => BlobKind::Header,
            "OSMData" => BlobKind::Data,
            _ => BlobKind::Other,
        };

        let datasize = header.datasize();
        if datasize < 0 {
            return Err(Error::Malformed("BlobHeader.datasize is negative".into()));
        }

        let mut payload = vec![0u8; datasize as usize];
        self.reader.read_exact(&mut payload)?;
        Ok(RawBlob { kind, payload })
    }
}

/// Reads the 4-byte big-endian length prefix of the next `BlobHeader`.
/// Returns `Ok(None)` on a clean EOF between frames.
fn read_blob_header_size<R: Read>(r: &mut R) -> Result<Option<u32>, Error> {
    let mut buf = [0u8; 4];
    match r.read_exact(&mut buf) {
        Ok(()) => {
            let size = u32::from_be_bytes(buf);
            if size > MAX_BLOB_HEADER_SIZE {
                return Err(Error::Malformed(format!(
                    "BlobHeader length {size} exceeds {MAX_BLOB_HEADER_SIZE}"
                )));
            }
            Ok(Some(size))
        }
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn read_blob_header<R: Read>(r: &mut R, size: u32) -> Result<fileformat::BlobHeader, Error> {
    let mut buf = vec![0u8; size as usize];
    r.read_exact(&mut buf)?;
    fileformat::BlobHeader::parse_from_bytes(&buf).map_err(Error::blob_decode)
}

/// Inflates a raw [`fileformat::Blob`] message's payload.
fn decode_blob(buf: &[u8]) -> Result<Vec<u8>, Error> {
    let blob = fileformat::Blob::parse_from_bytes(buf).map_err(Error::blob_decode)?;

    let inflated = match blob.data {
        Some(fileformat::blob::Data::Raw(data)) => data,
        Some(fileformat::blob::Data::ZlibData(data)) => {
            let raw_size = blob.raw_size.ok_or(Error::MissingRawSize)? as usize;
            let mut out = Vec::with_capacity(raw_size);
            flate2::read::ZlibDecoder::new(&data[..]).read_to_end(&mut out)?;
            if out.len() != raw_size {
                return Err(Error::Malformed(format!(
                    "inflated blob size {} != declared rawSize {raw_size}",
                    out.len()
                )));
            }
            out
        }
        _ => return Err(Error::UnsupportedBlobStorage),
    };

    if inflated.len() as u64 > MAX_BLOB_SIZE as u64 {
        return Err(Error::Malformed(format!(
            "inflated blob size {} exceeds {MAX_BLOB_SIZE}",
            inflated.len()
        )));
    }

    Ok(inflated)
}

/// Writes one length-prefixed `(BlobHeader, Blob)` frame, with `payload`
/// stored uncompressed (`Blob.raw`), as `blob_type` (`"OSMHeader"` or
/// `"OSMData"`).
pub fn write_frame<W: Write>(w: &mut W, payload: &[u8], blob_type: &str) -> Result<(), Error> {
    let mut blob = fileformat::Blob::default();
    blob.raw_size = Some(payload.len() as i32);
    blob.set_raw(payload.to_vec());
    let blob_bytes = blob.write_to_bytes().map_err(Error::blob_decode)?;

    let mut header = fileformat::BlobHeader::default();
    header.set_type(blob_type.to_string());
    header.set_datasize(blob_bytes.len() as i32);
    let header_bytes = header.write_to_bytes().map_err(Error::blob_decode)?;

    w.write_all(&(header_bytes.len() as u32).to_be_bytes())?;
    w.write_all(&header_bytes)?;
    w.write_all(&blob_bytes)?;
    Ok(())
}

/// Reads only `BlobHeader`s, seeking past each blob's payload, to count the
/// total number of blobs in the file without inflating or parsing any of
/// them. Used by the orchestrator to size its progress counters up front.
pub fn count_blobs<R: Read + io::Seek>(mut r: R) -> Result<usize, Error> {
    let mut count = 0usize;
    loop {
        match read_blob_header_size(&mut r)? {
            None => return Ok(count),
            Some(size) => {
                let header = read_blob_header(&mut r, size)?;
                let datasize = header.datasize();
                if datasize < 0 {
                    return Err(Error::Malformed("BlobHeader.datasize is negative".into()));
                }
                r.seek(io::SeekFrom::Current(datasize as i64))?;
                count += 1;
            }
        }
    }
}
