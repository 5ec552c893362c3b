//! Archive type detection.
//!
//! Classification is by content only: the leading bytes select a
//! decompressor, and the file only counts as an archive if a tar header can
//! then be read from the decompressed stream. File names are never consulted.

use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::Path;

/// Number of leading bytes inspected for a compression magic.
const MAGIC_LEN: usize = 6;

const BZIP2_MAGIC: &[u8] = &[0x42, 0x5A, 0x68];
const GZIP_MAGIC: &[u8] = &[0x1F, 0x8B, 0x08];
const XZ_MAGIC: &[u8] = &[0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00];

/// Detected container/compression format of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ArchiveType {
    /// Not a recognized tar archive
    #[default]
    Unknown,
    /// Plain tar
    Uncompressed,
    /// gzip-compressed tar
    Gzip,
    /// bzip2-compressed tar
    Bzip2,
    /// xz-compressed tar
    Xz,
}

impl ArchiveType {
    /// Whether this classification names an archive that can be extracted.
    #[must_use]
    pub fn is_archive(self) -> bool {
        self != Self::Unknown
    }

    /// The tar flag that selects this decompressor, if one is needed.
    #[must_use]
    pub fn tar_flag(self) -> Option<char> {
        match self {
            Self::Gzip => Some('z'),
            Self::Bzip2 => Some('j'),
            Self::Xz => Some('J'),
            Self::Uncompressed | Self::Unknown => None,
        }
    }

    /// Short lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Uncompressed => "tar",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Xz => "xz",
        }
    }
}

impl fmt::Display for ArchiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the file at `path`.
///
/// Never fails: anything that cannot be opened, decompressed, or parsed as
/// tar is [`ArchiveType::Unknown`]. Directories are `Unknown` as well.
///
/// # Example
///
/// ```no_run
/// use addcopy::{ArchiveType, detect_archive_type};
/// use std::path::Path;
///
/// if detect_archive_type(Path::new("rootfs.tar.gz")) == ArchiveType::Gzip {
///     println!("gzip-compressed tarball");
/// }
/// ```
pub fn detect_archive_type(path: &Path) -> ArchiveType {
    match File::open(path) {
        Ok(file) => detect_archive_type_from_reader(file),
        Err(_) => ArchiveType::Unknown,
    }
}

/// Classify a byte stream; see [`detect_archive_type`].
pub fn detect_archive_type_from_reader<R: Read>(mut reader: R) -> ArchiveType {
    let mut magic = [0u8; MAGIC_LEN];
    let n = match read_up_to(&mut reader, &mut magic) {
        Ok(n) => n,
        Err(_) => return ArchiveType::Unknown,
    };

    let compression = detect_compression(&magic[..n]);
    let stream = Cursor::new(&magic[..n]).chain(reader);

    let verified = match compression {
        ArchiveType::Gzip => has_tar_header(flate2::read::GzDecoder::new(stream)),
        ArchiveType::Bzip2 => has_tar_header(bzip2::read::BzDecoder::new(stream)),
        ArchiveType::Xz => has_tar_header(xz2::read::XzDecoder::new(stream)),
        ArchiveType::Uncompressed | ArchiveType::Unknown => has_tar_header(stream),
    };

    match (verified, compression) {
        (false, _) => ArchiveType::Unknown,
        (true, ArchiveType::Unknown) => ArchiveType::Uncompressed,
        (true, compression) => compression,
    }
}

/// Match the leading bytes of a file against the known compression magics.
///
/// A magic only matches if `header` holds all of its bytes. Returns
/// [`ArchiveType::Unknown`] when nothing matches; a plain tar has no magic
/// at offset 0 and is only recognized by [`detect_archive_type`].
pub fn detect_compression(header: &[u8]) -> ArchiveType {
    for (compression, magic) in [
        (ArchiveType::Bzip2, BZIP2_MAGIC),
        (ArchiveType::Gzip, GZIP_MAGIC),
        (ArchiveType::Xz, XZ_MAGIC),
    ] {
        if header.starts_with(magic) {
            return compression;
        }
    }
    ArchiveType::Unknown
}

/// Whether a valid tar header can be read from the start of `reader`.
fn has_tar_header<R: Read>(reader: R) -> bool {
    let mut archive = tar::Archive::new(reader);
    let mut entries = match archive.entries() {
        Ok(entries) => entries,
        Err(_) => return false,
    };
    matches!(entries.next(), Some(Ok(_)))
}

/// Fill as much of `buf` as the reader allows; a short count means EOF.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
