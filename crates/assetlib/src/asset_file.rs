//! Binary envelope shared by every asset kind.
//!
//! On-disk layout (all integers little-endian, no padding, no checksum):
//!
//! ```text
//! offset  size  field
//! 0       4     kind             raw bytes, e.g. b"MESH", not nul-terminated
//! 4       4     version          u32
//! 8       4     metadata_length  u32
//! 12      4     payload_length   u32
//! 16      ml    metadata         utf-8 json document
//! 16+ml   pl    payload          opaque (usually compressed) blob
//! ```
//!
//! The envelope never looks inside `metadata` or `payload`; the mesh and texture
//! codecs own their interpretation.

use std::{
    fs::File,
    io::{BufReader, Read, Write},
    path::Path,
};

use crate::{AssetError, AssetResult};

pub const HEADER_SIZE: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    pub kind: [u8; 4],
    pub version: u32,
    pub metadata: String,
    pub payload: Vec<u8>,
}

impl AssetFile {
    pub fn new(kind: [u8; 4], version: u32, metadata: String, payload: Vec<u8>) -> Self {
        Self {
            kind,
            version,
            metadata,
            payload,
        }
    }

    /// Writes the container to `path`, replacing whatever was there.
    pub fn save(&self, path: impl AsRef<Path>) -> AssetResult<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;

        let io_error = |source: std::io::Error| AssetError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut file = File::create(path).map_err(io_error)?;
        file.write_all(&bytes).map_err(io_error)?;
        file.flush().map_err(io_error)?;
        Ok(())
    }

    /// Reads a container from `path`. Fails if the file is missing or shorter than its header claims.
    pub fn load(path: impl AsRef<Path>) -> AssetResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::read_from(BufReader::new(file)).map_err(|err| match err {
            AssetError::Stream(source) => AssetError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> AssetResult<Self> {
        Self::read_from(bytes)
    }

    pub fn to_bytes(&self) -> AssetResult<Vec<u8>> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + self.metadata.len() + self.payload.len());
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> AssetResult<()> {
        writer.write_all(&self.header()?)?;
        writer.write_all(self.metadata.as_bytes())?;
        writer.write_all(&self.payload)?;
        Ok(())
    }

    /// Reads exactly one container from `reader`. Declared lengths are only trusted up to
    /// what the reader actually yields: a short read is reported as [`AssetError::Truncated`].
    pub fn read_from<R: Read>(mut reader: R) -> AssetResult<Self> {
        let header = read_section(&mut reader, "header", HEADER_SIZE as u64)?;

        let kind = [header[0], header[1], header[2], header[3]];
        let version = le_u32(&header[4..8]);
        let metadata_len = le_u32(&header[8..12]);
        let payload_len = le_u32(&header[12..16]);

        let metadata = read_section(&mut reader, "metadata", u64::from(metadata_len))?;
        let metadata = String::from_utf8(metadata)?;
        let payload = read_section(&mut reader, "payload", u64::from(payload_len))?;

        Ok(Self {
            kind,
            version,
            metadata,
            payload,
        })
    }

    fn header(&self) -> AssetResult<[u8; HEADER_SIZE]> {
        let metadata_len = section_len("metadata", self.metadata.len())?;
        let payload_len = section_len("payload", self.payload.len())?;

        let mut header = [0u8; HEADER_SIZE];
        header[0..4].copy_from_slice(&self.kind);
        header[4..8].copy_from_slice(&self.version.to_le_bytes());
        header[8..12].copy_from_slice(&metadata_len.to_le_bytes());
        header[12..16].copy_from_slice(&payload_len.to_le_bytes());
        Ok(header)
    }
}

fn section_len(section: &str, len: usize) -> AssetResult<u32> {
    u32::try_from(len).map_err(|_| {
        AssetError::InvalidBufferSize(format!(
            "{section} is {len} bytes, the container stores lengths as u32"
        ))
    })
}

fn read_section<R: Read>(reader: &mut R, section: &'static str, len: u64) -> AssetResult<Vec<u8>> {
    let mut buf = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut buf)?;

    let available = buf.len() as u64;
    if available < len {
        return Err(AssetError::Truncated {
            section,
            expected: len,
            available,
        });
    }
    Ok(buf)
}

fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn sample() -> AssetFile {
        AssetFile::new(
            *b"TEST",
            7,
            r#"{"hello":"world"}"#.to_string(),
            vec![0, 1, 2, 3, 254, 255],
        )
    }

    #[test]
    fn save_then_load_reproduces_every_field() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.bin");

        let file = sample();
        file.save(&path).unwrap();
        let loaded = AssetFile::load(&path).unwrap();

        assert_eq!(loaded.kind, *b"TEST");
        assert_eq!(loaded.version, 7);
        assert_eq!(loaded.metadata, file.metadata);
        assert_eq!(loaded.payload, file.payload);
    }

    #[test]
    fn header_layout_is_little_endian_and_unpadded() {
        let bytes = sample().to_bytes().unwrap();

        assert_eq!(&bytes[0..4], b"TEST");
        assert_eq!(&bytes[4..8], &7u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &17u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &6u32.to_le_bytes());
        assert_eq!(&bytes[16..33], br#"{"hello":"world"}"#);
        assert_eq!(&bytes[33..], &[0, 1, 2, 3, 254, 255]);
        assert_eq!(bytes.len(), HEADER_SIZE + 17 + 6);
    }

    #[test]
    fn empty_sections_round_trip() {
        let file = AssetFile::new(*b"NONE", 0, String::new(), Vec::new());
        let bytes = file.to_bytes().unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(AssetFile::from_bytes(&bytes).unwrap(), file);
    }

    #[test]
    fn save_overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("overwrite.bin");
        std::fs::write(&path, vec![0xAA; 4096]).unwrap();

        sample().save(&path).unwrap();

        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(on_disk, sample().to_bytes().unwrap());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = AssetFile::load(dir.path().join("missing.bin")).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn save_into_missing_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let err = sample()
            .save(dir.path().join("no_such_dir").join("x.bin"))
            .unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn truncated_payload_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.bin");
        let mut bytes = sample().to_bytes().unwrap();
        bytes.pop();
        std::fs::write(&path, &bytes).unwrap();

        match AssetFile::load(&path).unwrap_err() {
            AssetError::Truncated {
                section,
                expected,
                available,
            } => {
                assert_eq!(section, "payload");
                assert_eq!(expected, 6);
                assert_eq!(available, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn truncated_header_is_reported() {
        let err = AssetFile::from_bytes(b"MESH\x01\x00").unwrap_err();
        assert!(matches!(
            err,
            AssetError::Truncated {
                section: "header",
                ..
            }
        ));
    }

    #[test]
    fn huge_declared_metadata_does_not_trust_the_header() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"MESH");
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(b"{}");

        let err = AssetFile::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            AssetError::Truncated {
                section: "metadata",
                available: 2,
                ..
            }
        ));
    }

    #[test]
    fn non_utf8_metadata_is_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"TEXI");
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&[0xFF, 0xFE]);

        let err = AssetFile::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, AssetError::InvalidMetadataEncoding(_)));
    }
}
