//! Byte-exact interchange encoding of a [`GeoLocationCache`].
//!
//! Layout: magic, one version byte, then the bincode encoding of both maps.
//! Meant for warm-transferring a cache between processes, not for storage.

use super::cache::GeoLocationCache;
use crate::error::{GeopoolError, Result};
use std::io::{ErrorKind, Read, Write};

const SNAPSHOT_MAGIC: &[u8] = b"GEOPOOL_GEOCACHE";
const SNAPSHOT_VERSION: u8 = 1;

impl GeoLocationCache {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(SNAPSHOT_MAGIC.len() + 1 + self.items.len() * 512);
        self.encode_to(&mut buf)?;
        Ok(buf)
    }

    pub fn encode_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(SNAPSHOT_MAGIC)?;
        writer.write_all(&[SNAPSHOT_VERSION])?;
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::decode_from(bytes)
    }

    /// Decode a cache, rejecting bad headers and structurally inconsistent maps.
    pub fn decode_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut magic = vec![0u8; SNAPSHOT_MAGIC.len()];
        read_header(&mut reader, &mut magic)?;
        if magic != SNAPSHOT_MAGIC {
            log::warn!("Rejecting geo cache snapshot with bad magic");
            return Err(GeopoolError::InvalidFormat);
        }

        let mut version = [0u8; 1];
        read_header(&mut reader, &mut version)?;
        if version[0] != SNAPSHOT_VERSION {
            log::warn!(
                "Rejecting geo cache snapshot version {} (expected {})",
                version[0],
                SNAPSHOT_VERSION
            );
            return Err(GeopoolError::InvalidFormat);
        }

        let cache: GeoLocationCache = bincode::deserialize_from(reader)?;
        if !cache.is_consistent() {
            log::warn!("Rejecting geo cache snapshot with inconsistent cell maps");
            return Err(GeopoolError::InvalidFormat);
        }
        Ok(cache)
    }
}

fn read_header<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => GeopoolError::InvalidFormat,
        _ => GeopoolError::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> GeoLocationCache {
        let mut cache = GeoLocationCache::new();
        cache.set(0, 41.87963549397698, -87.63028184499035);
        cache.set(1, 40.75306726395187, -73.98119781456353);
        cache.set(2, 41.8797, -87.6303);
        cache.set(3, -33.8688, 151.2093);
        cache.delete(3);
        cache
    }

    #[test]
    fn test_round_trip_preserves_maps() {
        let cache = populated();
        let decoded = GeoLocationCache::decode(&cache.encode().unwrap()).unwrap();

        assert_eq!(decoded.items, cache.items);
        assert_eq!(decoded.cells, cache.cells);
        assert_eq!(decoded, cache);
    }

    #[test]
    fn test_round_trip_empty() {
        let cache = GeoLocationCache::new();
        let decoded = GeoLocationCache::decode(&cache.encode().unwrap()).unwrap();
        assert_eq!(decoded, cache);
        assert_eq!(decoded.cells.len(), 31);
    }

    #[test]
    fn test_encode_to_writer() {
        let cache = populated();
        let mut buf = Vec::new();
        cache.encode_to(&mut buf).unwrap();
        assert_eq!(buf, cache.encode().unwrap());
        assert!(buf.starts_with(SNAPSHOT_MAGIC));

        let decoded = GeoLocationCache::decode_from(std::io::Cursor::new(buf)).unwrap();
        assert_eq!(decoded, cache);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut bytes = populated().encode().unwrap();
        bytes[0] ^= 0xff;
        assert!(matches!(
            GeoLocationCache::decode(&bytes),
            Err(GeopoolError::InvalidFormat)
        ));
    }

    #[test]
    fn test_bad_version_rejected() {
        let mut bytes = populated().encode().unwrap();
        bytes[SNAPSHOT_MAGIC.len()] = SNAPSHOT_VERSION + 1;
        assert!(matches!(
            GeoLocationCache::decode(&bytes),
            Err(GeopoolError::InvalidFormat)
        ));
    }

    #[test]
    fn test_truncated_input_rejected() {
        assert!(matches!(
            GeoLocationCache::decode(b"GEOPOOL"),
            Err(GeopoolError::InvalidFormat)
        ));

        let bytes = populated().encode().unwrap();
        let truncated = &bytes[..bytes.len() / 2];
        assert!(GeoLocationCache::decode(truncated).is_err());
    }

    #[test]
    fn test_inconsistent_body_rejected() {
        let mut cache = populated();
        cache.cells[0].clear();
        let bytes = cache.encode().unwrap();
        assert!(matches!(
            GeoLocationCache::decode(&bytes),
            Err(GeopoolError::InvalidFormat)
        ));
    }
}
