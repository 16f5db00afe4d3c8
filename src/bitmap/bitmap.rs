use crc32fast::Hasher;
use roaring::RoaringBitmap;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::BITMAP_ID_LIMIT;

/// Blob header: [ VERSION u8 ][ CRC32 u32 ] followed by the portable roaring layout
const FORMAT_VERSION: u8 = 1;
const HEADER_SIZE: usize = 5;

/// Compressed set of document IDs bound to `[range_min, range_max)`
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    key: String,
    range_min: u64,
    range_max: u64,
    inner: RoaringBitmap,
}

impl Bitmap {
    pub fn new(key: impl Into<String>, range_min: u64, range_max: u64) -> Result<Self> {
        if range_min >= range_max || range_max > BITMAP_ID_LIMIT {
            return Err(Error::validation(format!(
                "Invalid bitmap range [{}, {})",
                range_min, range_max
            )));
        }

        Ok(Bitmap {
            key: key.into(),
            range_min,
            range_max,
            inner: RoaringBitmap::new(),
        })
    }

    /// Empty bitmap over the full 32-bit space, used for algebra results
    pub fn unbounded(key: impl Into<String>) -> Self {
        Bitmap {
            key: key.into(),
            range_min: 0,
            range_max: BITMAP_ID_LIMIT,
            inner: RoaringBitmap::new(),
        }
    }

    pub fn from_ids(key: impl Into<String>, range_min: u64, range_max: u64, ids: &[u32]) -> Result<Self> {
        let mut bitmap = Self::new(key, range_min, range_max)?;
        bitmap.tick_many(ids)?;
        Ok(bitmap)
    }

    /// Adopts an existing roaring set, rejecting members outside the range
    pub fn from_roaring(key: impl Into<String>, range_min: u64, range_max: u64, inner: RoaringBitmap) -> Result<Self> {
        let mut bitmap = Self::new(key, range_min, range_max)?;
        if let (Some(min), Some(max)) = (inner.min(), inner.max()) {
            bitmap.check_range(min)?;
            bitmap.check_range(max)?;
        }
        bitmap.inner = inner;
        Ok(bitmap)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn range(&self) -> (u64, u64) {
        (self.range_min, self.range_max)
    }

    pub fn len(&self) -> u64 {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.inner.contains(id)
    }

    pub fn as_roaring(&self) -> &RoaringBitmap {
        &self.inner
    }

    pub fn tick(&mut self, id: u32) -> Result<()> {
        self.check_range(id)?;
        self.inner.insert(id);
        Ok(())
    }

    /// All IDs are validated before the first insert
    pub fn tick_many(&mut self, ids: &[u32]) -> Result<()> {
        for id in ids {
            self.check_range(*id)?;
        }
        self.inner.extend(ids.iter().copied());
        Ok(())
    }

    pub fn untick(&mut self, id: u32) -> Result<()> {
        self.check_range(id)?;
        self.inner.remove(id);
        Ok(())
    }

    pub fn untick_many(&mut self, ids: &[u32]) -> Result<()> {
        for id in ids {
            self.check_range(*id)?;
        }
        for id in ids {
            self.inner.remove(*id);
        }
        Ok(())
    }

    /// Replaces the members, keeping key and range
    pub fn replace(&mut self, other: &Bitmap) -> Result<()> {
        if let (Some(min), Some(max)) = (other.inner.min(), other.inner.max()) {
            self.check_range(min)?;
            self.check_range(max)?;
        }
        self.inner = other.inner.clone();
        Ok(())
    }

    pub fn to_array(&self) -> Vec<u32> {
        self.inner.iter().collect()
    }

    pub fn and(&self, other: &Bitmap) -> Bitmap {
        Bitmap {
            key: self.key.clone(),
            range_min: self.range_min,
            range_max: self.range_max,
            inner: &self.inner & &other.inner,
        }
    }

    pub fn and_in_place(&mut self, other: &Bitmap) {
        self.inner &= &other.inner;
    }

    /// The union keeps this bitmap's key and widens the range to cover both
    pub fn or(&self, other: &Bitmap) -> Bitmap {
        Bitmap {
            key: self.key.clone(),
            range_min: self.range_min.min(other.range_min),
            range_max: self.range_max.max(other.range_max),
            inner: &self.inner | &other.inner,
        }
    }

    pub fn or_in_place(&mut self, other: &Bitmap) {
        self.range_min = self.range_min.min(other.range_min);
        self.range_max = self.range_max.max(other.range_max);
        self.inner |= &other.inner;
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut body = Vec::with_capacity(self.inner.serialized_size());
        self.inner.serialize_into(&mut body)?;

        let mut hasher = Hasher::new();
        hasher.update(&body);

        let mut blob = Vec::with_capacity(HEADER_SIZE + body.len());
        blob.push(FORMAT_VERSION);
        blob.extend_from_slice(&hasher.finalize().to_le_bytes());
        blob.extend_from_slice(&body);
        Ok(blob)
    }

    pub fn deserialize(key: impl Into<String>, range_min: u64, range_max: u64, blob: &[u8]) -> Result<Self> {
        let key = key.into();
        if blob.len() < HEADER_SIZE {
            return Err(Error::new(ErrorKind::Parse, format!("Bitmap \"{}\" blob truncated", key)));
        }
        if blob[0] != FORMAT_VERSION {
            return Err(Error::new(
                ErrorKind::Parse,
                format!("Bitmap \"{}\" has unsupported format version {}", key, blob[0]),
            ));
        }

        let expected = u32::from_le_bytes([blob[1], blob[2], blob[3], blob[4]]);
        let body = &blob[HEADER_SIZE..];
        let mut hasher = Hasher::new();
        hasher.update(body);
        if hasher.finalize() != expected {
            return Err(Error::new(ErrorKind::Parse, format!("Bitmap \"{}\" checksum mismatch", key)));
        }

        let inner = RoaringBitmap::deserialize_from(body)?;
        Self::from_roaring(key, range_min, range_max, inner)
    }

    fn check_range(&self, id: u32) -> Result<()> {
        let id = id as u64;
        if id < self.range_min || id >= self.range_max {
            return Err(Error::range(format!(
                "ID {} outside [{}, {}) of bitmap \"{}\"",
                id, self.range_min, self.range_max, self.key
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_bitmap() -> Bitmap {
        Bitmap::new("contexts/work", 1_000_000, BITMAP_ID_LIMIT).unwrap()
    }

    #[test]
    fn test_out_of_range_tick_leaves_bitmap_unchanged() {
        let mut bitmap = user_bitmap();
        bitmap.tick(1_000_001).unwrap();

        let before = bitmap.to_array();
        let err = bitmap.tick_many(&[1_000_002, 999_999]).unwrap_err();

        assert!(err.is_range());
        assert_eq!(bitmap.to_array(), before);
    }

    #[test]
    fn test_internal_range_rejects_user_ids() {
        let mut bitmap = Bitmap::new("internal/system", 1_000, 1_000_000).unwrap();
        assert!(bitmap.tick(1_000_000).unwrap_err().is_range());
        assert!(bitmap.tick(999).unwrap_err().is_range());
        bitmap.tick(1_000).unwrap();
        assert_eq!(bitmap.to_array(), vec![1_000]);
    }

    #[test]
    fn test_and_or() {
        let a = Bitmap::from_ids("a", 0, 100, &[1, 2, 3, 4]).unwrap();
        let b = Bitmap::from_ids("b", 0, 100, &[3, 4, 5]).unwrap();

        assert_eq!(a.and(&b).to_array(), vec![3, 4]);
        assert_eq!(a.or(&b).to_array(), vec![1, 2, 3, 4, 5]);

        let mut c = a.clone();
        c.and_in_place(&b);
        assert_eq!(c.to_array(), vec![3, 4]);
        assert_eq!(a.len(), 4);
    }

    #[test]
    fn test_corrupt_blob_is_rejected() {
        let bitmap = Bitmap::from_ids("k", 0, 100, &[10, 20]).unwrap();
        let mut blob = bitmap.serialize().unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0xff;

        assert!(Bitmap::deserialize("k", 0, 100, &blob).is_err());
        assert!(Bitmap::deserialize("k", 0, 100, &blob[..3]).is_err());
    }

    #[test]
    fn test_deserialize_enforces_range() {
        let wide = Bitmap::from_ids("k", 0, 2_000_000, &[5, 1_500_000]).unwrap();
        let blob = wide.serialize().unwrap();
        assert!(Bitmap::deserialize("k", 1_000, 1_000_000, &blob).unwrap_err().is_range());
    }
}
