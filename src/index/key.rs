//! # Index Key Comparison
//!
//! Index keys are the concatenation of their sub-keys in cluster-index
//! order. Comparison walks the parts: numeric kinds decode their
//! little-endian value, binary kinds compare bytewise, UTF-16 kinds compare
//! code unit by code unit. A descending part flips its ordering.

use std::cmp::Ordering;

use smallvec::SmallVec;

use crate::types::ScalarType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Real,
    Float,
    DateTime,
    Guid,
    Bytes,
    Utf16,
}

impl KeyKind {
    pub fn from_scalar(ty: ScalarType) -> Self {
        match ty {
            ScalarType::TinyInt | ScalarType::Bit => KeyKind::TinyInt,
            ScalarType::SmallInt => KeyKind::SmallInt,
            ScalarType::Int | ScalarType::SmallDateTime | ScalarType::SmallMoney => KeyKind::Int,
            ScalarType::BigInt | ScalarType::Money => KeyKind::BigInt,
            ScalarType::Real => KeyKind::Real,
            ScalarType::Float => KeyKind::Float,
            ScalarType::DateTime => KeyKind::DateTime,
            ScalarType::UniqueIdentifier => KeyKind::Guid,
            ScalarType::NChar | ScalarType::NVarChar => KeyKind::Utf16,
            _ => KeyKind::Bytes,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KeyPart {
    pub kind: KeyKind,
    /// Sub-key length in bytes.
    pub len: usize,
    pub descending: bool,
}

impl KeyPart {
    pub fn new(kind: KeyKind, len: usize) -> Self {
        Self {
            kind,
            len,
            descending: false,
        }
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        let ord = match self.kind {
            KeyKind::TinyInt => a[0].cmp(&b[0]),
            KeyKind::SmallInt => le_i16(a).cmp(&le_i16(b)),
            KeyKind::Int => le_i32(a).cmp(&le_i32(b)),
            KeyKind::BigInt => le_i64(a).cmp(&le_i64(b)),
            KeyKind::Real => {
                let (x, y) = (f32::from_le_bytes(arr(a)), f32::from_le_bytes(arr(b)));
                x.total_cmp(&y)
            }
            KeyKind::Float => {
                let (x, y) = (f64::from_le_bytes(arr(a)), f64::from_le_bytes(arr(b)));
                x.total_cmp(&y)
            }
            KeyKind::DateTime => {
                // days (bytes 4..8) order before ticks (bytes 0..4)
                le_i32(&a[4..]).cmp(&le_i32(&b[4..])).then(le_u32(a).cmp(&le_u32(b)))
            }
            KeyKind::Guid | KeyKind::Bytes => a.cmp(b),
            KeyKind::Utf16 => {
                let ua = a.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]]));
                let ub = b.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]]));
                ua.cmp(ub)
            }
        };
        if self.descending {
            ord.reverse()
        } else {
            ord
        }
    }
}

/// Compares concatenated index keys part by part.
#[derive(Debug, Clone)]
pub struct KeyComparator {
    parts: SmallVec<[KeyPart; 4]>,
    key_length: usize,
}

impl KeyComparator {
    pub fn new(parts: impl IntoIterator<Item = KeyPart>) -> Self {
        let parts: SmallVec<[KeyPart; 4]> = parts.into_iter().collect();
        let key_length = parts.iter().map(|p| p.len).sum();
        Self { parts, key_length }
    }

    /// Total key length in bytes: the sum of sub-key lengths.
    pub fn key_length(&self) -> usize {
        self.key_length
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.parts
    }

    /// Compares two full keys. Short buffers compare by their available
    /// prefix, so a truncated search key acts as a range prefix. A numeric
    /// sub-key cannot compare partially; its truncation ends the walk.
    pub fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        let mut at = 0;
        for part in &self.parts {
            let end = at + part.len;
            if a.len() < end || b.len() < end {
                let avail = a.len().min(b.len());
                if at >= avail {
                    break;
                }
                let stop = end.min(avail);
                let ord = match part.kind {
                    KeyKind::Guid | KeyKind::Bytes | KeyKind::TinyInt => {
                        a[at..stop].cmp(&b[at..stop])
                    }
                    _ => break,
                };
                if ord != Ordering::Equal {
                    return ord;
                }
                break;
            }
            let ord = part.compare(&a[at..end], &b[at..end]);
            if ord != Ordering::Equal {
                return ord;
            }
            at = end;
        }
        Ordering::Equal
    }
}

#[inline]
fn arr<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

#[inline]
fn le_i16(b: &[u8]) -> i16 {
    i16::from_le_bytes(arr(b))
}

#[inline]
fn le_i32(b: &[u8]) -> i32 {
    i32::from_le_bytes(arr(b))
}

#[inline]
fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes(arr(b))
}

#[inline]
fn le_i64(b: &[u8]) -> i64 {
    i64::from_le_bytes(arr(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_cmp() -> KeyComparator {
        KeyComparator::new([KeyPart::new(KeyKind::Int, 4)])
    }

    #[test]
    fn int_keys_compare_by_value_not_bytes() {
        let cmp = int_cmp();
        // 256 > 1 although byte-lexicographic comparison of LE images says otherwise
        let a = 256i32.to_le_bytes();
        let b = 1i32.to_le_bytes();
        assert_eq!(cmp.compare(&a, &b), Ordering::Greater);
        let neg = (-1i32).to_le_bytes();
        assert_eq!(cmp.compare(&neg, &b), Ordering::Less);
    }

    #[test]
    fn composite_key_walks_parts_in_order() {
        let cmp = KeyComparator::new([
            KeyPart::new(KeyKind::Int, 4),
            KeyPart::new(KeyKind::BigInt, 8),
        ]);
        assert_eq!(cmp.key_length(), 12);
        let mut a = Vec::new();
        a.extend_from_slice(&1i32.to_le_bytes());
        a.extend_from_slice(&5i64.to_le_bytes());
        let mut b = Vec::new();
        b.extend_from_slice(&1i32.to_le_bytes());
        b.extend_from_slice(&9i64.to_le_bytes());
        assert_eq!(cmp.compare(&a, &b), Ordering::Less);
        assert_eq!(cmp.compare(&a, &a), Ordering::Equal);
    }

    #[test]
    fn descending_part_reverses() {
        let cmp = KeyComparator::new([KeyPart::new(KeyKind::Int, 4).descending()]);
        let a = 2i32.to_le_bytes();
        let b = 7i32.to_le_bytes();
        assert_eq!(cmp.compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn bytes_kind_is_lexicographic() {
        let cmp = KeyComparator::new([KeyPart::new(KeyKind::Bytes, 5)]);
        assert_eq!(cmp.compare(&[1, 0, 0, 0, 4], &[1, 0, 0, 1, 4]), Ordering::Less);
        assert_eq!(
            cmp.compare(&[2, 0, 0, 0, 4], &[1, 9, 9, 9, 4]),
            Ordering::Greater
        );
    }

    #[test]
    fn prefix_key_matches_range() {
        let cmp = KeyComparator::new([
            KeyPart::new(KeyKind::Bytes, 5),
            KeyPart::new(KeyKind::BigInt, 8),
        ]);
        // search key carries only the cell prefix
        let probe = [7u8, 8, 9, 4, 4];
        let mut stored = vec![7u8, 8, 9, 4, 4];
        stored.extend_from_slice(&42i64.to_le_bytes());
        assert_eq!(cmp.compare(&probe, &stored), Ordering::Equal);
    }

    #[test]
    fn datetime_orders_days_before_ticks() {
        let cmp = KeyComparator::new([KeyPart::new(KeyKind::DateTime, 8)]);
        let mut early = Vec::new();
        early.extend_from_slice(&900_000u32.to_le_bytes());
        early.extend_from_slice(&100i32.to_le_bytes());
        let mut late = Vec::new();
        late.extend_from_slice(&5u32.to_le_bytes());
        late.extend_from_slice(&101i32.to_le_bytes());
        assert_eq!(cmp.compare(&early, &late), Ordering::Less);
    }
}
