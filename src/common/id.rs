//! Kademlia node Id or a content key
use rand::Rng;
use std::{
    fmt::{self, Debug, Display, Formatter},
    str::FromStr,
};

use crate::{Error, Result};

/// The default size of node Ids and content keys in bytes.
pub const ID_SIZE: usize = 20;

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Kademlia node Id or a content key.
///
/// The length is not fixed at compile time, every [crate::RoutingTable] is
/// configured with the identifier size it accepts.
pub struct Id(Box<[u8]>);

impl Id {
    /// Create a random Id of the default [ID_SIZE].
    pub fn random() -> Id {
        Self::random_with_size(ID_SIZE)
    }

    /// Create a random Id of `size` bytes.
    pub fn random_with_size(size: usize) -> Id {
        let mut rng = rand::thread_rng();
        Self::random_from(&mut rng, size)
    }

    /// Create a random Id of `size` bytes from a caller provided generator.
    pub fn random_from<R: Rng>(rng: &mut R, size: usize) -> Id {
        let mut bytes = vec![0; size];
        rng.fill(&mut bytes[..]);

        Id(bytes.into_boxed_slice())
    }

    /// Create a new Id from some bytes. Returns Err if `bytes` is empty.
    pub fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<Id> {
        let bytes = bytes.as_ref();
        if bytes.is_empty() {
            return Err(Error::InvalidIdSize {
                expected: ID_SIZE,
                got: 0,
            });
        }

        Ok(Id(bytes.into()))
    }

    /// Fit a hash digest into an Id of `size` bytes, truncating longer digests
    /// and zero-extending shorter ones.
    pub fn from_digest(digest: &[u8], size: usize) -> Id {
        let mut bytes = vec![0; size];
        let len = digest.len().min(size);
        bytes[..len].copy_from_slice(&digest[..len]);

        Id(bytes.into_boxed_slice())
    }

    /// Length of this Id in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length of this Id in bits.
    pub fn bits(&self) -> usize {
        self.0.len() * 8
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Number of zero bits before the first set bit, most significant bit first.
    ///
    /// Equals [Self::bits] for the all-zero Id.
    pub fn leading_zeros(&self) -> usize {
        for (i, byte) in self.0.iter().enumerate() {
            if *byte != 0 {
                return i * 8 + byte.leading_zeros() as usize;
            }
        }

        self.bits()
    }

    /// Index of the k-bucket this Id belongs to.
    ///
    /// Unlike the XOR distance of canonical Kademlia, the class only depends on
    /// this Id's own leading zeros, so it is the same from every vantage point.
    ///
    /// An Id with its first bit set is in class `bits - 1`, the all-zero Id
    /// is in class `0`, same as `0x..01`.
    pub fn distance_class(&self) -> usize {
        self.bits()
            .saturating_sub(1)
            .saturating_sub(self.leading_zeros())
    }
}

impl AsRef<[u8]> for Id {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{byte:02x}")?;
        }

        Ok(())
    }
}

impl Debug for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Id({self})")
    }
}

impl FromStr for Id {
    type Err = Error;

    fn from_str(s: &str) -> Result<Id> {
        if s.len() % 2 != 0 || !s.is_ascii() {
            return Err(Error::InvalidHex(s.to_string()));
        }

        let bytes = (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16))
            .collect::<std::result::Result<Vec<u8>, _>>()
            .map_err(|_| Error::InvalidHex(s.to_string()))?;

        Id::from_bytes(bytes)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn leading_zeros() {
        assert_eq!(Id::from_bytes([0x80, 0]).unwrap().leading_zeros(), 0);
        assert_eq!(Id::from_bytes([0x01, 0]).unwrap().leading_zeros(), 7);
        assert_eq!(Id::from_bytes([0, 0x10]).unwrap().leading_zeros(), 11);
        assert_eq!(Id::from_bytes([0, 0]).unwrap().leading_zeros(), 16);
    }

    #[test]
    fn distance_class_bounds() {
        let zero = Id::from_bytes([0; ID_SIZE]).unwrap();
        assert_eq!(zero.distance_class(), 0);

        let mut bytes = [0; ID_SIZE];
        bytes[0] = 0x80;
        let top = Id::from_bytes(bytes).unwrap();
        assert_eq!(top.distance_class(), ID_SIZE * 8 - 1);
    }

    #[test]
    fn distance_class_single_byte() {
        let classes: Vec<usize> = [0x00, 0x01, 0x02, 0x03, 0x04, 0x40, 0xff]
            .iter()
            .map(|b| Id::from_bytes([*b]).unwrap().distance_class())
            .collect();

        assert_eq!(classes, vec![0, 0, 1, 1, 2, 6, 7]);
    }

    #[test]
    fn to_vec_copies_bytes() {
        let id = Id::from_bytes([0xde, 0xad, 0xbe, 0xef]).unwrap();

        assert_eq!(id.to_vec(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(id.to_vec(), id.as_bytes());
        assert_eq!(Id::from_bytes(id.to_vec()).unwrap(), id);
    }

    #[test]
    fn distance_class_ignores_vantage_point() {
        let id = Id::random();

        assert_eq!(id.distance_class(), id.clone().distance_class());
        assert!(id.distance_class() < id.bits());
    }

    #[test]
    fn from_digest() {
        let digest = [1, 2, 3, 4];

        assert_eq!(Id::from_digest(&digest, 2).as_bytes(), &[1, 2]);
        assert_eq!(Id::from_digest(&digest, 6).as_bytes(), &[1, 2, 3, 4, 0, 0]);
    }

    #[test]
    fn hex_round_trip() {
        let id = Id::from_str("aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d").unwrap();

        assert_eq!(id.len(), ID_SIZE);
        assert_eq!(
            id.to_string(),
            "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
        );
    }

    #[test]
    fn invalid_input() {
        assert!(Id::from_bytes(b"").is_err());
        assert!(Id::from_str("abc").is_err());
        assert!(Id::from_str("zz").is_err());
        assert!(Id::from_str("").is_err());
    }
}
