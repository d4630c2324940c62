use rand::RngCore;
use serde::de::Error as SerdeError;
use serde::{Deserialize, Serialize};
use std::{
    convert::TryInto,
    fmt::{Display, Error, Formatter},
    str::FromStr,
};

pub const ID_SIZE: usize = 16; // 16 bytes / 128 bits

/// Identifier shared by users and every ledger record.
/// Random 128-bit values, so id spaces of different record kinds never collide.
#[derive(Eq, PartialEq, PartialOrd, Ord, Clone, Copy, Debug, Hash)]
pub struct Id([u8; ID_SIZE]);

pub type UserId = Id;

impl Id {
    pub const fn new(bytes: [u8; ID_SIZE]) -> Self {
        Id(bytes)
    }

    pub const fn zero() -> Self {
        Id::new([0; ID_SIZE])
    }

    // Generate a fresh random id
    pub fn random() -> Self {
        let mut bytes = [0u8; ID_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Id(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ID_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; ID_SIZE] = bytes.try_into().ok()?;
        Some(Id(bytes))
    }
}

impl FromStr for Id {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| "Invalid hex string")?;
        let bytes: [u8; ID_SIZE] = bytes.try_into().map_err(|_| "Invalid id length")?;
        Ok(Id::new(bytes))
    }
}

impl AsRef<[u8]> for Id {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", &self.to_hex())
    }
}

impl Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'a> Deserialize<'a> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        let hex = String::deserialize(deserializer)?;
        if hex.len() != ID_SIZE * 2 {
            return Err(SerdeError::custom("Invalid hex length"));
        }

        hex.parse().map_err(SerdeError::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_ids_differ() {
        assert_ne!(Id::random(), Id::random());
    }

    #[test]
    fn test_hex_parse() {
        let id = Id::random();
        let parsed: Id = id.to_hex().parse().unwrap();
        assert_eq!(id, parsed);

        assert!("zz".parse::<Id>().is_err());
        assert!("abcd".parse::<Id>().is_err());
    }

    #[test]
    fn test_json_form_is_hex() {
        let id = Id::new([0xab; ID_SIZE]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(ID_SIZE)));

        let err = serde_json::from_str::<Id>("\"abab\"");
        assert!(err.is_err());
    }
}
