//! A module for serializing/deserializing a `BString` as a fixed-width 32 byte array.
//!
//! Strings are written left aligned and right padded with zeroes, the way the EVM token bridge
//! stores a symbol or name in a `bytes32`. Some chains left pad instead, so zero padding is
//! stripped from both ends when reading.

use std::fmt;

use bstr::BString;
use serde::{
    de::{Error as DeError, SeqAccess, Visitor},
    ser::{Error as SerError, SerializeTuple},
    Deserializer, Serializer,
};

pub fn serialize<T, S>(value: T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    let v = value.as_ref();
    let l = v.len();
    if l > 32 {
        return Err(S::Error::custom(format_args!(
            "value is too large ({l} bytes); max 32",
        )));
    }

    let mut tup = serializer.serialize_tuple(32)?;
    for e in v.iter().chain(std::iter::repeat(&0u8).take(32 - l)) {
        tup.serialize_element(e)?;
    }

    tup.end()
}

struct ArrayStringVisitor;

impl<'de> Visitor<'de> for ArrayStringVisitor {
    type Value = BString;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an array of 32 bytes")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut buf = [0u8; 32];
        for (i, b) in buf.iter_mut().enumerate() {
            *b = seq
                .next_element()?
                .ok_or_else(|| A::Error::invalid_length(i, &self))?;
        }

        let start = buf.iter().position(|b| *b != 0).unwrap_or(32);
        let end = buf.iter().rposition(|b| *b != 0).map_or(start, |i| i + 1);

        Ok(BString::from(&buf[start..end]))
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<BString, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_tuple(32, ArrayStringVisitor)
}
