use crate::{
    error::{SimError, SimResult},
    rng::hash_string,
};
use derive_more::Display;
use serde::{de::Visitor, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// RNG seed for all randomized processes in the simulation. The canonical
/// seed form is a `u32`; this type remembers how the seed was written so
/// configs round-trip cleanly.
///
/// When deserializing, this type supports a few options:
/// - An integer: normalized to `u32` (absolute value, wrapped to 32 bits,
///   zero promoted to 1)
/// - A float: must be finite; floored and normalized the same way
/// - A string that parses as an integer: treated as the integer
/// - Any other string: kept as text and hashed into a `u32` when used
///
/// Regardless of input form, seeds always serialize as **strings** to dodge
/// precision issues with large integers in JSON/TOML.
#[derive(Clone, Debug, Display, PartialEq, Eq)]
pub enum Seed {
    /// A canonicalized integer seed, used directly
    Int(u32),
    /// A textual seed, hashed into a u32 before use
    Text(String),
}

impl Seed {
    /// Normalize an integer of any width into the canonical u32 form.
    fn normalize(value: u128) -> u32 {
        let wrapped = (value % (1u128 << 32)) as u32;
        if wrapped == 0 {
            1
        } else {
            wrapped
        }
    }

    /// Normalize a float seed. Fails on NaN and infinities; everything else
    /// is floored and canonicalized like an integer.
    pub fn from_f64(value: f64) -> SimResult<Self> {
        if !value.is_finite() {
            return Err(SimError::InvalidSeed(format!(
                "seed must be finite, got {}",
                value
            )));
        }
        Ok(Self::Int(Self::normalize(value.abs().floor() as u128)))
    }

    /// Convert the seed to the canonical `u32` used to drive the RNG.
    pub fn to_u32(&self) -> u32 {
        match self {
            Self::Int(seed) => *seed,
            Self::Text(text) => hash_string(text),
        }
    }
}

impl Default for Seed {
    fn default() -> Self {
        // Danger! This means the default will vary between calls!
        Self::Int(Self::normalize(u128::from(rand::random::<u32>())))
    }
}

impl From<u32> for Seed {
    fn from(seed: u32) -> Self {
        Self::Int(Self::normalize(u128::from(seed)))
    }
}

// Convert a string to a seed. If possible, parse it as an int. Otherwise,
// keep the raw text, to be hashed when the seed is used
impl From<&str> for Seed {
    fn from(seed_str: &str) -> Self {
        match seed_str.parse::<u128>() {
            Ok(seed) => Self::Int(Self::normalize(seed)),
            Err(_) => Self::Text(seed_str.into()),
        }
    }
}

impl Serialize for Seed {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        // Always serialize a seed as a string, to avoid issues with large
        // ints in JSON/TOML
        serializer.serialize_str(&self.to_string())
    }
}

// Custom deserialization to handle int, float, and string inputs
impl<'de> Deserialize<'de> for Seed {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        // We can deserialize from a bunch of different types so we can't
        // give a type hint here
        deserializer.deserialize_any(SeedVisitor)
    }
}

/// Macro to implement visit logic for the unsigned/signed integer widths
macro_rules! impl_visit_int {
    ($fname:ident, $type:ty) => {
        fn $fname<E>(self, value: $type) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Seed::Int(Seed::normalize(value.unsigned_abs() as u128)))
        }
    };
}

macro_rules! impl_visit_uint {
    ($fname:ident, $type:ty) => {
        fn $fname<E>(self, value: $type) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Seed::Int(Seed::normalize(value as u128)))
        }
    };
}

struct SeedVisitor;

impl<'de> Visitor<'de> for SeedVisitor {
    type Value = Seed;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an integer, a finite float, or a string")
    }

    impl_visit_uint!(visit_u8, u8);
    impl_visit_uint!(visit_u16, u16);
    impl_visit_uint!(visit_u32, u32);
    impl_visit_uint!(visit_u64, u64);
    impl_visit_uint!(visit_u128, u128);
    impl_visit_int!(visit_i8, i8);
    impl_visit_int!(visit_i16, i16);
    impl_visit_int!(visit_i32, i32);
    impl_visit_int!(visit_i64, i64);

    fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Seed::from_f64(value)
            .map_err(|_| E::custom(format!("seed must be finite: {}", value)))
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        // This will try to parse as an int, then fall back to text
        Ok(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{assert_de_tokens, assert_ser_tokens, Token};

    #[test]
    fn test_from_str() {
        // Valid int -> parses and canonicalizes
        assert_eq!(Seed::from("42"), Seed::Int(42));
        assert_eq!(Seed::from("0"), Seed::Int(1)); // zero promotes to 1

        // Invalid int -> stores the raw text
        assert_eq!(Seed::from("-1"), Seed::Text("-1".into()));
        assert_eq!(Seed::from("potato"), Seed::Text("potato".into()));
    }

    #[test]
    fn test_normalization() {
        // Wraps past 32 bits
        assert_eq!(Seed::from("4294967296"), Seed::Int(1)); // 2^32 -> 0 -> 1
        assert_eq!(Seed::from("4294967297"), Seed::Int(1)); // 2^32+1 -> 1
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(Seed::from_f64(42.9).unwrap(), Seed::Int(42));
        assert_eq!(Seed::from_f64(-42.9).unwrap(), Seed::Int(42));
        assert_eq!(Seed::from_f64(0.5).unwrap(), Seed::Int(1));
        assert!(Seed::from_f64(f64::NAN).is_err());
        assert!(Seed::from_f64(f64::INFINITY).is_err());
    }

    #[test]
    fn test_to_u32() {
        assert_eq!(Seed::Int(42).to_u32(), 42);
        // Text gets hashed, deterministically
        assert_eq!(
            Seed::Text("potato".into()).to_u32(),
            Seed::Text("potato".into()).to_u32()
        );
    }

    #[test]
    fn test_serialize() {
        // Ints get stringified to avoid precision issues
        assert_ser_tokens(&Seed::Int(42), &[Token::String("42")]);
        assert_ser_tokens(
            &Seed::Text("potato".into()),
            &[Token::String("potato")],
        );
    }

    #[test]
    fn test_deserialize() {
        assert_de_tokens(&Seed::Int(42), &[Token::String("42")]);
        assert_de_tokens(&Seed::Int(42), &[Token::U32(42)]);
        assert_de_tokens(&Seed::Int(42), &[Token::I64(-42)]);
        assert_de_tokens(&Seed::Int(1), &[Token::U64(0)]);
        assert_de_tokens(&Seed::Int(42), &[Token::F64(42.7)]);
        assert_de_tokens(
            &Seed::Text("potato".into()),
            &[Token::String("potato")],
        );
    }
}
