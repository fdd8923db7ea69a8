//! Closed enumerations for the tag bytes stored in tile headers and footers.

use fmd_common::{Error, Result};
use serde::{Deserialize, Serialize};

macro_rules! tag_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($element:literal) {
            $($variant:ident = $value:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[repr(u8)]
        pub enum $name {
            $($variant = $value,)*
        }

        impl TryFrom<u8> for $name {
            type Error = Error;

            fn try_from(tag: u8) -> Result<$name> {
                match tag {
                    $($value => Ok($name::$variant),)*
                    _ => Err(Error::unknown_tag($element, tag)),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value as u8
            }
        }
    };
}

tag_enum! {
    /// Value type of a field or of a tile's cells.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum Datatype ("datatype") {
        Int32 = 0,
        Int64 = 1,
        Float32 = 2,
        Float64 = 3,
        Char = 4,
        Int8 = 5,
        Uint8 = 6,
        Int16 = 7,
        Uint16 = 8,
        Uint32 = 9,
        Uint64 = 10,
        StringAscii = 11,
        StringUtf8 = 12,
        StringUtf16 = 13,
        StringUtf32 = 14,
        StringUcs2 = 15,
        StringUcs4 = 16,
        Any = 17,
        DatetimeYear = 18,
        DatetimeMonth = 19,
        DatetimeWeek = 20,
        DatetimeDay = 21,
        DatetimeHr = 22,
        DatetimeMin = 23,
        DatetimeSec = 24,
        DatetimeMs = 25,
        DatetimeUs = 26,
        DatetimeNs = 27,
        DatetimePs = 28,
        DatetimeFs = 29,
        DatetimeAs = 30,
        TimeHr = 31,
        TimeMin = 32,
        TimeSec = 33,
        TimeMs = 34,
        TimeUs = 35,
        TimeNs = 36,
        TimePs = 37,
        TimeFs = 38,
        TimeAs = 39,
        Blob = 40,
        Bool = 41,
    }
}

impl Datatype {
    /// Width of a single value in bytes.
    pub fn size(&self) -> u64 {
        use Datatype::*;
        match self {
            Char | Int8 | Uint8 | StringAscii | StringUtf8 | Any | Blob | Bool => 1,
            Int16 | Uint16 | StringUtf16 | StringUcs2 => 2,
            Int32 | Uint32 | Float32 | StringUtf32 | StringUcs4 => 4,
            Int64 | Uint64 | Float64 => 8,
            DatetimeYear | DatetimeMonth | DatetimeWeek | DatetimeDay | DatetimeHr
            | DatetimeMin | DatetimeSec | DatetimeMs | DatetimeUs | DatetimeNs | DatetimePs
            | DatetimeFs | DatetimeAs | TimeHr | TimeMin | TimeSec | TimeMs | TimeUs | TimeNs
            | TimePs | TimeFs | TimeAs => 8,
        }
    }
}

tag_enum! {
    /// Encryption applied to a tile payload.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EncryptionType ("encryption type") {
        NoEncryption = 0,
        Aes256Gcm = 1,
    }
}

tag_enum! {
    /// Layout of the fragment the metadata describes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum FragmentType ("fragment type") {
        Sparse = 0,
        Dense = 1,
    }
}

#[cfg(test)]
mod tests {
    use fmd_common::ErrorKind;

    use super::{Datatype, EncryptionType, FragmentType};

    #[test]
    fn test_datatype_tags() {
        for tag in 0..=41u8 {
            let dt = Datatype::try_from(tag).unwrap();
            assert_eq!(u8::from(dt), tag);
            assert!(matches!(dt.size(), 1 | 2 | 4 | 8));
        }
        assert_eq!(Datatype::try_from(4).unwrap(), Datatype::Char);
        assert_eq!(Datatype::StringUtf16.size(), 2);
        assert_eq!(Datatype::DatetimeNs.size(), 8);
        assert_eq!(Datatype::Float32.size(), 4);

        let err = Datatype::try_from(255).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::UnknownTag { tag: 255, .. }
        ));
    }

    #[test]
    fn test_other_tags() {
        assert_eq!(
            EncryptionType::try_from(1).unwrap(),
            EncryptionType::Aes256Gcm
        );
        assert!(EncryptionType::try_from(2).is_err());
        assert_eq!(FragmentType::try_from(1).unwrap(), FragmentType::Dense);
        assert!(FragmentType::try_from(7).is_err());
    }

    #[test]
    fn test_datatype_serde_names() {
        let dt: Datatype = serde_json::from_str("\"STRING_ASCII\"").unwrap();
        assert_eq!(dt, Datatype::StringAscii);
        assert_eq!(
            serde_json::to_string(&Datatype::DatetimeMs).unwrap(),
            "\"DATETIME_MS\""
        );
        assert_eq!(
            serde_json::to_string(&Datatype::Uint64).unwrap(),
            "\"UINT64\""
        );
    }
}
