// SPDX-License-Identifier: GPL-3.0-only

//! Four-character pixel format codes
//!
//! Codes cross process and driver boundaries either as text (`"I420"`) or as a
//! packed 32-bit integer. The integer form stores the first character in the
//! lowest byte, which is the layout V4L2, libyuv and DirectShow agree on.

use std::fmt;
use std::str::FromStr;

/// A four-character code such as `NV12` or `raw `
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FourCc([u8; 4]);

impl FourCc {
    /// Create a code from its four bytes
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(*code)
    }

    /// Unpack a little-endian packed code
    pub const fn from_u32(value: u32) -> Self {
        Self(value.to_le_bytes())
    }

    /// Pack the code into an integer, first character in the lowest byte
    pub const fn to_u32(self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    /// Raw bytes of the code
    pub const fn bytes(&self) -> [u8; 4] {
        self.0
    }

    /// The code as text
    ///
    /// Codes built from non-UTF-8 bytes (only possible through [`FourCc::from_u32`])
    /// are rendered with replacement characters by [`fmt::Display`] instead.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc({:?})", String::from_utf8_lossy(&self.0))
    }
}

/// Error returned when text is not exactly four ASCII characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFourCcError(pub String);

impl fmt::Display for ParseFourCcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid pixel format code {:?}: expected exactly 4 ASCII characters",
            self.0
        )
    }
}

impl std::error::Error for ParseFourCcError {}

impl FromStr for FourCc {
    type Err = ParseFourCcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| ParseFourCcError(s.to_string()))?;
        if !bytes.is_ascii() {
            return Err(ParseFourCcError(s.to_string()));
        }
        Ok(Self(bytes))
    }
}

impl From<FourCc> for u32 {
    fn from(code: FourCc) -> Self {
        code.to_u32()
    }
}

impl From<u32> for FourCc {
    fn from(value: u32) -> Self {
        Self::from_u32(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing_is_little_endian() {
        let code = FourCc::new(b"NV12");
        assert_eq!(
            code.to_u32(),
            u32::from(b'N') | u32::from(b'V') << 8 | u32::from(b'1') << 16 | u32::from(b'2') << 24
        );
        assert_eq!(FourCc::from_u32(code.to_u32()), code);
    }

    #[test]
    fn test_parse_requires_four_ascii_chars() {
        assert_eq!("raw ".parse::<FourCc>().unwrap(), FourCc::new(b"raw "));
        assert!("raw".parse::<FourCc>().is_err());
        assert!("NV12X".parse::<FourCc>().is_err());
        assert!("ÄBC".parse::<FourCc>().is_err());
    }

    #[test]
    fn test_display_keeps_padding() {
        assert_eq!(FourCc::new(b"raw ").to_string(), "raw ");
        assert_eq!(FourCc::new(b"raw ").as_str(), Some("raw "));
    }
}
