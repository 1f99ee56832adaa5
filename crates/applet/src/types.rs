use derive_more::{Display, From, Into};

/// Applet version (major.minor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, From, Into)]
#[display("{}.{}", major, minor)]
pub struct Version {
    /// Major version, high byte on the wire
    pub major: u8,
    /// Minor version, low byte on the wire
    pub minor: u8,
}

impl Version {
    /// Wire encoding: major in the high byte, minor in the low byte
    pub const fn to_bytes(self) -> [u8; 2] {
        [self.major, self.minor]
    }
}

impl From<[u8; 2]> for Version {
    fn from(bytes: [u8; 2]) -> Self {
        Self {
            major: bytes[0],
            minor: bytes[1],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_encoding() {
        let version = Version { major: 1, minor: 2 };
        assert_eq!(version.to_bytes(), [0x01, 0x02]);
        assert_eq!(Version::from([0x01, 0x02]), version);
        assert_eq!(version.to_string(), "1.2");
    }
}
