use crate::{
    Result,
    constants::{
        PIN_HASH_LENGTH, PRIVILEGE_ADD_USERS, PRIVILEGE_ADMIN, PRIVILEGE_DELETE_USERS,
        PRIVILEGE_REMOTE, PRIVILEGE_UNLOCK, PRIVILEGE_VIEW_LOGS, UID_LENGTH,
    },
    error::Error,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use subtle::ConstantTimeEq;

/// Card identifier (4 bytes, single-size ISO 14443A).
///
/// A `CardUid` is always complete: there is no way to build one from fewer
/// or more than [`UID_LENGTH`] bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CardUid([u8; UID_LENGTH]);

impl CardUid {
    /// Wrap four raw identifier bytes.
    #[must_use]
    pub const fn new(bytes: [u8; UID_LENGTH]) -> Self {
        CardUid(bytes)
    }

    /// Build from a slice that must be exactly [`UID_LENGTH`] bytes long.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardUid` for any other length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; UID_LENGTH] = bytes.try_into().map_err(|_| {
            Error::InvalidCardUid(format!(
                "UID must be {UID_LENGTH} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(CardUid(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; UID_LENGTH] {
        &self.0
    }

    /// Uppercase hex without separators, e.g. `12345678`.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

impl fmt::Display for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:02X} {:02X} {:02X} {:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

impl fmt::Debug for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CardUid({})", self.to_hex())
    }
}

/// Parses `12345678`, `12 34 56 78` or `12:34:56:78` (case-insensitive).
impl std::str::FromStr for CardUid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ':')
            .collect();
        let bytes = hex::decode(&compact)
            .map_err(|e| Error::InvalidCardUid(format!("{s}: {e}")))?;
        CardUid::from_slice(&bytes)
    }
}

impl Serialize for CardUid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CardUid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// SHA-256 digest of a user's PIN.
///
/// # Security
/// Comparison is constant-time so that a wrong PIN takes the same time to
/// reject regardless of how many leading digest bytes match.
#[derive(Clone, Copy)]
pub struct PinHash([u8; PIN_HASH_LENGTH]);

impl PinHash {
    #[must_use]
    pub const fn new(digest: [u8; PIN_HASH_LENGTH]) -> Self {
        PinHash(digest)
    }

    /// Parse a 64-character hex digest.
    ///
    /// # Errors
    /// Returns `Error::InvalidPinHash` if the input is not 32 bytes of hex.
    pub fn from_hex(s: &str) -> Result<Self> {
        let mut digest = [0u8; PIN_HASH_LENGTH];
        hex::decode_to_slice(s.trim(), &mut digest)
            .map_err(|e| Error::InvalidPinHash(e.to_string()))?;
        Ok(PinHash(digest))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; PIN_HASH_LENGTH] {
        &self.0
    }

    /// Constant-time comparison against a freshly computed digest.
    #[must_use]
    pub fn matches(&self, digest: &[u8; PIN_HASH_LENGTH]) -> bool {
        self.0.ct_eq(digest).into()
    }
}

impl PartialEq for PinHash {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for PinHash {}

impl fmt::Debug for PinHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("PinHash(..)")
    }
}

impl Serialize for PinHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for PinHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PinHash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Directory identifier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u8);

impl UserId {
    #[must_use]
    pub const fn new(id: u8) -> Self {
        UserId(id)
    }

    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-user capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Privileges(u8);

impl Privileges {
    pub const NONE: Privileges = Privileges(0);
    pub const UNLOCK: Privileges = Privileges(PRIVILEGE_UNLOCK);
    pub const ADMIN: Privileges = Privileges(PRIVILEGE_ADMIN);
    pub const REMOTE: Privileges = Privileges(PRIVILEGE_REMOTE);
    pub const ADD_USERS: Privileges = Privileges(PRIVILEGE_ADD_USERS);
    pub const DELETE_USERS: Privileges = Privileges(PRIVILEGE_DELETE_USERS);
    pub const VIEW_LOGS: Privileges = Privileges(PRIVILEGE_VIEW_LOGS);

    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Privileges(bits)
    }

    #[must_use]
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// True if every flag in `other` is set.
    #[must_use]
    pub fn contains(&self, other: Privileges) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Privileges {
    type Output = Privileges;

    fn bitor(self, rhs: Privileges) -> Privileges {
        Privileges(self.0 | rhs.0)
    }
}

/// A person enrolled in the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,

    /// Display name; informational only.
    #[serde(default)]
    pub name: String,

    pub uid: CardUid,

    pub pin_hash: PinHash,

    #[serde(default)]
    pub privileges: Privileges,
}

/// Audit record emitted on every security-relevant transition.
///
/// Events are never retained by the controller; they are formatted with
/// [`audit_line`](AccessEvent::audit_line) and shipped to telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEvent {
    pub user: Option<UserId>,
    pub granted: bool,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl AccessEvent {
    pub fn new(user: Option<UserId>, granted: bool, reason: impl Into<String>) -> Self {
        Self {
            user,
            granted,
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }

    /// Event not attributed to any user.
    pub fn system(granted: bool, reason: impl Into<String>) -> Self {
        Self::new(None, granted, reason)
    }

    /// Telemetry text: `System: <reason>` or `User<id>: GRANTED|DENIED - <reason>`.
    #[must_use]
    pub fn audit_line(&self) -> String {
        match self.user {
            None => format!("System: {}", self.reason),
            Some(user) => format!(
                "User{}: {} - {}",
                user,
                if self.granted { "GRANTED" } else { "DENIED" },
                self.reason
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("12345678", [0x12, 0x34, 0x56, 0x78])]
    #[case("12 34 56 78", [0x12, 0x34, 0x56, 0x78])]
    #[case("ab:cd:ef:01", [0xAB, 0xCD, 0xEF, 0x01])]
    #[case("00000000", [0x00, 0x00, 0x00, 0x00])]
    fn test_card_uid_parse(#[case] input: &str, #[case] expected: [u8; 4]) {
        let uid: CardUid = input.parse().unwrap();
        assert_eq!(uid.as_bytes(), &expected);
    }

    #[rstest]
    #[case("123456")] // too short
    #[case("1234567890")] // too long
    #[case("zz345678")] // not hex
    #[case("")]
    fn test_card_uid_invalid(#[case] input: &str) {
        let result: Result<CardUid> = input.parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_card_uid_from_slice_rejects_partial() {
        assert!(CardUid::from_slice(&[0x12, 0x34, 0x56]).is_err());
        assert!(CardUid::from_slice(&[0x12, 0x34, 0x56, 0x78, 0x9A]).is_err());
        assert!(CardUid::from_slice(&[0x12, 0x34, 0x56, 0x78]).is_ok());
    }

    #[test]
    fn test_card_uid_formatting() {
        let uid = CardUid::new([0x04, 0xAB, 0xCD, 0xEF]);
        assert_eq!(uid.to_hex(), "04ABCDEF");
        assert_eq!(uid.to_string(), "04 AB CD EF");
        assert_eq!(format!("{uid:?}"), "CardUid(04ABCDEF)");
    }

    #[test]
    fn test_pin_hash_matches() {
        let hash = PinHash::new([7u8; 32]);
        assert!(hash.matches(&[7u8; 32]));

        let mut other = [7u8; 32];
        other[31] = 8;
        assert!(!hash.matches(&other));
    }

    #[test]
    fn test_pin_hash_hex() {
        let hex = "03ac674216f3e15c761ee1a5e255f067953623c8b388b4459e13f978d7c846f4";
        let hash = PinHash::from_hex(hex).unwrap();
        assert_eq!(hash.as_bytes()[0], 0x03);
        assert!(PinHash::from_hex("03ac").is_err());
        assert_eq!(format!("{hash:?}"), "PinHash(..)");
    }

    #[test]
    fn test_privileges() {
        let admin = Privileges::UNLOCK | Privileges::ADMIN | Privileges::REMOTE;
        assert!(admin.contains(Privileges::ADMIN));
        assert!(admin.contains(Privileges::UNLOCK | Privileges::REMOTE));
        assert!(!admin.contains(Privileges::DELETE_USERS));
        assert_eq!(Privileges::from_bits(0x0F).bits(), 0x0F);
    }

    #[rstest]
    #[case(None, false, "Invalid RFID", "System: Invalid RFID")]
    #[case(None, true, "Remote unlock", "System: Remote unlock")]
    #[case(Some(0), true, "Access granted", "User0: GRANTED - Access granted")]
    #[case(Some(1), false, "Wrong PIN", "User1: DENIED - Wrong PIN")]
    fn test_audit_line(
        #[case] user: Option<u8>,
        #[case] granted: bool,
        #[case] reason: &str,
        #[case] expected: &str,
    ) {
        let event = AccessEvent::new(user.map(UserId::new), granted, reason);
        assert_eq!(event.audit_line(), expected);
    }

    #[test]
    fn test_user_record_serde() {
        let json = r#"{
            "id": 0,
            "name": "Admin",
            "uid": "12345678",
            "pin_hash": "03ac674216f3e15c761ee1a5e255f067953623c8b388b4459e13f978d7c846f4",
            "privileges": 63
        }"#;
        let user: UserRecord = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, UserId::new(0));
        assert_eq!(user.uid, CardUid::new([0x12, 0x34, 0x56, 0x78]));
        assert!(user.privileges.contains(Privileges::VIEW_LOGS));

        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["uid"], "12345678");
    }
}
