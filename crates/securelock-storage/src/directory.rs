use std::collections::HashMap;
use std::path::Path;

use securelock_core::{CardUid, UserId, UserRecord};
use tracing::info;

use crate::error::{StorageError, StorageResult};

/// Read-only lookup of enrolled users.
pub trait UserDirectory: Send + Sync {
    /// The user owning card `uid`, if enrolled.
    fn lookup(&self, uid: &CardUid) -> Option<&UserRecord>;

    /// Number of enrolled users.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory directory indexed by card identifier.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    users: Vec<UserRecord>,
    by_uid: HashMap<CardUid, usize>,
}

impl StaticDirectory {
    /// Build a directory from records.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Duplicate` if two records share a card
    /// identifier or a user id.
    pub fn from_records(users: Vec<UserRecord>) -> StorageResult<Self> {
        let mut by_uid = HashMap::with_capacity(users.len());
        let mut ids: HashMap<UserId, usize> = HashMap::with_capacity(users.len());

        for (index, user) in users.iter().enumerate() {
            if by_uid.insert(user.uid, index).is_some() {
                return Err(StorageError::Duplicate {
                    field: "card uid",
                    value: user.uid.to_string(),
                });
            }
            if ids.insert(user.id, index).is_some() {
                return Err(StorageError::Duplicate {
                    field: "user id",
                    value: user.id.to_string(),
                });
            }
        }

        Ok(Self { users, by_uid })
    }

    /// Parse a JSON array of user records.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Parse` for malformed JSON, identifiers that are
    /// not 8 hex digits, or PIN hashes that are not 64 hex digits, and
    /// `StorageError::Duplicate` as for [`from_records`](Self::from_records).
    pub fn from_json(json: &str) -> StorageResult<Self> {
        let users: Vec<UserRecord> = serde_json::from_str(json)?;
        Self::from_records(users)
    }

    /// Load a JSON directory file.
    ///
    /// # Errors
    ///
    /// As [`from_json`](Self::from_json), plus `StorageError::Io` if the
    /// file cannot be read.
    pub fn from_json_file(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let directory = Self::from_json(&std::fs::read_to_string(path)?)?;
        info!(path = %path.display(), users = directory.len(), "user directory loaded");
        Ok(directory)
    }

    pub fn find_by_id(&self, id: UserId) -> Option<&UserRecord> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserRecord> {
        self.users.iter()
    }
}

impl UserDirectory for StaticDirectory {
    fn lookup(&self, uid: &CardUid) -> Option<&UserRecord> {
        self.by_uid.get(uid).map(|&index| &self.users[index])
    }

    fn len(&self) -> usize {
        self.users.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use securelock_core::{PinHash, Privileges};

    fn user(id: u8, uid: [u8; 4]) -> UserRecord {
        UserRecord {
            id: UserId::new(id),
            name: format!("user{id}"),
            uid: CardUid::new(uid),
            pin_hash: PinHash::new([id; 32]),
            privileges: Privileges::UNLOCK,
        }
    }

    #[test]
    fn test_lookup_by_uid() {
        let directory =
            StaticDirectory::from_records(vec![user(1, [1, 1, 1, 1]), user(2, [2, 2, 2, 2])])
                .unwrap();
        assert_eq!(directory.len(), 2);
        assert_eq!(
            directory.lookup(&CardUid::new([2, 2, 2, 2])).map(|u| u.id),
            Some(UserId::new(2))
        );
        assert!(directory.lookup(&CardUid::new([3, 3, 3, 3])).is_none());
        assert_eq!(
            directory.find_by_id(UserId::new(1)).map(|u| u.uid),
            Some(CardUid::new([1, 1, 1, 1]))
        );
    }

    #[test]
    fn test_duplicate_uid_rejected() {
        let err = StaticDirectory::from_records(vec![user(1, [9, 9, 9, 9]), user(2, [9, 9, 9, 9])])
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { field: "card uid", .. }));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = StaticDirectory::from_records(vec![user(4, [1, 2, 3, 4]), user(4, [5, 6, 7, 8])])
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { field: "user id", .. }));
    }

    #[test]
    fn test_empty_directory() {
        let directory = StaticDirectory::default();
        assert!(directory.is_empty());
        assert!(directory.lookup(&CardUid::new([0; 4])).is_none());
    }
}
