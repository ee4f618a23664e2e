//! Who may change the shared calendar and who gets told about it.
//!
//! Both lists come from a static JSON file that is read once at
//! startup:
//!
//! ```json
//! {
//!   "allowed_users": [{"name": "alice", "id": 1001}],
//!   "pairings": {"1001": "1002", "1002": "1001"}
//! }
//! ```
//!
//! Ids may be written as JSON numbers or strings. They become `UserId`
//! here and nowhere else.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

impl UserId {
    /// Chat mention syntax for this user.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(UserId)
            .map_err(|_| anyhow!("Invalid user id: {:?}", s))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Ok(UserId(n)),
            RawId::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

impl Serialize for UserId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Snowflake ids overflow JSON numbers in some clients
        serializer.serialize_str(&self.0.to_string())
    }
}

/// The person who typed a command, as reported by the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
struct AllowedUserEntry {
    #[serde(default)]
    name: String,
    id: UserId,
}

#[derive(Debug, Deserialize)]
struct AccessFile {
    #[serde(default)]
    allowed_users: Vec<AllowedUserEntry>,
    #[serde(default)]
    pairings: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
pub struct AllowList {
    // id -> configured name, the name is only used in logs
    users: HashMap<UserId, String>,
}

impl AllowList {
    pub fn is_allowed(&self, id: UserId) -> bool {
        self.users.contains_key(&id)
    }

    pub fn name_of(&self, id: UserId) -> Option<&str> {
        self.users.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl FromIterator<(UserId, String)> for AllowList {
    fn from_iter<T: IntoIterator<Item = (UserId, String)>>(iter: T) -> Self {
        Self {
            users: iter.into_iter().collect(),
        }
    }
}

/// One-directional user -> partner mapping. A pairs with B says nothing
/// about B pairing with A.
#[derive(Debug, Clone, Default)]
pub struct PairingDirectory {
    partners: HashMap<UserId, UserId>,
}

impl PairingDirectory {
    pub fn partner_of(&self, id: UserId) -> Option<UserId> {
        self.partners.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.partners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }
}

impl FromIterator<(UserId, UserId)> for PairingDirectory {
    fn from_iter<T: IntoIterator<Item = (UserId, UserId)>>(iter: T) -> Self {
        Self {
            partners: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    pub allow_list: AllowList,
    pub pairings: PairingDirectory,
}

impl AccessControl {
    pub fn new(allow_list: AllowList, pairings: PairingDirectory) -> Self {
        Self {
            allow_list,
            pairings,
        }
    }

    /// Read the access file at `path`. A missing or malformed file is
    /// logged and yields an empty allow-list and no pairings. Call this
    /// again to pick up changes to the file.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                tracing::error!("Could not read access config {}: {}", path.display(), err);
                return Self::default();
            }
        };

        match Self::from_json(&contents) {
            Ok(access) => {
                tracing::info!(
                    "Loaded access config from {} ({} allowed users, {} pairings)",
                    path.display(),
                    access.allow_list.len(),
                    access.pairings.len()
                );
                access
            }
            Err(err) => {
                tracing::error!("Invalid access config {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let file: AccessFile = serde_json::from_str(contents)?;

        let allow_list = file
            .allowed_users
            .into_iter()
            .map(|entry| (entry.id, entry.name))
            .collect();

        let mut partners = HashMap::new();
        for (key, value) in file.pairings {
            let partner = match &value {
                serde_json::Value::String(s) => s.parse::<UserId>(),
                serde_json::Value::Number(n) => n
                    .as_u64()
                    .map(UserId)
                    .ok_or_else(|| anyhow!("Invalid user id: {}", n)),
                other => Err(anyhow!("Invalid user id: {}", other)),
            };
            match (key.parse::<UserId>(), partner) {
                (Ok(user), Ok(partner)) => {
                    partners.insert(user, partner);
                }
                (Err(err), _) | (_, Err(err)) => {
                    tracing::warn!("Skipping pairing {} -> {}: {}", key, value, err);
                }
            }
        }

        Ok(Self {
            allow_list,
            pairings: PairingDirectory { partners },
        })
    }

    pub fn is_allowed(&self, id: UserId) -> bool {
        self.allow_list.is_allowed(id)
    }

    pub fn partner_of(&self, id: UserId) -> Option<UserId> {
        self.pairings.partner_of(id)
    }

    /// Name to log for `user`: the allow-list name when there is one,
    /// otherwise the chat display name.
    pub fn name_for<'a>(&'a self, user: &'a UserIdentity) -> &'a str {
        self.allow_list
            .name_of(user.id)
            .unwrap_or(&user.display_name)
    }
}
