//! Domain values for the ERCx API.
//!
//! # Design
//! `Network`, `TestLevel` and `Permission` are closed sets. Parsing goes
//! through `FromStr` and fails with `ApiError::InvalidArgument`, so bad input
//! is rejected before a request is built. `Display` yields the exact form the
//! API expects in paths and bodies.
//!
//! `TokenInfo` is decoded by hand rather than through `Deserialize` so that a
//! missing key is reported by name, in a fixed order, and no partially filled
//! record ever exists.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::ApiError;

/// Chain a token lives on, identified on the wire by its chain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Goerli,
    Sepolia,
    Mainnet,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Goerli, Network::Sepolia, Network::Mainnet];

    /// Chain id.
    pub fn id(self) -> u64 {
        match self {
            Network::Goerli => 5,
            Network::Sepolia => 11_155_111,
            Network::Mainnet => 1,
        }
    }

    /// Chain id in its canonical decimal form.
    pub const fn id_str(self) -> &'static str {
        match self {
            Network::Goerli => "5",
            Network::Sepolia => "11155111",
            Network::Mainnet => "1",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Network::Goerli => "goerli",
            Network::Sepolia => "sepolia",
            Network::Mainnet => "mainnet",
        }
    }

    pub fn from_id(id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.id() == id)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id_str())
    }
}

impl FromStr for Network {
    type Err = ApiError;

    /// Accepts the name in any case, or the exact decimal chain id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|n| s.eq_ignore_ascii_case(n.name()) || s == n.id_str())
            .ok_or_else(|| ApiError::invalid_argument("network", s))
    }
}

impl Serialize for Network {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.id())
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Id(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Id(id) => Network::from_id(id)
                .ok_or_else(|| de::Error::custom(format!("unknown network id {id}"))),
            Raw::Text(text) => text.parse().map_err(de::Error::custom),
        }
    }
}

/// Group of property tests an evaluation is run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestLevel {
    Abi,
    Minimal,
    Recommended,
    Desirable,
    Addon,
    Fingerprint,
    All,
}

impl TestLevel {
    pub const ALL: [TestLevel; 7] = [
        TestLevel::Abi,
        TestLevel::Minimal,
        TestLevel::Recommended,
        TestLevel::Desirable,
        TestLevel::Addon,
        TestLevel::Fingerprint,
        TestLevel::All,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TestLevel::Abi => "abi",
            TestLevel::Minimal => "minimal",
            TestLevel::Recommended => "recommended",
            TestLevel::Desirable => "desirable",
            TestLevel::Addon => "addon",
            TestLevel::Fingerprint => "fingerprint",
            TestLevel::All => "all",
        }
    }
}

impl fmt::Display for TestLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestLevel {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| s.eq_ignore_ascii_case(level.as_str()))
            .ok_or_else(|| ApiError::invalid_argument("test level", s))
    }
}

/// Access granted to a user on a shared token list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Permission {
    Read,
    Write,
    Admin,
}

impl Permission {
    pub const ALL: [Permission; 3] = [Permission::Read, Permission::Write, Permission::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Read => "READ",
            Permission::Write => "WRITE",
            Permission::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = ApiError;

    /// Case-sensitive: only `READ`, `WRITE` and `ADMIN` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| s == p.as_str())
            .ok_or_else(|| ApiError::invalid_argument("permission", s))
    }
}

/// Token metadata as reported by the service.
///
/// `decimals` and `total_supply` stay decimal strings; total supplies routinely
/// exceed what fits in a `u64`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub id: String,
    pub name: String,
    pub address: String,
    pub symbol: String,
    pub decimals: String,
    pub total_supply: String,
    pub network: String,
}

impl TokenInfo {
    /// Keys required in the payload, in the order they are checked.
    pub const REQUIRED_FIELDS: [&'static str; 7] = [
        "id",
        "name",
        "address",
        "symbol",
        "decimals",
        "totalSupply",
        "network",
    ];

    /// Decode a token-info payload.
    ///
    /// Fails with `MissingField` on the first absent key and with
    /// `DecodeError` if the payload is not an object or a field holds
    /// something other than a string or a number. Extra keys are ignored.
    pub fn decode(payload: &Value) -> Result<Self, ApiError> {
        let object = payload
            .as_object()
            .ok_or_else(|| ApiError::DecodeError("token info is not a JSON object".to_string()))?;

        if let Some(missing) = Self::REQUIRED_FIELDS
            .iter()
            .find(|key| !object.contains_key(**key))
        {
            return Err(ApiError::MissingField((*missing).to_string()));
        }

        let field = |key: &str| -> Result<String, ApiError> {
            match &object[key] {
                Value::String(s) => Ok(s.clone()),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(ApiError::DecodeError(format!(
                    "field {key} must be a string, got {other}"
                ))),
            }
        };

        Ok(TokenInfo {
            id: field("id")?,
            name: field("name")?,
            address: field("address")?,
            symbol: field("symbol")?,
            decimals: field("decimals")?,
            total_supply: field("totalSupply")?,
            network: field("network")?,
        })
    }
}
