use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// HTTP routes served by the gateway.
pub mod routes {
    pub const REGISTER: &str = "/api/user/register";
    pub const LOGIN: &str = "/api/user/login";
    pub const LIST: &str = "/api/data/list";
    pub const GET: &str = "/api/data/get";
    pub const UPDATE: &str = "/api/data/update";
    pub const READY: &str = "/readyz";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    LoginPassword,
    CreditCard,
    Text,
    File,
}

impl RecordType {
    pub const ALL: [RecordType; 4] = [
        RecordType::LoginPassword,
        RecordType::Text,
        RecordType::File,
        RecordType::CreditCard,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::LoginPassword => "login_password",
            RecordType::CreditCard => "credit_card",
            RecordType::Text => "text",
            RecordType::File => "file",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login_password" => Ok(RecordType::LoginPassword),
            "credit_card" => Ok(RecordType::CreditCard),
            "text" => Ok(RecordType::Text),
            "file" => Ok(RecordType::File),
            other => Err(format!("unknown record type: {other}")),
        }
    }
}

/// One persisted secret entry. `body` is codec output everywhere except
/// transiently inside the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, with = "b64", skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<u8>,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, with = "b64", skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<u8>,
    #[serde(default, with = "b64", skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<u8>,
    /// Zero-based chunk index. Transport only.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub part: u32,
}

impl Record {
    pub fn new(record_type: RecordType) -> Self {
        Self {
            id: String::new(),
            name: Vec::new(),
            record_type,
            user_id: String::new(),
            deleted: false,
            date: None,
            body: Vec::new(),
            description: Vec::new(),
            part: 0,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_empty()
    }

    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            record_type: self.record_type,
            description: self.description.clone(),
        }
    }

    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }

    pub fn description_lossy(&self) -> String {
        String::from_utf8_lossy(&self.description).into_owned()
    }
}

/// List projection of a record. Never carries the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub id: String,
    #[serde(default, with = "b64", skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<u8>,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    #[serde(default, with = "b64", skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<u8>,
}

// ── Typed bodies ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginBody {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCardBody {
    pub ccn: String,
    pub exp: String,
    pub cvv: String,
}

// ── API Payloads ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthReply {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub msg: String,
    /// Base64 key material, only present on registration.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordRef {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: String,
}

// ── Chunking ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part<'a> {
    pub index: u32,
    pub bytes: &'a [u8],
}

pub fn part_count(len: usize, chunk_size: usize) -> usize {
    len.div_ceil(chunk_size.max(1)).max(1)
}

/// Slices `bytes` into consecutive parts of at most `chunk_size` bytes.
/// An empty input still yields one (empty) part so the record itself is sent.
pub fn split_parts(bytes: &[u8], chunk_size: usize) -> Vec<Part<'_>> {
    if bytes.is_empty() {
        return vec![Part { index: 0, bytes }];
    }
    bytes
        .chunks(chunk_size.max(1))
        .enumerate()
        .map(|(i, chunk)| Part {
            index: i as u32,
            bytes: chunk,
        })
        .collect()
}

fn is_false(v: &bool) -> bool {
    !*v
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

mod b64 {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => STANDARD
                .decode(s.as_bytes())
                .map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}
