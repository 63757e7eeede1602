//! In-memory keyring fixture for tests
//!
//! Stands in for a real OpenPGP implementation. Keys are plain structs and
//! their "armored" form is a hex-encoded JSON payload between the usual
//! public-key block markers, so armored text can be produced and checked
//! without any cryptography.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{EntityIdentity, KeyEntity, Keyring};
use crate::error::BoxError;

pub const ARMOR_BEGIN: &str = "-----BEGIN PGP PUBLIC KEY BLOCK-----";
pub const ARMOR_END: &str = "-----END PGP PUBLIC KEY BLOCK-----";

const LINE_WIDTH: usize = 64;

/// Fingerprint of the fixture key returned by [`stallman_key`]
pub const STALLMAN_FINGERPRINT: &str = "67819B343B2AB70DED9320872C6464AF2A8E4C02";

/// Creation time of the fixture key (2013-07-20T16:32:38Z)
pub const STALLMAN_CREATED: i64 = 1374337958;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestIdentity {
    pub name: String,
    pub created: Option<i64>,
    pub expires: Option<i64>,
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestKey {
    pub fingerprint: [u8; 20],
    pub created: i64,
    pub algorithm: u8,
    pub bit_length: u32,
    pub identities: Vec<TestIdentity>,
}

impl TestKey {
    pub fn new(fingerprint: [u8; 20], created: i64) -> Self {
        Self {
            fingerprint,
            created,
            algorithm: 1,
            bit_length: 4096,
            identities: Vec::new(),
        }
    }

    pub fn with_identity(mut self, name: impl Into<String>, created: i64) -> Self {
        self.identities.push(TestIdentity {
            name: name.into(),
            created: Some(created),
            expires: None,
            primary: false,
        });
        self
    }
}

fn to_datetime(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

impl KeyEntity for TestKey {
    fn fingerprint(&self) -> [u8; 20] {
        self.fingerprint
    }

    fn created(&self) -> DateTime<Utc> {
        to_datetime(self.created)
    }

    fn algorithm(&self) -> u8 {
        self.algorithm
    }

    fn bit_length(&self) -> Result<u32, BoxError> {
        if self.bit_length == 0 {
            return Err("unknown key size".into());
        }
        Ok(self.bit_length)
    }

    fn identities(&self) -> Vec<EntityIdentity> {
        self.identities
            .iter()
            .map(|ident| EntityIdentity {
                name: ident.name.clone(),
                created: ident.created.map(to_datetime),
                expires: ident.expires.map(to_datetime),
                primary: ident.primary,
            })
            .collect()
    }
}

/// Keyring over [`TestKey`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TestKeyring;

impl Keyring for TestKeyring {
    type Entity = TestKey;

    fn read_armored(&self, text: &str) -> Result<Vec<TestKey>, BoxError> {
        let start = text.find(ARMOR_BEGIN).ok_or("armor header not found")? + ARMOR_BEGIN.len();
        let len = text[start..].find(ARMOR_END).ok_or("armor footer not found")?;

        let payload: String = text[start..start + len]
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.contains(": "))
            .collect();
        let json = hex::decode(payload)?;
        let keys: Vec<TestKey> = serde_json::from_slice(&json)?;
        if keys.is_empty() {
            return Err("armored block holds no keys".into());
        }
        Ok(keys)
    }

    fn write_armored(&self, entities: &[TestKey]) -> Result<String, BoxError> {
        let payload = hex::encode(serde_json::to_vec(entities)?);

        let mut out = String::new();
        out.push_str(ARMOR_BEGIN);
        out.push_str("\n\n");
        for chunk in payload.as_bytes().chunks(LINE_WIDTH) {
            out.push_str(std::str::from_utf8(chunk)?);
            out.push('\n');
        }
        out.push_str(ARMOR_END);
        out.push('\n');
        Ok(out)
    }
}

/// Fixture key modeled on a well-known 4096-bit RSA key
pub fn stallman_key() -> TestKey {
    let mut fingerprint = [0u8; 20];
    // Constant is valid hex of the right length
    let _ = hex::decode_to_slice(STALLMAN_FINGERPRINT, &mut fingerprint);
    TestKey::new(fingerprint, STALLMAN_CREATED)
        .with_identity("Richard Stallman <rms@gnu.org>", STALLMAN_CREATED)
}
