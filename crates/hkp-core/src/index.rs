//! Machine-readable key index
//!
//! Line-oriented, colon-delimited listing of key metadata:
//!
//! ```text
//! info:<version>:<count>
//! pub:<fingerprint>:<algo>:<bitlen>:<creation>:<expiration>:<flags>
//! uid:<escaped name>:<creation>:<expiration>:<flags>
//! ```
//!
//! Times are Unix seconds, or empty when unset. Flags are any of `r`, `d`, `e`
//! in that order. Blank lines and lines with unknown tags are skipped.

use std::io::{BufRead, Write};
use std::ops::{BitOr, BitOrAssign};

use chrono::{DateTime, Utc};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::entity::{EntityIdentity, KeyEntity};
use crate::error::{DecodeError, Error};

/// Index format version
pub const INDEX_VERSION: u32 = 1;

/// Fingerprint length in bytes
pub const FINGERPRINT_LEN: usize = 20;

const PUB_FIELDS: usize = 7;
const UID_FIELDS: usize = 5;

/// Bytes left as-is in uid names. `:` is always escaped.
const UID_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'=')
    .remove(b'@');

/// Key/identity status flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IndexFlags(u8);

impl IndexFlags {
    pub const REVOKED: IndexFlags = IndexFlags(1 << 0);
    pub const DISABLED: IndexFlags = IndexFlags(1 << 1);
    pub const EXPIRED: IndexFlags = IndexFlags(1 << 2);

    const CODES: [(IndexFlags, char); 3] = [
        (IndexFlags::REVOKED, 'r'),
        (IndexFlags::DISABLED, 'd'),
        (IndexFlags::EXPIRED, 'e'),
    ];

    pub const fn empty() -> Self {
        IndexFlags(0)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn contains(&self, other: IndexFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: IndexFlags) {
        self.0 |= other.0;
    }

    /// Parse a flag field; unknown characters are ignored
    pub fn parse(s: &str) -> Self {
        let mut flags = IndexFlags::empty();
        for c in s.chars() {
            if let Some((flag, _)) = Self::CODES.iter().find(|(_, code)| *code == c) {
                flags.insert(*flag);
            }
        }
        flags
    }

    pub fn format(&self) -> String {
        Self::CODES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, code)| *code)
            .collect()
    }
}

impl BitOr for IndexFlags {
    type Output = IndexFlags;

    fn bitor(self, rhs: IndexFlags) -> IndexFlags {
        IndexFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for IndexFlags {
    fn bitor_assign(&mut self, rhs: IndexFlags) {
        self.0 |= rhs.0;
    }
}

/// One user identity of an index record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexIdentity {
    /// Arbitrary text; escaped on the wire
    pub name: String,
    pub creation_time: Option<DateTime<Utc>>,
    pub expiration_time: Option<DateTime<Utc>>,
    pub flags: IndexFlags,
}

/// One key record: a `pub` line and its `uid` lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexKey {
    pub creation_time: Option<DateTime<Utc>>,
    /// `None` means the key does not expire
    pub expiration_time: Option<DateTime<Utc>>,
    pub algorithm: u8,
    pub fingerprint: [u8; FINGERPRINT_LEN],
    pub bit_length: u32,
    pub flags: IndexFlags,
    /// Identities in wire order
    pub identities: Vec<IndexIdentity>,
}

impl IndexKey {
    /// Build an index record from a parsed key entity.
    ///
    /// The key expiration comes from the primary identity's self-signature,
    /// falling back to the first identity when none is flagged primary.
    pub fn from_entity<E: KeyEntity + ?Sized>(entity: &E) -> Result<Self, Error> {
        let bit_length = entity
            .bit_length()
            .map_err(|e| Error::Entity(e.to_string()))?;

        let identities = entity.identities();
        let expiration_time = primary_identity(&identities).and_then(|ident| ident.expires);

        Ok(Self {
            creation_time: Some(entity.created()),
            expiration_time,
            algorithm: entity.algorithm(),
            fingerprint: entity.fingerprint(),
            bit_length,
            flags: IndexFlags::empty(),
            identities: identities
                .into_iter()
                .map(|ident| IndexIdentity {
                    name: ident.name,
                    creation_time: ident.created,
                    expiration_time: ident.expires,
                    flags: IndexFlags::empty(),
                })
                .collect(),
        })
    }

    /// Fingerprint as uppercase hex
    pub fn fingerprint_hex(&self) -> String {
        hex::encode_upper(self.fingerprint)
    }
}

fn primary_identity(identities: &[EntityIdentity]) -> Option<&EntityIdentity> {
    identities
        .iter()
        .find(|ident| ident.primary)
        .or_else(|| identities.first())
}

fn format_time(t: &Option<DateTime<Utc>>) -> String {
    match t {
        Some(t) => t.timestamp().to_string(),
        None => String::new(),
    }
}

fn parse_time(field: &'static str, s: &str) -> Result<Option<DateTime<Utc>>, Error> {
    if s.is_empty() {
        return Ok(None);
    }
    let invalid = || Error::InvalidNumber {
        field,
        value: s.to_string(),
    };
    let secs: i64 = s.parse().map_err(|_| invalid())?;
    DateTime::from_timestamp(secs, 0).map(Some).ok_or_else(invalid)
}

fn parse_number<T: std::str::FromStr>(field: &'static str, s: &str) -> Result<T, Error> {
    s.parse().map_err(|_| Error::InvalidNumber {
        field,
        value: s.to_string(),
    })
}

fn escape_name(name: &str) -> String {
    utf8_percent_encode(name, UID_ESCAPE).to_string()
}

fn unescape_name(s: &str) -> Result<String, Error> {
    let bytes = s.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'%' {
            let well_formed = bytes
                .get(i + 1..i + 3)
                .map(|hex| hex.iter().all(u8::is_ascii_hexdigit))
                .unwrap_or(false);
            if !well_formed {
                return Err(Error::InvalidEscape(s.to_string()));
            }
        }
    }
    percent_decode_str(s)
        .decode_utf8()
        .map(|name| name.into_owned())
        .map_err(|_| Error::InvalidEscape(s.to_string()))
}

fn pub_line(key: &IndexKey) -> String {
    format!(
        "pub:{}:{}:{}:{}:{}:{}\n",
        key.fingerprint_hex(),
        key.algorithm,
        key.bit_length,
        format_time(&key.creation_time),
        format_time(&key.expiration_time),
        key.flags.format(),
    )
}

fn uid_line(ident: &IndexIdentity) -> String {
    format!(
        "uid:{}:{}:{}:{}\n",
        escape_name(&ident.name),
        format_time(&ident.creation_time),
        format_time(&ident.expiration_time),
        ident.flags.format(),
    )
}

/// Encode a machine-readable index into a string
pub fn encode_index(keys: &[IndexKey]) -> String {
    let mut out = format!("info:{}:{}\n", INDEX_VERSION, keys.len());
    for key in keys {
        out.push_str(&pub_line(key));
        for ident in &key.identities {
            out.push_str(&uid_line(ident));
        }
    }
    out
}

/// Write a machine-readable index
pub fn write_index<W: Write>(mut w: W, keys: &[IndexKey]) -> std::io::Result<()> {
    writeln!(w, "info:{}:{}", INDEX_VERSION, keys.len())?;
    for key in keys {
        w.write_all(pub_line(key).as_bytes())?;
        for ident in &key.identities {
            w.write_all(uid_line(ident).as_bytes())?;
        }
    }
    Ok(())
}

/// Decode a machine-readable index from a string
pub fn decode_index(text: &str) -> Result<Vec<IndexKey>, DecodeError> {
    read_index(text.as_bytes())
}

/// Read a machine-readable index.
///
/// On failure the records decoded so far are returned inside the error.
pub fn read_index<R: BufRead>(r: R) -> Result<Vec<IndexKey>, DecodeError> {
    let mut parser = IndexParser::default();
    for line in r.lines() {
        let line = line.map_err(|e| DecodeError::new(parser.keys.clone(), e.into()))?;
        if let Err(e) = parser.feed(&line) {
            return Err(DecodeError::new(parser.keys, e));
        }
    }
    parser.finish()
}

/// Incremental index decoder state
#[derive(Default)]
struct IndexParser {
    expected: Option<usize>,
    keys: Vec<IndexKey>,
}

impl IndexParser {
    fn feed(&mut self, line: &str) -> Result<(), Error> {
        if line.trim().is_empty() {
            return Ok(());
        }
        if self.expected.is_none() {
            self.expected = Some(parse_info(line)?);
            return Ok(());
        }

        let fields: Vec<&str> = line.split(':').collect();
        match fields[0] {
            "pub" => {
                let key = parse_pub(&fields)?;
                self.keys.push(key);
            }
            "uid" => {
                let key = self.keys.last_mut().ok_or(Error::UidBeforePub)?;
                key.identities.push(parse_uid(&fields)?);
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> Result<Vec<IndexKey>, DecodeError> {
        let Some(expected) = self.expected else {
            return Err(DecodeError::new(self.keys, Error::MissingHeader));
        };
        if self.keys.len() != expected {
            let actual = self.keys.len();
            return Err(DecodeError::new(
                self.keys,
                Error::CountMismatch { expected, actual },
            ));
        }
        Ok(self.keys)
    }
}

fn parse_info(line: &str) -> Result<usize, Error> {
    let fields: Vec<&str> = line.splitn(3, ':').collect();
    if fields.len() != 3 || fields[0] != "info" {
        return Err(Error::InvalidHeader(line.to_string()));
    }
    let version: u32 = parse_number("version", fields[1])?;
    let count: usize = parse_number("count", fields[2])?;
    if version != INDEX_VERSION {
        return Err(Error::UnsupportedVersion { version });
    }
    Ok(count)
}

fn parse_pub(fields: &[&str]) -> Result<IndexKey, Error> {
    if fields.len() != PUB_FIELDS {
        return Err(Error::FieldCount {
            tag: "pub",
            expected: PUB_FIELDS,
            actual: fields.len(),
        });
    }

    let decoded = hex::decode(fields[1])?;
    let fingerprint: [u8; FINGERPRINT_LEN] = decoded
        .as_slice()
        .try_into()
        .map_err(|_| Error::FingerprintLength(decoded.len()))?;

    Ok(IndexKey {
        fingerprint,
        algorithm: parse_number("algorithm", fields[2])?,
        bit_length: parse_number("bit length", fields[3])?,
        creation_time: parse_time("creation time", fields[4])?,
        expiration_time: parse_time("expiration time", fields[5])?,
        flags: IndexFlags::parse(fields[6]),
        identities: Vec::new(),
    })
}

fn parse_uid(fields: &[&str]) -> Result<IndexIdentity, Error> {
    if fields.len() != UID_FIELDS {
        return Err(Error::FieldCount {
            tag: "uid",
            expected: UID_FIELDS,
            actual: fields.len(),
        });
    }

    Ok(IndexIdentity {
        name: unescape_name(fields[1])?,
        creation_time: parse_time("creation time", fields[2])?,
        expiration_time: parse_time("expiration time", fields[3])?,
        flags: IndexFlags::parse(fields[4]),
    })
}
