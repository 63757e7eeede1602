//! Lookup request model shared by client and server

use serde::{Deserialize, Serialize};

/// Token the client always sends to ask for machine-readable output
pub const OPTION_MACHINE_READABLE: &str = "mr";

/// Token for the "no modification" option
pub const OPTION_NO_MODIFICATION: &str = "nm";

/// Lookup operations understood on the lookup path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupOp {
    Get,
    Index,
    /// Verbose index; answered exactly like `Index`
    Vindex,
}

impl LookupOp {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "get" => Some(LookupOp::Get),
            "index" => Some(LookupOp::Index),
            "vindex" => Some(LookupOp::Vindex),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LookupOp::Get => "get",
            LookupOp::Index => "index",
            LookupOp::Vindex => "vindex",
        }
    }
}

impl std::fmt::Display for LookupOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol flags carried in the `options` parameter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupOptions {
    pub no_modification: bool,
}

impl LookupOptions {
    /// Parse a comma-separated option list. Unknown tokens are ignored.
    pub fn parse(s: &str) -> Self {
        let mut options = Self::default();
        for token in s.split(',') {
            if token == OPTION_NO_MODIFICATION {
                options.no_modification = true;
            }
        }
        options
    }

    /// Comma-joined token list as sent by the client, `mr` first
    pub fn format(&self) -> String {
        let mut tokens = vec![OPTION_MACHINE_READABLE];
        if self.no_modification {
            tokens.push(OPTION_NO_MODIFICATION);
        }
        tokens.join(",")
    }
}

/// A lookup against the keyserver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRequest {
    /// User ID, email or `0x` key ID; not validated
    pub search: String,
    pub options: LookupOptions,
    pub exact: bool,
}

impl LookupRequest {
    pub fn new(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..Default::default()
        }
    }

    pub fn exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    pub fn no_modification(mut self, nm: bool) -> Self {
        self.options.no_modification = nm;
        self
    }

    /// Key-ID interpretation of the search term, if it is one
    pub fn key_id(&self) -> Option<crate::KeyIdSearch> {
        crate::KeyIdSearch::parse(&self.search)
    }
}
