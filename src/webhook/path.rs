//! Storage path classification.
//!
//! Swift paths look like `/version/account/container[/object]`. The first
//! three segments are required; everything after the container belongs to the
//! object name, slashes included.

use percent_encoding::percent_decode_str;

/// A parsed `/version/account/container[/object]` path.
///
/// Segments are kept as they appeared on the wire (percent-encoded); use the
/// `*_name` accessors for decoded names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath {
    pub version: String,
    pub account: String,
    pub container: String,
    pub object: Option<String>,
}

impl StoragePath {
    /// Parse a request path. Returns `None` for anything that is not at
    /// least a container path; callers treat that as a non-object request.
    pub fn parse(path: &str) -> Option<Self> {
        let rest = path.strip_prefix('/')?;
        let mut segments = rest.splitn(4, '/');

        let version = segments.next().filter(|s| !s.is_empty())?;
        let account = segments.next().filter(|s| !s.is_empty())?;
        let container = segments.next().filter(|s| !s.is_empty())?;
        let object = segments.next().filter(|s| !s.is_empty());

        Some(Self {
            version: version.to_string(),
            account: account.to_string(),
            container: container.to_string(),
            object: object.map(str::to_string),
        })
    }

    /// True when the path names an object inside a container.
    pub fn is_object(&self) -> bool {
        self.object.is_some()
    }

    /// `/version/account`, the root of the account's namespace.
    pub fn account_root(&self) -> String {
        format!("/{}/{}", self.version, self.account)
    }

    /// `/version/account/container`.
    pub fn container_path(&self) -> String {
        format!("/{}/{}/{}", self.version, self.account, self.container)
    }

    pub fn container_name(&self) -> String {
        decode(&self.container)
    }

    pub fn object_name(&self) -> Option<String> {
        self.object.as_deref().map(decode)
    }
}

fn decode(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}
