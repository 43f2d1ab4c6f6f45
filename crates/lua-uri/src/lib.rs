//! Document URI helpers for the Lua analysis ecosystem.
//!
//! The analyzer treats document URIs as opaque identifiers; the helpers here
//! cover the two things it actually needs from them:
//!
//! - A normalized lookup key (`uri_key`), so per-document bookkeeping survives
//!   case differences in Windows drive letters
//! - The default module name, derived from the trailing path component
//!   (`module_name`)
//!
//! # Examples
//!
//! ```
//! use lua_uri::{module_name, uri_key};
//!
//! assert_eq!(module_name("file:///src/socket-core.lua").as_deref(), Some("socket-core"));
//! assert_eq!(uri_key("file:///C:/src/init.lua"), "file:///c:/src/init.lua");
//! ```

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Derive a module name from the trailing path component of a document URI.
///
/// The name is the longest trailing run of word characters (with interior
/// dashes) before an optional `.lua` extension. Query strings and fragments
/// are ignored. Returns `None` when the trailing component has no usable
/// name, e.g. an empty path or one ending in punctuation.
///
/// # Examples
///
/// ```
/// use lua_uri::module_name;
///
/// assert_eq!(module_name("file:///a/b/socket.lua").as_deref(), Some("socket"));
/// assert_eq!(module_name("file:///a/b/my-mod.lua").as_deref(), Some("my-mod"));
/// assert_eq!(module_name("untitled:Untitled-1").as_deref(), Some("Untitled-1"));
/// assert_eq!(module_name("file:///a/b/"), None);
/// ```
pub fn module_name(uri: &str) -> Option<String> {
    static NAME_RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    let re = NAME_RE
        .get_or_init(|| Regex::new(r"(\w+(?:-\w+)*)(?:\.lua)?$"))
        .as_ref()
        .ok()?;

    let tail = uri.rsplit('/').next()?;
    let tail = tail.split(['?', '#']).next()?;
    re.captures(tail).map(|c| c[1].to_string())
}

/// Normalize a URI to a consistent key for lookups.
///
/// Handles platform-specific differences so per-document maps stay consistent
/// across systems, particularly Windows drive-letter case:
/// `file:///C:/foo` and `file:///c:/foo` map to the same key. URIs that do
/// not parse are returned as-is.
///
/// # Examples
///
/// ```
/// use lua_uri::uri_key;
///
/// assert_eq!(uri_key("file:///tmp/test.lua"), "file:///tmp/test.lua");
/// assert_eq!(uri_key("file:///C:/Users/test.lua"), "file:///c:/Users/test.lua");
/// assert_eq!(uri_key("not-a-uri"), "not-a-uri");
/// ```
pub fn uri_key(uri: &str) -> String {
    if let Ok(u) = Url::parse(uri) {
        let s = u.as_str().to_string();
        if let Some(rest) = s.strip_prefix("file:///") {
            // Windows drive letter pattern: single letter followed by colon
            if rest.len() > 1
                && rest.as_bytes()[1] == b':'
                && rest.as_bytes()[0].is_ascii_alphabetic()
            {
                return format!("file:///{}{}", rest[0..1].to_ascii_lowercase(), &rest[1..]);
            }
        }
        s
    } else {
        uri.to_string()
    }
}

/// Check if a URI uses the `file://` scheme.
///
/// # Examples
///
/// ```
/// use lua_uri::is_file_uri;
///
/// assert!(is_file_uri("file:///tmp/test.lua"));
/// assert!(!is_file_uri("untitled:Untitled-1"));
/// ```
pub fn is_file_uri(uri: &str) -> bool {
    uri.starts_with("file://")
}

/// Extract the file extension from a URI.
///
/// # Examples
///
/// ```
/// use lua_uri::uri_extension;
///
/// assert_eq!(uri_extension("file:///tmp/test.lua"), Some("lua"));
/// assert_eq!(uri_extension("file:///tmp/no-extension"), None);
/// ```
pub fn uri_extension(uri: &str) -> Option<&str> {
    let path_part = uri.rsplit('/').next()?;
    let path_part = path_part.split('?').next()?;
    let path_part = path_part.split('#').next()?;
    let dot_pos = path_part.rfind('.')?;
    let ext = &path_part[dot_pos + 1..];
    if ext.is_empty() { None } else { Some(ext) }
}
