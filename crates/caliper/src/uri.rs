use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum UriError {
    #[error("invalid uri {0:?}: missing or malformed scheme")]
    Scheme(String),

    #[error("invalid uri {uri:?}: {source}")]
    Parse {
        uri: String,
        #[source]
        source: url::ParseError,
    },
}

/// A `$ref`/`$id` value split into its resolution parts.
#[derive(Debug, Clone)]
pub(crate) struct Reference {
    /// Absolute form when one exists: the text was already absolute, or a
    /// base was available to resolve against. Keeps the fragment.
    pub uri: Option<Url>,
    /// Fragment-less form, the remote-document cache key. Relative or empty
    /// when no absolute form exists.
    pub locator: String,
    /// Percent-decoded fragment.
    pub fragment: String,
    /// The resolved reference as text, the ref-cache key.
    pub full: String,
}

/// Parses a reference, resolving it against `base` when one is given.
pub(crate) fn parse_reference(base: Option<&Url>, text: &str) -> Result<Reference, UriError> {
    check_scheme(text)?;
    let uri = match base {
        Some(base) => Some(base.join(text).map_err(|source| UriError::Parse {
            uri: text.to_owned(),
            source,
        })?),
        None if has_scheme(text) => Some(Url::parse(text).map_err(|source| UriError::Parse {
            uri: text.to_owned(),
            source,
        })?),
        None => None,
    };
    Ok(match uri {
        Some(uri) => Reference {
            locator: strip_fragment(&uri).to_string(),
            fragment: percent_decode(uri.fragment().unwrap_or("")),
            full: uri.to_string(),
            uri: Some(uri),
        },
        None => {
            let (locator, fragment) = match text.split_once('#') {
                Some((locator, fragment)) => (locator, fragment),
                None => (text, ""),
            };
            Reference {
                uri: None,
                locator: locator.to_owned(),
                fragment: percent_decode(fragment),
                full: text.to_owned(),
            }
        }
    })
}

/// Rejects references whose first path segment smuggles a `:` without a
/// valid scheme in front of it (the RFC 3986 relative-reference rule, which
/// also covers a bare `:`). The WHATWG parser underneath [`Url`] would
/// otherwise accept these as path text.
fn check_scheme(text: &str) -> Result<(), UriError> {
    if let Some(end) = scheme_end(text) {
        if !valid_scheme(&text[..end]) {
            return Err(UriError::Scheme(text.to_owned()));
        }
    }
    Ok(())
}

fn scheme_end(text: &str) -> Option<usize> {
    for (at, byte) in text.bytes().enumerate() {
        match byte {
            b':' => return Some(at),
            b'/' | b'?' | b'#' => return None,
            _ => {}
        }
    }
    None
}

fn valid_scheme(scheme: &str) -> bool {
    let mut bytes = scheme.bytes();
    match bytes.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
}

fn has_scheme(text: &str) -> bool {
    scheme_end(text).is_some()
}

/// The locator of a URI: everything but the fragment.
pub(crate) fn strip_fragment(uri: &Url) -> Url {
    let mut locator = uri.clone();
    locator.set_fragment(None);
    locator
}

pub(crate) fn percent_decode(text: &str) -> String {
    percent_decode_str(text).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://example.com/root.json").unwrap()
    }

    #[test]
    fn bare_colon_is_invalid() {
        assert!(matches!(
            parse_reference(None, ":"),
            Err(UriError::Scheme(_))
        ));
        // Still invalid with a base, unlike plain WHATWG joining.
        assert!(matches!(
            parse_reference(Some(&base()), ":"),
            Err(UriError::Scheme(_))
        ));
        assert!(matches!(
            parse_reference(None, "1njk:"),
            Err(UriError::Scheme(_))
        ));
    }

    #[test]
    fn colon_in_later_segments_is_fine() {
        let r = parse_reference(Some(&base()), "a/b:c").unwrap();
        assert_eq!(r.locator, "http://example.com/a/b:c");
    }

    #[test]
    fn fragment_only_reference() {
        let r = parse_reference(Some(&base()), "#/definitions/a").unwrap();
        assert_eq!(r.locator, "http://example.com/root.json");
        assert_eq!(r.fragment, "/definitions/a");
        assert_eq!(r.full, "http://example.com/root.json#/definitions/a");

        let r = parse_reference(None, "#/definitions/a").unwrap();
        assert!(r.uri.is_none());
        assert_eq!(r.locator, "");
        assert_eq!(r.fragment, "/definitions/a");
    }

    #[test]
    fn relative_reference_resolves_against_base() {
        let base = Url::parse("http://h/baseUriChange/").unwrap();
        let r = parse_reference(Some(&base), "folderInteger.json").unwrap();
        assert_eq!(r.locator, "http://h/baseUriChange/folderInteger.json");
        assert_eq!(r.fragment, "");
    }

    #[test]
    fn relative_reference_without_base_stays_relative() {
        let r = parse_reference(None, "folderInteger.json#/a").unwrap();
        assert!(r.uri.is_none());
        assert_eq!(r.locator, "folderInteger.json");
        assert_eq!(r.fragment, "/a");
    }

    #[test]
    fn fragments_are_percent_decoded() {
        let r = parse_reference(Some(&base()), "#/a%20b").unwrap();
        assert_eq!(r.fragment, "/a b");
    }

    #[test]
    fn strip_fragment_drops_only_the_fragment() {
        let uri = Url::parse("http://h/a.json?q=1#/b").unwrap();
        assert_eq!(strip_fragment(&uri).as_str(), "http://h/a.json?q=1");
    }
}
