use std::path::PathBuf;

use super::CoverError;

/// Where a cover's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverSource {
    Http(String),
    File(PathBuf),
}

impl CoverSource {
    /// Classify a cover URL. Strings without a scheme are local paths.
    pub fn parse(url: &str) -> Result<Self, CoverError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(CoverError::Empty);
        }

        if let Some((scheme, rest)) = url.split_once("://") {
            return match scheme.to_ascii_lowercase().as_str() {
                "http" | "https" => Ok(Self::Http(url.to_string())),
                "file" => file_url_path(rest).map(Self::File),
                other => Err(CoverError::UnsupportedScheme(other.to_string())),
            };
        }

        Ok(Self::File(PathBuf::from(url)))
    }
}

// Only local file URLs: an empty host or `localhost`, followed by an absolute path.
fn file_url_path(rest: &str) -> Result<PathBuf, CoverError> {
    let path = rest.strip_prefix("localhost").unwrap_or(rest);
    if !path.starts_with('/') {
        return Err(CoverError::UnsupportedScheme("file (remote host)".to_string()));
    }
    Ok(PathBuf::from(percent_decode(path)))
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(value) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(value);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_urls() {
        assert_eq!(
            CoverSource::parse("https://x/jazz.png").unwrap(),
            CoverSource::Http("https://x/jazz.png".into())
        );
        assert_eq!(
            CoverSource::parse("  HTTP://x/rock.png ").unwrap(),
            CoverSource::Http("HTTP://x/rock.png".into())
        );
    }

    #[test]
    fn test_file_urls_and_paths() {
        assert_eq!(
            CoverSource::parse("file:///srv/covers/soul.png").unwrap(),
            CoverSource::File("/srv/covers/soul.png".into())
        );
        assert_eq!(
            CoverSource::parse("file://localhost/srv/covers/my%20cover.png").unwrap(),
            CoverSource::File("/srv/covers/my cover.png".into())
        );
        assert_eq!(
            CoverSource::parse("covers/afro.png").unwrap(),
            CoverSource::File("covers/afro.png".into())
        );
    }

    #[test]
    fn test_empty_and_unsupported() {
        assert!(matches!(CoverSource::parse(""), Err(CoverError::Empty)));
        assert!(matches!(CoverSource::parse("   "), Err(CoverError::Empty)));
        assert!(matches!(
            CoverSource::parse("gs://bucket/cover.png"),
            Err(CoverError::UnsupportedScheme(s)) if s == "gs"
        ));
    }

    #[test]
    fn test_remote_file_hosts_are_rejected() {
        assert!(matches!(
            CoverSource::parse("file://fileserver/covers/jazz.png"),
            Err(CoverError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            CoverSource::parse("file://covers/jazz.png"),
            Err(CoverError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_percent_decode_leaves_bad_escapes() {
        assert_eq!(percent_decode("a%2Fb"), "a/b");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
    }
}
