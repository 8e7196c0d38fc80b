use std::fmt;
use std::str::FromStr;

use regex::Regex;

/// Scheme reported when the url does not name one.
pub const DEFAULT_SCHEME: &str = "ssh";

/// Connection details extracted from the `url` of a git remote.
///
/// Optional fields distinguish "not present in the url" (`None`) from
/// "present but empty" (`Some("")`).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RemoteUrl {
    pub scheme: String,
    pub schemes: Vec<String>,
    pub username: Option<String>,
    pub hostname: Option<String>,
    pub port: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub url: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported remote url: {}", self.url)
    }
}

impl std::error::Error for ParseError {}

struct Pattern {
    name: &'static str,
    regex: Regex,
}

impl Pattern {
    fn new(name: &'static str, re: &str) -> Pattern {
        Pattern {
            name,
            regex: Regex::new(re).expect("can't compile regex"),
        }
    }

    fn captures(&self, url: &str, schemes: &[String]) -> Option<RemoteUrl> {
        let caps = self.regex.captures(url)?;
        let group = |name: &str| caps.name(name).map(|m| m.as_str().to_owned());

        Some(RemoteUrl {
            scheme: group("scheme").unwrap_or_else(|| DEFAULT_SCHEME.to_owned()),
            schemes: schemes.to_vec(),
            username: group("username").filter(|u| !u.is_empty()),
            hostname: group("hostname").filter(|h| !h.is_empty()),
            port: group("port"),
            path: group("path"),
        })
    }
}

lazy_static! {
    // Tried in order, the first match wins.
    static ref PATTERNS: [Pattern; 5] = [
        Pattern::new(
            "ssh-url",
            r"^(?:git\+ssh|ssh\+git|ssh)://(?:(?P<username>[^@/:\s]*)@)?(?P<hostname>[^@/:\s]+)(?::(?P<port>\d*))?(?P<path>/\S*)?$",
        ),
        Pattern::new(
            "scheme-url",
            r"^(?P<scheme>ssh|git|https?|ftps?|rsync|file)://(?:(?P<username>[^@/:\s]*)@)?(?P<hostname>[^@/:\s]*)(?::(?P<port>\d+))?(?P<path>/\S*)$",
        ),
        Pattern::new(
            "any-scheme-url",
            r"^(?P<scheme>[A-Za-z][A-Za-z0-9.-]*)://(?:(?P<username>[^@/:\s]*)@)?(?P<hostname>[^@/:\s]*)(?::(?P<port>\d*))?(?P<path>/\S*)$",
        ),
        Pattern::new(
            "scp-absolute",
            r"^(?:(?P<username>[^@/:\s]*)@)?(?P<hostname>[^@/:\s]+):(?P<path>/\S*)$",
        ),
        Pattern::new(
            "scp-relative",
            r"^(?:(?P<username>[^@/:\s]*)@)?(?P<hostname>[^@/:\s]+)(?::(?P<port>\d+))?[:/](?P<path>\S+)$",
        ),
    ];
}

/// Split the part before the first `://` on `+`.
///
/// `git+ssh://host/p` yields `["git", "ssh"]`, a url without `://` yields
/// nothing.
pub fn schemes(url: &str) -> Vec<String> {
    match url.split_once("://") {
        Some((prefix, _)) => prefix.split('+').map(str::to_owned).collect(),
        None => vec![],
    }
}

/// Parse a git remote url into its connection details.
///
/// Accepts `ssh://` urls (optionally `git+ssh://`), urls with one of the
/// common transport schemes, and the scp-like `[user@]host:path` forms.
pub fn parse(url: &str) -> Result<RemoteUrl, ParseError> {
    let schemes = schemes(url);

    for pattern in PATTERNS.iter() {
        if let Some(remote) = pattern.captures(url, &schemes) {
            log::debug!("remote url {:?} matched {}", url, pattern.name);
            return Ok(remote);
        }
    }

    Err(ParseError {
        url: url.to_owned(),
    })
}

impl FromStr for RemoteUrl {
    type Err = ParseError;

    fn from_str(url: &str) -> Result<RemoteUrl, ParseError> {
        parse(url)
    }
}

impl RemoteUrl {
    /// Gerrit project name derived from the path.
    pub fn project(&self) -> Option<String> {
        let path = self.path.as_deref()?.trim_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        let path = match self.scheme.as_str() {
            // authenticated REST endpoint
            "http" | "https" => path.strip_prefix("a/").unwrap_or(path),
            _ => path,
        };
        let path = path.trim_end_matches('/');

        if path.is_empty() {
            None
        } else {
            Some(path.to_owned())
        }
    }

    /// `user@host`, or just `host` when the url names no user.
    pub fn ssh_destination(&self) -> Option<String> {
        let hostname = self.hostname.as_deref()?;

        Some(match &self.username {
            Some(username) => format!("{}@{}", username, hostname),
            None => hostname.to_owned(),
        })
    }
}
