use anyhow::{anyhow, Context};
use regex::Regex;

use crate::url::RemoteUrl;

lazy_static! {
    static ref CHANGE_REF: Regex = Regex::new(r"^\d+,\d+$").expect("can't compile regex");
}

/// Change actions; Gerrit accepts at most one per review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Submit,
    Abandon,
    Rebase,
}

impl Action {
    pub fn flag(self) -> &'static str {
        match self {
            Action::Submit => "--submit",
            Action::Abandon => "--abandon",
            Action::Rebase => "--rebase",
        }
    }
}

/// Overrides for where the review gets sent.
#[derive(Debug, Clone, Default)]
pub struct Target {
    pub username: Option<String>,
    pub port: Option<String>,
    /// Used only when the remote url carries no port
    pub default_port: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Review {
    pub verified: Option<i8>,
    pub code_review: Option<i8>,
    pub message: Option<String>,
    pub action: Option<Action>,
    pub project: Option<String>,
    pub revision: String,
}

impl Review {
    pub fn new(revision: impl Into<String>) -> Review {
        Review {
            revision: revision.into(),
            ..Default::default()
        }
    }

    /// Nothing to send: no score, no message and no action
    pub fn is_empty(&self) -> bool {
        self.verified.is_none()
            && self.code_review.is_none()
            && self.message.is_none()
            && self.action.is_none()
    }

    /// Build the `ssh ... gerrit review ...` command line.
    pub fn command(&self, remote: &RemoteUrl, target: &Target) -> anyhow::Result<Vec<String>> {
        let destination = RemoteUrl {
            username: target.username.clone().or_else(|| remote.username.clone()),
            ..remote.clone()
        }
        .ssh_destination()
        .ok_or_else(|| anyhow!("Remote url has no hostname to connect to"))?;

        let port = target
            .port
            .as_deref()
            .or(remote.port.as_deref().filter(|p| !p.is_empty()))
            .or(target.default_port.as_deref());

        let mut args = vec!["ssh".to_owned()];

        if let Some(port) = port {
            args.push("-p".to_owned());
            args.push(port.to_owned());
        }

        args.push(destination);
        args.push("gerrit".to_owned());
        args.push("review".to_owned());

        if let Some(project) = self.project.clone().or_else(|| remote.project()) {
            args.push("--project".to_owned());
            args.push(project);
        }
        if let Some(verified) = self.verified {
            args.push("--verified".to_owned());
            args.push(verified.to_string());
        }
        if let Some(code_review) = self.code_review {
            args.push("--code-review".to_owned());
            args.push(code_review.to_string());
        }
        if let Some(message) = &self.message {
            args.push("--message".to_owned());
            args.push(quote_message(message));
        }
        if let Some(action) = self.action {
            args.push(action.flag().to_owned());
        }

        args.push(self.revision.clone());

        Ok(args)
    }
}

/// Gerrit splits its command line again on the server, so the message has
/// to arrive as a single quoted word.
pub fn quote_message(message: &str) -> String {
    let escaped = message.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Resolve `rev` to a full commit id.
///
/// `<change>,<patchset>` references are Gerrit's own and are passed through.
pub fn resolve_revision(repo: &git2::Repository, rev: &str) -> anyhow::Result<String> {
    if CHANGE_REF.is_match(rev) {
        return Ok(rev.to_owned());
    }

    let commit = repo
        .revparse_single(rev)
        .with_context(|| format!("Failed to resolve revision '{}'", rev))?
        .peel_to_commit()
        .with_context(|| format!("Revision '{}' is not a commit", rev))?;

    Ok(commit.id().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::parse;

    #[test]
    fn test_command_from_ssh_url() {
        let remote = parse("ssh://alice@gerrit.example.com:29418/myproject").unwrap();
        let review = Review {
            verified: Some(1),
            code_review: Some(-2),
            ..Review::new("c0ffee")
        };

        let args = review.command(&remote, &Target::default()).unwrap();
        assert_eq!(
            args,
            vec![
                "ssh",
                "-p",
                "29418",
                "alice@gerrit.example.com",
                "gerrit",
                "review",
                "--project",
                "myproject",
                "--verified",
                "1",
                "--code-review",
                "-2",
                "c0ffee",
            ]
        );
    }

    #[test]
    fn test_command_from_scp_url() {
        let remote = parse("gerrit.example.com:tools/repo.git").unwrap();
        let review = Review {
            message: Some("looks good".to_owned()),
            action: Some(Action::Submit),
            ..Review::new("1234,5")
        };

        let args = review.command(&remote, &Target::default()).unwrap();
        assert_eq!(
            args,
            vec![
                "ssh",
                "gerrit.example.com",
                "gerrit",
                "review",
                "--project",
                "tools/repo",
                "--message",
                "\"looks good\"",
                "--submit",
                "1234,5",
            ]
        );
    }

    #[test]
    fn test_command_overrides() {
        let remote = parse("ssh://alice@gerrit.example.com:29418/myproject").unwrap();
        let review = Review {
            action: Some(Action::Abandon),
            project: Some("other".to_owned()),
            ..Review::new("HEAD")
        };
        let target = Target {
            username: Some("ci-bot".to_owned()),
            port: Some("2222".to_owned()),
            default_port: Some("29418".to_owned()),
        };

        let args = review.command(&remote, &target).unwrap();
        assert_eq!(&args[..4], ["ssh", "-p", "2222", "ci-bot@gerrit.example.com"]);
        assert!(args.windows(2).any(|w| w == ["--project", "other"]));
        assert!(args.contains(&"--abandon".to_owned()));
    }

    #[test]
    fn test_username_override_without_url_user() {
        let remote = parse("gerrit.example.com:29418/myproject").unwrap();
        let review = Review {
            verified: Some(1),
            ..Review::new("HEAD")
        };

        let args = review.command(&remote, &Target::default()).unwrap();
        assert_eq!(&args[..4], ["ssh", "-p", "29418", "gerrit.example.com"]);

        let target = Target {
            username: Some("ci-bot".to_owned()),
            ..Default::default()
        };
        let args = review.command(&remote, &target).unwrap();
        assert_eq!(args[3], "ci-bot@gerrit.example.com");
    }

    #[test]
    fn test_default_port_only_without_url_port() {
        let target = Target {
            default_port: Some("29418".to_owned()),
            ..Default::default()
        };
        let review = Review {
            action: Some(Action::Rebase),
            ..Review::new("HEAD")
        };

        let remote = parse("https://review.example.org/a/myproject").unwrap();
        let args = review.command(&remote, &target).unwrap();
        assert_eq!(&args[..4], ["ssh", "-p", "29418", "review.example.org"]);

        // an empty port in the url does not count as a port
        let remote = parse("ssh://gerrit.example.com:/myproject").unwrap();
        let args = review.command(&remote, &target).unwrap();
        assert_eq!(&args[..3], ["ssh", "-p", "29418"]);

        let remote = parse("ssh://gerrit.example.com:2200/myproject").unwrap();
        let args = review.command(&remote, &target).unwrap();
        assert_eq!(&args[..3], ["ssh", "-p", "2200"]);
    }

    #[test]
    fn test_command_needs_hostname() {
        let remote = parse("file:///srv/git/myproject.git").unwrap();
        let review = Review {
            verified: Some(1),
            ..Review::new("HEAD")
        };
        assert!(review.command(&remote, &Target::default()).is_err());
    }

    #[test]
    fn test_is_empty() {
        assert!(Review::new("HEAD").is_empty());
        let review = Review {
            message: Some(String::new()),
            ..Review::new("HEAD")
        };
        assert!(!review.is_empty());
    }

    #[test]
    fn test_quote_message() {
        assert_eq!(quote_message("LGTM"), "\"LGTM\"");
        assert_eq!(
            quote_message(r#"say "hi" \o/"#),
            r#""say \"hi\" \\o/""#
        );
    }
}
