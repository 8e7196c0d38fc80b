use anyhow::{anyhow, Context};

use crate::url::RemoteUrl;

/// Remote used when neither the command line nor the config picks one.
pub const DEFAULT_REMOTE: &str = "origin";

/// Config key naming the remote to review against.
pub const REMOTE_KEY: &str = "verdict.remote";

/// Config key with the ssh port to use when the remote url has none.
pub const PORT_KEY: &str = "verdict.port";

/// Read access to git config: remotes and the `verdict.*` keys.
pub struct ConfigStore {
    config: git2::Config,
}

impl ConfigStore {
    /// Open a single config file, e.g. `.git/config`
    pub fn open(path: &std::path::Path) -> anyhow::Result<ConfigStore> {
        let config = git2::Config::open(path)
            .with_context(|| format!("Failed to open git config {}", path.display()))?;

        Ok(ConfigStore { config })
    }

    /// The layered (system, global, repository) config of `repo`
    pub fn from_repo(repo: &git2::Repository) -> anyhow::Result<ConfigStore> {
        let config = repo.config().context("Failed to get git config")?;

        Ok(ConfigStore { config })
    }

    fn get_string(&self, key: &str) -> anyhow::Result<Option<String>> {
        match self.config.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read '{}' from git config", key)),
        }
    }

    pub fn preferred_remote(&self) -> anyhow::Result<Option<String>> {
        self.get_string(REMOTE_KEY)
    }

    pub fn default_port(&self) -> anyhow::Result<Option<String>> {
        self.get_string(PORT_KEY)
    }

    /// Pick the remote to use: `explicit` first, then `verdict.remote`,
    /// then `origin`.
    pub fn select_remote(&self, explicit: Option<&str>) -> anyhow::Result<String> {
        if let Some(explicit) = explicit {
            return Ok(explicit.to_owned());
        }

        Ok(self
            .preferred_remote()?
            .unwrap_or_else(|| DEFAULT_REMOTE.to_owned()))
    }

    /// Names of all remotes that have a url, in config order
    pub fn remote_names(&self) -> anyhow::Result<Vec<String>> {
        let mut names: Vec<String> = vec![];
        let mut entries = self
            .config
            .entries(Some(r"remote\..*\.url"))
            .context("Failed to read remotes from git config")?;

        while let Some(entry) = entries.next() {
            let entry = entry.context("Failed to read git config entry")?;
            let name = entry
                .name()
                .and_then(|n| n.strip_prefix("remote."))
                .and_then(|n| n.strip_suffix(".url"));

            if let Some(name) = name {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_owned());
                }
            }
        }

        Ok(names)
    }

    pub fn remote_url(&self, remote_name: &str) -> anyhow::Result<String> {
        if let Some(url) = self.get_string(&format!("remote.{}.url", remote_name))? {
            return Ok(url);
        }

        let known = self.remote_names().unwrap_or_default();
        let known = if known.is_empty() {
            "none".to_owned()
        } else {
            known.join(", ")
        };

        Err(anyhow!(
            "Remote '{}' not found in git config (remote.{}.url), known remotes: {}",
            remote_name,
            remote_name,
            known
        ))
    }

    /// Look up and parse the url of `remote_name`.
    ///
    /// A url that cannot be parsed keeps its [`crate::url::ParseError`] as
    /// the error source.
    pub fn remote(&self, remote_name: &str) -> anyhow::Result<RemoteUrl> {
        let url = self.remote_url(remote_name)?;
        let remote = crate::url::parse(&url)
            .with_context(|| format!("Failed to parse url of remote '{}'", remote_name))?;

        log::debug!("remote '{}': {:?}", remote_name, remote);

        Ok(remote)
    }
}
