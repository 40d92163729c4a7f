//! Git metadata for remote links
//!
//! Records link back to the hosted source when the project lives in a git
//! checkout with a known remote. The repository is opened with libgit2, so
//! linked worktrees and submodules (whose `.git` is a file) resolve like any
//! other checkout. Missing pieces degrade to `None` with a warning.

use git2::Repository;
use std::path::{Component, Path, PathBuf};
use tracing::warn;
use url::Url;

/// Hosts with a known blob URL layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GitHost {
    GitHub,
    GitLab,
}

impl GitHost {
    fn from_domain(domain: &str) -> Option<GitHost> {
        match domain.to_ascii_lowercase().as_str() {
            "github.com" | "www.github.com" => Some(GitHost::GitHub),
            "gitlab.com" | "www.gitlab.com" => Some(GitHost::GitLab),
            _ => None,
        }
    }

    fn blob_url(&self, owner: &str, repo: &str, rev: &str, path: &str, lineno: usize) -> String {
        match self {
            GitHost::GitHub => {
                format!("https://github.com/{owner}/{repo}/blob/{rev}/{path}#L{lineno}")
            }
            GitHost::GitLab => {
                format!("https://gitlab.com/{owner}/{repo}/-/blob/{rev}/{path}#L{lineno}")
            }
        }
    }
}

/// A parsed remote URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRemote {
    pub domain: String,
    /// Owner or group path (`group/subgroup` on GitLab)
    pub owner: String,
    pub repo: String,
}

impl GitRemote {
    /// Parse URL-style (`https://host/owner/repo`, `ssh://git@host:22/owner/repo.git`)
    /// and scp-like (`git@host:owner/repo.git`) remotes.
    pub fn parse(remote: &str) -> Option<GitRemote> {
        let remote = remote.trim();
        let url = match Url::parse(remote) {
            Ok(url) if url.has_host() => url,
            // `host:path` parses as a URL with scheme `host`, so it lands here too
            _ => Url::parse(&scp_to_ssh(remote)?).ok()?,
        };

        let domain = url.host_str()?.to_string();
        let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
        let (repo, owner) = segments.split_last()?;
        let repo = repo.strip_suffix(".git").unwrap_or(repo);
        if domain.is_empty() || owner.is_empty() || repo.is_empty() {
            return None;
        }

        Some(GitRemote {
            domain,
            owner: owner.join("/"),
            repo: repo.to_string(),
        })
    }

    pub fn host(&self) -> Option<GitHost> {
        GitHost::from_domain(&self.domain)
    }
}

/// `user@host:path` as `ssh://user@host/path`
fn scp_to_ssh(remote: &str) -> Option<String> {
    let (authority, path) = remote.split_once(':')?;
    if authority.is_empty() || authority.contains('/') || path.starts_with("//") {
        return None;
    }
    Some(format!("ssh://{}/{}", authority, path.trim_start_matches('/')))
}

/// URL of the `origin` remote
fn origin_url(repo: &Repository) -> Option<String> {
    let remote = match repo.find_remote("origin") {
        Ok(remote) => remote,
        Err(e) => {
            warn!("remote-url is not found: {}", e.message());
            return None;
        }
    };
    let url = remote.url().map(str::to_string);
    if url.is_none() {
        warn!("remote-url of origin is not valid UTF-8");
    }
    url
}

/// Commit `HEAD` points at, whether on a branch or detached
fn head_rev(repo: &Repository) -> Option<String> {
    let commit = repo.head().and_then(|head| head.peel_to_commit());
    match commit {
        Ok(commit) => Some(commit.id().to_string()),
        Err(e) => {
            warn!("current rev is not found: {}", e.message());
            None
        }
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Hosted link to `lineno` (1-based) of `filepath`.
///
/// `filepath` is made relative to `project_path` and percent-encoded per
/// segment. Unparseable remotes and unsupported hosts yield the remote URL
/// unchanged.
pub fn form_https_url(
    git_url: &str,
    rev: &str,
    project_path: &Path,
    filepath: &Path,
    lineno: usize,
) -> String {
    let Some(remote) = GitRemote::parse(git_url) else {
        warn!("Unable to parse git remote url: {}", git_url);
        return git_url.to_string();
    };
    let Some(host) = remote.host() else {
        warn!("Unsupported Git host: {}", remote.domain);
        return git_url.to_string();
    };

    let relative = filepath.strip_prefix(project_path).unwrap_or(filepath);
    let path = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(segment) => Some(urlencoding::encode(&segment.to_string_lossy()).into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");

    host.blob_url(&remote.owner, &remote.repo, rev, &path, lineno)
}

/// Git metadata resolved once per analysis run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GitInfo {
    pub root: Option<PathBuf>,
    pub remote_url: Option<String>,
    pub rev: Option<String>,
}

impl GitInfo {
    /// Open the repository at `explicit_root` when given, otherwise discover
    /// it upwards from `src_dir`.
    ///
    /// An explicit root that is not a repository still serves as the base for
    /// relative paths; remote and revision are then `None`.
    pub fn resolve(explicit_root: Option<&Path>, src_dir: &Path) -> Self {
        let opened = match explicit_root {
            Some(root) => Repository::open(root),
            None => Repository::discover(src_dir),
        };
        let repo = match opened {
            Ok(repo) => repo,
            Err(e) => {
                warn!(
                    "git root is not found for {}: {}",
                    explicit_root.unwrap_or(src_dir).display(),
                    e.message()
                );
                return Self {
                    root: explicit_root.map(canonical),
                    ..Self::default()
                };
            }
        };

        // Bare repositories have no checkout to link into
        let root = repo.workdir().or(explicit_root).map(canonical);
        Self {
            remote_url: origin_url(&repo),
            rev: head_rev(&repo),
            root,
        }
    }

    /// Remote link for a record: a full blob URL with remote and revision,
    /// the bare remote URL without a revision, otherwise `None`.
    pub fn link(&self, project_path: &Path, filepath: &Path, lineno: usize) -> Option<String> {
        let remote = self.remote_url.as_deref()?;
        match &self.rev {
            Some(rev) => Some(form_https_url(remote, rev, project_path, filepath, lineno)),
            None => Some(remote.to_string()),
        }
    }
}
