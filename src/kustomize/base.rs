//! Remote base references.
//!
//! Remote bases follow the go-getter URL convention:
//!
//! ```text
//! [git::][<scheme>://][<auth>@]<host>[:/]<owner>/<repo>[//<subdir>]?ref=<version>
//! ```
//!
//! The reference is decomposed field by field with anchored string
//! operations. Each candidate split is a fixed number of forward or backward
//! scans; only inputs with several `?ref=` markers need more than one.

use tracing::debug;

use crate::model::Dependency;
use crate::traits::ExtractError;

const GETTER_PREFIX: &str = "git::";
const REF_MARKER: &str = "?ref=";
const SCHEMES: [&str; 3] = ["http://", "https://", "ssh://"];
const GITHUB_HOST: &str = "github.com";

/// Fields of a remote base URL. All slices borrow from the original string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteBase<'a> {
    /// Scheme, auth, and path; everything git needs to clone
    pub url: &'a str,
    /// Host and project, without scheme or auth
    pub path: &'a str,
    /// `<owner>/<repo>`
    pub project: &'a str,
    /// Directory inside the repository, empty when absent
    pub subdir: &'a str,
    /// Value of `?ref=`
    pub reference: &'a str,
}

impl<'a> RemoteBase<'a> {
    pub fn parse(base: &'a str) -> Result<Self, ExtractError> {
        let rest = base.strip_prefix(GETTER_PREFIX).unwrap_or(base);

        // The version is taken from the last marker whose locator still
        // decomposes, so a `?ref=` inside the repository name is kept there.
        for (idx, _) in rest.rmatch_indices(REF_MARKER) {
            let reference = &rest[idx + REF_MARKER.len()..];
            if reference.is_empty() || reference.contains(['\n', '\r']) {
                continue;
            }
            if let Some((url, path, project, subdir)) = split_locator(&rest[..idx]) {
                return Ok(Self {
                    url,
                    path,
                    project,
                    subdir,
                    reference,
                });
            }
        }

        Err(ExtractError::reference(
            base,
            "expected [git::][scheme://]host/owner/repo[//subdir]?ref=version",
        ))
    }

    pub fn is_github(&self) -> bool {
        self.path.starts_with(GITHUB_HOST)
    }

    pub fn to_dependency(&self) -> Dependency {
        if self.is_github() {
            return Dependency::github_tags(strip_git_suffix(self.project), self.reference);
        }

        Dependency::git_tags(
            strip_git_suffix(self.path),
            strip_git_suffix(self.project),
            self.url,
            self.reference,
        )
    }
}

/// Turns one `bases`/`resources` entry into a dependency.
///
/// Local paths and plain URLs without a pinned `ref` are not remote bases
/// and yield `None`.
pub fn extract_base(base: &str) -> Option<Dependency> {
    match RemoteBase::parse(base) {
        Ok(remote) => Some(remote.to_dependency()),
        Err(e) => {
            debug!(error = %e, "Skipping base");
            None
        }
    }
}

fn strip_git_suffix(s: &str) -> &str {
    s.strip_suffix(".git").unwrap_or(s)
}

/// Splits the part before `?ref=` into (url, path, project, subdir).
fn split_locator(locator: &str) -> Option<(&str, &str, &str, &str)> {
    let after_scheme = SCHEMES
        .iter()
        .find_map(|scheme| locator.strip_prefix(scheme))
        .unwrap_or(locator);
    let scheme_len = locator.len() - after_scheme.len();

    // Auth ends at the last '@' before the first '/'
    let host_end = after_scheme.find('/').unwrap_or(after_scheme.len());
    let auth_len = after_scheme[..host_end]
        .rfind('@')
        .map_or(0, |at| at + 1);

    let candidates = if auth_len > 0 {
        [Some(scheme_len + auth_len), Some(scheme_len)]
    } else {
        [Some(scheme_len), None]
    };

    candidates.into_iter().flatten().find_map(|start| {
        let (path, project, subdir) = split_path(&locator[start..])?;
        Some((&locator[..start + path.len()], path, project, subdir))
    })
}

/// Splits `[host(:|/)]owner/repo[subdir]` into (path, project, subdir).
fn split_path(s: &str) -> Option<(&str, &str, &str)> {
    if let Some(sep) = s.find([':', '/']).filter(|&sep| sep > 0) {
        if let Some((project, subdir)) = split_project(&s[sep + 1..]) {
            return Some((&s[..sep + 1 + project.len()], project, subdir));
        }
    }

    let (project, subdir) = split_project(s)?;
    Some((project, project, subdir))
}

/// Splits `owner/repo[subdir]` into (project, subdir).
fn split_project(s: &str) -> Option<(&str, &str)> {
    let owner_end = s.find('/').filter(|&i| i > 0)?;
    let repo_start = owner_end + 1;
    let repo_end = s[repo_start..]
        .find('/')
        .map_or(s.len(), |i| repo_start + i);
    if repo_end == repo_start {
        return None;
    }

    let (project, subdir) = s.split_at(repo_end);
    if subdir.contains('?') {
        return None;
    }
    Some((project, subdir))
}
