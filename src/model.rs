use serde::{Deserialize, Serialize};

/// Where available versions of a dependency are looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Datasource {
    #[serde(rename = "docker")]
    Docker,
    #[serde(rename = "git-tags")]
    GitTags,
    #[serde(rename = "github-tags")]
    GithubTags,
}

impl Datasource {
    /// Wire identifier, e.g. `"git-tags"`.
    pub fn id(&self) -> &'static str {
        match self {
            Datasource::Docker => "docker",
            Datasource::GitTags => "git-tags",
            Datasource::GithubTags => "github-tags",
        }
    }
}

/// Ordering scheme used to compare versions of a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Versioning {
    #[serde(rename = "docker")]
    Docker,
}

impl Versioning {
    pub fn id(&self) -> &'static str {
        match self {
            Versioning::Docker => "docker",
        }
    }
}

/// How a container image is pinned.
///
/// The three variants are exclusive: a tag that itself looks like a digest
/// (`sha256:...`) is a [`ImagePin::Digest`], and an explicit digest keeps any
/// tag only for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePin {
    /// Ordinary tag, e.g. `1.19`
    Tag { tag: String },

    /// Digest only, either from `digest` or from a `sha256:` tag
    Digest { digest: String },

    /// Explicit digest plus the tag it was taken from
    DigestWithTag { digest: String, tag: String },
}

const DIGEST_TAG_PREFIX: &str = "sha256:";

impl ImagePin {
    /// Picks the pin from an image's `newTag` and `digest` overrides.
    ///
    /// Returns `None` when neither is present.
    pub fn classify(new_tag: Option<String>, digest: Option<String>) -> Option<Self> {
        match (digest, new_tag) {
            (Some(digest), Some(tag)) => Some(ImagePin::DigestWithTag { digest, tag }),
            (Some(digest), None) => Some(ImagePin::Digest { digest }),
            (None, Some(tag)) if tag.starts_with(DIGEST_TAG_PREFIX) => {
                Some(ImagePin::Digest { digest: tag })
            }
            (None, Some(tag)) => Some(ImagePin::Tag { tag }),
            (None, None) => None,
        }
    }

    pub fn current_value(&self) -> Option<&str> {
        match self {
            ImagePin::Tag { tag } | ImagePin::DigestWithTag { tag, .. } => Some(tag),
            ImagePin::Digest { .. } => None,
        }
    }

    pub fn current_digest(&self) -> Option<&str> {
        match self {
            ImagePin::Digest { digest } | ImagePin::DigestWithTag { digest, .. } => Some(digest),
            ImagePin::Tag { .. } => None,
        }
    }
}

/// A single external reference found in a manifest.
///
/// At least one of `current_value` / `current_digest` is always set by the
/// constructors below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub datasource: Datasource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versioning: Option<Versioning>,
    pub dep_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dep_name_short: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_digest: Option<String>,
    /// Snapshot of the source text used to locate the value when patching
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_string: Option<String>,
}

impl Dependency {
    /// Remote base hosted on GitHub, looked up through its tags API.
    pub fn github_tags(dep_name: impl Into<String>, current_value: impl Into<String>) -> Self {
        Self {
            datasource: Datasource::GithubTags,
            versioning: None,
            dep_name: dep_name.into(),
            dep_name_short: None,
            lookup_name: None,
            current_value: Some(current_value.into()),
            current_digest: None,
            replace_string: None,
        }
    }

    /// Remote base on any other git host, looked up with `git ls-remote` on
    /// `lookup_name`.
    pub fn git_tags(
        dep_name: impl Into<String>,
        dep_name_short: impl Into<String>,
        lookup_name: impl Into<String>,
        current_value: impl Into<String>,
    ) -> Self {
        Self {
            datasource: Datasource::GitTags,
            versioning: None,
            dep_name: dep_name.into(),
            dep_name_short: Some(dep_name_short.into()),
            lookup_name: Some(lookup_name.into()),
            current_value: Some(current_value.into()),
            current_digest: None,
            replace_string: None,
        }
    }

    pub fn docker(dep_name: impl Into<String>, pin: &ImagePin) -> Self {
        Self {
            datasource: Datasource::Docker,
            versioning: Some(Versioning::Docker),
            dep_name: dep_name.into(),
            dep_name_short: None,
            lookup_name: None,
            current_value: pin.current_value().map(str::to_string),
            current_digest: pin.current_digest().map(str::to_string),
            replace_string: None,
        }
    }

    pub fn with_replace_string(mut self, replace_string: impl Into<String>) -> Self {
        self.replace_string = Some(replace_string.into());
        self
    }
}

/// Dependencies extracted from one manifest file. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageFile {
    pub deps: Vec<Dependency>,
}

impl PackageFile {
    /// Wraps `deps`, or returns `None` if there is nothing to report.
    pub fn from_deps(deps: Vec<Dependency>) -> Option<Self> {
        if deps.is_empty() {
            None
        } else {
            Some(Self { deps })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_plain_tag() {
        let pin = ImagePin::classify(Some("1.19".to_string()), None).unwrap();
        assert_eq!(pin.current_value(), Some("1.19"));
        assert_eq!(pin.current_digest(), None);
    }

    #[test]
    fn test_classify_digest_shaped_tag() {
        let pin = ImagePin::classify(Some("sha256:deadbeef".to_string()), None).unwrap();
        assert_eq!(
            pin,
            ImagePin::Digest {
                digest: "sha256:deadbeef".to_string()
            }
        );
        assert_eq!(pin.current_value(), None);
    }

    #[test]
    fn test_classify_digest_wins_over_tag() {
        let pin = ImagePin::classify(
            Some("1.19".to_string()),
            Some("sha256:cafef00d".to_string()),
        )
        .unwrap();
        assert_eq!(pin.current_digest(), Some("sha256:cafef00d"));
        assert_eq!(pin.current_value(), Some("1.19"));
    }

    #[test]
    fn test_classify_digest_without_tag() {
        let pin = ImagePin::classify(None, Some("sha256:cafef00d".to_string())).unwrap();
        assert_eq!(pin.current_digest(), Some("sha256:cafef00d"));
        assert_eq!(pin.current_value(), None);
    }

    #[test]
    fn test_classify_nothing() {
        assert!(ImagePin::classify(None, None).is_none());
    }

    #[test]
    fn test_dependency_serialization_shape() {
        let dep = Dependency::git_tags(
            "example.com/group/repo",
            "group/repo",
            "ssh://example.com/group/repo.git",
            "main",
        );

        let json = serde_json::to_value(&dep).unwrap();
        assert_eq!(json["datasource"], "git-tags");
        assert_eq!(json["depName"], "example.com/group/repo");
        assert_eq!(json["depNameShort"], "group/repo");
        assert_eq!(json["lookupName"], "ssh://example.com/group/repo.git");
        assert_eq!(json["currentValue"], "main");
        assert!(json.get("currentDigest").is_none());
        assert!(json.get("versioning").is_none());
        assert!(json.get("replaceString").is_none());

        let deserialized: Dependency = serde_json::from_value(json).unwrap();
        assert_eq!(deserialized, dep);
    }

    #[test]
    fn test_docker_dependency_has_versioning() {
        let pin = ImagePin::Tag {
            tag: "1.19".to_string(),
        };
        let json = serde_json::to_value(Dependency::docker("nginx", &pin)).unwrap();
        assert_eq!(json["datasource"], "docker");
        assert_eq!(json["versioning"], "docker");
    }

    #[test]
    fn test_datasource_ids_match_wire_names() {
        for ds in [Datasource::Docker, Datasource::GitTags, Datasource::GithubTags] {
            let json = serde_json::to_value(ds).unwrap();
            assert_eq!(json, ds.id());
        }
    }

    #[test]
    fn test_package_file_rejects_empty() {
        assert!(PackageFile::from_deps(Vec::new()).is_none());
        let dep = Dependency::github_tags("foo/bar", "v1");
        assert_eq!(PackageFile::from_deps(vec![dep]).unwrap().deps.len(), 1);
    }
}
