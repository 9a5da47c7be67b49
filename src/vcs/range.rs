use std::fmt;

use tracing::warn;

/// A `from`/`to` revision pair. Either side may be empty, in which case git
/// compares against the working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRange {
    pub from: String,
    pub to: String,
}

/// CI systems whose environment can supply a commit range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiProvider {
    Travis,
    GitLab,
}

impl CiProvider {
    /// Providers in the order they are tried.
    pub const ALL: [CiProvider; 2] = [CiProvider::Travis, CiProvider::GitLab];

    /// Read the commit range for a pull/merge request build from `env`.
    pub fn detect<F>(self, env: &F) -> Option<CommitRange>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            CiProvider::Travis => {
                let pr = env("TRAVIS_PULL_REQUEST")?;
                if pr.is_empty() || pr == "false" {
                    return None;
                }
                let range = env("TRAVIS_COMMIT_RANGE").unwrap_or_default();
                match range.split_once("...") {
                    Some((from, to)) => Some(CommitRange {
                        from: from.to_owned(),
                        to: to.to_owned(),
                    }),
                    None => {
                        warn!(range = %range, "malformed TRAVIS_COMMIT_RANGE");
                        None
                    }
                }
            }
            CiProvider::GitLab => {
                let from = env("CI_MERGE_REQUEST_DIFF_BASE_SHA").filter(|s| !s.is_empty())?;
                let to = env("CI_COMMIT_SHA").filter(|s| !s.is_empty())?;
                Some(CommitRange { from, to })
            }
        }
    }
}

impl fmt::Display for CiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CiProvider::Travis => f.write_str("travis"),
            CiProvider::GitLab => f.write_str("gitlab"),
        }
    }
}

/// Where a commit range came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSource {
    Flags,
    Ci(CiProvider),
}

/// Pick the commit range: explicit flags win; otherwise the first provider
/// in `providers` that detects one. `None` means there is nothing to diff.
pub fn commit_range<F>(
    from: Option<&str>,
    to: Option<&str>,
    providers: &[CiProvider],
    env: F,
) -> Option<(CommitRange, RangeSource)>
where
    F: Fn(&str) -> Option<String>,
{
    let from = from.unwrap_or_default();
    let to = to.unwrap_or_default();
    if !from.is_empty() || !to.is_empty() {
        let range = CommitRange {
            from: from.to_owned(),
            to: to.to_owned(),
        };
        return Some((range, RangeSource::Flags));
    }

    providers
        .iter()
        .find_map(|&provider| provider.detect(&env).map(|r| (r, RangeSource::Ci(provider))))
}
