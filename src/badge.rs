//! shields.io badge links for a GitHub user.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::github::ProfileSummary;

pub const DEFAULT_STYLE: &str = "flat";

/// Badge image URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeSet {
    pub followers: String,
    pub repos: String,
    pub stars: String,
    pub contributions: String,
    pub profile: String,
}

/// Counters copied from the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeStats {
    pub followers: u64,
    pub public_repos: u64,
}

impl From<&ProfileSummary> for BadgeStats {
    fn from(profile: &ProfileSummary) -> Self {
        Self {
            followers: profile.followers,
            public_repos: profile.public_repos,
        }
    }
}

struct BadgeKind {
    path: &'static [&'static str],
    label: &'static str,
    color: &'static str,
    logo: Option<&'static str>,
}

const FOLLOWERS: BadgeKind = BadgeKind {
    path: &["github", "followers"],
    label: "Followers",
    color: "blue",
    logo: None,
};
const REPOS: BadgeKind = BadgeKind {
    path: &["github", "repos"],
    label: "Repos",
    color: "green",
    logo: None,
};
const STARS: BadgeKind = BadgeKind {
    path: &["github", "stars"],
    label: "Stars",
    color: "yellow",
    logo: None,
};
const CONTRIBUTIONS: BadgeKind = BadgeKind {
    path: &["github", "commit-activity", "m"],
    label: "Commits",
    color: "orange",
    logo: None,
};
const PROFILE: BadgeKind = BadgeKind {
    path: &["github", "followers"],
    label: "Profile",
    color: "purple",
    logo: Some("github"),
};

impl BadgeSet {
    /// Builds every badge URL for `username`. `None` if `base_url` cannot be
    /// a base URL.
    pub fn build(base_url: &str, username: &str, style: &str) -> Option<Self> {
        let base = Url::parse(base_url).ok()?;
        if base.cannot_be_a_base() {
            return None;
        }
        let link = |kind: &BadgeKind| badge_url(&base, kind, username, style);
        Some(Self {
            followers: link(&FOLLOWERS),
            repos: link(&REPOS),
            stars: link(&STARS),
            contributions: link(&CONTRIBUTIONS),
            profile: link(&PROFILE),
        })
    }
}

fn badge_url(base: &Url, kind: &BadgeKind, username: &str, style: &str) -> String {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().extend(kind.path).push(username);
    }
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("style", style)
            .append_pair("label", kind.label)
            .append_pair("color", kind.color);
        if let Some(logo) = kind.logo {
            query.append_pair("logo", logo);
        }
    }
    url.to_string()
}
