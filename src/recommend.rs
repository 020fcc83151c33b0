//! Smart-frame recommendations derived from a GitHub profile.
//!
//! Everything here is pure: the server fetches the profile and repositories,
//! then calls [`recommend`].

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::github::{ProfileSummary, RepoSummary};

/// Activity above this level earns an extra 🔥.
const HIGH_ACTIVITY: f64 = 0.7;
/// Profiles with more public repositories than this count as open-source.
const OPEN_SOURCE_REPOS: u64 = 10;

/// Signals extracted from a profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileAnalysis {
    pub dominant_language: String,
    /// Normalized to 0..=1.
    pub activity_level: f64,
    pub is_student: bool,
    pub is_open_source: bool,
    pub is_data_scientist: bool,
    pub is_frontend: bool,
    pub is_backend: bool,
}

/// A suggested theme, accent and emoji set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub recommended_frame: String,
    pub accent_color: String,
    pub emojis: Vec<String>,
}

impl Recommendation {
    fn new(frame: &str, accent: &str, emojis: &[&str]) -> Self {
        Self {
            recommended_frame: frame.to_string(),
            accent_color: accent.to_string(),
            emojis: emojis.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Link to the strict render endpoint with this recommendation applied.
    pub fn preview_url(&self, public_base_url: &str, username: &str) -> Option<Url> {
        let mut url = Url::parse(public_base_url).ok()?;
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(["api", "framed-avatar", username]);
        url.query_pairs_mut()
            .append_pair("accentColor", &self.accent_color)
            .append_pair("theme", &self.recommended_frame)
            .append_pair("emojis", &self.emojis.join(","));
        Some(url)
    }
}

/// Most frequent repository language. Ties go to the language seen last.
pub fn dominant_language(repos: &[RepoSummary]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for language in repos.iter().filter_map(|r| r.language.as_deref()) {
        match counts.iter_mut().find(|(name, _)| *name == language) {
            Some((_, count)) => *count += 1,
            None => counts.push((language, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (language, count) in counts {
        if best.is_none_or(|(_, top)| count >= top) {
            best = Some((language, count));
        }
    }
    best.map_or_else(|| "Unknown".to_string(), |(language, _)| language.to_string())
}

pub fn analyze(profile: &ProfileSummary, repos: &[RepoSummary]) -> ProfileAnalysis {
    let total = profile.public_repos + profile.followers + profile.following;
    let activity_level = total.min(100) as f64 / 100.0;

    let bio = profile.bio.as_deref().unwrap_or_default().to_lowercase();
    let keywords: Vec<&str> = bio.split_whitespace().collect();
    let mentions = |needles: &[&str]| keywords.iter().any(|k| needles.iter().any(|n| k.contains(n)));

    ProfileAnalysis {
        dominant_language: dominant_language(repos),
        activity_level,
        is_student: mentions(&["student", "learner"]),
        is_open_source: profile.public_repos > OPEN_SOURCE_REPOS,
        is_data_scientist: mentions(&["data", "ml", "ai"]),
        is_frontend: mentions(&["frontend", "react", "web"]),
        is_backend: mentions(&["backend", "api", "server"]),
    }
}

/// First matching rule wins.
pub fn recommend_for(analysis: &ProfileAnalysis) -> Recommendation {
    let mut recommendation = if analysis.is_frontend {
        Recommendation::new("tech-minimal", "#61DAFB", &["💻", "🚀"])
    } else if analysis.is_data_scientist {
        Recommendation::new("neural", "#FFD43B", &["🧠", "📊"])
    } else if analysis.is_student || analysis.is_open_source {
        Recommendation::new("soft-modern", "#34D399", &["🚀", "📚"])
    } else if analysis.dominant_language == "Python" {
        Recommendation::new("minimal", "#3776AB", &["🐍", "💻"])
    } else if analysis.dominant_language == "JavaScript" {
        Recommendation::new("neon", "#F7DF1E", &["💻", "⚡"])
    } else {
        Recommendation::new("classic", "#FF6B6B", &["🌟", "💻"])
    };

    if analysis.activity_level > HIGH_ACTIVITY {
        recommendation.emojis.push("🔥".to_string());
    }
    recommendation
}

pub fn recommend(profile: &ProfileSummary, repos: &[RepoSummary]) -> Recommendation {
    recommend_for(&analyze(profile, repos))
}
