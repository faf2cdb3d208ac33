//! Star history aggregation for the video composition.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Maximum number of stargazer avatars shown in the video.
pub const MAX_AVATARS: usize = 50;

/// A user who starred the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Stargazer {
    pub user: String,
    pub avatar_url: String,
    pub starred_at: DateTime<Utc>,
}

/// Stars received on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TimelinePoint {
    /// Calendar day, `YYYY-MM-DD`
    pub date: String,
    /// Stars received that day
    pub count: u64,
    /// Stars received up to and including that day
    pub cumulative: u64,
}

/// Visualization payload cached under `owner:repo` and fed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StarData {
    /// Owner login
    pub user: String,
    pub user_avatar_url: String,
    /// Repository name
    pub repository: String,
    /// Total star count reported by GitHub
    pub stars: u64,
    /// Avatar URLs of the most recent stargazers, newest first
    pub stargazers: Vec<String>,
    #[serde(default)]
    pub timeline: Vec<TimelinePoint>,
}

impl StarData {
    /// Build the payload from repository metadata and the fetched stargazers.
    pub fn new(
        user: impl Into<String>,
        user_avatar_url: impl Into<String>,
        repository: impl Into<String>,
        stars: u64,
        stargazers: &[Stargazer],
    ) -> Self {
        Self {
            user: user.into(),
            user_avatar_url: user_avatar_url.into(),
            repository: repository.into(),
            stars,
            stargazers: sample_avatars(stargazers, MAX_AVATARS),
            timeline: star_timeline(stargazers),
        }
    }

    /// Cache key for a repository.
    pub fn cache_key(owner: &str, repo: &str) -> String {
        format!("{}:{}", owner, repo)
    }
}

/// Group stargazers per day and accumulate totals in date order.
pub fn star_timeline(stargazers: &[Stargazer]) -> Vec<TimelinePoint> {
    let mut per_day: BTreeMap<String, u64> = BTreeMap::new();
    for stargazer in stargazers {
        let date = stargazer.starred_at.format("%Y-%m-%d").to_string();
        *per_day.entry(date).or_insert(0) += 1;
    }

    let mut cumulative = 0;
    per_day
        .into_iter()
        .map(|(date, count)| {
            cumulative += count;
            TimelinePoint {
                date,
                count,
                cumulative,
            }
        })
        .collect()
}

/// Avatars of the last `limit` stargazers, most recent first.
///
/// Stargazers arrive in starring order, so the tail holds the newest ones.
pub fn sample_avatars(stargazers: &[Stargazer], limit: usize) -> Vec<String> {
    let start = stargazers.len().saturating_sub(limit);
    stargazers[start..]
        .iter()
        .rev()
        .map(|s| s.avatar_url.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn gazer(n: u32, day: u32) -> Stargazer {
        Stargazer {
            user: format!("user{n}"),
            avatar_url: format!("https://avatars.example/{n}"),
            starred_at: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_timeline_groups_and_accumulates() {
        let stargazers = vec![gazer(1, 2), gazer(2, 1), gazer(3, 2), gazer(4, 5)];
        let timeline = star_timeline(&stargazers);

        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline[0].date, "2024-03-01");
        assert_eq!((timeline[0].count, timeline[0].cumulative), (1, 1));
        assert_eq!((timeline[1].count, timeline[1].cumulative), (2, 3));
        assert_eq!((timeline[2].count, timeline[2].cumulative), (1, 4));
    }

    #[test]
    fn test_sample_takes_newest_first() {
        let stargazers: Vec<_> = (1..=60).map(|n| gazer(n, 1)).collect();
        let sample = sample_avatars(&stargazers, MAX_AVATARS);

        assert_eq!(sample.len(), 50);
        assert_eq!(sample[0], "https://avatars.example/60");
        assert_eq!(sample[49], "https://avatars.example/11");
    }

    #[test]
    fn test_zero_stargazers() {
        let data = StarData::new("octocat", "https://a/o", "empty", 0, &[]);
        assert_eq!(data.stars, 0);
        assert!(data.stargazers.is_empty());
        assert!(data.timeline.is_empty());
    }

    #[test]
    fn test_camel_case_fields() {
        let data = StarData::new("octocat", "https://a/o", "Hello-World", 3, &[gazer(1, 1)]);
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["userAvatarUrl"], "https://a/o");
        assert_eq!(json["stargazers"][0], "https://avatars.example/1");
        assert_eq!(StarData::cache_key("octocat", "Hello-World"), "octocat:Hello-World");
    }
}
