//! Timezone coordination analyzer
//!
//! Builds a distribution of player timezones and ranks the UTC hours at
//! which the most players are in their local evening.

use super::normalize::{normalize_timezone, parse_offset_hours};
use serde::Serialize;
use std::collections::BTreeMap;

/// First local hour a player is assumed to be active
pub const EVENING_START_HOUR: u32 = 18;
/// Last local hour (inclusive) a player is assumed to be active
pub const EVENING_END_HOUR: u32 = 23;
/// Number of coordination windows reported
pub const OPTIMAL_WINDOW_COUNT: usize = 3;
/// Number of timezones in the top list
pub const TOP_TIMEZONE_COUNT: usize = 5;
/// Share of players above which the top timezone is a majority
pub const MAJORITY_THRESHOLD_PERCENT: f64 = 50.0;
/// Bucket count above which multiple event times are suggested
pub const SPREAD_BUCKET_THRESHOLD: usize = 3;

pub const NO_DATA_MESSAGE: &str = "No timezone data available for analysis.";

const HOURS_PER_DAY: usize = 24;

/// Canonical offset -> number of players
pub type TimezoneDistribution = BTreeMap<String, usize>;

/// One ranked timezone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimezoneBucket {
    pub offset: String,
    pub count: usize,
}

/// Candidate UTC hour for alliance-wide activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinationWindow {
    pub utc_hour: u32,
    pub active_player_count: usize,
    /// Local clock time of every known offset at this hour, e.g. `"18:00 UTC+0"`
    pub local_times: Vec<String>,
}

/// Outcome of a single analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub total_players: usize,
    pub players_with_timezone: usize,
    pub distribution: TimezoneDistribution,
    pub top_timezones: Vec<TimezoneBucket>,
    pub optimal_times: Vec<CoordinationWindow>,
    pub recommendations: Vec<String>,
}

/// Analyze the timezones of a player snapshot.
///
/// Takes one entry per player; `None`, blank and `"Unknown"` entries count
/// toward `total_players` only.
pub fn analyze<'a, I>(time_zones: I) -> AnalysisResult
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut total_players = 0;
    let (distribution, players_with_timezone) =
        build_distribution(time_zones.into_iter().inspect(|_| total_players += 1));

    if players_with_timezone == 0 {
        return AnalysisResult {
            total_players,
            players_with_timezone: 0,
            distribution: TimezoneDistribution::new(),
            top_timezones: Vec::new(),
            optimal_times: Vec::new(),
            recommendations: vec![NO_DATA_MESSAGE.to_string()],
        };
    }

    let mut top_timezones = rank_buckets(&distribution);
    top_timezones.truncate(TOP_TIMEZONE_COUNT);

    let optimal_times = coordination_windows(&distribution);
    let recommendations = generate_recommendations(&distribution, &optimal_times);

    AnalysisResult {
        total_players,
        players_with_timezone,
        distribution,
        top_timezones,
        optimal_times,
        recommendations,
    }
}

/// Count players per canonical offset.
///
/// Returns the distribution together with the number of players that
/// reported a usable timezone.
pub fn build_distribution<'a, I>(time_zones: I) -> (TimezoneDistribution, usize)
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut distribution = TimezoneDistribution::new();
    let mut players_with_timezone = 0;

    for raw in time_zones.into_iter().flatten() {
        let raw = raw.trim();
        if raw.is_empty() || raw == "Unknown" {
            continue;
        }

        *distribution.entry(normalize_timezone(raw)).or_insert(0) += 1;
        players_with_timezone += 1;
    }

    (distribution, players_with_timezone)
}

/// Players in their local evening at each UTC hour.
///
/// Buckets without a parseable offset contribute nothing.
pub fn utc_hour_tally(distribution: &TimezoneDistribution) -> [usize; HOURS_PER_DAY] {
    let mut tally = [0; HOURS_PER_DAY];

    for (offset, &count) in distribution {
        let Some(offset_hours) = parse_offset_hours(offset) else {
            continue;
        };

        for local_hour in EVENING_START_HOUR..=EVENING_END_HOUR {
            tally[utc_hour_for(local_hour, offset_hours)] += count;
        }
    }

    tally
}

/// Top coordination windows, best first. Lower hours win ties.
pub fn coordination_windows(distribution: &TimezoneDistribution) -> Vec<CoordinationWindow> {
    let tally = utc_hour_tally(distribution);

    let mut hours: Vec<(u32, usize)> = (0..HOURS_PER_DAY as u32)
        .zip(tally)
        .filter(|&(_, count)| count > 0)
        .collect();
    hours.sort_by(|a, b| b.1.cmp(&a.1));

    hours
        .into_iter()
        .take(OPTIMAL_WINDOW_COUNT)
        .map(|(utc_hour, active_player_count)| CoordinationWindow {
            utc_hour,
            active_player_count,
            local_times: local_times_at(utc_hour, distribution),
        })
        .collect()
}

/// Human-readable advice derived from the distribution and windows
pub fn generate_recommendations(
    distribution: &TimezoneDistribution,
    optimal_times: &[CoordinationWindow],
) -> Vec<String> {
    let ranked = rank_buckets(distribution);
    let Some(top) = ranked.first() else {
        return vec![NO_DATA_MESSAGE.to_string()];
    };

    let tagged: usize = distribution.values().sum();
    let percentage = top.count as f64 / tagged as f64 * 100.0;

    let mut recommendations = Vec::new();
    if percentage > MAJORITY_THRESHOLD_PERCENT {
        recommendations.push(format!(
            "Majority timezone: {} ({:.0}% of players)",
            top.offset, percentage
        ));
    } else {
        recommendations.push(format!(
            "Distributed timezones: most common is {} ({:.0}% of players)",
            top.offset, percentage
        ));
    }

    if let Some(best) = optimal_times.first() {
        recommendations.push(format!(
            "Best coordination time: {:02}:00 UTC ({} players in their local evening)",
            best.utc_hour, best.active_player_count
        ));
    }
    if let Some(alternative) = optimal_times.get(1) {
        recommendations.push(format!(
            "Alternative time: {:02}:00 UTC ({} players)",
            alternative.utc_hour, alternative.active_player_count
        ));
    }

    if distribution.len() > SPREAD_BUCKET_THRESHOLD {
        recommendations.push(format!(
            "Consider multiple coordination windows to cover {} different timezones",
            distribution.len()
        ));
    }

    recommendations
}

/// Buckets by count, descending. Equal counts keep key order.
fn rank_buckets(distribution: &TimezoneDistribution) -> Vec<TimezoneBucket> {
    let mut buckets: Vec<TimezoneBucket> = distribution
        .iter()
        .map(|(offset, &count)| TimezoneBucket {
            offset: offset.clone(),
            count,
        })
        .collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    buckets
}

fn utc_hour_for(local_hour: u32, offset_hours: f64) -> usize {
    let utc = (f64::from(local_hour) - offset_hours).rem_euclid(HOURS_PER_DAY as f64);
    utc.floor() as usize % HOURS_PER_DAY
}

fn local_times_at(utc_hour: u32, distribution: &TimezoneDistribution) -> Vec<String> {
    let mut local_times: Vec<String> = distribution
        .keys()
        .filter_map(|offset| {
            let offset_hours = parse_offset_hours(offset)?;
            Some(local_time_label(utc_hour, offset_hours, offset))
        })
        .collect();
    local_times.sort();
    local_times
}

fn local_time_label(utc_hour: u32, offset_hours: f64, offset: &str) -> String {
    const MINUTES_PER_DAY: u32 = 24 * 60;

    let local = (f64::from(utc_hour) + offset_hours).rem_euclid(HOURS_PER_DAY as f64);
    let minutes = (local * 60.0).round() as u32 % MINUTES_PER_DAY;
    format!("{:02}:{:02} {}", minutes / 60, minutes % 60, offset)
}
