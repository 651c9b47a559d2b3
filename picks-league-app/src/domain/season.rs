use chrono::{DateTime, Utc};

use crate::domain::{LeagueId, RepoError, RepoRetrieveError, SeasonId, WeekId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeekType {
    Regular,
    Playoff,
}

impl WeekType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeekType::Regular => "Regular",
            WeekType::Playoff => "Playoff",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Regular" => Some(WeekType::Regular),
            "Playoff" => Some(WeekType::Playoff),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Week {
    pub id: WeekId,
    pub name: String,
    pub week_type: WeekType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub pick_lock_time: DateTime<Utc>,
}

impl Week {
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        now >= self.pick_lock_time
    }
}

/// Time bounds of a league season, from its start week's start to its end week's end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeasonWeekRange {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl SeasonWeekRange {
    pub fn contains(&self, week: &Week) -> bool {
        week.start_time >= self.start_time && week.end_time <= self.end_time
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeagueSeason {
    pub id: SeasonId,
    pub league_id: LeagueId,
    pub start_week_id: WeekId,
    pub end_week_id: WeekId,
    pub range: SeasonWeekRange,
}

impl LeagueSeason {
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.range.start_time <= now
    }
}

#[async_trait::async_trait]
pub trait SeasonRepository {
    async fn get_league_season(
        &self,
        season_id: SeasonId,
    ) -> Result<LeagueSeason, RepoRetrieveError>;
    /// Weeks of the season's sport calendar whose bounds fall inside its range,
    /// ordered by start time.
    async fn list_season_weeks(&self, season: &LeagueSeason) -> Result<Vec<Week>, RepoError>;
    async fn get_week(&self, week_id: WeekId) -> Result<Week, RepoRetrieveError>;
    /// League seasons whose range overlaps `[from, to]`.
    async fn list_league_seasons_overlapping(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<LeagueSeason>, RepoError>;
}

/// Weeks immediately before and after `current` by start time.
pub fn adjacent_weeks<'a>(weeks: &'a [Week], current: WeekId) -> (Option<&'a Week>, Option<&'a Week>) {
    let mut ordered: Vec<&Week> = weeks.iter().collect();
    ordered.sort_by_key(|w| w.start_time);
    let Some(index) = ordered.iter().position(|w| w.id == current) else {
        return (None, None);
    };
    let previous = index.checked_sub(1).and_then(|i| ordered.get(i).copied());
    let next = ordered.get(index + 1).copied();
    (previous, next)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn week(offset_weeks: i64) -> Week {
        let start = Utc.with_ymd_and_hms(2024, 9, 3, 0, 0, 0).unwrap() + Duration::weeks(offset_weeks);
        Week {
            id: WeekId::new(),
            name: format!("Week {}", offset_weeks + 1),
            week_type: WeekType::Regular,
            start_time: start,
            end_time: start + Duration::days(7) - Duration::seconds(1),
            pick_lock_time: start + Duration::days(5),
        }
    }

    #[test]
    fn test_range_is_inclusive_on_both_bounds() {
        let first = week(0);
        let last = week(2);
        let range = SeasonWeekRange {
            start_time: first.start_time,
            end_time: last.end_time,
        };
        assert!(range.contains(&first));
        assert!(range.contains(&week(1)));
        assert!(range.contains(&last));
        assert!(!range.contains(&week(3)));
        assert!(!range.contains(&week(-1)));
    }

    #[test]
    fn test_adjacent_weeks_follow_time_not_input_order() {
        let w0 = week(0);
        let w1 = week(1);
        let w2 = week(2);
        let weeks = vec![w2.clone(), w0.clone(), w1.clone()];

        let (prev, next) = adjacent_weeks(&weeks, w1.id);
        assert_eq!(prev.map(|w| w.id), Some(w0.id));
        assert_eq!(next.map(|w| w.id), Some(w2.id));

        let (prev, next) = adjacent_weeks(&weeks, w0.id);
        assert!(prev.is_none());
        assert_eq!(next.map(|w| w.id), Some(w1.id));

        assert_eq!(adjacent_weeks(&weeks, WeekId::new()), (None, None));
    }
}
