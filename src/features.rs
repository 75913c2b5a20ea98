use crate::stats::{StatAggregate, TeamGoals};

pub const FEATURE_COUNT: usize = 27;

/// Column order the scoreline model was trained on.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "leagueId",
    "home_possessionPct",
    "home_foulsCommitted",
    "home_yellowCards",
    "home_redCards",
    "home_wonCorners",
    "home_saves",
    "home_totalShots",
    "home_shotsOnTarget",
    "home_accuratePasses",
    "home_totalPasses",
    "home_blockedShots",
    "away_possessionPct",
    "away_foulsCommitted",
    "away_yellowCards",
    "away_redCards",
    "away_wonCorners",
    "away_saves",
    "away_totalShots",
    "away_shotsOnTarget",
    "away_blockedShots",
    "home_gf",
    "home_gd",
    "away_ga",
    "away_gd",
    "home_shotConversion",
    "away_shotConversion",
];

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl Default for FeatureVector {
    /// All zeros except both possession columns, which default to 50%.
    fn default() -> Self {
        let mut values = [0.0; FEATURE_COUNT];
        values[1] = crate::stats::DEFAULT_POSSESSION_PCT;
        values[12] = crate::stats::DEFAULT_POSSESSION_PCT;
        Self { values }
    }
}

impl FeatureVector {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        feature_index(name).map(|idx| self.values[idx])
    }

    #[cfg(test)]
    fn set(&mut self, name: &str, value: f64) -> bool {
        match feature_index(name) {
            Some(idx) => {
                self.values[idx] = value;
                true
            }
            None => false,
        }
    }

    /// Name/value pairs in model order.
    pub fn named(&self) -> Vec<(&'static str, f64)> {
        FEATURE_NAMES
            .iter()
            .copied()
            .zip(self.values.iter().copied())
            .collect()
    }
}

pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|n| *n == name)
}

pub fn build_features(
    league_id: u32,
    home: &StatAggregate,
    away: &StatAggregate,
    home_goals: TeamGoals,
    away_goals: TeamGoals,
) -> FeatureVector {
    // Away passing volume was not part of the training columns.
    let values = [
        f64::from(league_id),
        home.possession_pct(),
        home.fouls_committed,
        home.yellow_cards,
        home.red_cards,
        home.won_corners,
        home.saves,
        home.total_shots,
        home.shots_on_target,
        home.accurate_passes,
        home.total_passes,
        home.blocked_shots,
        away.possession_pct(),
        away.fouls_committed,
        away.yellow_cards,
        away.red_cards,
        away.won_corners,
        away.saves,
        away.total_shots,
        away.shots_on_target,
        away.blocked_shots,
        home_goals.gf,
        home_goals.difference(),
        away_goals.ga,
        away_goals.difference(),
        home.shot_conversion(),
        away.shot_conversion(),
    ];
    FeatureVector { values }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        let mut names = FEATURE_NAMES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), FEATURE_COUNT);
    }

    #[test]
    fn empty_inputs_yield_defaults_in_order() {
        let empty = StatAggregate::new();
        let fv = build_features(39, &empty, &empty, TeamGoals::default(), TeamGoals::default());
        let named = fv.named();
        assert_eq!(named.len(), FEATURE_COUNT);
        for (pair, expected) in named.iter().zip(FEATURE_NAMES.iter()) {
            assert_eq!(pair.0, *expected);
        }
        assert_eq!(fv.get("leagueId"), Some(39.0));
        assert_eq!(fv.get("home_possessionPct"), Some(50.0));
        assert_eq!(fv.get("away_possessionPct"), Some(50.0));
        assert_eq!(fv.get("home_shotsOnTarget"), Some(0.0));
        assert_eq!(fv.get("away_shotConversion"), Some(0.0));

        let mut defaults = FeatureVector::default();
        defaults.set("leagueId", 39.0);
        assert_eq!(fv, defaults);
    }

    #[test]
    fn goal_columns_and_conversion() {
        let mut home = StatAggregate::new();
        home.total_shots = 20.0;
        home.shots_on_target = 5.0;
        let away = StatAggregate::new();
        let fv = build_features(
            140,
            &home,
            &away,
            TeamGoals { gf: 30.0, ga: 12.0 },
            TeamGoals { gf: 10.0, ga: 25.0 },
        );
        assert_eq!(fv.get("home_gf"), Some(30.0));
        assert_eq!(fv.get("home_gd"), Some(18.0));
        assert_eq!(fv.get("away_ga"), Some(25.0));
        assert_eq!(fv.get("away_gd"), Some(-15.0));
        assert_eq!(fv.get("home_shotConversion"), Some(0.25));
        assert_eq!(fv.get("unknown"), None);
    }
}
