//! Hard-fork schedule.
//!
//! An ordered table of named protocol upgrades and the timestamps they activate
//! at. The schedule is built once from configuration and is read-only afterwards,
//! so lookups never need to synchronise with anything else.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Protocol upgrades the engine API versions are gated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hardfork {
    Paris,
    Shanghai,
    Cancun,
    Prague,
}

impl Hardfork {
    /// The canonical name of the upgrade, as used in the schedule.
    pub fn name(&self) -> &'static str {
        match self {
            Hardfork::Paris => "Paris",
            Hardfork::Shanghai => "Shanghai",
            Hardfork::Cancun => "Cancun",
            Hardfork::Prague => "Prague",
        }
    }
}

impl fmt::Display for Hardfork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Hardfork {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Hardfork::Paris,
            Hardfork::Shanghai,
            Hardfork::Cancun,
            Hardfork::Prague,
        ]
        .into_iter()
        .find(|fork| fork.name().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("unknown hardfork: {s}"))
    }
}

/// A named upgrade and the timestamp it activates at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardforkMilestone {
    pub name: String,
    pub timestamp: u64,
}

impl HardforkMilestone {
    pub fn new(name: impl Into<String>, timestamp: u64) -> Self {
        Self {
            name: name.into(),
            timestamp,
        }
    }
}

/// The configured, totally ordered sequence of [HardforkMilestone]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<HardforkMilestone>", into = "Vec<HardforkMilestone>")]
pub struct HardforkSchedule {
    milestones: Vec<HardforkMilestone>,
}

impl HardforkSchedule {
    /// Builds a schedule ordered by activation timestamp.
    ///
    /// Names are compared case-insensitively and a later entry replaces an earlier one
    /// with the same name, so configured overrides can simply be appended to a preset.
    pub fn new(milestones: impl IntoIterator<Item = HardforkMilestone>) -> Self {
        let mut deduped: Vec<HardforkMilestone> = Vec::new();
        for milestone in milestones {
            match deduped
                .iter_mut()
                .find(|m| m.name.eq_ignore_ascii_case(&milestone.name))
            {
                Some(existing) => *existing = milestone,
                None => deduped.push(milestone),
            }
        }
        deduped.sort_by_key(|m| m.timestamp);

        Self {
            milestones: deduped,
        }
    }

    /// Ethereum mainnet.
    pub fn mainnet() -> Self {
        Self::new([
            HardforkMilestone::new("Paris", 1663224179),
            HardforkMilestone::new("Shanghai", 1681338455),
            HardforkMilestone::new("Cancun", 1710338135),
            HardforkMilestone::new("Prague", 1746612311),
        ])
    }

    /// The Sepolia testnet.
    pub fn sepolia() -> Self {
        Self::new([
            HardforkMilestone::new("Shanghai", 1677557088),
            HardforkMilestone::new("Cancun", 1706655072),
            HardforkMilestone::new("Prague", 1741159776),
        ])
    }

    /// The Holesky testnet.
    pub fn holesky() -> Self {
        Self::new([
            HardforkMilestone::new("Paris", 1695902400),
            HardforkMilestone::new("Shanghai", 1696000704),
            HardforkMilestone::new("Cancun", 1707305664),
            HardforkMilestone::new("Prague", 1740434112),
        ])
    }

    /// A local devnet with every upgrade active from genesis.
    pub fn devnet() -> Self {
        Self::new([
            HardforkMilestone::new("Paris", 0),
            HardforkMilestone::new("Shanghai", 0),
            HardforkMilestone::new("Cancun", 0),
            HardforkMilestone::new("Prague", 0),
        ])
    }

    /// Returns the preset schedule for a named network, if one exists.
    pub fn for_network(network: &str) -> Option<Self> {
        match network.to_ascii_lowercase().as_str() {
            "mainnet" => Some(Self::mainnet()),
            "sepolia" => Some(Self::sepolia()),
            "holesky" => Some(Self::holesky()),
            "devnet" => Some(Self::devnet()),
            _ => None,
        }
    }

    /// Returns a copy of this schedule with `overrides` layered on top.
    pub fn with_overrides(&self, overrides: impl IntoIterator<Item = HardforkMilestone>) -> Self {
        Self::new(self.milestones.iter().cloned().chain(overrides))
    }

    /// Looks up the milestone of the named fork. `None` means the fork is not part of
    /// this network and must be treated as permanently disabled.
    pub fn milestone_for(&self, name: &str) -> Option<&HardforkMilestone> {
        self.milestones
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// Returns true if the named fork is configured and active at `timestamp`.
    pub fn is_active(&self, name: &str, timestamp: u64) -> bool {
        self.milestone_for(name)
            .map(|m| timestamp >= m.timestamp)
            .unwrap_or(false)
    }

    /// Returns the most recent milestone already active at `timestamp`.
    pub fn active_at(&self, timestamp: u64) -> Option<&HardforkMilestone> {
        self.milestones
            .iter()
            .take_while(|m| m.timestamp <= timestamp)
            .last()
    }

    pub fn milestones(&self) -> &[HardforkMilestone] {
        &self.milestones
    }

    pub fn is_empty(&self) -> bool {
        self.milestones.is_empty()
    }
}

impl From<Vec<HardforkMilestone>> for HardforkSchedule {
    fn from(milestones: Vec<HardforkMilestone>) -> Self {
        Self::new(milestones)
    }
}

impl From<HardforkSchedule> for Vec<HardforkMilestone> {
    fn from(schedule: HardforkSchedule) -> Self {
        schedule.milestones
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> HardforkSchedule {
        HardforkSchedule::new([
            HardforkMilestone::new("Cancun", 1710000000),
            HardforkMilestone::new("Shanghai", 1681338455),
        ])
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let schedule = schedule();
        assert_eq!(schedule.milestone_for("cancun").unwrap().timestamp, 1710000000);
        assert_eq!(schedule.milestone_for("CANCUN").unwrap().name, "Cancun");
        assert!(schedule.milestone_for("Prague").is_none());
    }

    #[test]
    fn activation_is_inclusive() {
        let schedule = schedule();
        assert!(!schedule.is_active("Cancun", 1709999999));
        assert!(schedule.is_active("Cancun", 1710000000));
        assert!(schedule.is_active("Cancun", 1710000001));
    }

    #[test]
    fn unconfigured_fork_is_never_active() {
        assert!(!schedule().is_active("Prague", u64::MAX));
    }

    #[test]
    fn milestones_are_ordered_by_timestamp() {
        let schedule = schedule();
        let names: Vec<_> = schedule.milestones().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Shanghai", "Cancun"]);
    }

    #[test]
    fn active_at_returns_latest_activated_milestone() {
        let schedule = schedule();
        assert!(schedule.active_at(0).is_none());
        assert_eq!(schedule.active_at(1700000000).unwrap().name, "Shanghai");
        assert_eq!(schedule.active_at(1710000000).unwrap().name, "Cancun");
    }

    #[test]
    fn overrides_replace_preset_entries() {
        let schedule = HardforkSchedule::mainnet()
            .with_overrides([HardforkMilestone::new("cancun", 1710000000)]);

        assert_eq!(schedule.milestones().len(), 4);
        assert_eq!(schedule.milestone_for("Cancun").unwrap().timestamp, 1710000000);
    }

    #[test]
    fn parses_fork_names() {
        assert_eq!("shanghai".parse::<Hardfork>().unwrap(), Hardfork::Shanghai);
        assert!("osaka".parse::<Hardfork>().is_err());
        assert_eq!(Hardfork::Cancun.to_string(), "Cancun");
    }

    #[test]
    fn presets_by_network_name() {
        assert!(HardforkSchedule::for_network("Mainnet").is_some());
        assert!(HardforkSchedule::for_network("devnet").unwrap().is_active("Prague", 0));
        assert!(HardforkSchedule::for_network("goerli").is_none());
    }
}
