use std::collections::{BTreeMap, BTreeSet};

use crate::models::HeatmapSlot;

use super::grid::{GridLayout, SlotSelection};
use super::slot::SlotKey;

/// How unavailable a slot is relative to everyone who has submitted.
///
/// Variants are ordered, so comparing two severities compares how busy the
/// slots are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Nobody has submitted yet.
    Neutral,
    AllAvailable,
    /// Up to a quarter unavailable.
    Low,
    /// Up to half unavailable.
    Moderate,
    /// Up to three quarters unavailable.
    High,
    /// More than three quarters, but not everyone.
    VeryHigh,
    AllUnavailable,
}

impl Severity {
    pub fn classify(unavailable_count: u32, total_participants: u32) -> Self {
        if total_participants == 0 {
            return Severity::Neutral;
        }
        let (count, total) = (u64::from(unavailable_count), u64::from(total_participants));
        if count == 0 {
            Severity::AllAvailable
        } else if 4 * count <= total {
            Severity::Low
        } else if 2 * count <= total {
            Severity::Moderate
        } else if 4 * count <= 3 * total {
            Severity::High
        } else if count < total {
            Severity::VeryHigh
        } else {
            Severity::AllUnavailable
        }
    }

    /// Bucket index from 0 (neutral) to 6.
    pub fn level(self) -> u8 {
        self as u8
    }
}

/// One participant's submitted unavailability.
#[derive(Debug, Clone)]
pub struct ParticipantAvailability {
    pub nickname: String,
    pub unavailable: SlotSelection,
}

/// Per-slot unavailability across submitted participants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Heatmap {
    slots: BTreeMap<SlotKey, HeatmapSlot>,
    total_participants: u32,
}

impl Heatmap {
    /// Wraps a heatmap as returned by the backend.
    pub fn from_slots(slots: Vec<HeatmapSlot>, total_participants: u32) -> Self {
        Self {
            slots: slots.into_iter().map(|s| (s.dt.clone(), s)).collect(),
            total_participants,
        }
    }

    /// Builds a heatmap entry for every cell of `layout`. Keys outside the
    /// layout are ignored; members keep participant order.
    pub fn aggregate(layout: &GridLayout, participants: &[ParticipantAvailability]) -> Self {
        let slots = layout
            .slot_keys()
            .into_iter()
            .map(|key| {
                let members: Vec<String> = participants
                    .iter()
                    .filter(|p| p.unavailable.contains(&key))
                    .map(|p| p.nickname.clone())
                    .collect();
                let slot = HeatmapSlot {
                    dt: key.clone(),
                    unavailable_count: members.len() as u32,
                    unavailable_members: members,
                };
                (key, slot)
            })
            .collect();
        Self {
            slots,
            total_participants: participants.len() as u32,
        }
    }

    pub fn total_participants(&self) -> u32 {
        self.total_participants
    }

    pub fn get(&self, key: &SlotKey) -> Option<&HeatmapSlot> {
        self.slots.get(key)
    }

    /// Missing slots count as fully available.
    pub fn count(&self, key: &SlotKey) -> u32 {
        self.slots.get(key).map_or(0, |s| s.unavailable_count)
    }

    pub fn severity(&self, key: &SlotKey) -> Severity {
        Severity::classify(self.count(key), self.total_participants)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeatmapSlot> {
        self.slots.values()
    }

    pub fn busy_slots(&self) -> BTreeSet<&SlotKey> {
        self.slots
            .values()
            .filter(|s| s.unavailable_count > 0)
            .map(|s| &s.dt)
            .collect()
    }

    pub fn into_slots(self) -> Vec<HeatmapSlot> {
        self.slots.into_values().collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotTooltip {
    pub dt: SlotKey,
    pub count: u32,
    pub members: Vec<String>,
}

/// Inline member list shown for the last clicked busy slot.
#[derive(Debug, Clone, Default)]
pub struct TooltipState {
    current: Option<SlotTooltip>,
}

impl TooltipState {
    pub fn current(&self) -> Option<&SlotTooltip> {
        self.current.as_ref()
    }

    /// Clicking a busy slot opens its tooltip, clicking it again closes it,
    /// and clicking a free slot clears whatever is open.
    pub fn select(&mut self, heatmap: &Heatmap, key: &SlotKey) -> Option<&SlotTooltip> {
        let busy = heatmap.get(key).filter(|s| s.unavailable_count > 0);
        self.current = match busy {
            Some(_) if self.current.as_ref().is_some_and(|t| &t.dt == key) => None,
            Some(slot) => Some(SlotTooltip {
                dt: slot.dt.clone(),
                count: slot.unavailable_count,
                members: slot.unavailable_members.clone(),
            }),
            None => None,
        };
        self.current.as_ref()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn key(s: &str) -> SlotKey {
        SlotKey::parse(s).unwrap()
    }

    fn participant(name: &str, slots: &[&str]) -> ParticipantAvailability {
        ParticipantAvailability {
            nickname: name.to_string(),
            unavailable: slots.iter().map(|s| key(s)).collect(),
        }
    }

    fn layout() -> GridLayout {
        GridLayout::new(vec![NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()], 9, 11)
    }

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(Severity::classify(0, 0), Severity::Neutral);
        assert_eq!(Severity::classify(3, 0), Severity::Neutral);
        assert_eq!(Severity::classify(0, 4), Severity::AllAvailable);
        assert_eq!(Severity::classify(1, 4), Severity::Low);
        assert_eq!(Severity::classify(2, 4), Severity::Moderate);
        assert_eq!(Severity::classify(3, 4), Severity::High);
        assert_eq!(Severity::classify(4, 5), Severity::VeryHigh);
        assert_eq!(Severity::classify(4, 4), Severity::AllUnavailable);
    }

    #[test]
    fn test_severity_is_monotonic() {
        for total in 1..=12u32 {
            let levels: Vec<_> = (0..=total).map(|c| Severity::classify(c, total)).collect();
            assert!(levels.windows(2).all(|w| w[0] <= w[1]), "total = {total}");
        }
    }

    #[test]
    fn test_aggregate_counts_and_members() {
        let heatmap = Heatmap::aggregate(
            &layout(),
            &[
                participant("A", &["2024-05-20T09:00:00", "2024-05-20T09:30:00"]),
                participant("B", &["2024-05-20T09:00:00", "2024-05-20T15:00:00"]),
                participant("C", &[]),
            ],
        );
        assert_eq!(heatmap.total_participants(), 3);
        let nine = heatmap.get(&key("2024-05-20T09:00:00")).unwrap();
        assert_eq!(nine.unavailable_count, 2);
        assert_eq!(nine.unavailable_members, vec!["A", "B"]);
        assert_eq!(heatmap.count(&key("2024-05-20T09:30:00")), 1);
        assert_eq!(heatmap.count(&key("2024-05-20T10:00:00")), 0);
        assert!(heatmap.get(&key("2024-05-20T15:00:00")).is_none());
        assert_eq!(heatmap.iter().count(), 4);
    }

    #[test]
    fn test_tooltip_toggles() {
        let heatmap = Heatmap::aggregate(&layout(), &[participant("A", &["2024-05-20T09:00:00"])]);
        let mut tooltip = TooltipState::default();

        let shown = tooltip.select(&heatmap, &key("2024-05-20T09:00:00")).cloned();
        assert_eq!(shown.unwrap().members, vec!["A"]);
        assert!(tooltip.select(&heatmap, &key("2024-05-20T09:00:00")).is_none());

        tooltip.select(&heatmap, &key("2024-05-20T09:00:00"));
        assert!(tooltip.select(&heatmap, &key("2024-05-20T10:00:00")).is_none());
        assert!(tooltip.current().is_none());
    }
}
