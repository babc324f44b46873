use serde::{Deserialize, Serialize};

/// Newtype wrapper for prefab handles. The host resolves these to assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefabId(pub u64);

/// Which player a spawned object should aim at once it is live.
///
/// The engine does not interpret these values; it only forwards them to the
/// host's targeting logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TargetKind {
    #[default]
    None,
    ComputerPlayer,
    VRPlayer,
    LeftPlayer,
    RightPlayer,
    TopPlayer,
    BottomPlayer,
    FrontPlayer,
    BackPlayer,
    NearPlayer,
    FarPlayer,
    RandomPlayer,
}

impl TargetKind {
    /// Every variant, in declaration order.
    pub const ALL: [TargetKind; 12] = [
        Self::None,
        Self::ComputerPlayer,
        Self::VRPlayer,
        Self::LeftPlayer,
        Self::RightPlayer,
        Self::TopPlayer,
        Self::BottomPlayer,
        Self::FrontPlayer,
        Self::BackPlayer,
        Self::NearPlayer,
        Self::FarPlayer,
        Self::RandomPlayer,
    ];

    /// Returns the tag string for this target (e.g., "target:left").
    pub fn tag(&self) -> &'static str {
        match self {
            Self::None => "target:none",
            Self::ComputerPlayer => "target:computer",
            Self::VRPlayer => "target:vr",
            Self::LeftPlayer => "target:left",
            Self::RightPlayer => "target:right",
            Self::TopPlayer => "target:top",
            Self::BottomPlayer => "target:bottom",
            Self::FrontPlayer => "target:front",
            Self::BackPlayer => "target:back",
            Self::NearPlayer => "target:near",
            Self::FarPlayer => "target:far",
            Self::RandomPlayer => "target:random",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn default_is_none() {
        assert_eq!(TargetKind::default(), TargetKind::None);
    }

    #[test]
    fn tags_are_unique() {
        let tags: FxHashSet<&str> = TargetKind::ALL.iter().map(|t| t.tag()).collect();
        assert_eq!(tags.len(), TargetKind::ALL.len());
        assert_eq!(TargetKind::VRPlayer.tag(), "target:vr");
    }

    #[test]
    fn ron_names_match_variants() {
        let parsed: Vec<TargetKind> = ron::from_str("[None, LeftPlayer, RandomPlayer]").unwrap();
        assert_eq!(
            parsed,
            vec![
                TargetKind::None,
                TargetKind::LeftPlayer,
                TargetKind::RandomPlayer
            ]
        );
    }

    #[test]
    fn prefab_ids_compare_by_value() {
        assert_eq!(PrefabId(7), PrefabId(7));
        assert_ne!(PrefabId(7), PrefabId(8));
    }

    #[test]
    fn prefab_ids_are_bare_numbers_in_ron() {
        let parsed: Vec<PrefabId> = ron::from_str("[3, 14]").unwrap();
        assert_eq!(parsed, vec![PrefabId(3), PrefabId(14)]);
    }
}
