use serde::Serialize;

use crate::store::UserStats;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub name: String,
    pub analyses: i64,
    pub discoveries: i64,
    pub xp: i64,
    #[serde(rename = "isYou")]
    pub is_you: bool,
}

/// Demo rivals as (name, analyses, discoveries, xp).
const RIVALS: [(&str, i64, i64, i64); 7] = [
    ("AstroExplorer", 15, 8, 1250),
    ("StarHunter", 12, 6, 980),
    ("PlanetSeeker", 10, 5, 850),
    ("DataMaster", 8, 4, 720),
    ("CosmicVoyager", 6, 3, 580),
    ("SpaceExplorer", 4, 2, 420),
    ("GalaxyGazer", 3, 1, 320),
];

/// Rivals plus the caller, highest XP first. Ties keep rivals ahead.
pub fn build(you: &UserStats) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = RIVALS
        .iter()
        .map(|&(name, analyses, discoveries, xp)| LeaderboardEntry {
            rank: 0,
            name: name.to_string(),
            analyses,
            discoveries,
            xp,
            is_you: false,
        })
        .collect();
    entries.push(LeaderboardEntry {
        rank: 0,
        name: "You".to_string(),
        analyses: you.analyses,
        discoveries: you.discoveries,
        xp: you.total_xp,
        is_you: true,
    });
    entries.sort_by(|a, b| b.xp.cmp(&a.xp));
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_player_ranks_last() {
        let board = build(&UserStats::default());
        assert_eq!(board.len(), 8);
        assert_eq!(board[0].name, "AstroExplorer");
        assert_eq!(board[7].name, "You");
        assert_eq!(board[7].rank, 8);
    }

    #[test]
    fn player_is_slotted_by_xp() {
        let you = UserStats {
            analyses: 11,
            discoveries: 5,
            total_xp: 900,
            ..Default::default()
        };
        let board = build(&you);
        let me = board.iter().find(|e| e.is_you).unwrap();
        assert_eq!(me.rank, 3);
        assert!(board.windows(2).all(|w| w[0].xp >= w[1].xp));
    }

    #[test]
    fn ties_keep_rivals_first() {
        let you = UserStats {
            total_xp: 980,
            ..Default::default()
        };
        let board = build(&you);
        assert_eq!(board[1].name, "StarHunter");
        assert_eq!(board[2].name, "You");
    }
}
