use serde::Serialize;

use crate::store::UserStats;

/// What a player has to do to earn an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "atLeast", rename_all = "camelCase")]
pub enum Requirement {
    Analyses(i64),
    Discoveries(i64),
    StarsExplored(i64),
    Uploads(i64),
    TourCompleted,
}

impl Requirement {
    pub fn is_met(&self, stats: &UserStats, tour_completed: bool) -> bool {
        match *self {
            Requirement::Analyses(n) => stats.analyses >= n,
            Requirement::Discoveries(n) => stats.discoveries >= n,
            Requirement::StarsExplored(n) => stats.stars_explored >= n,
            Requirement::Uploads(n) => stats.uploads >= n,
            Requirement::TourCompleted => tour_completed,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub xp: i64,
    pub requirement: Requirement,
}

pub static CATALOG: [AchievementDef; 7] = [
    AchievementDef {
        id: "first_analysis",
        name: "Data Scientist",
        description: "Run your first AI analysis",
        xp: 50,
        requirement: Requirement::Analyses(1),
    },
    AchievementDef {
        id: "nasa_explorer",
        name: "NASA Collaborator",
        description: "Load NASA exoplanet data",
        xp: 75,
        requirement: Requirement::Analyses(1),
    },
    AchievementDef {
        id: "star_gazer",
        name: "Star Gazer",
        description: "Explore 10 stars",
        xp: 100,
        requirement: Requirement::StarsExplored(10),
    },
    AchievementDef {
        id: "planet_hunter",
        name: "Planet Hunter",
        description: "Discover 5 planets",
        xp: 150,
        requirement: Requirement::Discoveries(5),
    },
    AchievementDef {
        id: "data_uploader",
        name: "Data Uploader",
        description: "Upload 3 datasets",
        xp: 75,
        requirement: Requirement::Uploads(3),
    },
    AchievementDef {
        id: "ai_master",
        name: "AI Master",
        description: "Run 10 AI analyses",
        xp: 200,
        requirement: Requirement::Analyses(10),
    },
    AchievementDef {
        id: "space_tourist",
        name: "Space Tourist",
        description: "Complete a space tour",
        xp: 100,
        requirement: Requirement::TourCompleted,
    },
];

pub fn find(id: &str) -> Option<&'static AchievementDef> {
    CATALOG.iter().find(|a| a.id == id)
}
