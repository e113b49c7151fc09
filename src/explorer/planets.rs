use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlanetStatus {
    Confirmed,
    Candidate,
    #[serde(rename = "False Positive")]
    FalsePositive,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exoplanet {
    pub planet_name: &'static str,
    pub host_star: &'static str,
    /// Days.
    pub orbital_period: f64,
    /// Earth radii.
    pub planet_radius: f64,
    /// Hours.
    pub transit_duration: f64,
    pub status: PlanetStatus,
    pub discovery_year: u16,
}

const fn planet(
    planet_name: &'static str,
    host_star: &'static str,
    orbital_period: f64,
    planet_radius: f64,
    transit_duration: f64,
    status: PlanetStatus,
    discovery_year: u16,
) -> Exoplanet {
    Exoplanet {
        planet_name,
        host_star,
        orbital_period,
        planet_radius,
        transit_duration,
        status,
        discovery_year,
    }
}

use PlanetStatus::{Candidate, Confirmed};

pub static EXOPLANETS: [Exoplanet; 10] = [
    planet("Kepler-452b", "Kepler-452", 384.8, 1.63, 7.2, Confirmed, 2015),
    planet("TRAPPIST-1e", "TRAPPIST-1", 6.1, 0.92, 2.4, Confirmed, 2017),
    planet("Proxima Centauri b", "Proxima Centauri", 11.2, 1.27, 3.8, Confirmed, 2016),
    planet("HD 40307g", "HD 40307", 197.8, 2.2, 8.5, Confirmed, 2012),
    planet("Gliese 667Cc", "Gliese 667C", 28.1, 1.54, 4.2, Confirmed, 2011),
    planet("Wolf 1061c", "Wolf 1061", 17.9, 1.64, 3.1, Confirmed, 2015),
    planet("TOI-715b", "TOI-715", 19.3, 1.55, 2.8, Candidate, 2023),
    planet("K2-18b", "K2-18", 32.9, 2.37, 5.1, Confirmed, 2015),
    planet("LHS 1140b", "LHS 1140", 24.7, 1.43, 3.9, Confirmed, 2017),
    planet("Ross 128b", "Ross 128", 9.9, 1.35, 2.1, Confirmed, 2017),
];
