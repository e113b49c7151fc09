//! Weighted-random "AI" classification of catalog planets.
//!
//! The output is biased by the planet's recorded status, radius and orbital
//! period but is otherwise random. Nothing here is trained.

use rand::Rng;

use super::planets::{Exoplanet, PlanetStatus};

pub const LABELS: [PlanetStatus; 3] = [
    PlanetStatus::Confirmed,
    PlanetStatus::Candidate,
    PlanetStatus::FalsePositive,
];

/// Normalized probabilities for [`LABELS`].
pub fn weights(planet: &Exoplanet) -> [f64; 3] {
    let mut w = match planet.status {
        PlanetStatus::Confirmed => [0.7, 0.2, 0.1],
        PlanetStatus::Candidate => [0.3, 0.5, 0.2],
        PlanetStatus::FalsePositive => [0.4, 0.4, 0.2],
    };
    if planet.planet_radius < 1.0 {
        w[0] *= 0.8;
        w[1] *= 1.2;
    }
    if planet.orbital_period < 5.0 {
        w[2] *= 1.5;
    }
    let total: f64 = w.iter().sum();
    w.map(|x| x / total)
}

/// First label whose cumulative weight reaches `r`.
pub fn pick(weights: &[f64; 3], r: f64) -> PlanetStatus {
    let mut cumulative = 0.0_f64;
    for (label, w) in LABELS.iter().zip(weights) {
        cumulative += w;
        if r <= cumulative {
            return *label;
        }
    }
    LABELS[0]
}

pub fn predict<R: Rng + ?Sized>(planet: &Exoplanet, rng: &mut R) -> PlanetStatus {
    pick(&weights(planet), rng.gen::<f64>())
}

/// Confidence percentage in `[45, 95]` for jitter `r` in `[0, 1)`.
pub fn confidence_with(planet: &Exoplanet, r: f64) -> u8 {
    let mut base: f64 = 75.0;
    match planet.status {
        PlanetStatus::Confirmed => base += 15.0,
        PlanetStatus::Candidate => base += 5.0,
        PlanetStatus::FalsePositive => {}
    }
    if planet.planet_radius > 1.5 {
        base += 10.0;
    } else if planet.planet_radius < 1.0 {
        base -= 15.0;
    }
    if planet.orbital_period > 30.0 {
        base += 5.0;
    } else if planet.orbital_period < 10.0 {
        base -= 10.0;
    }
    base += (r - 0.5) * 20.0;
    base.round().clamp(45.0, 95.0) as u8
}

pub fn confidence<R: Rng + ?Sized>(planet: &Exoplanet, rng: &mut R) -> u8 {
    confidence_with(planet, rng.gen::<f64>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explorer::planets::EXOPLANETS;
    use rand::{rngs::StdRng, SeedableRng};

    fn find(name: &str) -> Option<&'static Exoplanet> {
        EXOPLANETS.iter().find(|p| p.planet_name == name)
    }

    fn close(a: [f64; 3], b: [f64; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn status_sets_base_weights() {
        let kepler = find("Kepler-452b").unwrap();
        assert!(close(weights(kepler), [0.7, 0.2, 0.1]));
        let toi = find("TOI-715b").unwrap();
        assert!(close(weights(toi), [0.3, 0.5, 0.2]));
    }

    #[test]
    fn small_planets_shift_towards_candidate() {
        let trappist = find("TRAPPIST-1e").unwrap();
        // [0.56, 0.24, 0.1] / 0.9
        assert!(close(weights(trappist), [0.56 / 0.9, 0.24 / 0.9, 0.1 / 0.9]));
    }

    #[test]
    fn short_periods_favor_false_positive() {
        let mut hot = *find("Kepler-452b").unwrap();
        hot.orbital_period = 3.0;
        // [0.7, 0.2, 0.15] / 1.05
        assert!(close(weights(&hot), [0.7 / 1.05, 0.2 / 1.05, 0.15 / 1.05]));
    }

    #[test]
    fn pick_walks_cumulative_weights() {
        let w = [0.7, 0.2, 0.1];
        assert_eq!(pick(&w, 0.0), PlanetStatus::Confirmed);
        assert_eq!(pick(&w, 0.69), PlanetStatus::Confirmed);
        assert_eq!(pick(&w, 0.85), PlanetStatus::Candidate);
        assert_eq!(pick(&w, 0.95), PlanetStatus::FalsePositive);
        assert_eq!(pick(&[0.0, 0.0, 0.0], 0.5), PlanetStatus::Confirmed);
    }

    #[test]
    fn confidence_is_adjusted_and_clamped() {
        let kepler = find("Kepler-452b").unwrap();
        assert_eq!(confidence_with(kepler, 0.5), 95);
        let trappist = find("TRAPPIST-1e").unwrap();
        assert_eq!(confidence_with(trappist, 0.5), 65);
        assert_eq!(confidence_with(trappist, 0.0), 55);
        let toi = find("TOI-715b").unwrap();
        // 75 + 5 + 10 = 90
        assert_eq!(confidence_with(toi, 0.5), 90);
    }

    #[test]
    fn random_outputs_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for planet in EXOPLANETS.iter() {
            for _ in 0..50 {
                let c = confidence(planet, &mut rng);
                assert!((45..=95).contains(&c));
                let _ = predict(planet, &mut rng);
            }
        }
    }
}
