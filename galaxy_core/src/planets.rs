//! Planetary system generation for frontier stars.
//!
//! Each outer star receives 3–7 planets typed by orbital band (rocky
//! inner worlds, giants at the rim, mixed in between), moons according to
//! planet type, and a 70%-chance asteroid belt for systems with at least
//! five planets. Bodies share their star's map coordinates; the orbital
//! index orders them within the system.

use serde_json::json;

use galaxy_schema::{GalaxyId, NamedStar, PoiKind, PoiRow, RegionKind};

use crate::rng::SeededRng;

const ROMAN_NUMERALS: [&str; 13] = [
    "", "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII",
];

const BELT_DENSITIES: [&str; 3] = ["sparse", "moderate", "dense"];

pub fn generate_planetary_systems(
    galaxy: GalaxyId,
    stars: &[NamedStar],
    rng: &mut SeededRng,
) -> Vec<PoiRow> {
    let mut rows = Vec::new();

    for star in stars {
        let planet_count = rng.int_in(3, 7) as u8;

        for orbital_index in 1..=planet_count {
            let kind = planet_kind(orbital_index, planet_count, rng);
            rows.push(PoiRow {
                galaxy_id: galaxy,
                kind,
                x: star.x,
                y: star.y,
                name: format!(
                    "{} {}",
                    star.name,
                    ROMAN_NUMERALS
                        .get(orbital_index as usize)
                        .copied()
                        .unwrap_or("XIII")
                ),
                region: RegionKind::Outer,
                inhabited: false,
                parent: Some(star.id),
                orbital_index: Some(orbital_index),
                attributes: json!({
                    "orbital_distance": i64::from(orbital_index) * 10 + rng.int_in(0, 5),
                    "size": planet_size(kind),
                }),
            });

            for moon_index in 0..moon_count(kind, rng) {
                rows.push(PoiRow {
                    galaxy_id: galaxy,
                    kind: PoiKind::Moon,
                    x: star.x,
                    y: star.y,
                    name: format!("{} {}{}", star.name, orbital_index, (b'a' + moon_index) as char),
                    region: RegionKind::Outer,
                    inhabited: false,
                    parent: Some(star.id),
                    orbital_index: Some(orbital_index),
                    attributes: json!({
                        "moon_of_orbital_index": orbital_index,
                        "size": if moon_index == 0 { "small" } else { "tiny" },
                    }),
                });
            }
        }

        if planet_count >= 5 && rng.chance(0.7) {
            let belt_index = rng.int_in(3, i64::from(planet_count) - 2) as u8;
            rows.push(PoiRow {
                galaxy_id: galaxy,
                kind: PoiKind::AsteroidBelt,
                x: star.x,
                y: star.y,
                name: format!("{} Asteroid Belt", star.name),
                region: RegionKind::Outer,
                inhabited: false,
                parent: Some(star.id),
                orbital_index: Some(belt_index),
                attributes: json!({
                    "orbital_distance": i64::from(belt_index) * 10 + rng.int_in(0, 5),
                    "density": BELT_DENSITIES[rng.index(BELT_DENSITIES.len())],
                }),
            });
        }
    }

    tracing::debug!(
        target: "galaxy::planets",
        stars = stars.len(),
        bodies = rows.len(),
        "planetary systems generated"
    );

    rows
}

/// Planet type by orbital band: rocky inner worlds, giants at the rim,
/// a mixed middle.
fn planet_kind(orbital_index: u8, total: u8, rng: &mut SeededRng) -> PoiKind {
    if orbital_index <= 2 {
        return if rng.chance(0.7) {
            PoiKind::Terrestrial
        } else {
            PoiKind::Lava
        };
    }
    if orbital_index >= total.saturating_sub(1) {
        return if rng.chance(0.6) {
            PoiKind::IceGiant
        } else {
            PoiKind::GasGiant
        };
    }
    const MIDDLE: [PoiKind; 5] = [
        PoiKind::Terrestrial,
        PoiKind::GasGiant,
        PoiKind::IceGiant,
        PoiKind::SuperEarth,
        PoiKind::Ocean,
    ];
    MIDDLE[rng.index(MIDDLE.len())]
}

fn moon_count(kind: PoiKind, rng: &mut SeededRng) -> u8 {
    match kind {
        PoiKind::GasGiant | PoiKind::IceGiant => rng.int_in(2, 6) as u8,
        PoiKind::Terrestrial | PoiKind::SuperEarth => {
            if rng.chance(0.3) {
                rng.int_in(1, 2) as u8
            } else {
                0
            }
        }
        _ => 0,
    }
}

fn planet_size(kind: PoiKind) -> &'static str {
    match kind {
        PoiKind::GasGiant => "massive",
        PoiKind::IceGiant | PoiKind::SuperEarth => "large",
        PoiKind::Terrestrial | PoiKind::Ocean | PoiKind::Lava => "medium",
        _ => "small",
    }
}
