//! Sector grid overlay.
//!
//! Divides the galaxy into a `grid_size × grid_size` lattice of named
//! sectors. Rows are named after Greek letters (wrapping with a numeric
//! suffix past Omega), columns are 1-based.

use galaxy_schema::{GalaxyId, SectorRow};

const GREEK_LETTERS: [&str; 24] = [
    "Alpha", "Beta", "Gamma", "Delta", "Epsilon", "Zeta", "Eta", "Theta", "Iota", "Kappa",
    "Lambda", "Mu", "Nu", "Xi", "Omicron", "Pi", "Rho", "Sigma", "Tau", "Upsilon", "Phi", "Chi",
    "Psi", "Omega",
];

pub fn generate_sector_grid(
    galaxy: GalaxyId,
    width: u32,
    height: u32,
    grid_size: u32,
) -> Vec<SectorRow> {
    let sector_width = f64::from(width) / f64::from(grid_size);
    let sector_height = f64::from(height) / f64::from(grid_size);

    let mut rows = Vec::with_capacity((grid_size * grid_size) as usize);
    for grid_y in 0..grid_size {
        let row_name = row_name(grid_y);
        for grid_x in 0..grid_size {
            rows.push(SectorRow {
                galaxy_id: galaxy,
                name: format!("{row_name}-{}", grid_x + 1),
                grid_x,
                grid_y,
                x_min: f64::from(grid_x) * sector_width,
                x_max: f64::from(grid_x + 1) * sector_width,
                y_min: f64::from(grid_y) * sector_height,
                y_max: f64::from(grid_y + 1) * sector_height,
                danger_level: 0,
            });
        }
    }
    rows
}

fn row_name(grid_y: u32) -> String {
    let letter = GREEK_LETTERS[(grid_y as usize) % GREEK_LETTERS.len()];
    if (grid_y as usize) >= GREEK_LETTERS.len() {
        format!("{letter}-{}", grid_y as usize / GREEK_LETTERS.len())
    } else {
        letter.to_string()
    }
}
