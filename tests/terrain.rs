mod common;

use approx::assert_relative_eq;

use skylane::GameConfig;

use crate::common::{ready_world, session_config};

#[test]
fn test_full_size_island_invariants() {
    let world = ready_world(GameConfig::default(), 17);
    let terrain = world.terrain().expect("terrain ready");
    let size = terrain.size();
    assert_eq!(size, 257);
    assert_eq!(terrain.heights().len(), size * size);
    assert_eq!(terrain.indices().len(), 6 * (size - 1) * (size - 1));

    for row in 0..size {
        for col in 0..size {
            let p = terrain.position(row, col);
            assert!(p.z >= 0.0, "underwater vertex at ({row}, {col})");
            assert_relative_eq!(terrain.normal(row, col).norm(), 1.0, epsilon = 1e-9);
        }
    }
}

#[test]
fn test_runways_are_flat_and_at_sea_level() {
    let world = ready_world(GameConfig::default(), 17);
    let terrain = world.terrain().expect("terrain ready");

    // Both runway corridors sit exactly at height zero along the centerline.
    for y in [-0.99, -0.95, -0.91, 0.91, 0.95, 0.99] {
        assert_relative_eq!(terrain.height_at(0.0, y).unwrap(), 0.0);
    }
}

#[test]
fn test_island_interior_rises_above_the_shore() {
    let world = ready_world(GameConfig::default(), 17);
    let terrain = world.terrain().expect("terrain ready");

    // The central ridge must clear the snow line somewhere; the seeded peak
    // is at 0.8 before displacement.
    let highest = terrain.heights().iter().cloned().fold(0.0, f64::max);
    assert!(highest > world.config().terrain.snow_line);
}

#[test]
fn test_surface_lookup_agrees_with_vertices() {
    let world = ready_world(session_config(), 9);
    let terrain = world.terrain().expect("terrain ready");
    let size = terrain.size();

    // Sampling exactly on a vertex returns that vertex height.
    for row in 0..size - 1 {
        for col in 0..size - 1 {
            let p = terrain.position(row, col);
            assert_relative_eq!(
                terrain.height_at(p.x, p.y).unwrap(),
                p.z,
                epsilon = 1e-12,
                max_relative = 1e-12,
            );
        }
    }

    // Off the grid there is no surface.
    assert!(terrain.height_at(1.5, 0.0).is_none());
    assert!(terrain.height_at(0.0, -1.5).is_none());
}
