//! Area geometry constants.

/// Height the elevation ray starts from
pub const ELEVATION_TEST_Z: f32 = 1024.0;
/// Height above the feet used for creature obstacle tests
pub const CREATURE_OBSTACLE_TEST_Z: f32 = 0.1;
/// Height of the eyes used for line-of-sight tests
pub const LINE_OF_SIGHT_TEST_Z: f32 = 1.6;
/// Triggers farther than this from a creature are not tested
pub const MAX_DISTANCE_TO_TEST_TRIGGER: f32 = 8.0;
/// Distance at which a move-to-point action counts as arrived
pub const ARRIVAL_DISTANCE: f32 = 0.1;
