//! Shared mesh fixtures for unit tests. All boxes use the same
//! outward-wound 12-triangle index set over the standard 8-corner ordering.

/// Cube of edge 2 centered at the origin.
pub const CUBE2_POSITIONS: [[f32; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

/// Unit cube (edge 1) centered at the origin.
pub const UNIT_CUBE_POSITIONS: [[f32; 3]; 8] = [
    [-0.5, -0.5, -0.5],
    [0.5, -0.5, -0.5],
    [0.5, 0.5, -0.5],
    [-0.5, 0.5, -0.5],
    [-0.5, -0.5, 0.5],
    [0.5, -0.5, 0.5],
    [0.5, 0.5, 0.5],
    [-0.5, 0.5, 0.5],
];

/// Large thin box (20 x 1 x 20) centered at the origin, used as a floor.
pub const FLOOR_POSITIONS: [[f32; 3]; 8] = [
    [-10.0, -0.5, -10.0],
    [10.0, -0.5, -10.0],
    [10.0, 0.5, -10.0],
    [-10.0, 0.5, -10.0],
    [-10.0, -0.5, 10.0],
    [10.0, -0.5, 10.0],
    [10.0, 0.5, 10.0],
    [-10.0, 0.5, 10.0],
];

/// Outward-wound triangles for the 8-corner boxes above.
pub const CUBE_TRIANGLES: [[usize; 3]; 12] = [
    [0, 3, 2],
    [0, 2, 1],
    [4, 5, 6],
    [4, 6, 7],
    [0, 1, 5],
    [0, 5, 4],
    [3, 7, 6],
    [3, 6, 2],
    [0, 4, 7],
    [0, 7, 3],
    [1, 2, 6],
    [1, 6, 5],
];

/// Right tetrahedron at the origin with unit legs.
pub const TETRA_POSITIONS: [[f32; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
];

/// Outward-wound faces of [`TETRA_POSITIONS`].
pub const TETRA_TRIANGLES: [[usize; 3]; 4] = [[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];
