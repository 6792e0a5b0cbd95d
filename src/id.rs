/// Index of a vertex in `[0, n)`.
pub type VertexId = usize;

/// Index of an arc. Forward arcs and their reverse partners share one index space.
pub type ArcId = usize;
