use std::fmt;

#[derive(Debug, PartialEq)]
pub enum Error {
    /// A footprint polygon has fewer than three vertices.
    DegeneratePolygon { index: usize, num_verts: usize },
    /// The flat-array footprint input declares more polygon vertices than
    /// the coordinate arrays supply.
    MismatchedVertexCount { declared: usize, supplied: usize },
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::DegeneratePolygon { index, num_verts } => {
                write!(
                    f,
                    "footprint polygon {} has {} vertices, expected at least 3",
                    index, num_verts
                )
            }
            Error::MismatchedVertexCount { declared, supplied } => {
                write!(
                    f,
                    "footprint declares {} polygon vertices but supplies {}",
                    declared, supplied
                )
            }
        }
    }
}
