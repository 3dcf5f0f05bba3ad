use crate::{coord, Coord, CoordNum, Error, Rect};

/// Obstacles represented as a set of convex 2-d polygons.
///
/// Vertices are stored in counter-clockwise order, all polygons concatenated
/// into one flat buffer. The index of a polygon doubles as its obstacle
/// identifier throughout the corridormap pipeline.
///
/// # Examples
///
/// ```
/// use corridormap_types::{coord, Footprint};
///
/// let footprint = Footprint::from_polygons(vec![
///     vec![
///         coord! { x: 10., y: 20. },
///         coord! { x: 50., y: 20. },
///         coord! { x: 30., y: 50. },
///     ],
/// ])
/// .unwrap();
///
/// assert_eq!(footprint.num_polys(), 1);
/// assert_eq!(footprint.polygon(0).len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Footprint<T: CoordNum = f32> {
    verts: Vec<Coord<T>>,
    // polygon i occupies verts[poly_offsets[i]..poly_offsets[i + 1]].
    poly_offsets: Vec<usize>,
}

impl<T: CoordNum> Footprint<T> {
    /// Builds a footprint from per-polygon vertex lists.
    ///
    /// Every polygon must have at least three vertices, in CCW order.
    pub fn from_polygons(polys: Vec<Vec<Coord<T>>>) -> Result<Self, Error> {
        let mut verts = Vec::with_capacity(polys.iter().map(Vec::len).sum());
        let mut poly_offsets = Vec::with_capacity(polys.len() + 1);
        poly_offsets.push(0);

        for (index, poly) in polys.into_iter().enumerate() {
            if poly.len() < 3 {
                return Err(Error::DegeneratePolygon {
                    index,
                    num_verts: poly.len(),
                });
            }
            verts.extend(poly);
            poly_offsets.push(verts.len());
        }

        Ok(Footprint { verts, poly_offsets })
    }

    /// Builds a footprint from the flat-array input format: parallel `x` and
    /// `y` coordinate arrays (all polygons concatenated, CCW each) and a
    /// per-polygon vertex count array.
    pub fn from_arrays(x: &[T], y: &[T], num_poly_verts: &[usize]) -> Result<Self, Error> {
        let declared: usize = num_poly_verts.iter().sum();
        let supplied = x.len().min(y.len());
        if declared > supplied {
            return Err(Error::MismatchedVertexCount { declared, supplied });
        }

        let mut verts = Vec::with_capacity(declared);
        let mut poly_offsets = Vec::with_capacity(num_poly_verts.len() + 1);
        poly_offsets.push(0);

        let mut first = 0;
        for (index, &nverts) in num_poly_verts.iter().enumerate() {
            if nverts < 3 {
                return Err(Error::DegeneratePolygon {
                    index,
                    num_verts: nverts,
                });
            }
            for i in first..first + nverts {
                verts.push(coord! { x: x[i], y: y[i] });
            }
            poly_offsets.push(verts.len());
            first += nverts;
        }

        Ok(Footprint { verts, poly_offsets })
    }

    /// The number of polygons.
    #[inline]
    pub fn num_polys(&self) -> usize {
        self.poly_offsets.len() - 1
    }

    /// The total number of vertices across all polygons.
    #[inline]
    pub fn num_verts(&self) -> usize {
        self.verts.len()
    }

    /// Vertices of polygon `i` in CCW order.
    #[inline]
    pub fn polygon(&self, i: usize) -> &[Coord<T>] {
        &self.verts[self.poly_offsets[i]..self.poly_offsets[i + 1]]
    }

    /// Index of polygon `i`'s first vertex in [`Self::verts`].
    #[inline]
    pub fn polygon_offset(&self, i: usize) -> usize {
        self.poly_offsets[i]
    }

    /// All vertices, polygons concatenated.
    #[inline]
    pub fn verts(&self) -> &[Coord<T>] {
        &self.verts
    }

    /// Iterator over the polygons in obstacle-id order.
    pub fn polygons(&self) -> impl Iterator<Item = &[Coord<T>]> + '_ {
        (0..self.num_polys()).map(move |i| self.polygon(i))
    }

    /// Axis-aligned bounding rectangle of all vertices, or `None` for an
    /// empty footprint.
    pub fn bounding_rect(&self) -> Option<Rect<T>> {
        let first = *self.verts.first()?;
        let mut min = first;
        let mut max = first;

        for v in &self.verts[1..] {
            if v.x < min.x {
                min.x = v.x;
            }
            if v.y < min.y {
                min.y = v.y;
            }
            if v.x > max.x {
                max.x = v.x;
            }
            if v.y > max.y {
                max.y = v.y;
            }
        }

        Some(Rect::new(min, max))
    }
}
