//! Compressed-sparse-row encoding of a binary pixel grid.
//!
//! The tracer spends its time asking "is this neighbour pixel marked, and
//! what is its dense index" — a CSR layout over the compacted feature
//! arrays answers both in one short row scan, with no dense `H × W`
//! allocation.

/// CSR grid over `num_rows × num_cols` cells.
///
/// `row_offset` has `num_rows + 1` monotone entries; the columns of row `r`
/// are `column[row_offset[r]..row_offset[r + 1]]`, strictly ascending.
#[derive(Clone, Debug)]
pub struct CsrGrid {
    num_rows: usize,
    num_cols: usize,
    row_offset: Vec<usize>,
    column: Vec<usize>,
}

/// Up to four 4-connected neighbours of a cell, with their dense indices.
#[derive(Clone, Copy, Debug, Default)]
pub struct CellNeis {
    num: usize,
    row: [usize; 4],
    col: [usize; 4],
    nz_idx: [usize; 4],
}

impl CellNeis {
    #[inline]
    pub fn len(&self) -> usize {
        self.num
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num == 0
    }

    /// Iterates `(row, col, nz_idx)` tuples.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        (0..self.num).map(move |i| (self.row[i], self.col[i], self.nz_idx[i]))
    }
}

// neighbour offsets in row-major scan order.
const NEI_OFFSET_ROW: [isize; 4] = [0, -1, 1, 0];
const NEI_OFFSET_COL: [isize; 4] = [-1, 0, 0, 1];

impl CsrGrid {
    /// Builds the grid from ascending row-major linear cell indices (the
    /// compacted feature arrays come out of classification in exactly this
    /// order).
    pub fn new(num_rows: usize, num_cols: usize, nz_coords: &[u32]) -> CsrGrid {
        let num_nz = nz_coords.len();
        let mut column = Vec::with_capacity(num_nz);
        let mut row_offset = vec![0; num_rows + 1];

        let mut next_row = 0;
        for (i, &coord) in nz_coords.iter().enumerate() {
            let coord = coord as usize;
            column.push(coord % num_cols);
            let curr_row = coord / num_cols;

            for j in next_row..=curr_row {
                row_offset[j] = i;
            }

            next_row = curr_row + 1;
        }

        for j in next_row..num_rows + 1 {
            row_offset[j] = num_nz;
        }

        CsrGrid {
            num_rows,
            num_cols,
            row_offset,
            column,
        }
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    #[inline]
    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    #[inline]
    pub fn num_nz(&self) -> usize {
        self.column.len()
    }

    /// Dense index of the non-zero cell at `(row, col)`, if marked.
    pub fn nz(&self, row: usize, col: usize) -> Option<usize> {
        let row_b = self.row_offset[row];
        let row_e = self.row_offset[row + 1];

        // rows are a handful of cells in practice, a linear scan wins.
        self.column[row_b..row_e]
            .iter()
            .position(|&c| c == col)
            .map(|i| row_b + i)
    }

    /// Dense index lookup by linear cell index (`row * num_cols + col`).
    #[inline]
    pub fn nz_linear(&self, linear_index: usize) -> Option<usize> {
        self.nz(linear_index / self.num_cols, linear_index % self.num_cols)
    }

    /// Marked 4-connected neighbours of `(row, col)`. Out-of-bounds
    /// neighbours are skipped.
    pub fn cell_neis(&self, row: usize, col: usize) -> CellNeis {
        let mut neis = CellNeis::default();

        for i in 0..4 {
            let n_r = row as isize + NEI_OFFSET_ROW[i];
            let n_c = col as isize + NEI_OFFSET_COL[i];

            if n_r < 0 || n_r >= self.num_rows as isize || n_c < 0 || n_c >= self.num_cols as isize
            {
                continue;
            }

            if let Some(nz_idx) = self.nz(n_r as usize, n_c as usize) {
                neis.row[neis.num] = n_r as usize;
                neis.col[neis.num] = n_c as usize;
                neis.nz_idx[neis.num] = nz_idx;
                neis.num += 1;
            }
        }

        neis
    }

    /// [`Self::cell_neis`] by linear cell index.
    #[inline]
    pub fn cell_neis_linear(&self, linear_index: usize) -> CellNeis {
        self.cell_neis(linear_index / self.num_cols, linear_index % self.num_cols)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // 4x4 grid with marks at (r0 c1), (r0 c3), (r2 c0), (r2 c1), (r3 c2).
    fn grid() -> CsrGrid {
        CsrGrid::new(4, 4, &[1, 3, 8, 9, 14])
    }

    #[test]
    fn row_offsets_are_monotone_and_padded() {
        let g = grid();
        assert_eq!(g.num_nz(), 5);
        // empty row 1 collapses to an empty range, trailing rows hit num_nz.
        for r in 0..4 {
            assert!(g.row_offset[r] <= g.row_offset[r + 1]);
        }
        assert_eq!(g.row_offset, vec![0, 2, 2, 4, 5]);
    }

    #[test]
    fn lookup_matches_membership() {
        let g = grid();
        let marked = [1usize, 3, 8, 9, 14];

        for linear in 0..16 {
            let hit = g.nz_linear(linear);
            if marked.contains(&linear) {
                let idx = hit.unwrap();
                assert!(idx < g.num_nz());
                // dense index identifies the mark in compaction order.
                assert_eq!(marked[idx], linear);
            } else {
                assert_eq!(hit, None);
            }
        }
    }

    #[test]
    fn columns_strictly_ascend_within_rows() {
        let g = grid();
        for r in 0..g.num_rows() {
            let cols = &g.column[g.row_offset[r]..g.row_offset[r + 1]];
            for w in cols.windows(2) {
                assert!(w[0] < w[1]);
            }
        }
    }

    #[test]
    fn neighbours_are_4_connected_marks() {
        let g = grid();

        // (2, 1) has marked neighbours (2, 0) and (3, 2)? no: (3, 1) is not
        // marked, (1, 1) is not marked -> only (2, 0).
        let neis: Vec<_> = g.cell_neis(2, 1).iter().collect();
        assert_eq!(neis, vec![(2, 0, 2)]);

        // (3, 2) neighbours: nothing marked around it except none;
        // (2, 2) unmarked, (3, 1) and (3, 3) unmarked.
        assert!(g.cell_neis(3, 2).is_empty());

        // corner cell: out-of-bounds neighbours skipped.
        let neis: Vec<_> = g.cell_neis(0, 0).iter().collect();
        assert_eq!(neis, vec![(0, 1, 0)]);
    }

    #[test]
    fn empty_grid() {
        let g = CsrGrid::new(3, 3, &[]);
        assert_eq!(g.num_nz(), 0);
        assert_eq!(g.nz(1, 1), None);
        assert!(g.cell_neis(1, 1).is_empty());
    }
}
