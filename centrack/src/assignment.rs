/// Greedy nearest-neighbor assignment between tracked and detected centroids
///
/// Rows of the cost matrix are existing objects (in ascending id order),
/// columns are the centroids detected in the current frame (in input order).
use crate::bbox::Centroid;
use ndarray::{Array2, ArrayView2};

/// Result of greedy assignment
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentResult {
    /// Assignments as (row_idx, col_idx) pairs, in selection order
    pub assignments: Vec<(usize, usize)>,
    /// Indices of rows that received no column
    pub unassigned_rows: Vec<usize>,
    /// Indices of columns that received no row
    pub unassigned_cols: Vec<usize>,
    /// Sum of the selected costs
    pub total_cost: f64,
}

/// Pairwise Euclidean distances, shape (rows.len(), cols.len())
pub fn distance_matrix(rows: &[Centroid], cols: &[Centroid]) -> Array2<f64> {
    Array2::from_shape_fn((rows.len(), cols.len()), |(i, j)| rows[i].distance(&cols[j]))
}

/// Repeatedly take the globally smallest remaining cost, retiring its row and column.
///
/// Equal costs are resolved by lowest row, then lowest column, so the result is
/// fully determined by the matrix. Stops once every row or every column is used.
pub fn greedy_assign(cost_matrix: ArrayView2<f64>) -> AssignmentResult {
    let num_rows = cost_matrix.nrows();
    let num_cols = cost_matrix.ncols();

    if num_rows == 0 || num_cols == 0 {
        return AssignmentResult {
            assignments: Vec::new(),
            unassigned_rows: (0..num_rows).collect(),
            unassigned_cols: (0..num_cols).collect(),
            total_cost: 0.0,
        };
    }

    let mut candidates: Vec<(f64, usize, usize)> = cost_matrix
        .indexed_iter()
        .map(|((i, j), &cost)| (cost, i, j))
        .collect();

    // Sort by cost (ascending), then row, then column
    candidates.sort_by(|a, b| {
        a.0.total_cmp(&b.0)
            .then(a.1.cmp(&b.1))
            .then(a.2.cmp(&b.2))
    });

    let limit = num_rows.min(num_cols);
    let mut assignments = Vec::with_capacity(limit);
    let mut used_rows = vec![false; num_rows];
    let mut used_cols = vec![false; num_cols];
    let mut total_cost = 0.0;

    for (cost, row, col) in candidates {
        if assignments.len() == limit {
            break;
        }
        if !used_rows[row] && !used_cols[col] {
            assignments.push((row, col));
            used_rows[row] = true;
            used_cols[col] = true;
            total_cost += cost;
        }
    }

    let unassigned_rows: Vec<usize> = (0..num_rows).filter(|&i| !used_rows[i]).collect();
    let unassigned_cols: Vec<usize> = (0..num_cols).filter(|&j| !used_cols[j]).collect();

    AssignmentResult {
        assignments,
        unassigned_rows,
        unassigned_cols,
        total_cost,
    }
}

impl AssignmentResult {
    /// Per-row view: `result[row] = Some(col)` when the row was matched
    pub fn row_matches(&self, num_rows: usize) -> Vec<Option<usize>> {
        let mut matches = vec![None; num_rows];
        for &(row, col) in &self.assignments {
            matches[row] = Some(col);
        }
        matches
    }
}
