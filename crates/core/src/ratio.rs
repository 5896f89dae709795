//! Paired ratios of background-corrected columns.

use crate::error::PipelineResult;
use crate::table::ColumnTable;

/// Ratio columns of one sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatioMatrix {
    pub table: ColumnTable,
    /// Ratios that came out infinite or NaN (division by zero)
    pub non_finite: usize,
}

/// Header of the `n`-th ratio column (1-based).
#[must_use]
pub fn ratio_header(n: usize) -> String {
    format!("cell {n}")
}

/// Divide each corrected column by its right-hand neighbour.
///
/// Columns are paired at stride 2 from the first; an unpaired last column
/// is ignored. At most `trim_limit` data rows are kept per ratio. A table
/// with fewer than two rows or two columns yields no ratios.
///
/// Division follows IEEE-754: a zero denominator gives an infinite or NaN
/// ratio, which is logged and counted rather than treated as an error.
///
/// # Errors
///
/// Returns `OutOfRange` when the ratio columns cannot be labelled.
pub fn compute_ratios(corrected: &ColumnTable, trim_limit: usize) -> PipelineResult<RatioMatrix> {
    let mut ratios = RatioMatrix::default();
    if corrected.row_count() < 2 || corrected.col_count() < 2 {
        return Ok(ratios);
    }

    for (n, pair) in corrected.columns().chunks_exact(2).enumerate() {
        let (numerator, denominator) = (&pair[0], &pair[1]);
        if numerator.values.len() > trim_limit {
            tracing::debug!("trimmed after {} measurements", trim_limit);
        }

        let values: Vec<f64> = numerator
            .values
            .iter()
            .zip(&denominator.values)
            .take(trim_limit)
            .map(|(a, b)| a / b)
            .collect();

        let column = ratios.table.push(ratio_header(n + 1), values)?;
        for (i, ratio) in column.values.iter().enumerate() {
            if !ratio.is_finite() {
                tracing::warn!(
                    "non-finite ratio {} at {}{} ({} / {})",
                    ratio,
                    column.label,
                    i + 2,
                    numerator.values[i],
                    denominator.values[i]
                );
                ratios.non_finite += 1;
            }
        }
        tracing::debug!(
            "wrote {} ratios to column {}",
            column.values.len(),
            column.label
        );
    }

    Ok(ratios)
}
