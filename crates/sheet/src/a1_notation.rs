use crate::error::{Result, SheetError};

/// Parse A1-style cell notation (e.g., "A1", "Z99", "AA1")
/// Returns (row, column) as 0-based indices
pub fn parse_a1(notation: &str) -> Result<(usize, usize)> {
    let notation = notation.trim().to_uppercase();
    let split_pos = notation
        .bytes()
        .position(|b| b.is_ascii_digit())
        .ok_or_else(|| SheetError::InvalidCellNotation(notation.clone()))?;

    if split_pos == 0 {
        return Err(SheetError::InvalidCellNotation(notation));
    }

    let (col_part, row_part) = notation.split_at(split_pos);
    let col = parse_column_letters(col_part)
        .ok_or_else(|| SheetError::InvalidCellNotation(notation.clone()))?;
    let row = row_part
        .parse::<usize>()
        .map_err(|_| SheetError::InvalidCellNotation(notation.clone()))?;

    // Rows are 1-based in A1 notation
    if row == 0 {
        return Err(SheetError::InvalidCellNotation(notation));
    }

    Ok((row - 1, col))
}

/// Convert column letters to 0-based column index
/// A=0, B=1, ... Z=25, AA=26, AB=27, ...
fn parse_column_letters(col_str: &str) -> Option<usize> {
    if col_str.is_empty() {
        return None;
    }

    let mut col = 0usize;
    for b in col_str.bytes() {
        if !b.is_ascii_uppercase() {
            return None;
        }
        col = col.checked_mul(26)?.checked_add(usize::from(b - b'A') + 1)?;
    }

    Some(col - 1)
}

/// Convert 0-based column index to column letters
/// 0=A, 1=B, ... 25=Z, 26=AA, 27=AB, ...
pub fn column_index_to_letters(mut col: usize) -> String {
    let mut result = String::new();
    col += 1;

    while col > 0 {
        col -= 1;
        result.insert(0, ((col % 26) as u8 + b'A') as char);
        col /= 26;
    }

    result
}
