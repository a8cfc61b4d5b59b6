//! Merged-token repair for spectrum blocks.
//!
//! Some loggers write two adjacent three-digit counts into one cell
//! (`"012 007"` or `"012007"`), leaving the block short by one cell per merge.
//! When a block's width differs from its declared width, every cell longer
//! than three characters is split into its first three characters and the
//! remaining suffix. Blocks that already have the declared width are returned
//! unchanged, so repairing twice is the same as repairing once.

use tracing::warn;

const TOKEN_WIDTH: usize = 3;

/// Split one cell into its three-character prefix and trimmed suffix.
///
/// Cells of three characters or fewer are never split, so a block that is
/// short because of small unpadded counts stays short.
fn split_merged(cell: &str) -> (String, Option<String>) {
    let cell = cell.trim();
    match cell.char_indices().nth(TOKEN_WIDTH) {
        Some((at, _)) => {
            let suffix = cell[at..].trim();
            let suffix = (!suffix.is_empty()).then(|| suffix.to_string());
            (cell[..at].to_string(), suffix)
        }
        None => (cell.to_string(), None),
    }
}

/// Repair `cells` if their count differs from `expected`.
///
/// The result may still have the wrong width; callers decide whether that is
/// an error.
pub fn repair_block(field: &str, cells: &[String], expected: usize) -> Vec<String> {
    if cells.len() == expected {
        return cells.to_vec();
    }

    let mut repaired = Vec::with_capacity(expected);
    for cell in cells {
        let (prefix, suffix) = split_merged(cell);
        repaired.push(prefix);
        repaired.extend(suffix);
    }

    warn!(
        "Repaired merged tokens in {}: {} cells -> {} (declared {})",
        field,
        cells.len(),
        repaired.len(),
        expected
    );
    repaired
}
