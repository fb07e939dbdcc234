//! Textual stage layouts: one string per row, `#` enabled and `.` disabled.

use formation_core::{StageLayoutMask, GRID_COLUMNS, GRID_ROWS, TILE_COUNT};

pub(crate) fn parse_mask(rows: &[String]) -> Result<StageLayoutMask, String> {
    if rows.len() != GRID_ROWS {
        return Err(format!("expected {GRID_ROWS} rows, found {}", rows.len()));
    }

    let mut flags = [false; TILE_COUNT];
    for (row_index, row) in rows.iter().enumerate() {
        let cells: Vec<char> = row.trim().chars().collect();
        if cells.len() != GRID_COLUMNS {
            return Err(format!(
                "row {row_index} has {} tiles, expected {GRID_COLUMNS}",
                cells.len()
            ));
        }
        for (column, cell) in cells.into_iter().enumerate() {
            flags[row_index * GRID_COLUMNS + column] = match cell {
                '#' => true,
                '.' => false,
                other => {
                    return Err(format!("row {row_index} contains unexpected `{other}`"));
                }
            };
        }
    }

    Ok(StageLayoutMask::from_flags(flags))
}
