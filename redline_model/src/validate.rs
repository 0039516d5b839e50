use crate::error::malformed;
use crate::{Block, Document, Inline, ModelError, Paragraph, Table};

/// Deepest table nesting accepted by [`Document::validate`].
pub const MAX_TABLE_DEPTH: usize = 32;

const MAX_NUMBERING_LEVEL: u8 = 8;

impl Document {
    /// Check structural invariants without recursing on the call stack.
    ///
    /// - every table has at least one row and a non-empty grid
    /// - the grid spans of each row add up to the grid width
    /// - every cell holds at least one block
    /// - table nesting stays within [`MAX_TABLE_DEPTH`]
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut pending: Vec<(&[Block], Vec<usize>, usize)> =
            vec![(self.blocks.as_slice(), Vec::new(), 0)];

        while let Some((blocks, prefix, depth)) = pending.pop() {
            for (idx, block) in blocks.iter().enumerate() {
                let mut path = prefix.clone();
                path.push(idx);

                match block {
                    Block::Paragraph(paragraph) => validate_paragraph(paragraph, &path)?,
                    Block::SectionBreak(_) => {}
                    Block::Table(table) => {
                        if depth + 1 > MAX_TABLE_DEPTH {
                            return Err(malformed(
                                &path,
                                format!("tables nested deeper than {MAX_TABLE_DEPTH} levels"),
                            ));
                        }
                        validate_table_shape(table, &path)?;
                        for (row_idx, row) in table.rows.iter().enumerate() {
                            for (cell_idx, cell) in row.cells.iter().enumerate() {
                                let mut cell_path = path.clone();
                                cell_path.push(row_idx);
                                cell_path.push(cell_idx);
                                pending.push((cell.blocks.as_slice(), cell_path, depth + 1));
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

fn validate_paragraph(paragraph: &Paragraph, path: &[usize]) -> Result<(), ModelError> {
    if let Some(numbering) = paragraph.props.numbering
        && numbering.level > MAX_NUMBERING_LEVEL
    {
        return Err(malformed(
            path,
            format!(
                "numbering level {} exceeds {MAX_NUMBERING_LEVEL}",
                numbering.level
            ),
        ));
    }

    for inline in &paragraph.content {
        if let Inline::Tracked(group) = inline
            && group.runs.is_empty()
        {
            return Err(malformed(path, "revision marker without runs"));
        }
    }

    Ok(())
}

fn validate_table_shape(table: &Table, path: &[usize]) -> Result<(), ModelError> {
    if table.grid.is_empty() {
        return Err(malformed(path, "table has an empty column grid"));
    }
    if table.rows.is_empty() {
        return Err(malformed(path, "table has no rows"));
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let mut row_path = path.to_vec();
        row_path.push(row_idx);

        let mut spanned = 0usize;
        for (cell_idx, cell) in row.cells.iter().enumerate() {
            let mut cell_path = row_path.clone();
            cell_path.push(cell_idx);
            if cell.props.grid_span == 0 {
                return Err(malformed(&cell_path, "cell spans zero grid columns"));
            }
            if cell.blocks.is_empty() {
                return Err(malformed(&cell_path, "cell holds no blocks"));
            }
            spanned += cell.props.grid_span as usize;
        }

        if spanned != table.grid.len() {
            return Err(malformed(
                &row_path,
                format!(
                    "row spans {spanned} grid columns but the table declares {}",
                    table.grid.len()
                ),
            ));
        }
    }

    Ok(())
}
