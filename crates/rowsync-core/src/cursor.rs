//! Edit-field cursor and tab advancement

use serde::{Deserialize, Serialize};

use crate::column::{Column, navigable_fields};
use crate::error::{GridError, Result};
use crate::row::{Row, RowId};

/// The single (row, field) pair open for editing.
///
/// `field == None` selects the row without opening any field, which is what
/// adding a row does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EditField {
    pub row_id: RowId,
    pub field: Option<String>,
}

impl EditField {
    pub fn new(row_id: RowId, field: impl Into<String>) -> Self {
        Self {
            row_id,
            field: Some(field.into()),
        }
    }

    pub fn row(row_id: RowId) -> Self {
        Self { row_id, field: None }
    }
}

/// Tab direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

/// Compute where the cursor lands after one tab step.
///
/// Moving past the last field of a row continues on the first field of the
/// next non-deleted row and vice versa. Stepping off either end of the grid
/// clears the cursor instead of wrapping. A cursor without a field is
/// returned unchanged.
pub fn next_edit_field<M>(
    cursor: Option<&EditField>,
    columns: &[Column],
    rows: &[Row<M>],
    direction: Direction,
) -> Result<Option<EditField>> {
    let Some(cursor) = cursor else {
        return Ok(None);
    };
    let Some(field) = cursor.field.as_deref() else {
        return Ok(Some(cursor.clone()));
    };

    let fields = navigable_fields(columns);
    let field_index = fields.iter().position(|f| *f == field).ok_or_else(|| {
        GridError::CursorDesync(format!("field '{}' is not an editable column", field))
    })?;

    let live_rows: Vec<RowId> = rows
        .iter()
        .filter(|r| !r.is_deleted())
        .map(|r| r.row_id)
        .collect();
    let row_index = live_rows
        .iter()
        .position(|id| *id == cursor.row_id)
        .ok_or_else(|| {
            GridError::CursorDesync(format!("row {} is not an editable row", cursor.row_id))
        })?;

    let last_field = fields.len() - 1;
    let next = match direction {
        Direction::Forward if field_index < last_field => Some((row_index, field_index + 1)),
        Direction::Forward if row_index + 1 < live_rows.len() => Some((row_index + 1, 0)),
        Direction::Forward => None,
        Direction::Backward if field_index > 0 => Some((row_index, field_index - 1)),
        Direction::Backward if row_index > 0 => Some((row_index - 1, last_field)),
        Direction::Backward => None,
    };

    Ok(next.map(|(r, f)| EditField::new(live_rows[r], fields[f])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{DataColumn, Editor};
    use crate::model::Record;
    use crate::row::SyncAction;
    use pretty_assertions::assert_eq;

    fn columns() -> Vec<Column> {
        vec![
            Column::Data(DataColumn::new("key")),
            Column::Data(DataColumn::new("name").editable(Editor::Text)),
            Column::Data(DataColumn::new("qty").editable(Editor::Number { min: None, max: None })),
        ]
    }

    fn rows(n: usize) -> Vec<Row<Record>> {
        (0..n).map(|i| Row::loaded(Record::new().with("key", i as i64))).collect()
    }

    fn step(cursor: &EditField, rows: &[Row<Record>], direction: Direction) -> Option<EditField> {
        next_edit_field(Some(cursor), &columns(), rows, direction).unwrap()
    }

    #[test]
    fn no_cursor_is_noop() {
        let rows = rows(2);
        assert_eq!(next_edit_field(None, &columns(), &rows, Direction::Forward), Ok(None));
    }

    #[test]
    fn row_selection_without_field_is_unchanged() {
        let rows = rows(2);
        let cursor = EditField::row(rows[0].row_id);
        assert_eq!(step(&cursor, &rows, Direction::Forward), Some(cursor));
    }

    #[test]
    fn moves_within_row() {
        let rows = rows(2);
        let cursor = EditField::new(rows[0].row_id, "name");
        assert_eq!(
            step(&cursor, &rows, Direction::Forward),
            Some(EditField::new(rows[0].row_id, "qty"))
        );
        let cursor = EditField::new(rows[1].row_id, "qty");
        assert_eq!(
            step(&cursor, &rows, Direction::Backward),
            Some(EditField::new(rows[1].row_id, "name"))
        );
    }

    #[test]
    fn crosses_row_boundaries() {
        let rows = rows(2);
        let cursor = EditField::new(rows[0].row_id, "qty");
        assert_eq!(
            step(&cursor, &rows, Direction::Forward),
            Some(EditField::new(rows[1].row_id, "name"))
        );
        let cursor = EditField::new(rows[1].row_id, "name");
        assert_eq!(
            step(&cursor, &rows, Direction::Backward),
            Some(EditField::new(rows[0].row_id, "qty"))
        );
    }

    #[test]
    fn exits_at_grid_edges() {
        let rows = rows(3);
        let last = EditField::new(rows[2].row_id, "qty");
        assert_eq!(step(&last, &rows, Direction::Forward), None);
        let first = EditField::new(rows[0].row_id, "name");
        assert_eq!(step(&first, &rows, Direction::Backward), None);
    }

    #[test]
    fn skips_deleted_rows() {
        let mut rows = rows(3);
        rows[1].sync_action = SyncAction::Deleted;
        let cursor = EditField::new(rows[0].row_id, "qty");
        assert_eq!(
            step(&cursor, &rows, Direction::Forward),
            Some(EditField::new(rows[2].row_id, "name"))
        );
    }

    #[test]
    fn unknown_field_is_desync() {
        let rows = rows(1);
        let cursor = EditField::new(rows[0].row_id, "key");
        let err = next_edit_field(Some(&cursor), &columns(), &rows, Direction::Forward).unwrap_err();
        assert!(matches!(err, GridError::CursorDesync(_)));
    }

    #[test]
    fn unknown_row_is_desync() {
        let rows = rows(1);
        let cursor = EditField::new(RowId::new(), "name");
        let err = next_edit_field(Some(&cursor), &columns(), &rows, Direction::Backward).unwrap_err();
        assert!(matches!(err, GridError::CursorDesync(_)));
    }
}
