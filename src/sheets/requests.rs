//! Request bodies for `spreadsheets:batchUpdate`.

use serde::Serialize;

/// One entry of a batch update. Serializes as `{"<requestName>": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    ClearBasicFilter(ClearBasicFilter),
    UpdateSheetProperties(UpdateSheetProperties),
    RepeatCell(RepeatCell),
    DeleteDimension(DeleteDimension),
}

impl Request {
    pub fn clear_basic_filter(sheet_id: i64) -> Self {
        Request::ClearBasicFilter(ClearBasicFilter { sheet_id })
    }

    /// Sets the frozen row and column counts of a sheet.
    pub fn freeze(sheet_id: i64, rows: usize, cols: usize) -> Self {
        Request::UpdateSheetProperties(UpdateSheetProperties {
            properties: SheetPropertiesUpdate {
                sheet_id,
                grid_properties: GridPropertiesUpdate {
                    frozen_row_count: Some(rows),
                    frozen_column_count: Some(cols),
                },
            },
            fields: "gridProperties.frozenRowCount,gridProperties.frozenColumnCount".to_string(),
        })
    }

    /// Sets only the frozen row count, leaving frozen columns alone.
    pub fn freeze_rows(sheet_id: i64, rows: usize) -> Self {
        Request::UpdateSheetProperties(UpdateSheetProperties {
            properties: SheetPropertiesUpdate {
                sheet_id,
                grid_properties: GridPropertiesUpdate {
                    frozen_row_count: Some(rows),
                    frozen_column_count: None,
                },
            },
            fields: "gridProperties.frozenRowCount".to_string(),
        })
    }

    /// Applies `format` to every cell of `range`.
    pub fn format(range: GridRange, format: CellFormat) -> Self {
        Request::RepeatCell(RepeatCell {
            range,
            cell: CellData {
                user_entered_format: format,
            },
            fields: "userEnteredFormat(backgroundColor,horizontalAlignment,textFormat)"
                .to_string(),
        })
    }

    /// Deletes rows `start..=end` (1-based, inclusive).
    pub fn delete_rows(sheet_id: i64, start: usize, end: usize) -> Self {
        Request::DeleteDimension(DeleteDimension {
            range: DimensionRange {
                sheet_id,
                dimension: Dimension::Rows,
                start_index: start.saturating_sub(1),
                end_index: end,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearBasicFilter {
    pub sheet_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSheetProperties {
    pub properties: SheetPropertiesUpdate,
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetPropertiesUpdate {
    pub sheet_id: i64,
    pub grid_properties: GridPropertiesUpdate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridPropertiesUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frozen_row_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frozen_column_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatCell {
    pub range: GridRange,
    pub cell: CellData,
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    pub user_entered_format: CellFormat,
}

/// Half-open, 0-based cell rectangle on one sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRange {
    pub sheet_id: i64,
    pub start_row_index: usize,
    pub end_row_index: usize,
    pub start_column_index: usize,
    pub end_column_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDimension {
    pub range: DimensionRange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionRange {
    pub sheet_id: i64,
    pub dimension: Dimension,
    pub start_index: usize,
    pub end_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Dimension {
    Rows,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellFormat {
    pub background_color: Color,
    pub horizontal_alignment: HorizontalAlignment,
    pub text_format: TextFormat,
}

impl CellFormat {
    /// White background, centered, black 10pt regular text.
    pub fn plain_centered() -> Self {
        Self {
            background_color: Color::WHITE,
            horizontal_alignment: HorizontalAlignment::Center,
            text_format: TextFormat {
                foreground_color: Color::BLACK,
                font_size: 10,
                bold: false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Color {
    pub const WHITE: Color = Color {
        red: 1.0,
        green: 1.0,
        blue: 1.0,
    };
    pub const BLACK: Color = Color {
        red: 0.0,
        green: 0.0,
        blue: 0.0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HorizontalAlignment {
    Center,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFormat {
    pub foreground_color: Color,
    pub font_size: u32,
    pub bold: bool,
}
