use serde::{Deserialize, Serialize};

use super::errors::ValidationError;

/// Columns the account table can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Geo,
    Time,
}

impl SortColumn {
    pub fn parse(name: &str) -> Result<Self, ValidationError> {
        match name {
            "geo" => Ok(SortColumn::Geo),
            "time" => Ok(SortColumn::Time),
            other => Err(ValidationError::UnknownSortColumn(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// Parses `asc`/`desc`; anything else reads as ascending.
    pub fn parse_lenient(name: &str) -> Self {
        if name.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

/// Current ordering of the account table. `column == None` keeps backend order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortState {
    pub column: Option<SortColumn>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(column: Option<SortColumn>, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    /// Header click: the same column flips direction, a new column starts ascending.
    pub fn toggle(&mut self, column: SortColumn) {
        if self.column == Some(column) {
            self.direction = self.direction.flipped();
        } else {
            self.column = Some(column);
            self.direction = SortDirection::Asc;
        }
    }
}
