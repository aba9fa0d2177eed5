//! Compiles `GET /tasks` query-string filters into an owner-scoped
//! `WHERE` / `ORDER BY` / `LIMIT` fragment.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDateTime;

use super::{CompiledQuery, ParamList, SqlParam};
use crate::models::TaskPriority;
use crate::validation::{parse_due_date, FieldError};

/// Columns a list may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Title,
    DueDate,
    Priority,
    Category,
    Completed,
    CreatedAt,
    UpdatedAt,
}

impl SortColumn {
    pub fn column(&self) -> &'static str {
        match self {
            SortColumn::Title => "title",
            SortColumn::DueDate => "due_date",
            SortColumn::Priority => "priority",
            SortColumn::Category => "category",
            SortColumn::Completed => "completed",
            SortColumn::CreatedAt => "created_at",
            SortColumn::UpdatedAt => "updated_at",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "title" => Some(SortColumn::Title),
            "due" | "due_date" => Some(SortColumn::DueDate),
            "priority" => Some(SortColumn::Priority),
            "category" => Some(SortColumn::Category),
            "completed" => Some(SortColumn::Completed),
            "created_at" => Some(SortColumn::CreatedAt),
            "updated_at" => Some(SortColumn::UpdatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// `column` or `column:asc` / `column:desc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub column: SortColumn,
    pub direction: Option<SortDirection>,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Option<Self> {
        let (column, direction) = match raw.split_once(':') {
            Some((column, direction)) => (column, Some(direction)),
            None => (raw, None),
        };
        let direction = match direction.map(str::to_ascii_lowercase).as_deref() {
            None => None,
            Some("asc") => Some(SortDirection::Asc),
            Some("desc") => Some(SortDirection::Desc),
            Some(_) => return None,
        };
        Some(Self {
            column: SortColumn::parse(column)?,
            direction,
        })
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column.column())?;
        match self.direction {
            Some(SortDirection::Asc) => f.write_str(" ASC"),
            Some(SortDirection::Desc) => f.write_str(" DESC"),
            None => Ok(()),
        }
    }
}

/// Parsed list filters. `None` fields contribute nothing to the query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub completed: Option<bool>,
    pub category: Option<String>,
    pub due_before: Option<NaiveDateTime>,
    pub search_title: Option<String>,
    pub priority: Option<TaskPriority>,
    pub sort: Option<SortOrder>,
    pub limit: Option<i64>,
}

impl TaskFilter {
    /// Reads the recognized keys from a decoded query string.
    ///
    /// Empty values count as absent and unknown keys are ignored. A present
    /// value that fails to parse is reported against its key.
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, FieldError> {
        let value = |key: &str| {
            params
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        let completed = value("completed")
            .map(|raw| parse_bool(raw).ok_or_else(|| FieldError::new("completed", "expected a boolean")))
            .transpose()?;
        let due_before = value("due")
            .map(|raw| parse_due_date("due", raw))
            .transpose()?;
        let priority = value("priority")
            .map(|raw| TaskPriority::parse_field("priority", raw))
            .transpose()?;
        let sort = value("sort")
            .map(|raw| {
                SortOrder::parse(raw).ok_or_else(|| FieldError::new("sort", "unsupported sort column"))
            })
            .transpose()?;
        let limit = value("limit")
            .map(|raw| match raw.parse::<i64>() {
                Ok(limit) if limit >= 0 => Ok(limit),
                _ => Err(FieldError::new("limit", "expected a non-negative integer")),
            })
            .transpose()?;

        Ok(Self {
            completed,
            category: value("category").map(str::to_owned),
            due_before,
            search_title: value("search").map(str::to_owned),
            priority,
            sort,
            limit,
        })
    }

    pub fn compile(&self, owner_id: i32) -> CompiledQuery {
        compile_filter(owner_id, self)
    }
}

/// Builds `WHERE user_id = $1 [AND ...] [ORDER BY ...] [LIMIT $n]`.
///
/// Conditions are appended in a fixed order: completed, category, due,
/// search, priority.
pub fn compile_filter(owner_id: i32, filter: &TaskFilter) -> CompiledQuery {
    let mut params = ParamList::default();
    let mut conditions = vec![format!("user_id = {}", params.push(SqlParam::Int(owner_id)))];

    if let Some(completed) = filter.completed {
        conditions.push(format!("completed = {}", params.push(SqlParam::Bool(completed))));
    }
    if let Some(category) = &filter.category {
        conditions.push(format!(
            "category = {}",
            params.push(SqlParam::Text(category.clone()))
        ));
    }
    if let Some(due) = filter.due_before {
        conditions.push(format!("due_date <= {}", params.push(SqlParam::Timestamp(due))));
    }
    if let Some(title) = &filter.search_title {
        conditions.push(format!("title = {}", params.push(SqlParam::Text(title.clone()))));
    }
    if let Some(priority) = filter.priority {
        conditions.push(format!(
            "priority = {}",
            params.push(SqlParam::Priority(priority))
        ));
    }

    let mut sql = format!("WHERE {}", conditions.join(" AND "));
    if let Some(sort) = filter.sort {
        sql.push_str(&format!(" ORDER BY {sort}"));
    }
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {}", params.push(SqlParam::BigInt(limit))));
    }

    CompiledQuery {
        sql,
        params: params.into_inner(),
    }
}

// Same spellings as Go's strconv.ParseBool, which existing clients send.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
