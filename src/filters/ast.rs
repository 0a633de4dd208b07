/// Thread fields a filter can test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    /// Participant ID, display name or group name (case-insensitive substring)
    With,
    /// Thread kind: `direct` or `group`
    Type,
    /// Last activity on or after a date (YYYY-MM-DD)
    Since,
    /// Whether the viewer has unread messages: `true` or `false`
    Unread,
}

impl FilterField {
    pub fn name(self) -> &'static str {
        match self {
            FilterField::With => "with",
            FilterField::Type => "type",
            FilterField::Since => "since",
            FilterField::Unread => "unread",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    And,
    Or,
}

/// Single field:value test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: FilterField,
    pub value: String,
}

impl FieldFilter {
    pub fn new(field: FilterField, value: impl Into<String>) -> Self {
        Self { field, value: value.into() }
    }
}

/// Flat filter expression, evaluated left to right
///
/// `operators[i]` joins `filters[i]` and `filters[i + 1]`. There is no grouping: without an
/// explicit keyword, repeated fields are OR'd and different fields are AND'd.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterExpr {
    pub filters: Vec<FieldFilter>,
    pub operators: Vec<FilterOperator>,
}

impl FilterExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_filter(&mut self, filter: FieldFilter) {
        self.filters.push(filter);
    }

    pub fn add_operator(&mut self, operator: FilterOperator) {
        self.operators.push(operator);
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
