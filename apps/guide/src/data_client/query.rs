use serde_json::Value;

/// Tables (and views) exposed by the hosted data API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Places,
    Plans,
    PlanItems,
    Reviews,
    SavedPlaces,
    Users,
    UserProfiles,
    Follows,
    Notifications,
    UserActivities,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Places => "places",
            Table::Plans => "plans",
            Table::PlanItems => "plan_items",
            Table::Reviews => "reviews",
            Table::SavedPlaces => "saved_places",
            Table::Users => "users",
            Table::UserProfiles => "user_profiles",
            Table::Follows => "follows",
            Table::Notifications => "notifications",
            Table::UserActivities => "user_activities",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(&'static str, Value),
    /// Case-insensitive substring match.
    ILike(&'static str, String),
    In(&'static str, Vec<Value>),
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Filter::Eq(column, value.into())
    }

    pub fn contains(column: &'static str, needle: impl Into<String>) -> Self {
        Filter::ILike(column, needle.into())
    }

    pub fn any_of<I, V>(column: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::In(column, values.into_iter().map(Into::into).collect())
    }

    pub fn column(&self) -> &'static str {
        match self {
            Filter::Eq(c, _) | Filter::ILike(c, _) | Filter::In(c, _) => c,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: &'static str,
    pub ascending: bool,
}

/// A read against one table: filters are ANDed, orders apply left to right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: &'static str, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn order_by(mut self, column: &'static str, ascending: bool) -> Self {
        self.order.push(Order { column, ascending });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Renders a JSON scalar the way the data API expects it in a query string.
pub(crate) fn scalar_to_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}
