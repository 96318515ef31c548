/// Selection of records by key, independent of any backend.
///
/// A query with the same start and end key targets a single record. Leaving
/// both keys unset selects everything, up to `limit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    fields: Option<Vec<String>>,
    start_key: Option<String>,
    end_key: Option<String>,
    limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the fields loaded for each record (persistent field names).
    pub fn set_fields<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn set_key(&mut self, key: impl Into<String>) -> &mut Self {
        let key = key.into();
        self.start_key = Some(key.clone());
        self.end_key = Some(key);
        self
    }

    pub fn set_start_key(&mut self, key: impl Into<String>) -> &mut Self {
        self.start_key = Some(key.into());
        self
    }

    pub fn set_end_key(&mut self, key: impl Into<String>) -> &mut Self {
        self.end_key = Some(key.into());
        self
    }

    pub fn set_key_range(&mut self, start: impl Into<String>, end: impl Into<String>) -> &mut Self {
        self.set_start_key(start).set_end_key(end)
    }

    pub fn set_limit(&mut self, limit: usize) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    pub fn start_key(&self) -> Option<&str> {
        self.start_key.as_deref()
    }

    pub fn end_key(&self) -> Option<&str> {
        self.end_key.as_deref()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// The single key targeted by this query, if start and end coincide.
    pub fn key(&self) -> Option<&str> {
        match (self.start_key(), self.end_key()) {
            (Some(start), Some(end)) if start == end => Some(start),
            _ => None,
        }
    }
}
