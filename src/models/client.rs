#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// A client that has not been stored yet, together with its initial phones.
#[derive(Debug, Clone, Default)]
pub struct NewClient {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phones: Vec<String>,
}

impl NewClient {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phones: Vec::new(),
        }
    }

    pub fn with_phones<I, S>(mut self, phones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.phones = phones.into_iter().map(Into::into).collect();
        self
    }
}

/// Fields to change on an existing client.
///
/// `None` and `Some("")` mean the same thing here: the field is left as it
/// is. Likewise `Some(vec![])` for `phones` keeps the current phone set
/// instead of clearing it. A non-empty `phones` replaces every phone row of
/// the client.
#[derive(Debug, Clone, Default)]
pub struct ClientChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phones: Option<Vec<String>>,
}

impl ClientChanges {
    /// Phones to store, if the caller asked for a replacement.
    pub fn replacement_phones(&self) -> Option<&[String]> {
        self.phones
            .as_deref()
            .filter(|phones| !phones.is_empty())
    }
}

/// Search criteria; every non-empty field must match.
#[derive(Debug, Clone, Default)]
pub struct ClientFilter {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}
