use sqlx::{Postgres, QueryBuilder};

use crate::models::{ClientChanges, ClientFilter};

const SELECT_CLIENTS: &str = "SELECT id, first_name, last_name, email FROM clients WHERE ";

/// Treats an empty string the same as a missing value.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Builds the search query for `filter`.
///
/// Returns `None` when no criterion is set, so the caller can answer with
/// an empty result instead of listing every client.
pub fn find_clients(filter: &ClientFilter) -> Option<QueryBuilder<'_, Postgres>> {
    let first_name = present(&filter.first_name);
    let last_name = present(&filter.last_name);
    let email = present(&filter.email);
    let phone = present(&filter.phone);

    if first_name.is_none() && last_name.is_none() && email.is_none() && phone.is_none() {
        return None;
    }

    let mut builder = QueryBuilder::<Postgres>::new(SELECT_CLIENTS);
    let mut conditions = builder.separated(" AND ");
    if let Some(first_name) = first_name {
        conditions.push("first_name = ").push_bind_unseparated(first_name);
    }
    if let Some(last_name) = last_name {
        conditions.push("last_name = ").push_bind_unseparated(last_name);
    }
    if let Some(email) = email {
        conditions.push("email = ").push_bind_unseparated(email);
    }
    if let Some(phone) = phone {
        conditions
            .push("id IN (SELECT client_id FROM phones WHERE phone = ")
            .push_bind_unseparated(phone)
            .push_unseparated(")");
    }
    builder.push(" ORDER BY id");

    Some(builder)
}

/// Builds the `UPDATE clients` statement for the scalar fields of `changes`.
///
/// Returns `None` when there is nothing to set. Phones are not handled here.
pub fn update_client(id: i32, changes: &ClientChanges) -> Option<QueryBuilder<'_, Postgres>> {
    let first_name = present(&changes.first_name);
    let last_name = present(&changes.last_name);
    let email = present(&changes.email);

    if first_name.is_none() && last_name.is_none() && email.is_none() {
        return None;
    }

    let mut builder = QueryBuilder::<Postgres>::new("UPDATE clients SET ");
    let mut assignments = builder.separated(", ");
    if let Some(first_name) = first_name {
        assignments.push("first_name = ").push_bind_unseparated(first_name);
    }
    if let Some(last_name) = last_name {
        assignments.push("last_name = ").push_bind_unseparated(last_name);
    }
    if let Some(email) = email {
        assignments.push("email = ").push_bind_unseparated(email);
    }
    builder.push(" WHERE id = ").push_bind(id);

    Some(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_criteria() -> ClientFilter {
        ClientFilter::default()
    }

    #[test]
    fn no_criteria_builds_nothing() {
        assert!(find_clients(&no_criteria()).is_none());
    }

    #[test]
    fn empty_strings_count_as_missing_criteria() {
        let filter = ClientFilter {
            first_name: Some(String::new()),
            email: Some(String::new()),
            ..no_criteria()
        };
        assert!(find_clients(&filter).is_none());
    }

    #[test]
    fn single_criterion() {
        let filter = ClientFilter {
            last_name: Some("Petrov".into()),
            ..no_criteria()
        };
        let builder = find_clients(&filter).unwrap();
        assert_eq!(
            builder.sql(),
            "SELECT id, first_name, last_name, email FROM clients WHERE last_name = $1 ORDER BY id"
        );
    }

    #[test]
    fn criteria_are_joined_with_and() {
        let filter = ClientFilter {
            first_name: Some("Ivan".into()),
            last_name: Some("Ivanov".into()),
            email: Some("ivan@example.com".into()),
            phone: Some("+79001234567".into()),
        };
        let builder = find_clients(&filter).unwrap();
        assert_eq!(
            builder.sql(),
            "SELECT id, first_name, last_name, email FROM clients WHERE \
             first_name = $1 AND last_name = $2 AND email = $3 AND \
             id IN (SELECT client_id FROM phones WHERE phone = $4) ORDER BY id"
        );
    }

    #[test]
    fn phone_uses_subquery() {
        let filter = ClientFilter {
            phone: Some("+79009876543".into()),
            ..no_criteria()
        };
        let builder = find_clients(&filter).unwrap();
        assert_eq!(
            builder.sql(),
            "SELECT id, first_name, last_name, email FROM clients WHERE \
             id IN (SELECT client_id FROM phones WHERE phone = $1) ORDER BY id"
        );
    }

    #[test]
    fn update_without_fields_builds_nothing() {
        let changes = ClientChanges {
            first_name: Some(String::new()),
            phones: Some(vec!["+79001234567".into()]),
            ..ClientChanges::default()
        };
        assert!(update_client(1, &changes).is_none());
    }

    #[test]
    fn update_skips_empty_fields() {
        let changes = ClientChanges {
            first_name: Some(String::new()),
            last_name: Some("Sidorova".into()),
            email: Some("sveta@example.com".into()),
            phones: None,
        };
        let builder = update_client(3, &changes).unwrap();
        assert_eq!(
            builder.sql(),
            "UPDATE clients SET last_name = $1, email = $2 WHERE id = $3"
        );
    }

    #[test]
    fn update_all_fields() {
        let changes = ClientChanges {
            first_name: Some("Ivan".into()),
            last_name: Some("Ivanov".into()),
            email: Some("ivanov@example.com".into()),
            phones: None,
        };
        let builder = update_client(1, &changes).unwrap();
        assert_eq!(
            builder.sql(),
            "UPDATE clients SET first_name = $1, last_name = $2, email = $3 WHERE id = $4"
        );
    }

    #[test]
    fn empty_phone_list_is_not_a_replacement() {
        let changes = ClientChanges {
            phones: Some(Vec::new()),
            ..ClientChanges::default()
        };
        assert!(changes.replacement_phones().is_none());

        let changes = ClientChanges {
            phones: Some(vec!["+79005554433".into()]),
            ..ClientChanges::default()
        };
        assert_eq!(changes.replacement_phones(), Some(&["+79005554433".to_string()][..]));
    }
}
