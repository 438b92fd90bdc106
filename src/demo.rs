use anyhow::Result;

use clients_db::{ClientChanges, ClientFilter, Database, NewClient};

use crate::print_clients;

/// Walks through every repository operation on a fresh schema and drops it
/// again at the end.
pub async fn run(db: &mut Database) -> Result<()> {
    println!("Creating tables...");
    db.create_schema().await?;

    println!("\nAdding clients...");
    let ivan = db
        .add_client(
            &NewClient::new("Ivan", "Ivanov", "ivan@example.com")
                .with_phones(["+79001234567", "+79007654321"]),
        )
        .await?;
    let petr = db
        .add_client(
            &NewClient::new("Petr", "Petrov", "petr@example.com").with_phones(["+79009876543"]),
        )
        .await?;
    db.add_client(
        &NewClient::new("Svetlana", "Sidorova", "svetlana@example.com")
            .with_phones(["+79001122334"]),
    )
    .await?;

    println!("\nSearching clients...");
    show(db, "first name 'Ivan'", by_first_name("Ivan")).await?;
    show(
        db,
        "last name 'Petrov'",
        ClientFilter {
            last_name: Some("Petrov".into()),
            ..ClientFilter::default()
        },
    )
    .await?;
    show(
        db,
        "email 'svetlana@example.com'",
        ClientFilter {
            email: Some("svetlana@example.com".into()),
            ..ClientFilter::default()
        },
    )
    .await?;
    show(
        db,
        "phone '+79001234567'",
        ClientFilter {
            phone: Some("+79001234567".into()),
            ..ClientFilter::default()
        },
    )
    .await?;

    println!("\nUpdating client {ivan} (Ivan Ivanov)...");
    db.update_client(
        ivan,
        &ClientChanges {
            first_name: Some("Ivan".into()),
            last_name: Some("Ivanov".into()),
            email: Some("ivanov@example.com".into()),
            phones: Some(vec!["+79001234567".into(), "+79005554433".into()]),
        },
    )
    .await?;
    show(db, "first name 'Ivan' after update", by_first_name("Ivan")).await?;
    print_phones(db, ivan).await?;

    println!("\nDeleting phone '+79005554433' of client {ivan}...");
    db.delete_phone(ivan, "+79005554433").await?;
    print_phones(db, ivan).await?;

    println!("\nDeleting client {petr} (Petr Petrov)...");
    db.delete_client(petr).await?;
    show(db, "first name 'Petr' after delete", by_first_name("Petr")).await?;

    println!("\nDropping tables...");
    db.drop_schema().await?;

    Ok(())
}

fn by_first_name(name: &str) -> ClientFilter {
    ClientFilter {
        first_name: Some(name.to_string()),
        ..ClientFilter::default()
    }
}

async fn show(db: &mut Database, label: &str, filter: ClientFilter) -> Result<()> {
    let clients = db.find_clients(&filter).await?;
    println!("Search by {label}:");
    print_clients(&clients);
    Ok(())
}

async fn print_phones(db: &mut Database, client_id: i32) -> Result<()> {
    let phones = db.list_phones(client_id).await?;
    let numbers: Vec<&str> = phones.iter().map(|p| p.phone.as_str()).collect();
    println!("Phones of client {client_id}: {}", numbers.join(", "));
    Ok(())
}
