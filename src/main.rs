mod cli;
mod demo;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use clients_db::{config, db, Client, ClientFilter, Database, NewClient};

use crate::cli::{Cli, Command};

fn init_tracing(debug: bool) -> Result<()> {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(debug)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Err(err) = init_tracing(cli.debug) {
        eprintln!("Failed to initialize logging: {err}");
    }

    // Load configuration
    let config = config::init(cli.database_url)?;

    // Initialize database connection
    let mut db = db::init(&config).await?;

    let result = run(&mut db, cli.command).await;

    // Close the connection even when the command failed
    db.close().await?;

    result
}

async fn run(db: &mut Database, command: Command) -> Result<()> {
    match command {
        Command::Init => {
            db.create_schema().await?;
            println!("Tables created");
        }
        Command::Drop => {
            db.drop_schema().await?;
            println!("Tables dropped");
        }
        Command::Add(args) => {
            let client = NewClient::from(args);
            let id = db.add_client(&client).await?;
            println!("Added client {id}");
        }
        Command::AddPhone { client_id, phone } => {
            db.add_phone(client_id, &phone).await?;
            println!("Added phone {phone} to client {client_id}");
        }
        Command::Update(args) => {
            let (id, changes) = args.changes();
            db.update_client(id, &changes).await?;
            println!("Updated client {id}");
        }
        Command::DeletePhone { client_id, phone } => {
            let removed = db.delete_phone(client_id, &phone).await?;
            println!("Removed {removed} phone(s) from client {client_id}");
        }
        Command::Delete { id } => {
            let removed = db.delete_client(id).await?;
            println!("Removed {removed} client(s)");
        }
        Command::Find(args) => {
            let clients = db.find_clients(&ClientFilter::from(args)).await?;
            print_clients(&clients);
        }
        Command::Show { id } => match db.get_client(id).await? {
            Some(client) => {
                print_clients(std::slice::from_ref(&client));
                for phone in db.list_phones(id).await? {
                    println!("    {}", phone.phone);
                }
            }
            None => println!("No client with id {id}"),
        },
        Command::Demo => demo::run(db).await?,
    }

    Ok(())
}

pub(crate) fn print_clients(clients: &[Client]) {
    if clients.is_empty() {
        println!("  (none)");
    }
    for client in clients {
        println!(
            "  #{} {} {} <{}>",
            client.id, client.first_name, client.last_name, client.email
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_tracing_install_is_reported() {
        let _ = init_tracing(false);
        assert!(init_tracing(true).is_err());
    }
}
