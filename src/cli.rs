use clap::{ArgAction, Args, Parser, Subcommand};

use clients_db::{ClientChanges, ClientFilter, NewClient};

#[derive(Parser, Debug)]
#[command(name = "clients_db", version, about = "Manage clients and their phone numbers")]
pub struct Cli {
    /// PostgreSQL URL; falls back to DATABASE_URL from the environment or .env
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Enable debug logging unless RUST_LOG is set
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the clients and phones tables if they do not exist
    Init,
    /// Drop both tables
    Drop,
    /// Add a client with optional phones
    Add(AddArgs),
    /// Add one phone to an existing client
    AddPhone { client_id: i32, phone: String },
    /// Change fields of a client; --phone replaces all of its phones
    Update(UpdateArgs),
    /// Remove one phone from a client
    DeletePhone { client_id: i32, phone: String },
    /// Remove a client and all of its phones
    Delete { id: i32 },
    /// Search clients; given criteria are combined with AND
    Find(FindArgs),
    /// Show one client with its phones
    Show { id: i32 },
    /// Run the demonstration scenario against an empty database
    Demo,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub email: String,
    /// May be repeated
    #[arg(long = "phone")]
    pub phones: Vec<String>,
}

impl From<AddArgs> for NewClient {
    fn from(args: AddArgs) -> Self {
        NewClient::new(args.first_name, args.last_name, args.email).with_phones(args.phones)
    }
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub id: i32,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    /// May be repeated; the given list replaces the current phones
    #[arg(long = "phone")]
    pub phones: Vec<String>,
}

impl UpdateArgs {
    pub fn changes(self) -> (i32, ClientChanges) {
        let changes = ClientChanges {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phones: Some(self.phones),
        };
        (self.id, changes)
    }
}

#[derive(Args, Debug)]
pub struct FindArgs {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
}

impl From<FindArgs> for ClientFilter {
    fn from(args: FindArgs) -> Self {
        ClientFilter {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            phone: args.phone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_collects_repeated_phones() {
        let cli = Cli::parse_from([
            "clients_db",
            "add",
            "--first-name",
            "Ivan",
            "--last-name",
            "Ivanov",
            "--email",
            "ivan@example.com",
            "--phone",
            "+79001234567",
            "--phone",
            "+79007654321",
        ]);
        let Command::Add(args) = cli.command else {
            panic!("expected add command");
        };
        let client = NewClient::from(args);
        assert_eq!(client.email, "ivan@example.com");
        assert_eq!(client.phones, vec!["+79001234567", "+79007654321"]);
    }

    #[test]
    fn update_without_phones_keeps_them() {
        let cli = Cli::parse_from(["clients_db", "update", "1", "--email", "ivanov@example.com"]);
        let Command::Update(args) = cli.command else {
            panic!("expected update command");
        };
        let (id, changes) = args.changes();
        assert_eq!(id, 1);
        assert_eq!(changes.email.as_deref(), Some("ivanov@example.com"));
        assert!(changes.first_name.is_none());
        assert!(changes.replacement_phones().is_none());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "clients_db",
            "find",
            "--phone",
            "+79001234567",
            "--database-url",
            "postgres://localhost/clients_db",
            "--debug",
        ]);
        assert!(cli.debug);
        assert_eq!(
            cli.database_url.as_deref(),
            Some("postgres://localhost/clients_db")
        );
        let Command::Find(args) = cli.command else {
            panic!("expected find command");
        };
        let filter = ClientFilter::from(args);
        assert_eq!(filter.phone.as_deref(), Some("+79001234567"));
        assert!(filter.email.is_none());
    }

    #[test]
    fn delete_phone_takes_positionals() {
        let cli = Cli::parse_from(["clients_db", "delete-phone", "1", "+79005554433"]);
        match cli.command {
            Command::DeletePhone { client_id, phone } => {
                assert_eq!(client_id, 1);
                assert_eq!(phone, "+79005554433");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
