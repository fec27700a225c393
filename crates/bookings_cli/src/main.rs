//! Command-line front end for the bookings store.
//!
//! # Responsibility
//! - Load configuration, initialize logging and open the repository once.
//! - Map each subcommand onto exactly one repository operation and print
//!   its serialized payload.
//!
//! # Invariants
//! - Storage errors keep their kind up to the exit code: not found exits 4,
//!   setup failures exit 2, everything else exits 1.

use anyhow::Context;
use bookings_core::{
    init_logging, Config, ConfigError, CrudRepository, EntityService, ErrorKind, EventLog,
    HotelFields, RecordId, Repository, RoomFields, StoreError, VisitorFields,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

const EXIT_FAILURE: u8 = 1;
const EXIT_SETUP: u8 = 2;
const EXIT_NOT_FOUND: u8 = 4;

fn main() -> ExitCode {
    // A missing .env file is fine; the variables may come from the shell.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("bookings: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Manage hotels, rooms and visitors in the bookings store.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Connection descriptor; overrides DB_URL and DB_NAME.
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Drop every table and re-apply migrations before running. Destroys data.
    #[arg(long, global = true)]
    reload: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Bring the schema to the latest version.
    Migrate,
    /// Probe the connection and report the schema version.
    Status,
    /// Hotel records.
    #[command(subcommand)]
    Hotel(HotelCommand),
    /// Room records.
    #[command(subcommand)]
    Room(RoomCommand),
    /// Visitor records.
    #[command(subcommand)]
    Visitor(VisitorCommand),
}

#[derive(Debug, Subcommand)]
enum HotelCommand {
    Create(HotelArgs),
    Get { id: RecordId },
    List,
    /// Replace every field of a hotel.
    Update {
        id: RecordId,
        #[command(flatten)]
        fields: HotelArgs,
    },
    Delete { id: RecordId },
}

#[derive(Debug, Subcommand)]
enum RoomCommand {
    Create(RoomArgs),
    Get { id: RecordId },
    List,
    /// Replace every field of a room.
    Update {
        id: RecordId,
        #[command(flatten)]
        fields: RoomArgs,
    },
    Delete { id: RecordId },
}

#[derive(Debug, Subcommand)]
enum VisitorCommand {
    Create(VisitorArgs),
    Get { id: RecordId },
    List,
    /// Replace every field of a visitor.
    Update {
        id: RecordId,
        #[command(flatten)]
        fields: VisitorArgs,
    },
    Delete { id: RecordId },
}

#[derive(Debug, Args)]
struct HotelArgs {
    #[arg(long)]
    country: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    name: String,
    /// Rating from 1 to 5.
    #[arg(long)]
    stars: i64,
}

#[derive(Debug, Args)]
struct RoomArgs {
    #[arg(long)]
    hotel_id: RecordId,
    /// Number of rooms in the unit.
    #[arg(long)]
    rooms: i64,
    #[arg(long)]
    meals: bool,
    #[arg(long)]
    bar: bool,
    #[arg(long)]
    service: bool,
    #[arg(long)]
    busy: bool,
}

#[derive(Debug, Args)]
struct VisitorArgs {
    #[arg(long)]
    hotel_id: RecordId,
    #[arg(long)]
    room_id: RecordId,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    /// Age from 18 to 100.
    #[arg(long)]
    age: i64,
}

impl From<HotelArgs> for HotelFields {
    fn from(args: HotelArgs) -> Self {
        HotelFields::new(args.country, args.city, args.name, args.stars)
    }
}

impl From<RoomArgs> for RoomFields {
    fn from(args: RoomArgs) -> Self {
        RoomFields {
            hotel_id: args.hotel_id,
            room_count: args.rooms,
            meals: args.meals,
            bar: args.bar,
            service: args.service,
            busy: args.busy,
        }
    }
}

impl From<VisitorArgs> for VisitorFields {
    fn from(args: VisitorArgs) -> Self {
        VisitorFields::new(
            args.hotel_id,
            args.room_id,
            args.first_name,
            args.last_name,
            args.age,
        )
    }
}

/// One CRUD call, independent of the entity it targets.
enum Action<F> {
    Create(F),
    Get(RecordId),
    List,
    Update(RecordId, F),
    Delete(RecordId),
}

impl From<HotelCommand> for Action<HotelFields> {
    fn from(command: HotelCommand) -> Self {
        match command {
            HotelCommand::Create(args) => Self::Create(args.into()),
            HotelCommand::Get { id } => Self::Get(id),
            HotelCommand::List => Self::List,
            HotelCommand::Update { id, fields } => Self::Update(id, fields.into()),
            HotelCommand::Delete { id } => Self::Delete(id),
        }
    }
}

impl From<RoomCommand> for Action<RoomFields> {
    fn from(command: RoomCommand) -> Self {
        match command {
            RoomCommand::Create(args) => Self::Create(args.into()),
            RoomCommand::Get { id } => Self::Get(id),
            RoomCommand::List => Self::List,
            RoomCommand::Update { id, fields } => Self::Update(id, fields.into()),
            RoomCommand::Delete { id } => Self::Delete(id),
        }
    }
}

impl From<VisitorCommand> for Action<VisitorFields> {
    fn from(command: VisitorCommand) -> Self {
        match command {
            VisitorCommand::Create(args) => Self::Create(args.into()),
            VisitorCommand::Get { id } => Self::Get(id),
            VisitorCommand::List => Self::List,
            VisitorCommand::Update { id, fields } => Self::Update(id, fields.into()),
            VisitorCommand::Delete { id } => Self::Delete(id),
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(cli.database_url.as_deref())?;
    config.reload |= cli.reload;

    start_logging(&config)?;
    log::info!(
        "event=cli_start module=cli status=ok version={} reload={}",
        bookings_core::core_version(),
        config.reload
    );

    let repository =
        Repository::open(&config, EventLog::global()).context("cannot open the bookings store")?;
    let output = match cli.command {
        Commands::Migrate => {
            let version = repository.database().schema_version()?;
            format!("schema_version={version}")
        }
        Commands::Status => {
            repository.database().health_check()?;
            let version = repository.database().schema_version()?;
            format!(
                "status=ok schema_version={version} latest={}",
                bookings_core::db::migrations::latest_version()
            )
        }
        Commands::Hotel(command) => execute(repository.hotels(), command.into())?,
        Commands::Room(command) => execute(repository.rooms(), command.into())?,
        Commands::Visitor(command) => execute(repository.visitors(), command.into())?,
    };

    println!("{output}");
    Ok(())
}

fn execute<R>(repo: R, action: Action<R::Fields>) -> Result<String, StoreError>
where
    R: CrudRepository,
    R::Record: Serialize,
{
    let service = EntityService::new(repo);
    let entity = R::ENTITY;
    match action {
        Action::Create(fields) => {
            let id = service.create(&fields)?;
            Ok(format!("created {entity} id={id}"))
        }
        Action::Get(id) => service.get_by_id(id).map(|payload| payload.into_string()),
        Action::List => service.get_all().map(|payload| payload.into_string()),
        Action::Update(id, fields) => service.update(id, &fields).map(|payload| payload.into_string()),
        Action::Delete(id) => {
            service.delete(id)?;
            Ok(format!("deleted {entity} id={id}"))
        }
    }
}

fn load_config(database_url: Option<&str>) -> Result<Config, ConfigError> {
    Config::from_lookup(|key| match (key, database_url) {
        ("DB_URL", Some(url)) => Some(url.to_string()),
        _ => std::env::var(key).ok(),
    })
}

fn start_logging(config: &Config) -> anyhow::Result<()> {
    let log_dir = match config.log_dir.as_deref() {
        Some(dir) if dir.is_relative() => Some(std::env::current_dir()?.join(dir)),
        Some(dir) => Some(dir.to_path_buf()),
        None => None,
    };
    init_logging(&config.log_level, log_dir.as_deref().and_then(Path::to_str))
        .map_err(anyhow::Error::msg)
        .context("cannot initialize logging")
}

fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(store_err) = err.downcast_ref::<StoreError>() {
        return match store_err.kind() {
            ErrorKind::NotFound => EXIT_NOT_FOUND,
            ErrorKind::ConnectionFailed | ErrorKind::MigrationFailed => EXIT_SETUP,
            ErrorKind::ExecutionFailed | ErrorKind::SerializationFailed => EXIT_FAILURE,
        };
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return EXIT_SETUP;
    }
    EXIT_FAILURE
}

#[cfg(test)]
mod tests {
    use super::{exit_code, Action, Cli, Commands, HotelCommand, EXIT_NOT_FOUND, EXIT_SETUP};
    use anyhow::Context;
    use bookings_core::{ConfigError, EntityKind, HotelFields, StoreError};
    use clap::{CommandFactory, Parser};

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn hotel_update_parses_full_row() {
        let cli = Cli::try_parse_from([
            "bookings",
            "--database-url",
            ":memory:",
            "hotel",
            "update",
            "3",
            "--country",
            "France",
            "--city",
            "Paris",
            "--name",
            "Le Grand",
            "--stars",
            "5",
        ])
        .unwrap();

        assert_eq!(cli.database_url.as_deref(), Some(":memory:"));
        let Commands::Hotel(command @ HotelCommand::Update { .. }) = cli.command else {
            panic!("expected hotel update");
        };
        let Action::Update(id, fields) = Action::<HotelFields>::from(command) else {
            panic!("expected update action");
        };
        assert_eq!(id, 3);
        assert_eq!(fields, HotelFields::new("France", "Paris", "Le Grand", 5));
    }

    #[test]
    fn update_requires_every_field() {
        let parsed = Cli::try_parse_from(["bookings", "hotel", "update", "3", "--stars", "5"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        let not_found = anyhow::Error::new(StoreError::NotFound {
            op: "get_hotel",
            entity: EntityKind::Hotel,
            id: 9,
        })
        .context("lookup");
        assert_eq!(exit_code(&not_found), EXIT_NOT_FOUND);

        let config = anyhow::Error::new(ConfigError::MissingDatabase);
        assert_eq!(exit_code(&config), EXIT_SETUP);

        let setup: anyhow::Result<()> = Err(StoreError::ConnectionFailed {
            op: "db.open",
            reason: "cannot open file database".to_string(),
            source: None,
        })
        .context("cannot open the bookings store");
        assert_eq!(exit_code(&setup.unwrap_err()), EXIT_SETUP);
    }
}
