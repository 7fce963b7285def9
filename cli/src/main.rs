//! ParkGate operator CLI
//!
//! Drives the reservation and settlement engine against the configured
//! database. Every command prints its result as JSON on stdout; logs go to
//! stderr.
//!
//! ```sh
//! # Validate config without touching the database
//! parkgate --check
//!
//! # Create a location with three slots, one of them for electric cars
//! parkgate location create --name "Main St" --address "1 Main St" --slots A1,A2,E1:electric
//!
//! # Operator-entered plate at the entry gate
//! parkgate gate enter --location <uuid> --plate "CAB 1234"
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use parkgate::config::AppConfig;
use parkgate::domain::booking::{BookingRequest, NewBooking};
use parkgate::domain::location::{CreateLocationDto, SlotDto, UpdateLocationDto};
use parkgate::domain::user::CreateUserDto;
use parkgate::domain::vehicle::RegisterVehicleDto;
use parkgate::domain::SlotType;
use parkgate::{
    init_database, init_tracing, run_migrations, Engine, ManualPlateReader,
    SeaOrmRepositoryProvider,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// ParkGate: parking reservations, gate workflow and wallet settlement.
#[derive(Parser, Debug)]
#[command(
    name = "parkgate",
    version,
    about = "Parking reservation and settlement engine",
    long_about = "ParkGate operator CLI: locations, bookings, wallets and \
                  gate events against the configured database.\n\n\
                  Default config: ~/.config/parkgate/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "PARKGATE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the database URL.
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Validate the configuration file and exit.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long, global = true)]
    no_migrate: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply database migrations and exit
    Migrate,
    /// Parking locations and their slots
    #[command(subcommand)]
    Location(LocationCommand),
    /// User directory
    #[command(subcommand)]
    User(UserCommand),
    /// Vehicle directory
    #[command(subcommand)]
    Vehicle(VehicleCommand),
    /// Wallet balance and ledger
    #[command(subcommand)]
    Wallet(WalletCommand),
    /// Bookings
    #[command(subcommand)]
    Booking(BookingCommand),
    /// Gate events with an operator-entered plate
    #[command(subcommand)]
    Gate(GateCommand),
    /// Booking summary of a user
    Stats {
        #[arg(long)]
        user: Uuid,
    },
}

#[derive(Subcommand, Debug)]
enum LocationCommand {
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: String,
        /// Comma separated slot numbers, optionally typed: A1,A2,E1:electric
        #[arg(long, value_delimiter = ',', required = true)]
        slots: Vec<String>,
    },
    List,
    Show {
        id: Uuid,
    },
    Rename {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    Delete {
        id: Uuid,
    },
    /// Set the occupied flag of one slot
    Slot {
        id: Uuid,
        number: String,
        #[arg(long)]
        occupied: bool,
    },
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    Show {
        id: Uuid,
    },
}

#[derive(Subcommand, Debug)]
enum VehicleCommand {
    Add {
        #[arg(long)]
        plate: String,
        #[arg(long)]
        owner: Uuid,
        #[arg(long, default_value = "")]
        brand: String,
        #[arg(long, default_value = "")]
        model: String,
    },
    List {
        #[arg(long)]
        owner: Uuid,
    },
}

#[derive(Subcommand, Debug)]
enum WalletCommand {
    TopUp {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        amount: i64,
    },
    Refund {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        amount: i64,
        #[arg(long, default_value = "Manual refund")]
        description: String,
    },
    Balance {
        #[arg(long)]
        user: Uuid,
    },
    History {
        #[arg(long)]
        user: Uuid,
    },
}

#[derive(Subcommand, Debug)]
enum BookingCommand {
    /// Pre-book a spot
    Reserve {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        vehicle: Uuid,
        #[arg(long)]
        location: Uuid,
        #[arg(long)]
        spot: String,
        /// RFC 3339 start, e.g. 2025-03-01T10:00:00Z
        #[arg(long, value_parser = parse_time)]
        start: DateTime<Utc>,
        #[arg(long, value_parser = parse_time)]
        end: Option<DateTime<Utc>>,
    },
    Cancel {
        id: Uuid,
    },
    Show {
        id: Uuid,
    },
    List {
        #[arg(long, conflicts_with = "vehicle", required_unless_present = "vehicle")]
        user: Option<Uuid>,
        #[arg(long)]
        vehicle: Option<Uuid>,
    },
}

#[derive(Subcommand, Debug)]
enum GateCommand {
    Enter {
        #[arg(long)]
        location: Uuid,
        #[arg(long)]
        plate: String,
    },
    Exit {
        #[arg(long)]
        location: Uuid,
        #[arg(long)]
        plate: String,
    },
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp '{}': {}", raw, e))
}

/// `A1` or `E1:electric`
fn parse_slot(raw: &str) -> SlotDto {
    match raw.split_once(':') {
        Some((number, kind)) => SlotDto::new(number.trim(), SlotType::from_str(kind.trim())),
        None => SlotDto::new(raw.trim(), SlotType::Standard),
    }
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(parkgate::default_config_path);

    let mut config = match AppConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) if cli.check => return Err(e.into()),
        Err(e) => {
            let cfg = AppConfig::default();
            init_tracing(&cfg.logging);
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
            cfg
        }
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(ref url) = cli.database_url {
        config.database.url = url.clone();
    }
    init_tracing(&config.logging);
    config.validate()?;

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        println!("✅ Configuration is valid");
        println!("   Config file     : {}", config_path.display());
        println!("   Database        : {}", config.database.url);
        println!("   Log level       : {}", config.logging.level);
        println!("   Reserve minimum : {}", config.pricing.reserve_minimum);
        println!("   Hourly rate     : {}", config.pricing.hourly_rate);
        return Ok(());
    }

    let Some(command) = cli.command else {
        eprintln!("No command given; see `parkgate --help`");
        return Ok(());
    };

    // ── Database ───────────────────────────────────────────────
    let db = init_database(&config.database).await?;
    if !cli.no_migrate || matches!(command, Command::Migrate) {
        run_migrations(&db).await?;
    }
    if matches!(command, Command::Migrate) {
        info!("Migrations complete");
        return Ok(());
    }

    let repos = Arc::new(SeaOrmRepositoryProvider::new(db));
    let engine = Engine::new(repos, Arc::new(ManualPlateReader), &config);

    run(&engine, command).await
}

async fn run(engine: &Engine, command: Command) -> CliResult<()> {
    match command {
        Command::Migrate => Ok(()),

        Command::Location(cmd) => match cmd {
            LocationCommand::Create {
                name,
                address,
                slots,
            } => {
                let dto = CreateLocationDto {
                    name,
                    address,
                    slots: slots.iter().map(|s| parse_slot(s)).collect(),
                };
                print_json(&engine.locations.create(dto).await?)
            }
            LocationCommand::List => print_json(&engine.locations.list().await?),
            LocationCommand::Show { id } => print_json(&engine.locations.get(id).await?),
            LocationCommand::Rename { id, name, address } => {
                let dto = UpdateLocationDto {
                    name,
                    address,
                    slots: None,
                };
                print_json(&engine.locations.update(id, dto).await?)
            }
            LocationCommand::Delete { id } => {
                engine.locations.delete(id).await?;
                print_json(&serde_json::json!({ "deleted": id }))
            }
            LocationCommand::Slot {
                id,
                number,
                occupied,
            } => {
                engine
                    .locations
                    .update_slot_status(id, &number, occupied)
                    .await?;
                print_json(&engine.locations.get(id).await?)
            }
        },

        Command::User(cmd) => match cmd {
            UserCommand::Add { name, email } => {
                let dto = CreateUserDto {
                    name,
                    email,
                    role: None,
                    password_hash: None,
                };
                print_json(&engine.directory.register_user(dto).await?)
            }
            UserCommand::Show { id } => print_json(&engine.directory.user(id).await?),
        },

        Command::Vehicle(cmd) => match cmd {
            VehicleCommand::Add {
                plate,
                owner,
                brand,
                model,
            } => {
                let dto = RegisterVehicleDto {
                    plate_number: plate,
                    brand,
                    model,
                    owner_id: owner,
                };
                print_json(&engine.directory.register_vehicle(dto).await?)
            }
            VehicleCommand::List { owner } => {
                print_json(&engine.directory.vehicles_of(owner).await?)
            }
        },

        Command::Wallet(cmd) => match cmd {
            WalletCommand::TopUp { user, amount } => {
                print_json(&engine.wallets.top_up(user, amount).await?)
            }
            WalletCommand::Refund {
                user,
                amount,
                description,
            } => print_json(&engine.wallets.refund(user, amount, &description).await?),
            WalletCommand::Balance { user } => {
                let balance = engine.wallets.balance(user).await?;
                print_json(&serde_json::json!({ "user_id": user, "balance": balance }))
            }
            WalletCommand::History { user } => {
                print_json(&engine.wallets.transactions(user).await?)
            }
        },

        Command::Booking(cmd) => match cmd {
            BookingCommand::Reserve {
                user,
                vehicle,
                location,
                spot,
                start,
                end,
            } => {
                let request = NewBooking {
                    vehicle_id: vehicle,
                    user_id: user,
                    location_id: location,
                    request: BookingRequest::PreBooked {
                        spot_number: spot,
                        start_time: start,
                        end_time: end,
                    },
                };
                print_json(&engine.bookings.create(request).await?)
            }
            BookingCommand::Cancel { id } => print_json(&engine.bookings.cancel(id).await?),
            BookingCommand::Show { id } => print_json(&engine.bookings.get_details(id).await?),
            BookingCommand::List { user, vehicle } => match (user, vehicle) {
                (Some(user), _) => print_json(&engine.bookings.by_user(user).await?),
                (None, Some(vehicle)) => print_json(&engine.bookings.by_vehicle(vehicle).await?),
                (None, None) => Ok(()),
            },
        },

        Command::Gate(cmd) => match cmd {
            GateCommand::Enter { location, plate } => {
                print_json(&engine.gate.enter(location, plate.as_bytes()).await?)
            }
            GateCommand::Exit { location, plate } => {
                print_json(&engine.gate.exit(location, plate.as_bytes()).await?)
            }
        },

        Command::Stats { user } => print_json(&engine.stats.user_stats(user).await?),
    }
}
