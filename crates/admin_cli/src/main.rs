use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::Engine;
use migration::MigratorTrait;
use sea_orm::{ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter};

// Accounts are provisioned from this tool; there is no signup endpoint.
// Direct entity access keeps the binary independent from the engine's
// internal identity store.
mod users {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub email: String,
        pub api_token: String,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Parser, Debug)]
#[command(name = "borsello_admin")]
#[command(about = "Admin utilities for Borsello (bootstrap users/wallets)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./borsello.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Wallet(Wallet),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    full_name: Option<String>,
    /// Grants access to the moderation endpoints.
    #[arg(long)]
    admin: bool,
}

#[derive(Args, Debug)]
struct Wallet {
    #[command(subcommand)]
    command: WalletCommand,
}

#[derive(Subcommand, Debug)]
enum WalletCommand {
    Create(WalletCreateArgs),
}

#[derive(Args, Debug)]
struct WalletCreateArgs {
    /// Email of the existing account that will own the wallet.
    #[arg(long)]
    owner: String,
    #[arg(long)]
    name: String,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn find_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<users::Model>, Box<dyn Error + Send + Sync>> {
    let user = users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(db)
        .await?;
    Ok(user)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            if find_by_email(&db, &args.email).await?.is_some() {
                eprintln!("user already exists: {}", args.email);
                std::process::exit(1);
            }

            let engine = Engine::builder().database(db.clone()).build()?;
            let (user, token) = engine
                .admin_store()
                .create_identity(&args.email, args.full_name.as_deref(), args.admin)
                .await?;

            println!("created user: {} ({})", user.email, user.id);
            // The token is shown exactly once; hand it to the account owner.
            println!("api token: {token}");
        }
        Command::Wallet(Wallet {
            command: WalletCommand::Create(args),
        }) => {
            let Some(owner) = find_by_email(&db, &args.owner).await? else {
                eprintln!("user not found: {}", args.owner);
                std::process::exit(1);
            };

            let engine = Engine::builder().database(db.clone()).build()?;
            let wallet = engine.create_wallet(&args.name, &owner.id).await?;
            println!("created wallet: {} ({})", wallet.name, wallet.id);
        }
    }

    Ok(())
}
