use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aula::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aula=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => cli::commands::init().await,
        Commands::Login { email, password } => cli::commands::login(email, password).await,
        Commands::Register { name, email, role } => {
            cli::commands::register(name, email, role).await
        }
        Commands::Logout { all } => cli::commands::logout(all).await,
        Commands::Whoami { format } => cli::commands::whoami(format).await,
        Commands::ChangePassword => cli::commands::change_password().await,
        Commands::Videos { action } => cli::commands::videos(action).await,
        Commands::Comments {
            video_id,
            page,
            depth,
            format,
        } => cli::commands::comments(&video_id, page, depth, format).await,
        Commands::Posts { action } => cli::commands::posts(action).await,
        Commands::Categories { format } => cli::commands::categories(format).await,
        Commands::Badges { user, format } => cli::commands::badges(user, format).await,
        Commands::Rate { video_id, stars } => cli::commands::rate(&video_id, stars).await,
        Commands::Upload { file, image } => cli::commands::upload(&file, image).await,
        Commands::Theme { action } => cli::commands::theme(action).await,
    }
}
