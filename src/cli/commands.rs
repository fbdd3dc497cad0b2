//! CLI command implementations

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password};
use indicatif::{ProgressBar, ProgressStyle};

use crate::auth::{decode_unverified, AuthManager, RegisterRequest, Role};
use crate::cli::{
    error, format_role, info, print_badge_table, print_category_table, print_comment_tree,
    print_post_table, print_structured, print_user_detail, print_video_detail, print_video_table,
    success, warn, OutputFormat, PostsAction, ThemeAction, VideosAction,
};
use crate::client::{ApiClient, PageRequest};
use crate::config::{self, Config};
use crate::services::videos::VideoFilter;
use crate::storage::{FileStore, KeyValueStore};
use crate::theme;

/// Initialize a new aula.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = Path::new(config::loader::CONFIG_FILENAME);

    if config_path.exists() {
        let overwrite = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("{} already exists. Overwrite it?", config::loader::CONFIG_FILENAME))
            .default(false)
            .interact()?;
        if !overwrite {
            warn("Keeping existing configuration");
            return Ok(());
        }
    }

    let default_url = config::ApiConfig::default().base_url;
    let api_url: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Portal API URL")
        .default(default_url.clone())
        .interact_text()?;

    if api_url == default_url {
        std::fs::write(config_path, config::loader::default_config_content())?;
    } else {
        let mut config = Config::default();
        config.api.base_url = api_url;
        config.api.validate()?;
        config::save_config(&config, config_path)?;
    }

    success(&format!("Created {}", config::loader::CONFIG_FILENAME));
    info("Run 'aula login' to sign in");

    Ok(())
}

/// Sign in
pub async fn login(email: Option<String>, password: Option<String>) -> Result<()> {
    let auth = session().await?;
    let theme = ColorfulTheme::default();

    let email = match email {
        Some(email) => email,
        None => Input::with_theme(&theme).with_prompt("Email").interact_text()?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::with_theme(&theme).with_prompt("Password").interact()?,
    };

    let outcome = auth.login(&email, &password).await;
    match (outcome.user, outcome.error) {
        (Some(user), _) => {
            success(&format!("Signed in as {} ({})", user.name, format_role(user.role)));
            Ok(())
        }
        (None, Some(err)) => {
            error(&format!("Login failed: {}", err));
            Err(err.into())
        }
        (None, None) => bail!("Login failed"),
    }
}

/// Create an account
pub async fn register(name: String, email: String, role: Option<Role>) -> Result<()> {
    let auth = session().await?;

    let password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;

    let request = RegisterRequest {
        name,
        email,
        password,
        role,
    };

    let outcome = auth.register(&request).await;
    match (outcome.user, outcome.error) {
        (Some(user), _) => {
            success(&format!("Welcome, {}! You are signed in.", user.name));
            Ok(())
        }
        (None, Some(err)) => {
            error(&format!("Registration failed: {}", err));
            Err(err.into())
        }
        (None, None) => bail!("Registration failed"),
    }
}

/// Sign out
pub async fn logout(all: bool) -> Result<()> {
    let auth = session().await?;

    if !auth.is_authenticated() {
        info("Not signed in");
        return Ok(());
    }

    if all {
        match auth.logout_all().await {
            Ok(()) => success("Signed out of every device"),
            Err(e) => {
                warn(&format!("Could not revoke other sessions: {}", e));
                success("Signed out of this device");
            }
        }
    } else {
        auth.logout().await;
        success("Signed out");
    }

    Ok(())
}

/// Show the signed-in user
pub async fn whoami(format: OutputFormat) -> Result<()> {
    let auth = session().await?;

    let Some(user) = auth.current_user() else {
        info("Not signed in. Run 'aula login'");
        return Ok(());
    };

    if !print_structured(&user, format)? {
        print_user_detail(&user);
        if let Ok(Some(token)) = auth.client().access_token() {
            if let Some(expires) = decode_unverified(&token).ok().and_then(|c| c.expires_at()) {
                println!(
                    "  {} {}",
                    "Token expires:".bold(),
                    expires.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
        }
        if let Ok(badges) = auth.client().badges().for_user(&user.id).await {
            if !badges.is_empty() {
                let names: Vec<_> = badges.iter().map(|b| b.name.as_str()).collect();
                println!("  {} {}", "Badges:".bold(), names.join(", "));
            }
        }
    }

    Ok(())
}

/// Change the account password
pub async fn change_password() -> Result<()> {
    let auth = require_session().await?;
    let theme = ColorfulTheme::default();

    let current = Password::with_theme(&theme)
        .with_prompt("Current password")
        .interact()?;
    let new = Password::with_theme(&theme)
        .with_prompt("New password")
        .with_confirmation("Repeat new password", "Passwords do not match")
        .interact()?;

    auth.change_password(&current, &new).await?;
    success("Password changed");

    Ok(())
}

/// Video subcommands
pub async fn videos(action: VideosAction) -> Result<()> {
    let auth = session().await?;
    let videos = auth.client().videos();

    match action {
        VideosAction::List {
            page,
            limit,
            category,
            search,
            format,
        } => {
            let filter = VideoFilter {
                page: PageRequest::new(page, limit),
                category,
                search,
            };
            let page = videos.list(&filter).await?;
            if !print_structured(&page, format)? {
                print_video_table(&page);
            }
        }
        VideosAction::Show { id, format } => {
            let video = videos.get(&id).await?;
            if !print_structured(&video, format)? {
                print_video_detail(&video);
            }
        }
    }

    Ok(())
}

/// Print a video's comment thread
pub async fn comments(video_id: &str, page: u32, depth: usize, format: OutputFormat) -> Result<()> {
    let auth = session().await?;

    let (tree, roots) = auth
        .client()
        .comments()
        .load_thread(video_id, PageRequest::new(page, 10), 5, depth)
        .await?;

    let flat: Vec<_> = tree.flatten().into_iter().map(|e| e.item).collect();
    if !print_structured(&flat, format)? {
        print_comment_tree(&tree);
        if roots.has_next() {
            info(&format!(
                "More comments: aula comments {} --page {}",
                video_id,
                page + 1
            ));
        }
    }

    Ok(())
}

/// Post subcommands
pub async fn posts(action: PostsAction) -> Result<()> {
    let auth = session().await?;

    match action {
        PostsAction::List {
            page,
            search,
            format,
        } => {
            let page = auth
                .client()
                .posts()
                .list(PageRequest::new(page, 10), search.as_deref())
                .await?;
            if !print_structured(&page, format)? {
                print_post_table(&page);
            }
        }
    }

    Ok(())
}

/// List categories
pub async fn categories(format: OutputFormat) -> Result<()> {
    let auth = session().await?;
    let categories = auth.client().categories().list().await?;

    if !print_structured(&categories, format)? {
        print_category_table(&categories);
    }

    Ok(())
}

/// List badges, optionally for one user
pub async fn badges(user: Option<String>, format: OutputFormat) -> Result<()> {
    let auth = session().await?;
    let service = auth.client().badges();

    let badges = match user {
        Some(user_id) => service.for_user(&user_id).await?,
        None => service.list().await?,
    };

    if !print_structured(&badges, format)? {
        print_badge_table(&badges);
    }

    Ok(())
}

/// Rate a video
pub async fn rate(video_id: &str, stars: u8) -> Result<()> {
    let auth = require_session().await?;
    let ratings = auth.client().ratings();

    ratings.rate(video_id, stars).await?;
    let summary = ratings.summary(video_id).await?;

    success(&format!(
        "Rated {} {} (average {:.1} from {} ratings)",
        "★".repeat(stars as usize).yellow(),
        video_id,
        summary.average,
        summary.count
    ));

    Ok(())
}

/// Upload a file
pub async fn upload(file: &Path, image: bool) -> Result<()> {
    let auth = require_session().await?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Uploading {}...", file.display()));

    let uploads = auth.client().uploads();
    let result = if image {
        uploads.upload_image(file).await
    } else {
        uploads.upload_video(file).await
    };

    match result {
        Ok(uploaded) => {
            pb.finish_and_clear();
            success(&format!("Uploaded to {}", uploaded.url.cyan()));
            Ok(())
        }
        Err(e) => {
            pb.finish_and_clear();
            error(&format!("Upload failed: {}", e));
            Err(e.into())
        }
    }
}

/// Theme subcommands
pub async fn theme(action: ThemeAction) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config);

    match action {
        ThemeAction::Show => {
            let mode = theme::load_theme(store.as_ref())?;
            info(&format!("Theme: {}", mode));
        }
        ThemeAction::Toggle => {
            let mode = theme::toggle_theme(store.as_ref())?;
            success(&format!("Switched to {} theme", mode));
        }
    }

    Ok(())
}

fn load_config() -> Result<Config> {
    config::load_config().context("Failed to load configuration")
}

fn open_store(config: &Config) -> Arc<dyn KeyValueStore> {
    Arc::new(FileStore::new(config.storage.path.clone()))
}

/// Build the client and restore any persisted session
async fn session() -> Result<AuthManager> {
    let config = load_config()?;
    let store = open_store(&config);
    let client = Arc::new(ApiClient::new(config.api, store)?);

    let auth = AuthManager::new(client);
    auth.initialize().await;
    Ok(auth)
}

async fn require_session() -> Result<AuthManager> {
    let auth = session().await?;
    if !auth.is_authenticated() {
        bail!("Not signed in. Run 'aula login' first");
    }
    Ok(auth)
}

