//! CLI interface for the Aula portal client

pub mod commands;
mod output;

pub use output::*;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::auth::Role;

#[derive(Parser)]
#[command(name = "aula")]
#[command(version)]
#[command(about = "Command-line client for the Aula education portal", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new aula.toml configuration file
    Init,

    /// Sign in and store the session tokens
    Login {
        /// Account email (prompted when omitted)
        #[arg(short, long)]
        email: Option<String>,

        /// Account password (prompted when omitted)
        #[arg(short, long, env = "AULA_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account and sign in
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account email
        #[arg(short, long)]
        email: String,

        /// Requested role (the server may ignore it)
        #[arg(short, long)]
        role: Option<Role>,
    },

    /// Sign out of this device
    Logout {
        /// Revoke every session of the account
        #[arg(short, long)]
        all: bool,
    },

    /// Show the signed-in user
    Whoami {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Change the account password
    ChangePassword,

    /// Browse videos
    Videos {
        #[command(subcommand)]
        action: VideosAction,
    },

    /// Show the comment thread of a video
    Comments {
        /// Video id
        video_id: String,

        /// Page of top-level comments
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// How many reply levels to load
        #[arg(short, long, default_value = "2")]
        depth: usize,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Browse community posts
    Posts {
        #[command(subcommand)]
        action: PostsAction,
    },

    /// List video categories
    Categories {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List badges
    Badges {
        /// Only badges awarded to this user id
        #[arg(short, long)]
        user: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Rate a video from 1 to 5 stars
    Rate {
        /// Video id
        video_id: String,

        /// Stars (1-5)
        stars: u8,
    },

    /// Upload a video or image
    Upload {
        /// File to upload
        file: PathBuf,

        /// Upload as an image instead of a video
        #[arg(long)]
        image: bool,
    },

    /// Show or switch the colour theme
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
}

#[derive(Subcommand)]
pub enum VideosAction {
    /// List videos
    List {
        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Page size
        #[arg(short, long, default_value = "10")]
        limit: u32,

        /// Filter by category id
        #[arg(short, long)]
        category: Option<String>,

        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one video
    Show {
        /// Video id
        id: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Subcommand)]
pub enum PostsAction {
    /// List posts
    List {
        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Subcommand)]
pub enum ThemeAction {
    /// Print the stored theme
    Show,

    /// Switch between light and dark
    Toggle,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}
