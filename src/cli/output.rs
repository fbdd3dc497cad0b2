//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use serde::Serialize;

use super::OutputFormat;
use crate::auth::{Role, User};
use crate::client::Page;
use crate::comments::CommentTree;
use crate::services::badges::Badge;
use crate::services::categories::Category;
use crate::services::comments::Comment;
use crate::services::posts::Post;
use crate::services::videos::Video;

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Print a value as JSON or YAML. Returns false for `Table`, which each
/// caller renders itself.
pub fn print_structured<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> anyhow::Result<bool> {
    match format {
        OutputFormat::Table => Ok(false),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(true)
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(value)?);
            Ok(true)
        }
    }
}

/// Format a role as a colored string
pub fn format_role(role: Role) -> String {
    match role {
        Role::SuperAdmin => role.as_str().magenta().to_string(),
        Role::Administrador => role.as_str().red().to_string(),
        Role::Docente => role.as_str().yellow().to_string(),
        Role::Estudiante => role.as_str().green().to_string(),
    }
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| Cell::new(h).fg(Color::Cyan)));
    table
}

fn print_page_footer<T>(page: &Page<Vec<T>>) {
    if let Some(p) = page.pagination {
        println!(
            "{}",
            format!("Page {} of {} ({} total)", p.page, p.total_pages.max(1), p.total).dimmed()
        );
    }
}

/// Print details of the signed-in user
pub fn print_user_detail(user: &User) {
    println!("{}", "Account".bold().underline());
    println!();
    println!("  {} {}", "Name:".bold(), user.name);
    println!("  {} {}", "Email:".bold(), user.email);
    println!("  {} {}", "Role:".bold(), format_role(user.role));
    println!("  {} {}", "Id:".bold(), user.id.dimmed());

    if !user.active {
        println!("  {} {}", "Status:".bold(), "inactive".red());
    }

    if let Some(bio) = &user.bio {
        println!("  {} {}", "Bio:".bold(), bio);
    }

    if let Some(created) = user.created_at {
        println!(
            "  {} {}",
            "Member since:".bold(),
            created.format("%Y-%m-%d")
        );
    }
}

/// Print a table of videos
pub fn print_video_table(page: &Page<Vec<Video>>) {
    if page.is_empty() {
        info("No videos found");
        return;
    }

    let mut table = new_table(&["Id", "Title", "Author", "Views", "Rating", "Published"]);
    for video in &page.items {
        let rating = video
            .average_rating
            .map(|r| format!("{:.1}★", r))
            .unwrap_or_else(|| "-".to_string());
        let published = video
            .created_at
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(&video.id),
            Cell::new(&video.title),
            Cell::new(video.author.as_ref().map(|a| a.name.as_str()).unwrap_or("-")),
            Cell::new(video.views),
            Cell::new(rating).fg(Color::Yellow),
            Cell::new(published),
        ]);
    }

    println!("{table}");
    print_page_footer(page);
}

/// Print detailed video information
pub fn print_video_detail(video: &Video) {
    println!("{}", video.title.bold().underline());
    println!();
    if let Some(description) = &video.description {
        println!("  {}", description);
        println!();
    }
    println!("  {} {}", "Id:".bold(), video.id);
    if let Some(author) = &video.author {
        println!("  {} {}", "Author:".bold(), author.name);
    }
    println!("  {} {}", "Views:".bold(), video.views);
    if let Some(rating) = video.average_rating {
        println!("  {} {:.1}", "Rating:".bold(), rating);
    }
    if let Some(url) = &video.video_url {
        println!("  {} {}", "URL:".bold(), url.cyan());
    }
}

/// Print a comment thread with replies indented under their parents
pub fn print_comment_tree(tree: &CommentTree<Comment>) {
    if tree.is_empty() {
        info("No comments yet");
        return;
    }

    for entry in tree.flatten() {
        let indent = "  ".repeat(entry.depth);
        let author = entry
            .item
            .author
            .as_ref()
            .map(|a| a.name.as_str())
            .unwrap_or("anonymous");
        let marker = if entry.depth == 0 { "●" } else { "↳" };

        println!(
            "{}{} {} {}",
            indent,
            marker.cyan(),
            author.bold(),
            entry.item.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
        );
        for line in entry.item.content.lines() {
            println!("{}  {}", indent, line);
        }

        let loaded = tree.replies(&entry.item.id).len() as u32;
        if entry.item.replies_count > loaded {
            println!(
                "{}  {}",
                indent,
                format!("({} more replies)", entry.item.replies_count - loaded).dimmed()
            );
        }
    }
}

/// Print a table of posts
pub fn print_post_table(page: &Page<Vec<Post>>) {
    if page.is_empty() {
        info("No posts found");
        return;
    }

    let mut table = new_table(&["Id", "Title", "Author", "Likes", "Comments"]);
    for post in &page.items {
        let likes = if post.liked_by_me {
            Cell::new(format!("{} ♥", post.likes)).fg(Color::Red)
        } else {
            Cell::new(post.likes)
        };
        table.add_row(vec![
            Cell::new(&post.id),
            Cell::new(&post.title),
            Cell::new(post.author.as_ref().map(|a| a.name.as_str()).unwrap_or("-")),
            likes,
            Cell::new(post.comments_count),
        ]);
    }

    println!("{table}");
    print_page_footer(page);
}

/// Print a table of categories
pub fn print_category_table(categories: &[Category]) {
    if categories.is_empty() {
        info("No categories defined");
        return;
    }

    let mut table = new_table(&["Id", "Name", "Description", "Videos"]);
    for category in categories {
        table.add_row(vec![
            Cell::new(&category.id),
            Cell::new(&category.name),
            Cell::new(category.description.as_deref().unwrap_or("-")),
            Cell::new(
                category
                    .video_count
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
    }

    println!("{table}");
}

/// Print a table of badges
pub fn print_badge_table(badges: &[Badge]) {
    if badges.is_empty() {
        info("No badges found");
        return;
    }

    let mut table = new_table(&["Badge", "Description", "Awarded"]);
    for badge in badges {
        let name = match &badge.icon {
            Some(icon) => format!("{} {}", icon, badge.name),
            None => badge.name.clone(),
        };
        let awarded = badge
            .awarded_at
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(name).fg(Color::Yellow),
            Cell::new(badge.description.as_deref().unwrap_or("")),
            Cell::new(awarded),
        ]);
    }

    println!("{table}");
}
