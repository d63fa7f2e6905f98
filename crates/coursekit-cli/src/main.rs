//! coursekit - command line client for the course platform.
//!
//! Signs in with a username and password, keeps the session in the cache
//! directory, and prints courses, profile, and notifications as plain text
//! or JSON.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use coursekit_core::auth::{FileCredentialStore, Keychain, LogoutHandler};
use coursekit_core::models::{Course, NotificationCategory};
use coursekit_core::{Api, Config, SessionContext};

#[derive(Parser)]
#[command(name = "coursekit")]
#[command(about = "Command line client for the course platform")]
struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long, env = "COURSEKIT_BASE_URL")]
    base_url: Option<String>,
    /// Print raw JSON instead of text
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with a username and password
    Login {
        #[arg(short, long)]
        username: Option<String>,
        /// Remember the password in the OS keychain
        #[arg(long)]
        remember: bool,
    },
    /// Exchange a social login authorization code for a session
    LoginCode { code: String },
    /// Print the browser URL for a social login provider
    SocialUrl { provider: String },
    /// Forget the local session
    Logout,
    /// Show the current profile
    Whoami,
    /// List enrolled courses, or featured courses with --featured
    Courses {
        #[arg(long, default_value_t = 1)]
        page: i32,
        #[arg(long)]
        featured: bool,
    },
    /// Show courses by id
    Course { ids: Vec<i64> },
    /// Enroll in a course
    Join { id: i64 },
    /// Leave a course
    Drop { id: i64 },
    /// List notifications
    Notifications {
        #[arg(long, default_value_t = 1)]
        page: i32,
        #[arg(long, value_enum, default_value_t = Category::All)]
        category: Category,
        /// Mark every notification in the category as read
        #[arg(long)]
        mark_read: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Category {
    All,
    Learn,
    Comments,
    Review,
    Teach,
    Other,
}

impl From<Category> for NotificationCategory {
    fn from(category: Category) -> Self {
        match category {
            Category::All => NotificationCategory::All,
            Category::Learn => NotificationCategory::Learn,
            Category::Comments => NotificationCategory::Comments,
            Category::Review => NotificationCategory::Review,
            Category::Teach => NotificationCategory::Teach,
            Category::Other => NotificationCategory::Other,
        }
    }
}

/// Forced logout from the terminal: no social SDKs, no screens, just a notice.
struct TerminalLogout;

impl LogoutHandler for TerminalLogout {
    fn sign_out_social(&self) -> Result<()> {
        Ok(())
    }

    fn show_launch_screen(&self) {
        eprintln!("Run `coursekit login` to sign in again.");
    }

    fn notify_user(&self, message: &str) {
        eprintln!("{}", message);
    }
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(base_url) = cli.base_url.clone() {
        config.base_url = base_url;
    }

    let store = FileCredentialStore::new(config.cache_dir()?)?;
    let context = Arc::new(
        SessionContext::new(Arc::new(store)).with_logout_handler(Arc::new(TerminalLogout)),
    );
    let api = Api::new(config.clone(), context)?;

    run(&cli, &api, config).await
}

async fn run(cli: &Cli, api: &Api, mut config: Config) -> Result<()> {
    match &cli.command {
        Command::Login { username, remember } => {
            let username = match username.clone().or_else(|| config.last_username.clone()) {
                Some(username) => username,
                None => prompt("Username: ")?,
            };
            let password = match Keychain::password(&username)? {
                Some(password) => password,
                None => {
                    eprint!("Password: ");
                    io::stderr().flush()?;
                    rpassword::read_password()?
                }
            };

            api.auth_with_login_password(&username, &password)
                .await
                .context("Login failed")?;
            info!(username = %username, "logged in");

            if *remember {
                if Keychain::persists() {
                    Keychain::store(&username, &password)?;
                } else {
                    warn!("no OS keychain available, password not remembered");
                    eprintln!("Password not remembered: no OS keychain is available.");
                }
            }
            config.last_username = Some(username);
            config.save()?;
            println!("Signed in.");
        }
        Command::LoginCode { code } => {
            api.auth_with_code(code).await.context("Login failed")?;
            println!("Signed in.");
        }
        Command::SocialUrl { provider } => {
            println!("{}", api.social_login_url(provider)?);
        }
        Command::Logout => {
            api.logout().await;
            if let Some(username) = config.last_username.take() {
                Keychain::delete(&username)?;
                config.save()?;
            }
            println!("Signed out.");
        }
        Command::Whoami => match api.user_profile().await? {
            Some(profile) if cli.json => print_json(&profile)?,
            Some(profile) => {
                let kind = if profile.is_guest { " (guest)" } else { "" };
                println!("{} [{}]{}", profile.display_name(), profile.id, kind);
            }
            None => println!("No profile."),
        },
        Command::Courses { page, featured } => {
            let response = if *featured {
                api.popular_courses(*page, &config.language).await?
            } else {
                api.enrolled_courses(*page).await?
            };
            if cli.json {
                print_json(&response.courses)?;
            } else {
                print_courses(&response.courses);
                if response.meta.has_next {
                    println!("(more on page {})", page + 1);
                }
            }
        }
        Command::Course { ids } => {
            let response = api.courses(1, ids).await?;
            if cli.json {
                print_json(&response.courses)?;
            } else {
                print_courses(&response.courses);
            }
        }
        Command::Join { id } => {
            api.join_course(*id).await?;
            println!("Joined course {}.", id);
        }
        Command::Drop { id } => {
            api.drop_course(*id).await?;
            println!("Left course {}.", id);
        }
        Command::Notifications {
            page,
            category,
            mark_read,
        } => {
            let category = NotificationCategory::from(*category);
            if *mark_read {
                api.mark_all_notifications_read(category).await?;
                println!("Marked as read.");
                return Ok(());
            }
            let response = api.notifications(category, *page).await?;
            if cli.json {
                print_json(&response.notifications)?;
            } else {
                for notification in &response.notifications {
                    let marker = if notification.is_unread.unwrap_or(false) {
                        "*"
                    } else {
                        " "
                    };
                    println!(
                        "{} {:>8}  {}",
                        marker,
                        notification.id.unwrap_or_default(),
                        notification.html_text.as_deref().unwrap_or_default()
                    );
                }
            }
        }
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    eprint!("{}", label);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_courses(courses: &[Course]) {
    if courses.is_empty() {
        println!("No courses.");
        return;
    }
    for course in courses {
        let marker = if course.is_enrolled() { "*" } else { " " };
        println!("{} {:>8}  {}", marker, course.id, course.title);
    }
}
