use blog_widgets::document::{Article, Document};
use blog_widgets::gate::{MemorySessionStore, PasswordGate};
use blog_widgets::render::{self, ArticlePage};
use blog_widgets::status::{self, LanyardClient, PresenceSource, StatusWidget, WidgetState};
use blog_widgets::zoom::ImageZoom;
use blog_widgets::{config, output};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once; version_string runs a single time at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "blog-widgets")]
#[command(about = "Preview and check the blog's interactive widgets")]
#[command(long_about = "\
Preview and check the blog's interactive widgets

Widgets:

  Password gate   Article content behind a per-session password prompt.
                  Unlock flags live in session storage under
                  post-unlocked-<post id>.
  Image zoom      Article images open in a full-screen overlay.
                  Escape, the close button or a backdrop click dismiss it.
  Live status     Discord presence from the Lanyard API, polled every
                  [status].poll_interval_secs seconds.

Set RUST_LOG to adjust logging (default: info).

Run 'blog-widgets gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (stock defaults apply when it does not exist)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the configured presence once and print the status card
    Status {
        /// Print the card's HTML instead of text
        #[arg(long)]
        html: bool,
    },
    /// Poll the presence API and print every change until Ctrl-C
    Watch,
    /// Render a markdown article into a preview page
    Article {
        /// Markdown file with the article body
        markdown: PathBuf,
        /// Article identifier (defaults to the file stem)
        #[arg(long)]
        post_id: Option<String>,
        /// Protect the article with this password
        #[arg(long)]
        password: Option<String>,
        /// Submit this password to the gate before rendering
        #[arg(long, requires = "password")]
        attempt: Option<String>,
        /// Open the zoom overlay on the Nth article image (1-based)
        #[arg(long)]
        zoom: Option<usize>,
        /// Output file (defaults to dist/<post id>/index.html)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Validate the config file and print a summary
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Status { html } => {
            let config = config::load_config(&cli.config)?;
            let client = LanyardClient::new(&config.status.api_base)?;
            let mut state = WidgetState::default();
            // A failed fetch is logged by apply(); the loading card stays.
            state.apply(client.fetch(&config.status.user_id).await);
            if html {
                println!("{}", status::render_status_card(&state).into_string());
            } else {
                output::print_status(&state);
            }
        }
        Command::Watch => {
            let config = config::load_config(&cli.config)?;
            let client: Arc<dyn PresenceSource> =
                Arc::new(LanyardClient::new(&config.status.api_base)?);
            let widget = StatusWidget::mount(client, &config.status);
            let mut rx = widget.subscribe();
            output::print_status(&rx.borrow_and_update());
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        println!();
                        output::print_status(&rx.borrow_and_update());
                    }
                }
            }
            widget.unmount().await;
        }
        Command::Article {
            markdown,
            post_id,
            password,
            attempt,
            zoom,
            output: output_path,
        } => {
            let config = config::load_config(&cli.config)?;
            let post_id = post_id.unwrap_or_else(|| file_stem(&markdown));
            let body = std::fs::read_to_string(&markdown)?;

            let mut store = MemorySessionStore::new();
            let gate = password.map(|pw| {
                let mut gate = PasswordGate::new(pw, post_id.as_str());
                gate.mount(&store);
                if let Some(attempt) = attempt {
                    gate.set_input(attempt);
                    if !gate.submit(&mut store) {
                        tracing::warn!("password attempt rejected");
                    }
                }
                gate
            });
            let unlocked = gate.as_ref().is_none_or(PasswordGate::is_unlocked);
            // A locked gate keeps the article, and so its images, off the page.
            let article = Article::from_markdown(&body);
            let mut doc = if unlocked {
                Document::from_article_markdown(&body)
            } else {
                Document::new()
            };

            let mut zoom_widget = ImageZoom::new();
            let now = Instant::now();
            zoom_widget.mount(&mut doc, now);
            if let Some(deadline) = zoom_widget.next_deadline() {
                zoom_widget.advance(&mut doc, deadline);
            }
            if let Some(n) = zoom {
                zoom_widget.click_nth_image(&mut doc, n);
                if !zoom_widget.is_open() {
                    tracing::warn!("no article image #{n} to zoom");
                }
            }

            let path = output_path
                .unwrap_or_else(|| PathBuf::from("dist").join(&post_id).join("index.html"));
            let status_state = WidgetState::default();
            let page = ArticlePage {
                title: &post_id,
                path: "/blog",
                article: &article,
                gate: gate.as_ref(),
                zoom: &zoom_widget,
                status: &status_state,
            };
            render::write_page(&path, render::render_article_page(&config, &page))?;

            output::print_article_output(&post_id, !unlocked, doc.article_images());
            println!("Wrote {}", path.display());
        }
        Command::Check => {
            let config = config::load_config(&cli.config)?;
            output::print_config_summary(&config);
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr so command output on stdout stays clean.
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "article".to_string())
}
