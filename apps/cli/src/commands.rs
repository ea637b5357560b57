//! CLI command definitions, routing, and tracing setup.

use std::future::Future;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use strandly_blog::{BlogService, BlogView, Detail, SortOrder, ViewQuery, categories};
use strandly_content::{AssetFit, AssetFormat, AssetTransform, AssetUrlBuilder};
use strandly_shared::{AppConfig, ConfigSource, Post, init_config, resolve_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Strandly: blog content, sitemap, and site proxy.
#[derive(Parser)]
#[command(
    name = "strandly",
    version,
    about = "Read blog content from the Strandly CMS, build the sitemap, and serve the site.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.strandly/strandly.toml).
    #[arg(long, global = true, env = "STRANDLY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Serve the built site with the CMS reverse proxy.
    Serve {
        /// Port to listen on (overrides [server].port).
        #[arg(short, long)]
        port: Option<u16>,

        /// Build directory to serve (overrides [server].static_dir).
        #[arg(long)]
        static_dir: Option<String>,
    },

    /// Generate sitemap.xml from published posts.
    Sitemap {
        /// Output path (overrides [sitemap].output).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Public site origin (overrides [sitemap].site_url).
        #[arg(long)]
        site_url: Option<String>,

        /// Print to stdout instead of writing a file.
        #[arg(long)]
        stdout: bool,
    },

    /// Blog posts.
    Posts {
        #[command(subcommand)]
        action: PostsAction,
    },

    /// List the tags defined in the CMS.
    Tags {
        /// Print JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the display URL for a CMS asset.
    Asset {
        /// Asset id or URL.
        asset: String,

        /// Widths for a srcset (comma-separated); prints a srcset instead of one URL.
        #[arg(long, value_delimiter = ',')]
        srcset: Vec<u32>,

        #[arg(long)]
        width: Option<u32>,

        #[arg(long)]
        height: Option<u32>,

        #[arg(long)]
        quality: Option<u8>,

        #[arg(long)]
        fit: Option<FitArg>,

        #[arg(long)]
        format: Option<FormatArg>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Post subcommands.
#[derive(Subcommand)]
pub(crate) enum PostsAction {
    /// List posts with search, filters, sorting and pagination.
    List {
        /// Case-insensitive text search over title, summary and body.
        #[arg(short, long, default_value = "")]
        query: String,

        /// Category name, or "all".
        #[arg(short, long, default_value = "all")]
        category: String,

        /// Tag filter; repeat for several (matches any).
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// newest, oldest or title; anything else keeps CMS order.
        #[arg(short, long, default_value = "newest")]
        sort: String,

        /// Page number (1-based).
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Print JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show one post, rendered to HTML.
    Show {
        /// Post slug.
        slug: String,

        /// Print JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum FitArg {
    Cover,
    Contain,
    Inside,
    Outside,
}

impl From<FitArg> for AssetFit {
    fn from(arg: FitArg) -> Self {
        match arg {
            FitArg::Cover => AssetFit::Cover,
            FitArg::Contain => AssetFit::Contain,
            FitArg::Inside => AssetFit::Inside,
            FitArg::Outside => AssetFit::Outside,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum FormatArg {
    Auto,
    Webp,
    Avif,
    Jpg,
    Png,
}

impl From<FormatArg> for AssetFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Auto => AssetFormat::Auto,
            FormatArg::Webp => AssetFormat::Webp,
            FormatArg::Avif => AssetFormat::Avif,
            FormatArg::Jpg => AssetFormat::Jpg,
            FormatArg::Png => AssetFormat::Png,
        }
    }
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "strandly=info,tower_http=info",
        1 => "strandly=debug,tower_http=debug",
        _ => "strandly=trace,tower_http=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    if let Command::Config { action } = &cli.command {
        return match action {
            ConfigAction::Init => cmd_config_init(cli.config.as_deref()),
            ConfigAction::Show => cmd_config_show(cli.config.as_deref()),
        };
    }

    let (config, source) = resolve_config(cli.config.as_deref())?;
    info!(source = %describe_source(&source), "configuration loaded");

    match cli.command {
        Command::Serve { port, static_dir } => cmd_serve(config, port, static_dir).await,
        Command::Sitemap {
            out,
            site_url,
            stdout,
        } => cmd_sitemap(config, out, site_url, stdout).await,
        Command::Posts { action } => match action {
            PostsAction::List {
                query,
                category,
                tags,
                sort,
                page,
                json,
            } => {
                let service = BlogService::from_config(&config)?;
                let view_query = ViewQuery {
                    query,
                    category,
                    tags,
                    sort: SortOrder::from_key(&sort),
                    page,
                    ..service.query()
                };
                cmd_posts_list(&service, &view_query, json).await
            }
            PostsAction::Show { slug, json } => cmd_posts_show(&config, &slug, json).await,
        },
        Command::Tags { json } => cmd_tags(&config, json).await,
        Command::Asset {
            asset,
            srcset,
            width,
            height,
            quality,
            fit,
            format,
        } => {
            let transform = AssetTransform {
                width,
                height,
                quality,
                fit: fit.map(Into::into),
                format: format.map(Into::into),
            };
            cmd_asset(&config, &asset, &srcset, &transform)
        }
        Command::Config { .. } => Ok(()),
    }
}

fn describe_source(source: &ConfigSource) -> String {
    match source.path() {
        Some(path) => path.display().to_string(),
        None => "built-in defaults".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_serve(
    mut config: AppConfig,
    port: Option<u16>,
    static_dir: Option<String>,
) -> Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(dir) = static_dir {
        config.server.static_dir = dir;
    }

    if !Path::new(&config.server.static_dir).join("index.html").exists() {
        tracing::warn!(
            static_dir = %config.server.static_dir,
            "no index.html in build directory; only the API proxy will be useful"
        );
    }

    println!(
        "Serving {} on http://{}:{} (API at {})",
        config.server.static_dir, config.server.host, config.server.port, config.server.api_prefix
    );
    strandly_proxy::serve(&config).await?;
    Ok(())
}

async fn cmd_sitemap(
    mut config: AppConfig,
    out: Option<PathBuf>,
    site_url: Option<String>,
    stdout: bool,
) -> Result<()> {
    if let Some(url) = site_url {
        config.sitemap.site_url = url;
    }
    let today = chrono::Utc::now().date_naive();

    let progress = CliProgress::new();
    progress.phase("Fetching published posts");
    let result = strandly_sitemap::generate(&config, today).await;
    progress.finish();
    let xml = result?;

    if stdout {
        println!("{xml}");
        return Ok(());
    }

    let path = out.unwrap_or_else(|| PathBuf::from(&config.sitemap.output));
    strandly_sitemap::write_sitemap(&path, &xml)?;

    let urls = xml.matches("<url>").count();
    println!("sitemap.xml generated successfully!");
    println!("  Path: {}", path.display());
    println!("  URLs: {urls}");
    Ok(())
}

async fn cmd_posts_list(service: &BlogService, query: &ViewQuery, json: bool) -> Result<()> {
    info!(
        query = %query.query,
        category = %query.category,
        tags = ?query.tags,
        sort = query.sort.as_str(),
        page = query.page,
        "listing posts"
    );

    let posts = with_spinner("Fetching posts", service.posts()).await?;
    let view = strandly_blog::derive_view(&posts, query);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    print_view(&view, &posts, query);
    Ok(())
}

fn print_view(view: &BlogView, posts: &[Post], query: &ViewQuery) {
    println!();
    if view.is_empty() {
        println!("  No posts found. Try a different search or filter.");
        println!();
        return;
    }

    println!(
        "  Page {}/{}  ·  {} matching  ·  sort: {}",
        view.page,
        view.total_pages,
        view.total_matching,
        query.sort.as_str()
    );
    println!();

    for post in &view.items {
        let date = post
            .published_instant()
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "----------".to_string());
        let category = post.category.as_deref().unwrap_or("-");
        println!("  {date}  {}", post.title);
        println!(
            "              /blog/{}  ·  {category}  ·  {} min read",
            post.slug, post.reading_time_minutes
        );
        let tags: Vec<&str> = post.tag_names().collect();
        if !tags.is_empty() {
            println!("              tags: {}", tags.join(", "));
        }
    }

    println!();
    println!("  Categories: {}", categories(posts).join(", "));
    println!();
}

async fn cmd_posts_show(config: &AppConfig, slug: &str, json: bool) -> Result<()> {
    let service = BlogService::from_config(config)?;
    let detail = with_spinner("Fetching post", service.post_by_slug(slug)).await?;

    let Detail::Found(detail) = detail else {
        return Err(eyre!("no post with slug '{slug}'"));
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    let post = &detail.post;
    println!();
    println!("  {}", post.title);
    let author = post.author.display_name();
    if !author.is_empty() {
        println!("  By:       {author}");
    }
    println!("  Date:     {}", post.published_at);
    println!("  Reading:  {} min", post.reading_time_minutes);
    if let Some(category) = &post.category {
        println!("  Category: {category}");
    }
    let tags: Vec<&str> = post.tag_names().collect();
    if !tags.is_empty() {
        println!("  Tags:     {}", tags.join(", "));
    }
    if let Some(hero) = &post.hero_image {
        let assets = AssetUrlBuilder::from_config(config)?;
        println!("  Image:    {}", assets.url(hero, &AssetTransform::hero()));
    }
    println!();
    println!("{}", detail.html);
    Ok(())
}

async fn cmd_tags(config: &AppConfig, json: bool) -> Result<()> {
    let service = BlogService::from_config(config)?;
    let tags = with_spinner("Fetching tags", service.tags()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tags)?);
        return Ok(());
    }

    for tag in &tags {
        println!("  {:>4}  {}", tag.id, tag.name);
    }
    Ok(())
}

fn cmd_asset(
    config: &AppConfig,
    asset: &str,
    srcset: &[u32],
    transform: &AssetTransform,
) -> Result<()> {
    let assets = AssetUrlBuilder::from_config(config)?;
    if srcset.is_empty() {
        println!("{}", assets.url(asset, transform));
    } else {
        println!("{}", assets.srcset(asset, srcset, transform));
    }
    Ok(())
}

fn cmd_config_init(target: Option<&Path>) -> Result<()> {
    let path = init_config(target)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let (config, source) = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("# source: {}", describe_source(&source));
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress spinner
// ---------------------------------------------------------------------------

/// Spinner shown on stderr while the CMS is queried.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

async fn with_spinner<T>(message: &str, future: impl Future<Output = T>) -> T {
    let progress = CliProgress::new();
    progress.phase(message);
    let out = future.await;
    progress.finish();
    out
}
