use clap::Parser;
use std::env;
use std::path::PathBuf;

/// Command line overrides for the most commonly tweaked settings.
/// Anything not given here falls back to the environment.
#[derive(Parser, Debug)]
#[command(name = "applicant-intake", about = "Job application intake service")]
pub struct Cli {
    /// Port to listen on (overrides PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory for uploaded resume files (overrides UPLOAD_DIR)
    #[arg(long)]
    pub upload_dir: Option<PathBuf>,

    /// SQLite database file (overrides DATABASE_PATH)
    #[arg(long)]
    pub database: Option<PathBuf>,
}

/// Outbound mail settings. Optional as a group: when the credentials are
/// missing the service still starts, with notification disabled.
#[derive(Clone, Debug)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    /// Sender address; defaults to the SMTP username.
    pub from_address: String,
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Port the HTTP server binds on
    pub port: u16,

    /// Directory where resume artifacts are stored
    pub upload_dir: PathBuf,

    /// SQLite database file location
    pub database_path: PathBuf,

    /// Maximum accepted resume size (in bytes)
    /// Default: 10MB (10 * 1024 * 1024)
    pub max_upload_size: usize,

    /// Externally visible base URL used when building resume links
    pub public_base_url: String,

    /// Directory for rotated log files
    pub log_dir: String,

    /// Mail transport credentials, None when not configured
    pub mail: Option<MailConfig>,

    /// Internal address blind-copied on every confirmation, if set
    pub notify_bcc: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// All variables are optional and carry safe defaults, except the mail
    /// group, which is absent when SMTP_USER/SMTP_PASSWORD are unset:
    /// - PORT (default: 8080)
    /// - UPLOAD_DIR (default: ./uploads)
    /// - DATABASE_PATH (default: ./applicants.db)
    /// - MAX_UPLOAD_SIZE in bytes (default: 10485760 = 10MB)
    /// - PUBLIC_BASE_URL (default: http://127.0.0.1:PORT)
    /// - LOG_DIR (default: ./logs)
    /// - SMTP_HOST, SMTP_PORT, SMTP_USER, SMTP_PASSWORD, MAIL_FROM, NOTIFY_BCC
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./uploads"));

        let database_path = env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./applicants.db"));

        let max_upload_size = env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10 * 1024 * 1024); // Default: 10MB

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://127.0.0.1:{}", port));

        let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());

        let mail = match (env::var("SMTP_USER"), env::var("SMTP_PASSWORD")) {
            (Ok(username), Ok(password)) => {
                let smtp_host =
                    env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string());
                let smtp_port = env::var("SMTP_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(587);
                let from_address = env::var("MAIL_FROM").unwrap_or_else(|_| username.clone());
                Some(MailConfig {
                    smtp_host,
                    smtp_port,
                    username,
                    password,
                    from_address,
                })
            }
            _ => None,
        };

        let notify_bcc = env::var("NOTIFY_BCC").ok().filter(|s| !s.is_empty());

        Ok(Config {
            port,
            upload_dir,
            database_path,
            max_upload_size,
            public_base_url,
            log_dir,
            mail,
            notify_bcc,
        })
    }

    /// Apply command line overrides on top of the environment values
    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(port) = cli.port {
            self.port = port;
            if env::var("PUBLIC_BASE_URL").is_err() {
                self.public_base_url = format!("http://127.0.0.1:{}", port);
            }
        }
        if let Some(dir) = &cli.upload_dir {
            self.upload_dir = dir.clone();
        }
        if let Some(db) = &cli.database {
            self.database_path = db.clone();
        }
        self
    }
}
