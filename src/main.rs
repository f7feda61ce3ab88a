use actix_multipart::form::MultipartFormConfig;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

use applicant_intake::api::application::handlers::application_config;
use applicant_intake::api::application::ApplicationService;
use applicant_intake::api::health::health_config;
use applicant_intake::config::{Cli, Config};
use applicant_intake::db;
use applicant_intake::mailer::Mailer;
use applicant_intake::shutdown::ShutdownCoordinator;
use applicant_intake::storage::ResumeStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from environment, then command line overrides
    let cli = Cli::parse();
    let config = Config::from_env()
        .expect("Failed to load configuration")
        .with_cli(&cli);

    // Upload and log directories must exist before anything writes to them
    std::fs::create_dir_all(&config.upload_dir).expect("Failed to create upload directory");
    std::fs::create_dir_all(&config.log_dir).expect("Failed to create logs directory");

    // Initialize file-based logging with daily rotation and level separation
    // Log files will be created as: logs/info.2024-12-22.log, logs/error.2024-12-22.log, etc.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    let info_file = tracing_appender::rolling::daily(&config.log_dir, "info.log");
    let warn_file = tracing_appender::rolling::daily(&config.log_dir, "warn.log");
    let error_file = tracing_appender::rolling::daily(&config.log_dir, "error.log");

    let info_layer = tracing_subscriber::fmt::layer()
        .with_writer(info_file)
        .with_ansi(false)
        .with_filter(LevelFilter::INFO);

    let warn_layer = tracing_subscriber::fmt::layer()
        .with_writer(warn_file)
        .with_ansi(false)
        .with_filter(LevelFilter::WARN);

    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(error_file)
        .with_ansi(false)
        .with_filter(LevelFilter::ERROR);

    // Console layer for terminal output
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(info_layer)
        .with(warn_layer)
        .with(error_layer)
        .init();

    info!("Starting applicant-intake application");
    info!("Configuration loaded:");
    info!("  - Port: {}", config.port);
    info!("  - Upload directory: {}", config.upload_dir.display());
    info!("  - Database file: {}", config.database_path.display());
    info!("  - Max upload size: {} bytes", config.max_upload_size);
    info!("  - Public base URL: {}", config.public_base_url);

    // Store initialization is fatal: the service must not serve traffic
    // without a working database.
    let pool = db::connection::get_connection(&config.database_path)
        .await
        .expect("Failed to open database");
    info!("Database connection pool established");

    db::migrations::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // Mail is optional: start anyway, with notification disabled
    let mailer = match &config.mail {
        Some(mail) => match Mailer::from_config(mail, config.notify_bcc.as_deref()) {
            Ok(mailer) => {
                info!("Mail transport configured for {}", mail.smtp_host);
                Some(mailer)
            }
            Err(e) => {
                warn!("Mail transport misconfigured, confirmation emails disabled: {}", e);
                None
            }
        },
        None => {
            warn!("SMTP credentials not set, confirmation emails disabled");
            None
        }
    };

    let store = ResumeStore::new(config.upload_dir.clone(), config.max_upload_size);
    let service = web::Data::new(ApplicationService::new(
        pool.clone(),
        store,
        mailer,
        config.public_base_url.clone(),
    ));

    let server_pool = pool.clone();
    let upload_dir = config.upload_dir.clone();
    let max_upload_size = config.max_upload_size;

    let server = HttpServer::new(move || {
        // Leave headroom above the file ceiling so the intake check, not
        // the multipart reader, produces the size error.
        let multipart_config =
            MultipartFormConfig::default().total_limit(max_upload_size + 1024 * 1024);

        App::new()
            .app_data(web::Data::new(server_pool.clone())) // Share DB pool across workers
            .app_data(service.clone()) // Inject orchestrator + query service
            .app_data(multipart_config) // Global multipart/file upload size limit
            .configure(health_config) // Health check endpoints
            .configure(application_config)
            // Read-only static access to stored artifacts
            .service(actix_files::Files::new("/uploads", upload_dir.clone()))
    });

    info!("Server starting on http://0.0.0.0:{}", config.port);

    let server = server.bind(("0.0.0.0", config.port))?.run();

    // Get server handle for graceful shutdown
    let server_handle = server.handle();

    // Spawn server in background
    let server_task = tokio::spawn(server);

    // Create shutdown coordinator and wait for shutdown signal
    let coordinator = ShutdownCoordinator::new(server_handle, server_task, pool);

    coordinator.wait_for_shutdown().await
}
