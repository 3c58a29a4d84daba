//! Precinct Desk - Main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use precinct_desk_lib::api::{self, ApiDoc, UploadLimit};
use precinct_desk_lib::auth::SessionVerifier;
use precinct_desk_lib::config::Config;
use precinct_desk_lib::db::DbPool;
use precinct_desk_lib::middleware;
use precinct_desk_lib::services::{FileKvStore, Storage, WorkflowRegistry, start_eviction_task};
use precinct_desk_lib::workflow::{Collaborators, DataService, Devices, ObjectStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL, PD_SESSION_SECRET and S3 credentials must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Precinct Desk");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
        info!("Using development defaults for DATABASE_URL and PD_SESSION_SECRET");
    }

    let pool = match DbPool::new(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };
    info!("Database connection established");

    let storage = match Storage::new(&config.s3).await {
        Ok(storage) => storage,
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            std::process::exit(1);
        }
    };

    let drafts = match FileKvStore::open(config.drafts_dir()).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open draft store: {}", e);
            std::process::exit(1);
        }
    };
    info!("Draft store at {}", drafts.dir().display());

    // Prepare shared state
    let data: Arc<dyn DataService> = Arc::new(pool);
    let objects: Arc<dyn ObjectStore> = Arc::new(storage);
    let registry = web::Data::new(WorkflowRegistry::new(Collaborators {
        data: data.clone(),
        objects: objects.clone(),
        kv: Arc::new(drafts),
        devices: Devices::unavailable(),
    }));

    // Evict workflow runs nobody has touched for a while
    start_eviction_task(registry.clone().into_inner(), config.runs);
    info!(
        "Run eviction started (idle ttl: {} seconds)",
        config.runs.ttl_secs
    );
    let data = web::Data::from(data);
    let objects = web::Data::from(objects);
    let verifier = web::Data::new(SessionVerifier::new(&config.session));
    let upload_limit = web::Data::new(UploadLimit(config.max_upload_size));

    let bind_address = config.bind_address();
    let is_development = config.is_development();
    let max_upload_size = config.max_upload_size;

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    // Start HTTP server
    let server = HttpServer::new(move || {
        let methods = vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"];
        let headers = vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE];
        let cors = if is_development {
            Cors::default()
                .allowed_origin("http://localhost:8081")
                .allowed_origin("http://127.0.0.1:8081")
                .allowed_methods(methods)
                .allowed_headers(headers)
                .max_age(3600)
        } else {
            // Restrictive CORS for production (same-origin only)
            Cors::default()
                .allowed_methods(methods)
                .allowed_headers(headers)
                .max_age(3600)
        };

        let mut app = App::new()
            // CORS must wrap before other middleware
            .wrap(cors)
            .wrap(middleware::RequestLogger)
            .app_data(data.clone())
            .app_data(objects.clone())
            .app_data(registry.clone())
            .app_data(verifier.clone())
            .app_data(upload_limit.clone())
            .app_data(web::PayloadConfig::new(max_upload_size))
            .service(web::scope("/api/v1").configure(api::configure_routes));

        if is_development {
            app = app.service(
                SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()),
            );
        }

        app
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
