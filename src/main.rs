use actix_cors::Cors;
use actix_web::{
    http::header,
    middleware::{DefaultHeaders, Logger},
    web, App, HttpServer,
};
use clap::Parser;
use content_backend::{
    build_pool,
    config::Config,
    helper::{
        identity_helpers::{AllowList, GithubIdentityProvider, IdentityProvider},
        media_helpers::UploadPolicy,
        token_helpers::TokenService,
    },
    routes,
    storage::{AssetStore, LocalAssetStore, SupabaseAssetStore},
    AppState,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "content_server", author, version, about = "Starts the content backend web server.")]
struct Cli {
    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    let db_file = config.database_file();
    if !db_file.exists() {
        panic!(
            "FATAL: content.db not found at '{}'. Run 'cargo run --bin setup_cli -- --env-file <path> db setup'",
            db_file.display()
        );
    }

    let pool = build_pool(&db_file).expect("FATAL: Failed to create Rusqlite connection pool.");

    let (assets, local_media_root): (Arc<dyn AssetStore>, Option<String>) = match config.asset_store.as_str() {
        "supabase" => {
            let url = config.supabase_url.as_deref().expect("FATAL: SUPABASE_URL is not set.");
            let key = config
                .supabase_service_key
                .as_deref()
                .expect("FATAL: SUPABASE_SERVICE_KEY is not set.");
            log::info!("Storing assets in Supabase bucket '{}'.", config.storage_bucket);
            (Arc::new(SupabaseAssetStore::new(url, key, &config.storage_bucket)), None)
        }
        _ => {
            let media_path = config.media_path.clone().expect("FATAL: MEDIA_PATH is not set.");
            let public_base_url = config
                .public_base_url
                .as_deref()
                .expect("FATAL: PUBLIC_BASE_URL is not set.");
            fs::create_dir_all(&media_path).expect("Failed to create media directory");
            log::info!("Storing assets on disk under '{}'.", media_path);
            (
                Arc::new(LocalAssetStore::new(&media_path, public_base_url)),
                Some(media_path),
            )
        }
    };

    let identity: Arc<dyn IdentityProvider> = Arc::new(GithubIdentityProvider::new(
        &config.github_client_id,
        &config.github_client_secret,
        &config.redirect_uri,
    ));

    let app_state = web::Data::new(AppState {
        tokens: TokenService::new(
            &config.jwt_secret_key,
            chrono::Duration::minutes(config.jwt_access_token_expire_minutes),
        ),
        identity,
        assets,
        uploads: UploadPolicy::new(config.allowed_mime_types(), config.max_file_size),
        allow_list: AllowList::new(config.allowed_logins()),
        frontend_url: config.frontend_url.clone(),
    });
    let pool_data = web::Data::new(pool);

    let server_address = format!("{}:{}", config.web.host, config.web.port);
    log::info!("Server starting at http://{}", server_address);

    HttpServer::new(move || {
        let cors = {
            let allowed_origins_str = &config.allowed_origins;
            let cors = if allowed_origins_str.trim() == "*" {
                Cors::default().allow_any_origin()
            } else {
                let mut cors = Cors::default();
                let origins: Vec<&str> = allowed_origins_str.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
                for origin in origins {
                    cors = cors.allowed_origin(origin);
                }
                cors
            };
            cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
                .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        };

        let mut app = App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block")),
            )
            .app_data(app_state.clone())
            .app_data(pool_data.clone())
            .configure(routes::configure);

        // Local object keys start with `media/`, so the store root is served under /assets.
        if let Some(root) = &local_media_root {
            app = app.service(actix_files::Files::new("/assets", root));
        }
        app
    })
    .bind(server_address)?
    .run()
    .await
}
