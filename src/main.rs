use actix_cors::Cors;
use actix_files::Files;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};

use mail_atlas::api;
use mail_atlas::cli::Args;
use mail_atlas::dao::SqliteDB;
use mail_atlas::service::{GeoClient, GeoResolver};

#[actix_web::main]
async fn main() -> Result<()> {
    let args = Args::parse().merge_with_config()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    info!("Mail Atlas starting");
    info!(
        "Config: host={}, port={}, db={}, geo_api={}, static={}",
        args.host, args.port, args.database, args.geo_api_url, args.static_dir
    );
    if args.api_key.is_none() {
        info!("No geolocation API key configured; lookups for new IPs will fail");
    }

    let db = SqliteDB::new(&args.database)?;
    info!("Database initialized");

    let geo = GeoClient::new(args.geo_api_url.clone(), args.api_key.clone());
    let resolver = GeoResolver::new(db.clone(), geo);

    let static_dir = args.static_dir.clone();
    info!("Listening on {}:{}", args.host, args.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(resolver.clone()))
            .configure(api::init_routes)
            .service(Files::new("/", static_dir.as_str()).index_file("index.html"))
    })
    .bind((args.host.as_str(), args.port))?
    .run()
    .await?;

    Ok(())
}
