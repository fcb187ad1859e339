// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Blueprint Studio CLI entrypoint.
//!
//! By default this opens an editing session and serves MCP over streamable HTTP at
//! `http://127.0.0.1:<port>/mcp`, plus uploaded assets under `/assets`, until Ctrl-C.
//!
//! Use `--mcp` to run the MCP server over stdio instead (intended for tool integrations).

use std::error::Error;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use rmcp::transport::{
    streamable_http_server::session::local::LocalSessionManager, StreamableHttpServerConfig,
    StreamableHttpService,
};

use blueprint_studio::config::EditorConfig;
use blueprint_studio::mcp::BlueprintMcp;
use blueprint_studio::memory::{MemoryAssets, MemoryPersistence};
use blueprint_studio::model::fixtures::sample_blueprint;
use blueprint_studio::model::{AssetNamespace, Blueprint, BlueprintId, RecordId};
use blueprint_studio::notice::LogNotifier;
use blueprint_studio::preview::BroadcastPreview;
use blueprint_studio::resolve::{BusinessContext, UnconfiguredGenerator};
use blueprint_studio::session::{EditorServices, EditorSession};
use blueprint_studio::store::{FolderAssets, FolderStore, WriteDurability};

const DEFAULT_MCP_HTTP_PORT: u16 = 27436;
const DEFAULT_LOCALE: &str = "en";

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<workspace-dir>] [--record <id>] [--business <name>] [--niche <niche>] [--locale <tag>] [--durable-writes] [--mcp-http-port <port>]\n  {program} [<workspace-dir>] [--record <id>] [...] --mcp\n  {program} --demo [--business <name>] [--mcp | --mcp-http-port <port>]\n\nHTTP mode (default) serves MCP at `http://127.0.0.1:<port>/mcp` and uploads under `/assets`.\n--mcp-http-port selects the port (0 = ephemeral; default {DEFAULT_MCP_HTTP_PORT}).\n\nIf workspace-dir is omitted, the current working directory is used.\n--record reopens a saved blueprint; without it a new blueprint is started and stored on first save.\n--demo keeps everything in memory and cannot be combined with workspace-dir or --record.\n\n--durable-writes opts into slower, best-effort durable persistence (fsync/sync where supported).\nEnvironment: BLUEPRINT_* settings (see config), RUST_LOG for log filtering."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    mcp: bool,
    demo: bool,
    workspace_dir: Option<String>,
    record: Option<String>,
    business: Option<String>,
    niche: Option<String>,
    locale: Option<String>,
    mcp_http_port: Option<u16>,
    durable_writes: bool,
}

fn set_once(slot: &mut Option<String>, value: Option<String>) -> Result<(), ()> {
    if slot.is_some() {
        return Err(());
    }
    *slot = Some(value.ok_or(())?);
    Ok(())
}

fn set_flag(flag: &mut bool) -> Result<(), ()> {
    if *flag {
        return Err(());
    }
    *flag = true;
    Ok(())
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--mcp" => set_flag(&mut options.mcp)?,
            "--demo" => set_flag(&mut options.demo)?,
            "--durable-writes" => set_flag(&mut options.durable_writes)?,
            "--record" => set_once(&mut options.record, args.next())?,
            "--business" => set_once(&mut options.business, args.next())?,
            "--niche" => set_once(&mut options.niche, args.next())?,
            "--locale" => set_once(&mut options.locale, args.next())?,
            "--mcp-http-port" => {
                if options.mcp_http_port.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let port: u16 = raw.parse().map_err(|_| ())?;
                options.mcp_http_port = Some(port);
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => set_once(&mut options.workspace_dir, Some(arg))?,
        }
    }

    if options.demo && (options.workspace_dir.is_some() || options.record.is_some()) {
        return Err(());
    }

    if options.mcp && options.mcp_http_port.is_some() {
        return Err(());
    }

    Ok(options)
}

/// A fresh starter document for a new workspace blueprint.
fn starter_blueprint(name: Option<&str>) -> Result<Blueprint, Box<dyn Error>> {
    let mut document = sample_blueprint();
    document.set_id(BlueprintId::new(format!("bp-{}", uuid::Uuid::new_v4()))?);
    if let Some(name) = name {
        document.set_name(name);
    }
    Ok(document)
}

struct Opened {
    session: EditorSession,
    assets: Option<Arc<FolderAssets>>,
}

/// Builds the session from options. Must run inside the tokio runtime.
fn open_session(options: &CliOptions, config: &EditorConfig) -> Result<Opened, Box<dyn Error>> {
    let namespace = AssetNamespace::new(config.asset_namespace.as_str());
    let preview = Arc::new(BroadcastPreview::default());
    let notifier = Arc::new(LogNotifier);
    let generator = Arc::new(UnconfiguredGenerator);

    if options.demo {
        let mut document = sample_blueprint();
        if let Some(name) = options.business.as_deref() {
            document.set_name(name);
        }
        let context = business_context(options, document.name(), None);
        let services = EditorServices {
            persistence: Arc::new(MemoryPersistence::new()),
            generator,
            assets: Arc::new(MemoryAssets::new(config.asset_base_url.as_str(), namespace)),
            preview,
            notifier,
        };
        let session = EditorSession::open(document, None, context, services, config)?;
        return Ok(Opened { session, assets: None });
    }

    let dir = options.workspace_dir.clone().unwrap_or_else(|| ".".to_owned());
    let durability = WriteDurability::from_flag(config.durable_writes);
    let store = FolderStore::new(&dir).with_durability(durability);
    let assets = Arc::new(
        FolderAssets::new(&dir, config.asset_base_url.clone(), namespace).with_durability(durability),
    );

    let (document, record_id, context) = match options.record.as_deref() {
        Some(raw) => {
            let record_id = RecordId::new(raw)?;
            let record = store.load(&record_id)?;
            let context = business_context(options, &record.meta.business_name, Some(&record.meta));
            (record.document, Some(record_id), context)
        }
        None => {
            let document = starter_blueprint(options.business.as_deref())?;
            let context = business_context(options, document.name(), None);
            (document, None, context)
        }
    };

    let services = EditorServices {
        persistence: Arc::new(store),
        generator,
        assets: assets.clone(),
        preview,
        notifier,
    };
    let session = EditorSession::open(document, record_id, context, services, config)?;
    Ok(Opened { session, assets: Some(assets) })
}

fn business_context(
    options: &CliOptions,
    fallback_name: &str,
    saved: Option<&blueprint_studio::persist::SaveMeta>,
) -> BusinessContext {
    let pick = |flag: &Option<String>, saved: Option<&String>, default: &str| {
        flag.clone()
            .or_else(|| saved.filter(|value| !value.is_empty()).cloned())
            .unwrap_or_else(|| default.to_owned())
    };
    BusinessContext {
        name: pick(&options.business, None, fallback_name),
        niche: pick(&options.niche, saved.map(|meta| &meta.niche), ""),
        locale: pick(&options.locale, saved.map(|meta| &meta.locale), DEFAULT_LOCALE),
    }
}

fn content_type(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

async fn serve_asset(State(assets): State<Arc<FolderAssets>>, Path(path): Path<String>) -> Response {
    let Some(file) = assets.resolve_relative(&path) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let mime = content_type(&file);
    match tokio::task::spawn_blocking(move || std::fs::read(file)).await {
        Ok(Ok(bytes)) => ([(header::CONTENT_TYPE, mime)], bytes).into_response(),
        Ok(Err(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            StatusCode::NOT_FOUND.into_response()
        }
        Ok(Err(err)) => {
            tracing::warn!(%path, %err, "cannot read asset");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(err) => {
            tracing::warn!(%path, %err, "asset read task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn serve_http(
    mcp: BlueprintMcp,
    assets: Option<Arc<FolderAssets>>,
    port: u16,
) -> Result<(), Box<dyn Error>> {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "serving MCP at /mcp");

    let config = StreamableHttpServerConfig {
        stateful_mode: true,
        ..StreamableHttpServerConfig::default()
    };
    let shutdown_token = config.cancellation_token.clone();
    let server_shutdown = shutdown_token.clone();

    let session_manager = Arc::new(LocalSessionManager::default());
    let mcp_service = {
        let mcp = mcp.clone();
        StreamableHttpService::new(move || Ok(mcp.clone()), session_manager, config)
    };

    let router = match assets {
        Some(assets) => Router::new()
            .route("/assets/{*path}", get(serve_asset))
            .with_state(assets)
            .nest_service("/mcp", mcp_service),
        None => Router::new().nest_service("/mcp", mcp_service),
    };
    let server_handle = tokio::spawn(async move {
        let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
            server_shutdown.cancelled().await;
        });
        if let Err(err) = serve.await {
            tracing::error!(%err, "MCP HTTP server error");
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    shutdown_token.cancel();
    let _ = server_handle.await;
    mcp.close().await;
    Ok(())
}

async fn run(options: CliOptions, config: EditorConfig) -> Result<(), Box<dyn Error>> {
    let Opened { session, assets } = open_session(&options, &config)?;
    let mcp = BlueprintMcp::new(session);

    if options.mcp {
        mcp.serve_stdio().await?;
        return Ok(());
    }
    serve_http(mcp, assets, options.mcp_http_port.unwrap_or(DEFAULT_MCP_HTTP_PORT)).await
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "blueprint-studio".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        blueprint_studio::logging::init_tracing();

        let mut config = EditorConfig::from_env()?;
        if options.durable_writes {
            config.durable_writes = true;
        }

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        runtime.block_on(run(options, config))
    })();

    if let Err(err) = result {
        eprintln!("blueprint-studio: {err}");
        std::process::exit(1);
    }
}
