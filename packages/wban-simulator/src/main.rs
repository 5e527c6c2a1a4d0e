//! main.rs — WBAN vitals simulator entry point
//!
//! Runs two concurrent tasks:
//!   1. Tick loop: one network reading per configured patient every interval,
//!      recorded in the history and broadcast to dashboard clients
//!   2. HTTP server: `/ws` live feed + control commands, REST views of the
//!      latest readings, per-patient history and the sensor catalog

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::{ws::{Message, WebSocket}, Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use clap::Parser;
use rand::rngs::StdRng;
use tokio::sync::{broadcast, RwLock};
use tokio::time::interval;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

use wban_simulator::config::FullConfig;
use wban_simulator::control::{clamp_interval, ControlCommand};
use wban_simulator::{HistoryBook, RadioConfig, RngSource, WbanGenerator};
use wban_types::{NetworkReading, SENSOR_CATALOG};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "wban-sim", about = "WBAN patient vitals simulator")]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    /// Tick interval override (milliseconds)
    #[arg(long)]
    interval_ms: Option<u64>,
    /// Fixed RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
    /// Dashboard server port
    #[arg(long)]
    ctrl_port: Option<u16>,
    /// Patient id to simulate (repeatable, replaces the configured list)
    #[arg(long = "patient")]
    patients: Vec<String>,
}

// ── Shared state ──────────────────────────────────────────────────────────────

type Generator = WbanGenerator<RngSource<StdRng>>;

struct SimState {
    generator: Generator,
    history: HistoryBook,
    patients: Vec<String>,
    paused: bool,
    interval_ms: u64,
    tick_counter: u64,
    radio: RadioConfig,
    seed: Option<u64>,
}

impl SimState {
    fn fresh_generator(radio: &RadioConfig, seed: Option<u64>) -> Generator {
        match seed {
            Some(s) => WbanGenerator::seeded(radio.clone(), s),
            None => WbanGenerator::from_entropy(radio.clone()),
        }
    }
}

type SharedState = Arc<RwLock<SimState>>;

#[derive(Clone)]
struct AppState {
    shared: SharedState,
    telem: Arc<broadcast::Sender<String>>,
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wban_simulator=info,wban_sim=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut cfg = FullConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config))?;
    if let Some(ms) = args.interval_ms {
        cfg.simulation.update_interval_ms = ms;
    }
    if args.seed.is_some() {
        cfg.simulation.seed = args.seed;
    }
    if let Some(port) = args.ctrl_port {
        cfg.simulation.ctrl_port = port;
    }
    if !args.patients.is_empty() {
        cfg.patients.ids = args.patients.clone();
    }
    cfg.validate().context("invalid configuration after CLI overrides")?;

    info!(
        "WBAN simulator starting: {} patients x {} sensors, tick {}ms, seed {:?}",
        cfg.patients.ids.len(),
        SENSOR_CATALOG.len(),
        cfg.simulation.update_interval_ms,
        cfg.simulation.seed
    );

    let shared: SharedState = Arc::new(RwLock::new(SimState {
        generator: SimState::fresh_generator(&cfg.radio, cfg.simulation.seed),
        history: HistoryBook::new(cfg.simulation.history_len),
        patients: cfg.patients.ids.clone(),
        paused: false,
        interval_ms: cfg.simulation.update_interval_ms,
        tick_counter: 0,
        radio: cfg.radio.clone(),
        seed: cfg.simulation.seed,
    }));

    // Broadcast channel for the dashboard feed
    let (telem_tx, _) = broadcast::channel::<String>(64);
    let telem_tx = Arc::new(telem_tx);

    tokio::spawn(sim_loop(shared.clone(), telem_tx.clone()));

    let ctrl_addr = format!("0.0.0.0:{}", cfg.simulation.ctrl_port);
    info!("Dashboard feed at ws://{ctrl_addr}/ws");

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(|| async { "wban-sim ok" }))
        .route("/sensors", get(list_sensors))
        .route("/patients", get(list_patients))
        .route("/patients/:id/latest", get(patient_latest))
        .route("/patients/:id/history", get(patient_history))
        .with_state(AppState { shared, telem: telem_tx })
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    let listener = tokio::net::TcpListener::bind(&ctrl_addr)
        .await
        .with_context(|| format!("binding {ctrl_addr}"))?;
    axum::serve(listener, app).await.context("dashboard server stopped")?;
    Ok(())
}

// ── Tick loop ─────────────────────────────────────────────────────────────────

async fn sim_loop(state: SharedState, telem: Arc<broadcast::Sender<String>>) {
    let mut current_ms = state.read().await.interval_ms;
    let mut ticker = interval(Duration::from_millis(current_ms));

    info!("Tick loop running every {current_ms}ms");

    loop {
        ticker.tick().await;

        let (paused, interval_ms) = {
            let s = state.read().await;
            (s.paused, s.interval_ms)
        };
        if interval_ms != current_ms {
            current_ms = interval_ms;
            ticker = interval(Duration::from_millis(current_ms));
            ticker.tick().await;
            info!("Tick interval now {current_ms}ms");
        }
        if paused { continue; }

        let (readings, tick) = {
            let mut s = state.write().await;
            s.tick_counter += 1;
            let patients = s.patients.clone();
            let mut out = Vec::with_capacity(patients.len());
            for patient in &patients {
                match s.generator.generate_network_reading(patient) {
                    Ok(reading) => {
                        s.history.record(reading.clone());
                        out.push(reading);
                    }
                    Err(e) => warn!("{patient}: no reading this tick: {e}"),
                }
            }
            (out, s.tick_counter)
        };

        for reading in &readings {
            match feed_message(reading) {
                Ok(msg) => { let _ = telem.send(msg); }
                Err(e) => warn!("feed: serialize failed: {e}"),
            }
        }

        if tick % 20 == 0 {
            let frames: usize = readings.iter().map(|r| r.frames.len()).sum();
            info!("tick={tick} | patients={} | frames={frames}", readings.len());
        } else {
            debug!("tick={tick} done");
        }
    }
}

fn feed_message(reading: &NetworkReading) -> serde_json::Result<String> {
    serde_json::to_string(&serde_json::json!({
        "type": "network_reading",
        "data": reading,
    }))
}

// ── WebSocket feed + control ──────────────────────────────────────────────────

async fn ws_handler(ws: WebSocketUpgrade, State(app): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_ws(socket, app))
}

async fn handle_ws(mut socket: WebSocket, app: AppState) {
    let mut telem_rx = app.telem.subscribe();

    // Send the latest reading of every patient immediately on connect
    let snapshot: Vec<String> = {
        let s = app.shared.read().await;
        s.history.latest().filter_map(|r| feed_message(r).ok()).collect()
    };
    for msg in snapshot {
        if socket.send(Message::Text(msg)).await.is_err() { return; }
    }

    loop {
        tokio::select! {
            Ok(msg) = telem_rx.recv() => {
                if socket.send(Message::Text(msg)).await.is_err() { break; }
            }
            Some(Ok(Message::Text(cmd))) = socket.recv() => {
                handle_command(&app.shared, &cmd).await;
            }
            else => break,
        }
    }
}

async fn handle_command(state: &SharedState, raw: &str) {
    let Some(cmd) = ControlCommand::parse(raw) else {
        warn!("Unknown control command: {raw}");
        return;
    };
    let mut s = state.write().await;
    match cmd {
        ControlCommand::Pause => { s.paused = true; info!("Sim paused"); }
        ControlCommand::Resume => { s.paused = false; info!("Sim resumed"); }
        ControlCommand::Reset => {
            s.generator = SimState::fresh_generator(&s.radio, s.seed);
            s.history.clear();
            s.tick_counter = 0;
            info!("Sim reset: new generator, history cleared");
        }
        ControlCommand::SetInterval { interval_ms } => {
            s.interval_ms = clamp_interval(interval_ms);
            info!("Tick interval set to {}ms", s.interval_ms);
        }
    }
}

// ── REST views ────────────────────────────────────────────────────────────────

async fn list_sensors() -> impl IntoResponse {
    Json(SENSOR_CATALOG)
}

async fn list_patients(State(app): State<AppState>) -> impl IntoResponse {
    Json(app.shared.read().await.patients.clone())
}

async fn patient_latest(Path(id): Path<String>, State(app): State<AppState>) -> Response {
    let s = app.shared.read().await;
    match s.history.patient(&id).and_then(|h| h.latest()) {
        Some(reading) => Json(reading.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, format!("no readings for {id}")).into_response(),
    }
}

async fn patient_history(Path(id): Path<String>, State(app): State<AppState>) -> Response {
    let s = app.shared.read().await;
    match s.history.patient(&id) {
        Some(h) => Json(serde_json::json!({
            "patient_id": id,
            "heart_rate": h.heart_rate_summary(),
            "readings": h.iter().collect::<Vec<_>>(),
        }))
        .into_response(),
        None => (StatusCode::NOT_FOUND, format!("no readings for {id}")).into_response(),
    }
}
