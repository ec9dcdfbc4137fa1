//! Traffic inspector demo.
//!
//! Runs a simulated interceptor on a background thread and drives an
//! inspector controller against the captured traffic, logging each page.
//!
//! ```text
//! RUST_LOG=debug inspector-demo [settings.json]
//! ```
//!
//! The optional settings file is a JSON object with an `"inspector"` section.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{error, info};
use traffic_inspector::bootstrap::build_registry;
use traffic_inspector::config::load_config;
use traffic_inspector::export::to_curl;
use traffic_inspector::models::{HttpMethod, RequestRecord, ResponseRecord, Transaction};
use traffic_inspector::registry::keys;
use traffic_inspector::{Filter, InspectorState, TransactionStore};

const ENDPOINTS: &[(HttpMethod, &str, u16)] = &[
    (HttpMethod::GET, "https://api.example.com/users", 200),
    (HttpMethod::POST, "https://api.example.com/users", 201),
    (HttpMethod::GET, "https://api.example.com/users/42", 404),
    (HttpMethod::DELETE, "https://api.example.com/sessions/7", 204),
    (HttpMethod::GET, "https://api.example.com/posts?page=2", 200),
    (HttpMethod::PUT, "https://api.example.com/posts/9", 500),
];

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = match std::env::args().nth(1) {
        Some(path) => Some(serde_json::from_str(&std::fs::read_to_string(path)?)?),
        None => None,
    };
    let config = load_config(settings)?;
    info!(
        "starting inspector demo (page size {}, debounce {}ms)",
        config.items_per_page, config.search_debounce_ms
    );

    let registry = build_registry(config);
    let store = registry.resolve(keys::STORE)?;
    let controller = registry.resolve(keys::CONTROLLER)?;

    let interceptor = {
        let store = Arc::clone(&store);
        thread::spawn(move || simulate_traffic(store.as_ref(), 30))
    };

    controller.reload().await;
    log_state("initial", &controller.state());

    interceptor
        .join()
        .map_err(|_| "interceptor thread panicked")??;

    controller.reload().await;
    log_state("after capture", &controller.state());

    while controller.load_more().await {
        log_state("load more", &controller.state());
    }

    controller.set_search("users");
    controller.set_search("users/42");
    controller.settle().await;
    log_state("search 'users/42'", &controller.state());

    if let Some(first) = controller.state().transactions.first() {
        info!("reproduce with:\n{}", to_curl(&first.request));
    }

    controller
        .set_filter(Filter::default().with_method(HttpMethod::GET))
        .await;
    log_state("GET only", &controller.state());
    info!("{}", controller.stats().summary());

    controller.clear_all().await;
    log_state("after clear", &controller.state());
    Ok(())
}

/// Appends a start event and a terminal event for `count` calls.
fn simulate_traffic(store: &dyn TransactionStore, count: usize) -> Result<(), String> {
    for i in 0..count {
        let (method, url, status) = ENDPOINTS[i % ENDPOINTS.len()];
        let mut request = RequestRecord::new(method, url).with_header("Accept", "application/json");
        if matches!(method, HttpMethod::POST | HttpMethod::PUT) {
            request = request
                .with_header("Content-Type", "application/json")
                .with_body(format!("{{\"seq\":{}}}", i));
        }

        let pending = Transaction::started(request);
        store.append(pending.clone()).map_err(|e| e.to_string())?;
        thread::sleep(Duration::from_millis(2));

        let terminal = if i % 11 == 10 {
            pending.fail("connection reset by peer")
        } else {
            pending.complete(ResponseRecord::new(status, "").with_body(b"{}".to_vec()))
        };
        store.append(terminal).map_err(|e| e.to_string())?;
    }
    info!("interceptor captured {} calls", count);
    Ok(())
}

fn log_state(label: &str, state: &InspectorState) {
    info!(
        "[{}] {:?}: showing {} of {} (page {}/{}, more: {})",
        label,
        state.phase,
        state.transactions.len(),
        state.total_count,
        state.page.current_page + 1,
        state.page.total_pages,
        state.has_more_pages
    );
    if let Some(err) = &state.error {
        error!("[{}] {}", label, err);
    }
}
