//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;

#[cfg(test)]
mod test_support;

use crate::config::{AppState, Config};

#[tokio::main]
async fn main() {
    // RUST_LOG controla o nível; sem ele, `info`.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env().expect("Configuração inválida.");
    let app_state = AppState::new(&config)
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Escritas de companhia interrompidas no último processo.
    match app_state.intent_log.resume_pending().await {
        Ok(summary) if summary.resumed > 0 => tracing::info!(
            "🔁 Intenções retomadas: {} concluídas, {} ainda pendentes",
            summary.completed,
            summary.still_pending
        ),
        Ok(_) => {}
        Err(e) => tracing::warn!("⚠️ Falha ao retomar intenções pendentes: {}", e),
    }

    let app = routes::router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", config.bind_addr);
    tracing::info!("📚 Documentação em http://{}/swagger-ui", config.bind_addr);
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
