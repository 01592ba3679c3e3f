use std::net::SocketAddr;

use crate::{
    Res,
    config::Config,
    info,
    server::{self, AppState},
};

pub async fn serve(config: Config, addr: Option<SocketAddr>) -> Res<()> {
    let state = AppState::new(&config)?;
    state.spawn_cleanup_tasks();

    let addr = addr.unwrap_or(config.server_addr);
    let listener = server::bind(addr).await?;

    info!("Listening on http://{}", addr);
    info!("Authorize by visiting http://{}/auth", addr);

    server::start_api_server(listener, state).await
}
