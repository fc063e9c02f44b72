/*****************************************************************************************
 *
 *  gugnag-server – Live-Editable Site Text Service
 *  ------------------------------------------------
 *
 *  VERSION: Text API + WebSocket fan-out (SQLite store with history)
 *
 *****************************************************************************************/

#[tokio::main]
async fn main() {
    gugnag_server::start_server().await;
}
