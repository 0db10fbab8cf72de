use activity_socket::{observer::ConnectionObserver, ws::ClientConfig};

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let api_base = std::env::var("API_BASE_URL")
        .map_err(|_| {
            println!("No API_BASE_URL env var or invalid");
            std::process::exit(1);
        })
        .unwrap();

    let client = activity_socket::activity_client(&api_base, ClientConfig::default()).unwrap();
    let mut observer = ConnectionObserver::new(&client);

    client.connect();

    while observer.changed().await {
        let snapshot = observer.snapshot();

        println!(
            "[{:?}] {}",
            snapshot.indicator(),
            snapshot.connection_state.status_text()
        );

        if let Some(records) = snapshot.activity.as_ref().and_then(|a| a.records()) {
            for record in records {
                println!("  {} last active {}", record.phone, record.last_active);
            }
        }
    }
}
