// --- Degree Requirement Planner - main entry point ---

use gradplan::gateway::SqliteGateway;
use gradplan::run_server;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    println!("=== Degree Requirement Planner (API) ===");

    if let Err(e) = gradplan::analytics::init_db() {
        eprintln!("WARN: could not initialize analytics DB: {}. Query logging disabled.", e);
    }

    let gateway = match SqliteGateway::open() {
        Ok(g) => g,
        Err(e) => {
            eprintln!("ERROR: could not open catalog store: {}", e);
            std::process::exit(1);
        }
    };

    let bind = "127.0.0.1:8080";
    println!("Starting server at http://{}", bind);
    run_server(bind, gateway).await
}
