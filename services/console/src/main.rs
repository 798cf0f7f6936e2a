use hireflow_console::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("application error: {}", err.user_message());
        std::process::exit(1);
    }
}
