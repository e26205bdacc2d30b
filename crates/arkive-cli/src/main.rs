use std::process;

#[tokio::main]
async fn main() {
    let code = arkive_cli::run().await;
    process::exit(code);
}
