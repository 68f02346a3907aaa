#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    zerotime::run().await
}
