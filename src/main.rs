#[actix_web::main]
async fn main() -> std::io::Result<()> {
    worknest_server::run().await
}
