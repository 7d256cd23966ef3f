/// Sign a development bearer token for the meal plan API.
///
/// Usage: mint-token --user-id UID [--ttl-seconds 3600]
///   Reads the HS256 secret from AUTH_JWT_SECRET (or --secret).

use clap::Parser;
use jsonwebtoken::{encode, EncodingKey, Header};
use mealplan_api::models::auth::Claims;

#[derive(Parser)]
#[command(name = "mint-token", about = "Sign an HS256 bearer token for local testing")]
struct Args {
    /// User id placed in the `sub` claim
    #[arg(long)]
    user_id: String,

    /// Token lifetime in seconds
    #[arg(long, default_value_t = 3600)]
    ttl_seconds: i64,

    /// HS256 secret shared with the API
    #[arg(long, env = "AUTH_JWT_SECRET", hide_env_values = true)]
    secret: String,
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.user_id.trim().is_empty() {
        anyhow::bail!("--user-id must not be empty");
    }

    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: args.user_id.clone(),
        exp: (now + args.ttl_seconds).max(0) as usize,
        iat: now as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(args.secret.as_bytes()),
    )?;

    tracing::info!("Signed token for {} valid {}s", args.user_id, args.ttl_seconds);
    println!("{token}");
    Ok(())
}
