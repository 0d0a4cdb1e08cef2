use clap::Parser;
use color_eyre::Result;
use tracing::info;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use leadquiz::db::Db;
use leadquiz::email::ResendEmailSender;
use leadquiz::services::admin_auth::AdminAuthService;
use leadquiz::services::scoring::ScoringPolicy;
use leadquiz::stytch::StytchClient;
use leadquiz::{names, router, utils, AppState};

#[derive(Parser, Debug)]
#[command(version = utils::VERSION)]
struct Args {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://leadquiz.db")]
    database_url: String,

    #[arg(long, env = "BIND_ADDRESS", default_value = "127.0.0.1:1414")]
    address: String,

    #[arg(long, env = "STYTCH_PROJECT_ID", default_value = "")]
    stytch_project_id: String,

    #[arg(long, env = "STYTCH_SECRET", default_value = "")]
    stytch_secret: String,

    /// Role an account must hold to pass the admin gate.
    #[arg(long, env = "STYTCH_ADMIN_ROLE", default_value = names::DEFAULT_ADMIN_ROLE)]
    stytch_admin_role: String,

    /// Email delivery is disabled when unset.
    #[arg(long, env = "RESEND_API_KEY")]
    resend_api_key: Option<String>,

    #[arg(long, env = "RESEND_FROM_EMAIL", default_value = names::DEFAULT_FROM_EMAIL)]
    resend_from_email: String,

    #[arg(long, env = "RESEND_FROM_NAME", default_value = names::DEFAULT_FROM_NAME)]
    resend_from_name: String,

    /// Default for lead notifications; the app_settings row overrides it.
    #[arg(long, env = "NOTIFY_ADMIN", default_value_t = false)]
    notify_admin: bool,

    #[arg(long, env = "ADMIN_NOTIFICATION_EMAIL")]
    admin_notification_email: Option<String>,

    #[arg(long, env = "SCORING_POLICY", value_enum, default_value_t = ScoringPolicy::Weighted)]
    scoring_policy: ScoringPolicy,

    #[arg(long, env = "SECURE_COOKIES", default_value_t = false)]
    secure_cookies: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("leadquiz=debug")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let args = Args::parse();

    let db = Db::new(&args.database_url).await?;

    let state = AppState {
        db,
        auth: AdminAuthService::new(
            StytchClient::new(args.stytch_project_id, args.stytch_secret),
            args.stytch_admin_role,
        ),
        email: ResendEmailSender::new(
            args.resend_api_key,
            args.resend_from_email,
            args.resend_from_name,
        ),
        scoring_policy: args.scoring_policy,
        secure_cookies: args.secure_cookies,
        notify_admin_default: args.notify_admin,
        admin_notification_email: args.admin_notification_email,
    };

    let listener = tokio::net::TcpListener::bind(&args.address).await?;
    info!("listening on {}", args.address);
    axum::serve(listener, router(state)).await?;

    Ok(())
}
