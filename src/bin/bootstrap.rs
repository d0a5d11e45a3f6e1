use showroom::{Config, run_bootstrap};
use tracing_subscriber::EnvFilter;

fn print_usage(bin_name: &str) {
    eprintln!("Usage: {bin_name} <user_name> [--password <password>] [--full-name <name>] [--skip-migrations]");
    eprintln!();
    eprintln!("Creates the admin account (password required) or refreshes an existing one.");
}

fn init_tracing(log_level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_line_number(true);

    if json_format {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

struct Args {
    user_name: String,
    password: Option<String>,
    full_name: Option<String>,
    skip_migrations: bool,
}

fn parse_args(bin_name: &str) -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let mut user_name = None;
    let mut password = None;
    let mut full_name = None;
    let mut skip_migrations = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--password" => {
                password = Some(args.next().ok_or("--password requires a value")?);
            }
            "--full-name" => {
                full_name = Some(args.next().ok_or("--full-name requires a value")?);
            }
            "--skip-migrations" => skip_migrations = true,
            "--help" | "-h" => {
                print_usage(bin_name);
                std::process::exit(0);
            }
            other if other.starts_with("--") => return Err(format!("Unknown flag: {other}")),
            other => {
                if user_name.replace(other.to_string()).is_some() {
                    return Err("Only one user name may be given".to_string());
                }
            }
        }
    }

    Ok(Args {
        user_name: user_name.ok_or("A user name is required")?,
        password,
        full_name,
        skip_migrations,
    })
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let bin_name = std::env::args().next().unwrap_or_else(|| "bootstrap".to_string());
    let args = match parse_args(&bin_name) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("Error: {err}");
            print_usage(&bin_name);
            std::process::exit(2);
        }
    };

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level, config.logging.json_format);
    println!("Using database: {}", config.database.url);

    match run_bootstrap(
        &config,
        &args.user_name,
        args.password.as_deref(),
        args.full_name.as_deref(),
        args.skip_migrations,
    )
    .await
    {
        Ok(outcome) if outcome.created => {
            println!("Admin account created with user name: {}", outcome.user_name);
        }
        Ok(outcome) => {
            if outcome.password_changed {
                println!("Admin account {} updated (password refreshed).", outcome.user_name);
            } else {
                println!("Admin account {} updated.", outcome.user_name);
            }
        }
        Err(err) => {
            eprintln!("Bootstrap failed: {err}");
            std::process::exit(1);
        }
    }
}
