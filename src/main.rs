use clap::{Arg, ArgMatches, Command};
use log::error;
use serde_json::json;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;

use solo_auth::utils::logging::initialize_logging;
use solo_auth::utils::time::{format_duration, format_timestamp};
use solo_auth::{auth_router, AuthConfig, Method, Request, DEFAULT_ROUTE_PREFIX, USERS_FILE};

fn cli() -> Command {
    Command::new("solo-auth")
        .about("Credential registration, login and session tokens")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("PATH")
                .help("JSON configuration file"),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .global(true)
                .value_name("PATH")
                .help("Credential store file (default: users.json)"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .global(true)
                .value_name("PATH")
                .help("Append logs to this file instead of stderr"),
        )
        .subcommand(
            Command::new("register")
                .about("Register a new account")
                .arg(Arg::new("identifier").help("Email or username").required(true))
                .arg(password_arg()),
        )
        .subcommand(
            Command::new("login")
                .about("Log in and print a session token")
                .arg(Arg::new("identifier").help("Email or username").required(true))
                .arg(password_arg()),
        )
        .subcommand(
            Command::new("profile")
                .about("Show the account a session token belongs to")
                .arg(Arg::new("token").help("Session token").required(true)),
        )
}

fn password_arg() -> Arg {
    Arg::new("password")
        .long("password")
        .value_name("PASSWORD")
        .help("Password (prompted for when omitted)")
}

/// Take the password from the command line or prompt without echo
fn read_password(matches: &ArgMatches) -> Result<String, Box<dyn Error>> {
    if let Some(password) = matches.get_one::<String>("password") {
        return Ok(password.clone());
    }
    eprint!("Password: ");
    Ok(rpassword::read_password()?)
}

fn build_request(matches: &ArgMatches) -> Result<Request, Box<dyn Error>> {
    let request = match matches.subcommand() {
        Some(("register", sub)) | Some(("login", sub)) => {
            let name = matches.subcommand_name().unwrap_or_default();
            let identifier = sub.get_one::<String>("identifier").cloned().unwrap_or_default();
            let password = read_password(sub)?;
            Request::new(Method::Post, format!("{}/{}", DEFAULT_ROUTE_PREFIX, name))
                .with_json(json!({ "identifier": identifier, "password": password }))
        }
        Some(("profile", sub)) => {
            let token = sub.get_one::<String>("token").cloned().unwrap_or_default();
            Request::new(Method::Get, format!("{}/profile", DEFAULT_ROUTE_PREFIX))
                .with_header("Authorization", format!("Bearer {}", token))
        }
        _ => return Err("unknown command".into()),
    };
    Ok(request)
}

fn run() -> Result<bool, Box<dyn Error>> {
    let matches = cli().get_matches();

    initialize_logging(matches.get_one::<String>("log-file").map(Path::new))?;

    let mut config = AuthConfig::load(matches.get_one::<String>("config").map(Path::new))?;
    if let Some(store) = matches.get_one::<String>("store") {
        config.store_path = Some(PathBuf::from(store));
    }
    if config.store_path.is_none() {
        config.store_path = Some(PathBuf::from(USERS_FILE));
    }

    let service = config.build_service()?;
    let router = auth_router(DEFAULT_ROUTE_PREFIX);

    let request = build_request(&matches)?;
    let response = router.dispatch(&service, &request);

    println!("{} {} -> {}", request.method, request.path, response.status);
    println!("{}", serde_json::to_string_pretty(&response.body)?);

    if let Some(expires_at) = response.body.get("expiresAt").and_then(|v| v.as_u64()) {
        println!(
            "Token valid until {} UTC ({})",
            format_timestamp(expires_at),
            format_duration(service.token_ttl().as_secs())
        );
    }

    Ok(response.status < 400)
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    }
}
