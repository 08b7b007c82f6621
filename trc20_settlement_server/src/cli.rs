use std::{env, env::VarError};

/// There's no real CLI for the gateway, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 10] = [
        "RUST_LOG",
        "TSG_DATABASE_URL",
        "TSG_TRONSCAN_API_URL",
        "TSG_USDT_CONTRACT_ID",
        "TSG_POLL_INTERVAL_SECS",
        "TSG_ROUND_BUDGET_MS",
        "TSG_LOOKBACK_HOURS",
        "TSG_CALLBACK_MAX_ATTEMPTS",
        "TSG_CALLBACK_BACKOFF_SECS",
        "TSG_TELEGRAM_CHAT_ID",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
