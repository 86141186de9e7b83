use std::path::Path;
use std::sync::Arc;
use std::{env, process};

use rustycall::config::Config;
use rustycall::log::{LogSink, Logger};
use rustycall::signaling::run::run_signaling_server_with_log;

/// Environment override for the config file path.
const CONFIG_ENV: &str = "RUSTYCALL_CONFIG";

fn usage(prog: &str) -> ! {
    eprintln!("Usage:");
    eprintln!("  {prog}                # [Signaling] bind_addr, default 0.0.0.0:5000");
    eprintln!("  {prog} [CONFIG.ini]   # load settings from a config file");
    eprintln!("  {prog} [ADDR]         # e.g. 0.0.0.0:6000");
    eprintln!("  {prog} [IP] [PORT]    # e.g. 127.0.0.1 6000");
    eprintln!();
    eprintln!("The config path may also be given with {CONFIG_ENV}.");
    process::exit(1);
}

fn load_config(path: &str) -> Config {
    match Config::load(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("[signaling_server] cannot load config {path}: {e}");
            process::exit(1);
        }
    }
}

fn main() -> std::io::Result<()> {
    // --- Parse CLI args ----------------------------------------------------
    let args: Vec<String> = env::args().collect();
    let prog = args.first().map(String::as_str).unwrap_or("signaling_server");

    let env_config = env::var(CONFIG_ENV).ok().filter(|p| !p.is_empty());
    let (config, bind_override) = match args.len() {
        1 => (env_config.as_deref().map(load_config).unwrap_or_else(Config::empty), None),
        2 if Path::new(&args[1]).is_file() => (load_config(&args[1]), None),
        2 => (
            env_config.as_deref().map(load_config).unwrap_or_else(Config::empty),
            Some(args[1].clone()),
        ),
        3 => (
            env_config.as_deref().map(load_config).unwrap_or_else(Config::empty),
            Some(format!("{}:{}", args[1], args[2])),
        ),
        _ => usage(prog),
    };

    // --- Start process logger ----------------------------------------------
    let logger = Logger::start_server(1024, &config);
    let log_sink: Arc<dyn LogSink> = Arc::new(logger.handle());

    eprintln!(
        "[signaling_server] starting ({})",
        bind_override.as_deref().unwrap_or("bind address from config")
    );

    // --- Run signaling server (blocks) -------------------------------------
    run_signaling_server_with_log(&config, bind_override, log_sink)
}
