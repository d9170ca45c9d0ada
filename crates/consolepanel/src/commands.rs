use std::path::PathBuf;
use std::sync::Arc;

use clap::ArgMatches;
use tracing::{error, info, warn};

use consolepanel_core::config::PanelConfig;
use consolepanel_core::events;
use consolepanel_core::preferences::{self, PreferencesStore};
use consolepanel_core::tools::{
    NewConsoleRequest, ToolAdapter, ToolError, require_handle, require_key, require_text,
    sanitize_handle,
};
use consolepanel_core::{ActionStatus, DisplayOrder, PathSegments};

use crate::remote::RemoteBackend;
use crate::watch::{WatchOptions, run_watch};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Load configuration with warning on errors.
///
/// Falls back to defaults if config loading fails, but warns the user.
fn load_config_with_warning() -> PanelConfig {
    match PanelConfig::load_hierarchy() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config: {}. Using defaults.", e);
            warn!(
                event = "cli.config.load_failed",
                error = %e,
                "Config load failed, using defaults"
            );
            PanelConfig::default()
        }
    }
}

/// Load preferences, surfacing a corrupt file instead of silently resetting it.
fn load_preferences_store(config: &PanelConfig) -> PreferencesStore {
    let data = preferences::load_preferences();
    if let Some(reason) = &data.load_error {
        eprintln!("Warning: {}. Starting with empty preferences.", reason);
        warn!(event = "cli.preferences.load_failed", error = %reason);
    }
    PreferencesStore::new(data, config.preferences.limits())
}

fn save_preferences_store(store: &PreferencesStore) -> CommandResult {
    preferences::save_preferences(store.data()).map_err(|e| {
        eprintln!("❌ Failed to save preferences: {}", e);
        events::log_app_error(&e);
        e.into()
    })
}

pub fn run_command(matches: &ArgMatches) -> CommandResult {
    events::log_app_startup(matches.subcommand_name().unwrap_or("none"));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(dispatch(matches))
}

async fn dispatch(matches: &ArgMatches) -> CommandResult {
    match matches.subcommand() {
        Some(("serve", sub_matches)) => handle_serve_command(sub_matches).await,
        Some(("list", sub_matches)) => handle_list_command(sub_matches).await,
        Some(("capture", sub_matches)) => handle_capture_command(sub_matches).await,
        Some(("focus", sub_matches)) => handle_focus_command(sub_matches).await,
        Some(("type", sub_matches)) => handle_type_command(sub_matches).await,
        Some(("key", sub_matches)) => handle_key_command(sub_matches).await,
        Some(("kill", sub_matches)) => handle_kill_command(sub_matches).await,
        Some(("new", sub_matches)) => handle_new_command(sub_matches).await,
        Some(("ls", sub_matches)) => handle_ls_command(sub_matches).await,
        Some(("star", sub_matches)) => handle_star_command(sub_matches),
        Some(("nick", sub_matches)) => handle_nick_command(sub_matches),
        Some(("watch", sub_matches)) => handle_watch_command(sub_matches).await,
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    }
}

async fn handle_serve_command(matches: &ArgMatches) -> CommandResult {
    let mut config = load_config_with_warning();
    if let Some(bind) = matches.get_one::<String>("bind") {
        config.server.bind = Some(bind.clone());
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = Some(*port);
    }
    config.validate()?;

    info!(
        event = "cli.serve_started",
        bind = config.server.bind(),
        port = config.server.port()
    );
    println!(
        "ConsolePanel listening on http://{}:{}",
        config.server.bind(),
        config.server.port()
    );

    match consolepanel_server::run_server(&config).await {
        Ok(()) => {
            events::log_app_shutdown();
            info!(event = "cli.serve_completed");
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Server failed: {}", e);
            error!(event = "cli.serve_failed", error = %e);
            events::log_app_error(&e);
            Err(e.into())
        }
    }
}

async fn handle_list_command(matches: &ArgMatches) -> CommandResult {
    let json_output = matches.get_flag("json");
    info!(event = "cli.list_started", json_output = json_output);

    let config = load_config_with_warning();
    let adapter = ToolAdapter::new(config.tools.clone());

    let windows = match adapter.list_windows().await {
        Ok(windows) => windows,
        Err(e) => return Err(tool_failure("list windows", e)),
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&windows)?);
    } else if windows.is_empty() {
        println!("No console windows found.");
    } else {
        let store = load_preferences_store(&config);
        let mut order = DisplayOrder::new();
        order.merge(&windows);

        println!(
            "{:<12} {:>8} {:>11}  {}",
            "HANDLE", "PID", "SIZE", "TITLE"
        );
        for entry in order.annotate(&windows, store.data()) {
            let star = if entry.starred { "★ " } else { "" };
            println!(
                "{:<12} {:>8} {:>11}  {}{}",
                entry.descriptor.handle,
                entry.descriptor.process_id,
                format!("{}x{}", entry.descriptor.width, entry.descriptor.height),
                star,
                entry.label()
            );
        }
    }

    info!(event = "cli.list_completed", count = windows.len());
    Ok(())
}

async fn handle_capture_command(matches: &ArgMatches) -> CommandResult {
    let raw = matches.get_one::<String>("handle").map(String::as_str);
    let handle = require_handle(raw).map_err(|e| validation_failure("capture", e))?;

    info!(event = "cli.capture_started", handle = handle);

    let config = load_config_with_warning();
    let adapter = ToolAdapter::new(config.tools.clone());

    let result = match adapter.capture_window(&handle).await {
        Ok(result) => result,
        Err(e) => return Err(tool_failure("capture window", e)),
    };

    let Some(bytes) = result.image_bytes() else {
        let reason = result.error.as_deref().unwrap_or("capture failed");
        eprintln!("❌ Capture of '{}' failed: {}", handle, reason);
        error!(event = "cli.capture_failed", handle = handle, error = reason);
        return Err(reason.to_string().into());
    };

    let output = matches
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("{}.png", handle)));
    if let Err(e) = tokio::fs::write(&output, bytes).await {
        eprintln!("❌ Failed to write '{}': {}", output.display(), e);
        events::log_app_error(&e);
        return Err(e.into());
    }

    let method = match result.method {
        Some(consolepanel_core::CaptureMethod::Primary) => "primary",
        Some(consolepanel_core::CaptureMethod::Fallback) => "fallback",
        None => "unknown",
    };
    println!(
        "✅ Captured '{}' ({}x{}, {}) to {}",
        handle,
        result.width,
        result.height,
        method,
        output.display()
    );
    info!(
        event = "cli.capture_completed",
        handle = handle,
        bytes = bytes.len(),
        path = %output.display()
    );
    Ok(())
}

async fn handle_focus_command(matches: &ArgMatches) -> CommandResult {
    let raw = matches.get_one::<String>("handle").map(String::as_str);
    let handle = require_handle(raw).map_err(|e| validation_failure("focus", e))?;
    info!(event = "cli.focus_started", handle = handle);

    let config = load_config_with_warning();
    let adapter = ToolAdapter::new(config.tools.clone());
    let status = adapter
        .foreground_window(&handle)
        .await
        .map_err(|e| tool_failure("focus window", e))?;

    report_status("focus", &handle, &status, "Focused")
}

async fn handle_type_command(matches: &ArgMatches) -> CommandResult {
    let raw = matches.get_one::<String>("handle").map(String::as_str);
    let handle = require_handle(raw).map_err(|e| validation_failure("type", e))?;
    let text = require_text(matches.get_one::<String>("text").map(String::as_str))
        .map_err(|e| validation_failure("type", e))?;
    info!(event = "cli.type_started", handle = handle, chars = text.chars().count());

    let config = load_config_with_warning();
    let adapter = ToolAdapter::new(config.tools.clone());
    let status = adapter
        .type_text(&handle, text)
        .await
        .map_err(|e| tool_failure("type text", e))?;

    if status.ok {
        let mut store = load_preferences_store(&config);
        store.push_history(text);
        if let Err(e) = preferences::save_preferences(store.data()) {
            warn!(event = "cli.type_history_save_failed", error = %e);
        }
    }

    report_status("type", &handle, &status, "Typed into")
}

async fn handle_key_command(matches: &ArgMatches) -> CommandResult {
    let raw = matches.get_one::<String>("handle").map(String::as_str);
    let handle = require_handle(raw).map_err(|e| validation_failure("key", e))?;
    let key = require_key(matches.get_one::<String>("key").map(String::as_str))
        .map_err(|e| validation_failure("key", e))?;
    info!(event = "cli.key_started", handle = handle, key = key);

    let config = load_config_with_warning();
    let adapter = ToolAdapter::new(config.tools.clone());
    let status = adapter
        .press_key(&handle, &key)
        .await
        .map_err(|e| tool_failure("press key", e))?;

    report_status("key", &handle, &status, &format!("Sent '{}' to", key))
}

async fn handle_kill_command(matches: &ArgMatches) -> CommandResult {
    let raw = matches.get_one::<String>("handle").map(String::as_str);
    let handle = require_handle(raw).map_err(|e| validation_failure("kill", e))?;
    info!(event = "cli.kill_started", handle = handle);

    let config = load_config_with_warning();
    let adapter = ToolAdapter::new(config.tools.clone());
    let status = adapter
        .kill_window(&handle)
        .await
        .map_err(|e| tool_failure("kill window", e))?;

    if status.ok {
        let mut store = load_preferences_store(&config);
        store.forget(&handle);
        if let Err(e) = preferences::save_preferences(store.data()) {
            warn!(event = "cli.kill_forget_failed", error = %e);
        }
    }

    report_status("kill", &handle, &status, "Closed")
}

async fn handle_new_command(matches: &ArgMatches) -> CommandResult {
    let request = NewConsoleRequest {
        command: matches.get_one::<String>("command").cloned(),
        title: matches.get_one::<String>("title").cloned(),
        directory: matches.get_one::<String>("directory").cloned(),
    };
    info!(
        event = "cli.new_started",
        has_command = request.command.is_some(),
        has_directory = request.directory.is_some()
    );

    let config = load_config_with_warning();
    let adapter = ToolAdapter::new(config.tools.clone());
    let status = adapter
        .spawn_console(&request)
        .await
        .map_err(|e| tool_failure("open console", e))?;

    let directory = request.directory.as_deref().filter(|d| !d.trim().is_empty());
    if let (true, Some(directory)) = (status.ok, directory) {
        let mut store = load_preferences_store(&config);
        store.remember_directory(directory);
        if let Err(e) = preferences::save_preferences(store.data()) {
            warn!(event = "cli.new_directory_save_failed", error = %e);
        }
    }

    report_status("new", "console", &status, "Opened")
}

async fn handle_ls_command(matches: &ArgMatches) -> CommandResult {
    let path = matches.get_one::<String>("path").map(String::as_str);
    info!(event = "cli.ls_started", path = path);

    let config = load_config_with_warning();
    let adapter = ToolAdapter::new(config.tools.clone());
    let listing = adapter
        .list_directory(path)
        .await
        .map_err(|e| tool_failure("list directory", e))?;

    if !listing.ok {
        let reason = listing.error.as_deref().unwrap_or("listing failed");
        eprintln!("❌ Cannot list '{}': {}", path.unwrap_or(listing.path.as_str()), reason);
        error!(event = "cli.ls_failed", error = reason);
        return Err(reason.to_string().into());
    }

    let segments = PathSegments::parse(&listing.path);
    let trail: Vec<String> = segments
        .breadcrumbs()
        .into_iter()
        .map(|crumb| crumb.name)
        .collect();
    println!("{}", trail.join(" › "));
    if let Some(parent) = segments.parent() {
        println!("  ..  {}", parent);
    }
    for dir in &listing.dirs {
        println!("  {}", segments.join(dir));
    }

    info!(event = "cli.ls_completed", count = listing.dirs.len());
    Ok(())
}

fn handle_star_command(matches: &ArgMatches) -> CommandResult {
    let raw = matches.get_one::<String>("handle").map(String::as_str);
    let handle = require_handle(raw).map_err(|e| validation_failure("star", e))?;
    let starred = !matches.get_flag("off");
    info!(event = "cli.star_started", handle = handle, starred = starred);

    let config = load_config_with_warning();
    let mut store = load_preferences_store(&config);
    let changed = store.set_starred(&handle, starred);
    save_preferences_store(&store)?;

    match (starred, changed) {
        (true, true) => println!("★ Starred '{}'", handle),
        (false, true) => println!("Unstarred '{}'", handle),
        (_, false) => println!("'{}' unchanged", handle),
    }
    info!(event = "cli.star_completed", handle = handle, changed = changed);
    Ok(())
}

fn handle_nick_command(matches: &ArgMatches) -> CommandResult {
    let raw = matches.get_one::<String>("handle").map(String::as_str);
    let handle = require_handle(raw).map_err(|e| validation_failure("nick", e))?;
    let name = matches.get_one::<String>("name").map(String::as_str);
    info!(event = "cli.nick_started", handle = handle, clearing = name.is_none());

    let config = load_config_with_warning();
    let mut store = load_preferences_store(&config);
    if let Err(e) = store.set_nickname(&handle, name) {
        eprintln!("❌ {}", e);
        events::log_app_error(&e);
        return Err(e.into());
    }
    save_preferences_store(&store)?;

    match store.data().nickname(&handle) {
        Some(nickname) => println!("'{}' is now '{}'", handle, nickname),
        None => println!("Cleared nickname for '{}'", handle),
    }
    info!(event = "cli.nick_completed", handle = handle);
    Ok(())
}

async fn handle_watch_command(matches: &ArgMatches) -> CommandResult {
    let config = load_config_with_warning();
    config.validate()?;

    let expand = matches
        .get_many::<String>("expand")
        .into_iter()
        .flatten()
        .map(|h| sanitize_handle(h))
        .filter(|h| !h.is_empty())
        .collect();
    let options = WatchOptions {
        out_dir: matches
            .get_one::<String>("out")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("captures")),
        expand,
        once: matches.get_flag("once"),
        list_interval: config.scheduler.list_interval(),
        scheduler: config.scheduler.scheduler_config(),
    };
    let store = load_preferences_store(&config);

    info!(
        event = "cli.watch_started",
        remote = matches.contains_id("server"),
        out_dir = %options.out_dir.display(),
        once = options.once
    );

    let result = match matches.get_one::<String>("server") {
        Some(base) => {
            let backend = RemoteBackend::new(base, config.tools.timeout());
            run_watch(Arc::new(backend), options, store.data()).await
        }
        None => {
            let adapter = ToolAdapter::new(config.tools.clone());
            run_watch(Arc::new(adapter), options, store.data()).await
        }
    };

    match result {
        Ok(captured) => {
            info!(event = "cli.watch_completed", captured = captured);
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Watch stopped: {}", e);
            error!(event = "cli.watch_failed", error = %e);
            events::log_app_error(&e);
            Err(e.into())
        }
    }
}

/// Print the outcome of a control tool. A logical failure exits nonzero.
fn report_status(command: &str, target: &str, status: &ActionStatus, verb: &str) -> CommandResult {
    if status.ok {
        println!("✅ {} '{}'", verb, target);
        info!(event = "cli.action_completed", command = command, target = target);
        Ok(())
    } else {
        let reason = status.error.as_deref().unwrap_or("tool reported failure");
        eprintln!("❌ {} failed for '{}': {}", command, target, reason);
        warn!(
            event = "cli.action_rejected",
            command = command,
            target = target,
            error = reason
        );
        Err(reason.to_string().into())
    }
}

fn validation_failure(command: &str, e: ToolError) -> Box<dyn std::error::Error> {
    eprintln!("❌ Invalid {} request: {}", command, e);
    warn!(event = "cli.request_rejected", command = command, error = %e);
    e.into()
}

fn tool_failure(action: &str, e: ToolError) -> Box<dyn std::error::Error> {
    eprintln!("❌ Failed to {}: {}", action, e);
    error!(event = "cli.tool_failed", action = action, error = %e);
    events::log_panel_error(&e);
    e.into()
}
