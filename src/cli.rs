use anyhow::{Result, anyhow};
use pico_args::Arguments;
use std::{env, path::PathBuf};

use patience::config::{ProfileStore, default_profile_text};
use patience::events::{EngineEvent, EventSink, LogSink};
use patience::sequencer::StageSequencer;
use patience::sim::{self, Script};

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    // Flags first so they may appear anywhere on the line
    let seed: Option<u64> = pargs.opt_value_from_str("--seed")?;
    let hide_progress = pargs.contains("--no-progress");

    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            if let Some(t) = topic {
                print_subcmd_help(&t);
            } else {
                print_help();
            }
            Ok(())
        }

        Some("init") => {
            let store = ProfileStore::from_home()?;
            let path = store.install_default()?;
            println!("patience: default profile at {}", path.display());
            Ok(())
        }

        Some("list") => {
            let store = ProfileStore::from_home()?;
            let names = store.list_profiles();
            print_response(&serde_json::json!({
                "dir": store.profiles_dir,
                "profiles": names,
            }));
            Ok(())
        }

        Some("check") => {
            let arg: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: patience check <profile>"))?;
            let profile = ProfileStore::from_home()?.load(&arg)?;
            // building the sequence validates every task
            StageSequencer::from_profile(&profile, Vec::new())?;
            print_response(&profile.summary());
            Ok(())
        }

        Some("simulate") => {
            let usage = || anyhow!("usage: patience simulate <profile> <script> [--seed N]");
            let profile_arg: String = pargs.free_from_str().map_err(|_| usage())?;
            let script_arg: PathBuf = pargs.free_from_str().map_err(|_| usage())?;

            let mut profile = ProfileStore::from_home()?.load(&profile_arg)?;
            if seed.is_some() {
                profile.meta.seed = seed;
            }
            let script = Script::load(&script_arg)?;
            let mut seq = StageSequencer::from_profile(&profile, Vec::new())?;

            // stdout carries the JSON lines; the log gets a readable trace on stderr
            let mut trace = LogSink;
            let report = sim::run_script(&mut seq, &script, |t, ev| {
                trace.emit(ev.clone());
                if hide_progress && matches!(ev, EngineEvent::Progress { .. }) {
                    return;
                }
                print_event(t, ev);
            });
            println!("{}", serde_json::to_string(&report)?);
            Ok(())
        }

        Some("default-profile") => {
            print!("{}", default_profile_text());
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!(
        r#"patience - timed gesture minigame engine

USAGE:
  patience help [command]                      Show general or command-specific help
  patience init                                Install the default profile
  patience list                                List installed profiles
  patience check <profile>                     Validate a profile and summarise it
  patience simulate <profile> <script> [--seed N] [--no-progress]
                                               Replay a scripted session
  patience default-profile                     Print the bundled default profile

TIPS:
  - Profiles: ~/.config/patience/profiles
  - <profile> is a file path or the name of an installed profile
  - Logging: PATIENCE_LOG or RUST_LOG (default: info)
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "init" => println!(
            "usage: patience init\nWrites the bundled profile to ~/.config/patience/profiles/default.toml unless present."
        ),
        "list" => println!("usage: patience list\nLists installed profiles."),
        "check" => println!(
            "usage: patience check <profile>\nParses and validates a profile, then prints its stages."
        ),
        "simulate" => println!(
            "usage: patience simulate <profile> <script> [--seed N] [--no-progress]\nRuns a TOML input script against a profile and prints engine events as JSON lines."
        ),
        "default-profile" => {
            println!("usage: patience default-profile\nPrints the bundled default profile.")
        }
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}

fn print_event(t: f64, ev: &EngineEvent) {
    let mut v = serde_json::to_value(ev).unwrap_or_default();
    if let Some(obj) = v.as_object_mut() {
        obj.insert("t".into(), serde_json::json!((t * 1000.0).round() / 1000.0));
    }
    println!("{v}");
}

fn print_response(v: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(v).unwrap_or_default());
}
