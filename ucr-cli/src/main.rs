//! ucr: CLI binary for UCCA reward-model data generation.
//!
//! Subcommands:
//! - vocab
//! - score
//! - build
//! - inspect
//! - oracles
//! - simulate

use std::env;
use std::path::PathBuf;
use std::process;

use ucr_core::{score_all, vocab, Config, OracleAction, ParserSettings};
use ucr_oracle::{replay_all, replay_lines, ReplayConfig, ScriptedBackend, ScriptedGraph};

fn print_help() {
    eprintln!(
        r#"ucr - UCCA reward-model data CLI

USAGE:
    ucr <COMMAND> [OPTIONS]

COMMANDS:
    vocab               Print the 88-entry action vocabulary and its encodings
    score               Score the vocabulary against one oracle valid set
    build               Replay recorded oracle traces and write a training dataset
    inspect             Summarize a written dataset
    oracles             Print the oracle action sequence of every trace
    simulate            Drive the simulation adapter with the oracle's choices

OPTIONS:
    -h, --help          Print this help message
    -V, --version       Print version

Run `ucr <COMMAND> --help` for command options.
"#
    );
}

fn print_version() {
    println!("ucr {}", env!("CARGO_PKG_VERSION"));
}

/// Value following the flag at `args[i]`, or exit.
fn flag_value(args: &[String], i: usize) -> String {
    args.get(i + 1).cloned().unwrap_or_else(|| {
        eprintln!("Missing value for {}", args[i]);
        process::exit(1);
    })
}

/// Load the YAML config (defaults if `path` is None) plus the blake3 hash of its bytes.
fn load_config(path: Option<&str>) -> (Config, Option<String>) {
    let Some(path) = path else {
        return (Config::default(), None);
    };
    let bytes = std::fs::read(path).unwrap_or_else(|e| {
        eprintln!("Failed to read config file: {e}");
        process::exit(1);
    });
    let text = String::from_utf8(bytes).unwrap_or_else(|e| {
        eprintln!("Config file is not UTF-8: {e}");
        process::exit(1);
    });
    let cfg = Config::from_yaml(&text).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}");
        process::exit(1);
    });
    (cfg, Some(ucr_logging::hash_config_bytes(text.as_bytes())))
}

fn load_traces(path: &str) -> Vec<ScriptedGraph> {
    ucr_oracle::load_traces(path).unwrap_or_else(|e| {
        eprintln!("Failed to load traces {path}: {e}");
        process::exit(1);
    })
}

fn cmd_vocab(args: &[String]) {
    if let Some(a) = args.first() {
        if a == "--help" || a == "-h" {
            println!("ucr vocab\n\nUSAGE:\n    ucr vocab\n");
            return;
        }
        eprintln!("Unknown option for `ucr vocab`: {a}");
        process::exit(1);
    }
    println!("action space: {}", ucr_core::ACTION_SPACE_ID);
    println!("{:>3}  {:<22} type10 hasLabel label14", "idx", "action");
    for (idx, a) in vocab().iter().enumerate() {
        let e = a.encode();
        println!(
            "{:>3}  {:<22} {:>6} {:>8} {:>7}",
            idx,
            a.to_string(),
            e.type_code,
            e.has_label,
            e.label_code
        );
    }
}

fn cmd_score(args: &[String]) {
    let mut valid: Option<String> = None;
    let mut all = false;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!(
                    r#"ucr score

USAGE:
    ucr score --valid SHIFT,NODE-H [--all]

OPTIONS:
    --valid LIST    Comma-separated oracle actions (canonical strings); may be empty
    --all           Print every vocabulary entry, not only the rewarded ones
"#
                );
                return;
            }
            "--valid" => {
                valid = Some(flag_value(args, i));
                i += 2;
            }
            "--all" => {
                all = true;
                i += 1;
            }
            other => {
                eprintln!("Unknown option for `ucr score`: {}", other);
                eprintln!("Run `ucr score --help` for usage.");
                process::exit(1);
            }
        }
    }

    let valid = valid.unwrap_or_else(|| {
        eprintln!("Missing --valid");
        process::exit(1);
    });
    let actions: Vec<OracleAction> = valid
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<OracleAction>().unwrap_or_else(|e| {
                eprintln!("Invalid oracle action {s:?}: {e}");
                process::exit(1);
            })
        })
        .collect();

    let score = score_all(&actions);
    for (idx, (a, r)) in score.iter().enumerate() {
        if all || r > 0.0 {
            println!("{:>3}  {:<22} {:.1}", idx, a.to_string(), r);
        }
    }
    println!();
    println!(
        "rewards: 1.0 x{}, 0.5 x{}, 0.0 x{}",
        score.count(1.0),
        score.count(0.5),
        score.count(0.0)
    );
    if !score.ambiguous.is_empty() {
        let names: Vec<String> = score.ambiguous.iter().map(|t| t.to_string()).collect();
        println!("ambiguous types (smallest tag used): {}", names.join(", "));
    }
}

fn cmd_build(args: &[String]) {
    let mut traces: Option<String> = None;
    let mut out: Option<String> = None;
    let mut config_path: Option<String> = None;
    let mut events: Option<String> = None;
    let mut parallel = false;
    let mut quiet = false;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!(
                    r#"ucr build

USAGE:
    ucr build --traces traces.json [--out data/env_training_data.json.gz] [--config cfg.yaml] [--events run.ndjson] [--parallel]

OPTIONS:
    --traces PATH   Recorded oracle traces (JSON) (required)
    --out PATH      Dataset archive path (default: dataset.out from config)
    --config PATH   YAML config (default: built-in defaults)
    --events PATH   Append NDJSON run events here (default: corpus.events from config)
    --parallel      Replay graphs on all cores
    --quiet         No per-graph progress markers
"#
                );
                return;
            }
            "--traces" => {
                traces = Some(flag_value(args, i));
                i += 2;
            }
            "--out" => {
                out = Some(flag_value(args, i));
                i += 2;
            }
            "--config" => {
                config_path = Some(flag_value(args, i));
                i += 2;
            }
            "--events" => {
                events = Some(flag_value(args, i));
                i += 2;
            }
            "--parallel" => {
                parallel = true;
                i += 1;
            }
            "--quiet" => {
                quiet = true;
                i += 1;
            }
            other => {
                eprintln!("Unknown option for `ucr build`: {}", other);
                eprintln!("Run `ucr build --help` for usage.");
                process::exit(1);
            }
        }
    }

    let traces = traces.unwrap_or_else(|| {
        eprintln!("Missing --traces");
        process::exit(1);
    });
    let (cfg, config_hash) = load_config(config_path.as_deref());
    let graphs = load_traces(&traces);

    let out_path = PathBuf::from(out.unwrap_or_else(|| cfg.dataset.out.clone()));
    if let Some(dir) = out_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if let Err(e) = ucr_replay::cleanup_tmp_files(dir) {
            eprintln!("warning: failed to clean up tmp files in {}: {e}", dir.display());
        }
    }
    let mut writer = ucr_replay::DatasetWriter::new(ucr_replay::DatasetWriterConfig {
        out_path: out_path.clone(),
        compression_level: cfg.dataset.compression_level,
        git_hash: ucr_logging::try_git_hash(),
        config_hash,
    })
    .unwrap_or_else(|e| {
        eprintln!("Failed to create dataset writer: {e}");
        process::exit(1);
    });

    let mut events = events.or_else(|| cfg.corpus.events.clone()).map(|p| {
        ucr_logging::NdjsonWriter::open_append_with_flush(&p, 100).unwrap_or_else(|e| {
            eprintln!("Failed to open event log {p}: {e}");
            process::exit(1);
        })
    });

    let run_id = out_path
        .file_name()
        .and_then(|s| s.to_str())
        .and_then(|s| s.strip_suffix(ucr_replay::schema::ARCHIVE_SUFFIX))
        .unwrap_or("run")
        .to_string();
    let opts = ucr_runtime::CorpusOptions {
        replay: ReplayConfig::from_config(&cfg.replay),
        run_id: run_id.clone(),
        progress: cfg.corpus.progress && !quiet,
    };

    println!(
        "Replaying {} graphs from {traces} (parser settings: {})",
        graphs.len(),
        cfg.parser
    );
    let result = if parallel || cfg.corpus.parallel {
        ucr_runtime::run_corpus_parallel(
            &ScriptedBackend,
            &graphs,
            &opts,
            &mut writer,
            events.as_mut(),
        )
    } else {
        ucr_runtime::run_corpus(&ScriptedBackend, &graphs, &opts, &mut writer, events.as_mut())
    };
    let report = result.unwrap_or_else(|e| {
        eprintln!("Corpus run failed: {e}");
        process::exit(1);
    });

    let meta = writer.finish().unwrap_or_else(|e| {
        eprintln!("Failed to write dataset {}: {e}", out_path.display());
        process::exit(1);
    });

    if let Some(ev) = events.as_mut() {
        let path = out_path.display().to_string();
        let written = ucr_runtime::dataset_written_event(&run_id, &path, &meta);
        if let Err(e) = ev.write_event(&written).and_then(|_| ev.flush()) {
            eprintln!("Failed to write event log: {e}");
        }
    }

    println!();
    println!("Dataset:");
    println!("  - Graphs replayed: {}", report.replayed);
    println!("  - Graphs skipped: {}", report.skipped.len());
    for s in &report.skipped {
        println!("      {} ({}): {}", s.graph_idx, s.graph_id, s.reason);
    }
    println!("  - Steps: {}", report.steps);
    println!("  - Tuples: {}", meta.num_tuples);
    println!("  - Ambiguous steps: {}", report.ambiguous_steps);
    println!("  - Out: {}", out_path.display());
}

fn cmd_inspect(args: &[String]) {
    let path = match args.first().map(String::as_str) {
        Some("--help") | Some("-h") => {
            println!("ucr inspect\n\nUSAGE:\n    ucr inspect data/env_training_data.json.gz\n");
            return;
        }
        Some(p) => p.to_string(),
        None => {
            eprintln!("Missing dataset path");
            process::exit(1);
        }
    };

    let meta = ucr_replay::read_meta(&path).unwrap_or_else(|e| {
        eprintln!("Failed to read dataset meta: {e}");
        process::exit(1);
    });
    let tuples = ucr_replay::read_dataset(&path).unwrap_or_else(|e| {
        eprintln!("Failed to read dataset: {e}");
        process::exit(1);
    });

    let mut counts = [0usize; 3];
    for t in &tuples {
        match t.r {
            r if r == 1.0 => counts[2] += 1,
            r if r == 0.5 => counts[1] += 1,
            _ => counts[0] += 1,
        }
    }

    println!("Dataset {path}:");
    println!("  - Version: {}", meta.dataset_version);
    println!(
        "  - Action space: {} ({} actions)",
        meta.action_space_id, meta.vocab_size
    );
    match meta.obs_len {
        Some(n) => println!("  - Observation length: {n}"),
        None => println!("  - Observation length: n/a"),
    }
    println!("  - Tuples: {}", tuples.len());
    println!(
        "  - Graphs: {} replayed, {} skipped",
        meta.num_graphs, meta.num_skipped
    );
    println!(
        "  - Rewards: 1.0 x{}, 0.5 x{}, 0.0 x{}",
        counts[2], counts[1], counts[0]
    );
    if let Some(h) = &meta.git_hash {
        println!("  - Git: {h}");
    }
    if let Some(h) = &meta.config_hash {
        println!("  - Config: {h}");
    }
    if tuples.len() != meta.num_tuples {
        eprintln!(
            "warning: meta records {} tuples, archive holds {}",
            meta.num_tuples,
            tuples.len()
        );
        process::exit(1);
    }
}

fn cmd_oracles(args: &[String]) {
    let mut traces: Option<String> = None;
    let mut config_path: Option<String> = None;
    let mut settings: Option<String> = None;
    let mut list_settings = false;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!(
                    r#"ucr oracles

USAGE:
    ucr oracles --traces traces.json [--config cfg.yaml] [--settings implicit,linkage]
    ucr oracles --list-settings

OPTIONS:
    --traces PATH       Recorded oracle traces (JSON) (required)
    --config PATH       YAML config (parser settings, step ceiling)
    --settings NAMES    Comma-separated parser switches, overriding the config
    --list-settings     Print every compatible parser settings combination
"#
                );
                return;
            }
            "--traces" => {
                traces = Some(flag_value(args, i));
                i += 2;
            }
            "--config" => {
                config_path = Some(flag_value(args, i));
                i += 2;
            }
            "--settings" => {
                settings = Some(flag_value(args, i));
                i += 2;
            }
            "--list-settings" => {
                list_settings = true;
                i += 1;
            }
            other => {
                eprintln!("Unknown option for `ucr oracles`: {}", other);
                eprintln!("Run `ucr oracles --help` for usage.");
                process::exit(1);
            }
        }
    }

    if list_settings {
        for s in ParserSettings::all() {
            println!("{s}");
        }
        return;
    }

    let traces = traces.unwrap_or_else(|| {
        eprintln!("Missing --traces");
        process::exit(1);
    });
    let (mut cfg, _) = load_config(config_path.as_deref());
    if let Some(list) = settings {
        let names: Vec<&str> = list
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect();
        if let Some(bad) = names
            .iter()
            .find(|n| !ParserSettings::NAMES.iter().any(|k| *k == **n))
        {
            eprintln!(
                "Unknown parser setting {bad:?} (expected one of {})",
                ParserSettings::NAMES.join(", ")
            );
            process::exit(1);
        }
        cfg.parser = ParserSettings::from_names(&names);
        if let Err(e) = cfg.parser.validate() {
            eprintln!("{e}");
            process::exit(1);
        }
    }
    let graphs = load_traces(&traces);
    let replay = ReplayConfig::from_config(&cfg.replay);

    eprintln!("parser settings: {}", cfg.parser);
    for g in &graphs {
        match replay_lines(&ScriptedBackend, g, replay.clone()) {
            Ok(lines) => {
                println!("# {}", g.id);
                for l in &lines {
                    println!("{l}");
                }
            }
            Err(e) => eprintln!("skipping graph {}: {e}", g.id),
        }
    }
}

fn cmd_simulate(args: &[String]) {
    let mut traces: Option<String> = None;
    let mut checkpoint: Option<String> = None;
    let mut config_path: Option<String> = None;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!(
                    r#"ucr simulate

USAGE:
    ucr simulate --traces traces.json [--checkpoint env_r_model.safetensors] [--config cfg.yaml]

OPTIONS:
    --traces PATH       Recorded oracle traces (JSON) (required)
    --checkpoint PATH   Reward estimator checkpoint (default: env.checkpoint from config)
    --config PATH       YAML config
"#
                );
                return;
            }
            "--traces" => {
                traces = Some(flag_value(args, i));
                i += 2;
            }
            "--checkpoint" => {
                checkpoint = Some(flag_value(args, i));
                i += 2;
            }
            "--config" => {
                config_path = Some(flag_value(args, i));
                i += 2;
            }
            other => {
                eprintln!("Unknown option for `ucr simulate`: {}", other);
                eprintln!("Run `ucr simulate --help` for usage.");
                process::exit(1);
            }
        }
    }

    let traces = traces.unwrap_or_else(|| {
        eprintln!("Missing --traces");
        process::exit(1);
    });
    let (cfg, _) = load_config(config_path.as_deref());
    let checkpoint = checkpoint.unwrap_or_else(|| cfg.env.checkpoint.clone());
    let graphs = load_traces(&traces);

    let mut env = ucr_env::UccaEnv::from_checkpoint(ScriptedBackend, &checkpoint)
        .unwrap_or_else(|e| {
            eprintln!("Failed to load estimator {checkpoint}: {e}");
            process::exit(1);
        });
    let replay = ReplayConfig::from_config(&cfg.replay);

    let mut total = 0.0f64;
    let mut steps = 0u64;
    for g in &graphs {
        let oracle_steps = match replay_all(&ScriptedBackend, g, replay.clone()) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("skipping graph {}: {e}", g.id);
                continue;
            }
        };
        env.reset(g);
        for s in &oracle_steps {
            let code = match s.chosen.to_vocab() {
                Ok(a) => a.encode(),
                Err(e) => {
                    eprintln!("graph {}: {e}", g.id);
                    break;
                }
            };
            let out = env.step(code).unwrap_or_else(|e| {
                eprintln!("graph {} step {}: {e}", g.id, s.index);
                process::exit(1);
            });
            println!(
                "{} {:>4} {:<22} r={:.4}{}",
                g.id,
                out.info.step,
                out.info.action.to_string(),
                out.reward,
                if out.done { " done" } else { "" }
            );
            total += out.reward;
            steps += 1;
            if out.done {
                break;
            }
        }
    }

    println!();
    if steps > 0 {
        println!(
            "Simulated {steps} steps over {} graphs, mean reward {:.4}",
            graphs.len(),
            total / steps as f64
        );
    } else {
        println!("No steps simulated");
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        process::exit(0);
    }

    match args[1].as_str() {
        "-h" | "--help" | "help" => {
            print_help();
        }
        "-V" | "--version" => {
            print_version();
        }
        "vocab" => cmd_vocab(&args[2..]),
        "score" => cmd_score(&args[2..]),
        "build" => cmd_build(&args[2..]),
        "inspect" => cmd_inspect(&args[2..]),
        "oracles" => cmd_oracles(&args[2..]),
        "simulate" => cmd_simulate(&args[2..]),
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            eprintln!("Run `ucr --help` for usage.");
            process::exit(1);
        }
    }
}
