use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use chagraph::driver::{construct, Budget};
use chagraph::entry::{EntryPoints, ExplicitEntryPoints, MainMethods};
use chagraph::hierarchy::ClassHierarchy;
use chagraph::ir::MethodSignature;
use chagraph::load::load_inputs;
use chagraph::report::{build_invocation, build_sarif, graph_report};

/// CLI arguments for chagraph execution.
#[derive(Parser, Debug)]
#[command(
    name = "chagraph",
    about = "Class Hierarchy Analysis call graphs for JVM program models.",
    version
)]
struct Cli {
    #[arg(long, value_name = "PATH")]
    input: PathBuf,
    #[arg(long, value_name = "PATH")]
    classpath: Vec<PathBuf>,
    /// Entry point such as `com/example/App.run()V`; defaults to main methods.
    #[arg(long, value_name = "METHOD")]
    entry: Vec<MethodSignature>,
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Format::Sarif)]
    format: Format,
    /// Stop after processing this many methods and emit a partial graph.
    #[arg(long, value_name = "N")]
    max_methods: Option<usize>,
    #[arg(long)]
    quiet: bool,
    #[arg(long)]
    timing: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum Format {
    Sarif,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);
    run(cli)
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "error" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    if !cli.input.exists() {
        anyhow::bail!("input not found: {}", cli.input.display());
    }
    for entry in &cli.classpath {
        if !entry.exists() {
            anyhow::bail!("classpath entry not found: {}", entry.display());
        }
    }

    let started_at = Instant::now();
    let loaded = load_inputs(&cli.input, &cli.classpath)?;
    let program = loaded.program;
    let hierarchy = ClassHierarchy::from_program(&program);

    let entry_points = if cli.entry.is_empty() {
        MainMethods.entry_points(&program)
    } else {
        ExplicitEntryPoints(cli.entry).entry_points(&program)
    };
    if entry_points.is_empty() {
        tracing::warn!(target: "chagraph", "no entry points; the call graph will be empty");
    }

    let budget = Budget {
        max_methods: cli.max_methods,
    };
    let construction = construct(&program, &hierarchy, entry_points, budget);

    let mut writer = output_writer(cli.output.as_deref())?;
    match cli.format {
        Format::Sarif => {
            let sarif = build_sarif(&construction, build_invocation());
            serde_json::to_writer_pretty(&mut writer, &sarif)
                .context("failed to serialize SARIF output")?;
        }
        Format::Json => {
            serde_json::to_writer_pretty(&mut writer, &graph_report(&construction))
                .context("failed to serialize call graph")?;
        }
    }
    writer
        .write_all(b"\n")
        .context("failed to write call graph output")?;

    if cli.timing && !cli.quiet {
        eprintln!(
            "timing: total_ms={} files={} classes={} methods={} call_sites={} \
             unresolved={} nodes={} edges={} complete={}",
            started_at.elapsed().as_millis(),
            loaded.file_count,
            program.class_count(),
            construction.stats.methods_processed,
            construction.stats.call_sites,
            construction.stats.unresolved_call_sites,
            construction.graph.node_count(),
            construction.graph.edge_count(),
            construction.complete
        );
    }

    Ok(())
}

fn output_writer(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) if path == Path::new("-") => Ok(Box::new(io::stdout())),
        Some(path) => Ok(Box::new(
            File::create(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Ok(Box::new(io::stdout())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::fs;

    const MODEL: &str = r#"{
        "classes": [
            {
                "name": "app/Main",
                "methods": [
                    {
                        "name": "main",
                        "descriptor": "([Ljava/lang/String;)V",
                        "static": true,
                        "body": [
                            {"op": "invoke", "target": "app/Shape.area()D", "kind": "interface"}
                        ]
                    },
                    {
                        "name": "other",
                        "descriptor": "()V",
                        "body": [{"op": "invoke", "target": "app/Square.area()D"}]
                    }
                ]
            },
            {
                "name": "app/Shape",
                "interface": true,
                "methods": [{"name": "area", "descriptor": "()D"}]
            },
            {
                "name": "app/Square",
                "interfaces": ["app/Shape"],
                "methods": [{"name": "area", "descriptor": "()D", "body": []}]
            },
            {
                "name": "app/Circle",
                "interfaces": ["app/Shape"],
                "methods": [{"name": "area", "descriptor": "()D", "body": []}]
            }
        ]
    }"#;

    fn cli(input: PathBuf, output: PathBuf, format: Format, entry: Vec<&str>) -> Cli {
        Cli {
            input,
            classpath: Vec::new(),
            entry: entry
                .into_iter()
                .map(|text| text.parse().expect("entry point"))
                .collect(),
            output: Some(output),
            format,
            max_methods: None,
            quiet: true,
            timing: false,
        }
    }

    #[test]
    fn cli_parses_entries_and_format() {
        let cli = Cli::try_parse_from([
            "chagraph",
            "--input",
            "model.json",
            "--entry",
            "app/Main.other()V",
            "--format",
            "json",
            "--max-methods",
            "10",
        ])
        .expect("parse arguments");

        assert_eq!(cli.entry.len(), 1);
        assert_eq!(cli.entry[0].to_string(), "app/Main.other()V");
        assert_eq!(cli.format, Format::Json);
        assert_eq!(cli.max_methods, Some(10));
        assert!(
            Cli::try_parse_from(["chagraph", "--input", "m.json", "--entry", "bogus"]).is_err()
        );
    }

    #[test]
    fn run_writes_json_graph_from_main_methods() {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = dir.path().join("model.json");
        fs::write(&input, MODEL).expect("write model");
        let output = dir.path().join("graph.json");

        run(cli(input, output.clone(), Format::Json, Vec::new())).expect("run");

        let value: Value =
            serde_json::from_str(&fs::read_to_string(output).expect("read output")).expect("json");
        assert_eq!(value["complete"], true);
        assert_eq!(
            value["nodes"],
            serde_json::json!([
                "app/Circle.area()D",
                "app/Main.main([Ljava/lang/String;)V",
                "app/Shape.area()D",
                "app/Square.area()D"
            ])
        );
        assert_eq!(value["edges"].as_array().expect("edges").len(), 3);
        assert_eq!(value["edges"][0]["callee"], "app/Circle.area()D");
        assert_eq!(value["edges"][0]["kinds"], serde_json::json!(["interface"]));
    }

    #[test]
    fn run_writes_sarif_graph_for_explicit_entry() {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = dir.path().join("model.json");
        fs::write(&input, MODEL).expect("write model");
        let output = dir.path().join("graph.sarif");

        run(cli(input, output.clone(), Format::Sarif, vec!["app/Main.other()V"])).expect("run");

        let value: Value =
            serde_json::from_str(&fs::read_to_string(output).expect("read output")).expect("json");
        let graph = &value["runs"][0]["graphs"][0];
        assert_eq!(graph["nodes"].as_array().expect("nodes").len(), 2);
        assert_eq!(graph["edges"][0]["sourceNodeId"], "app/Main.other()V");
        assert_eq!(graph["edges"][0]["targetNodeId"], "app/Square.area()D");
        assert_eq!(graph["edges"][0]["label"]["text"], "virtual");
    }

    #[test]
    fn run_rejects_missing_input() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = run(cli(
            dir.path().join("missing.json"),
            dir.path().join("out.json"),
            Format::Json,
            Vec::new(),
        ));

        assert!(result.is_err());
    }
}
