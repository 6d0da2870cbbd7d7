use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use clap::{Parser, Subcommand};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_CRATE: &str = "password_policy_lambda";
const ARTIFACT: &str = "dist/password_policy.zip";

type TaskResult = Result<(), String>;

#[derive(Parser)]
#[command(name = "xtask", about = "CI and packaging for the password policy Lambda")]
struct Cli {
    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Check formatting, run clippy with warnings denied, then run all tests
    Ci {
        /// Skip fmt and clippy
        #[arg(long)]
        tests_only: bool,
    },
    /// Build the Lambda binary and zip it as `bootstrap` under dist/
    ServerlessPackage {
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Use the debug profile instead of release
        #[arg(long)]
        debug: bool,
    },
}

fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .map_or_else(|| manifest_dir.to_path_buf(), Path::to_path_buf)
}

fn cargo(root: &Path, args: &[&str]) -> TaskResult {
    let rendered = args.join(" ");
    eprintln!("[xtask] cargo {rendered}");

    let status = Command::new("cargo")
        .args(args)
        .current_dir(root)
        .status()
        .map_err(|error| format!("could not start cargo: {error}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("`cargo {rendered}` exited with {status}"))
    }
}

fn ci(root: &Path, tests_only: bool) -> TaskResult {
    if !tests_only {
        cargo(root, &["fmt", "--all", "--", "--check"])?;
        cargo(
            root,
            &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        )?;
    }
    cargo(root, &["test", "--workspace"])
}

fn serverless_package(root: &Path, target: &str, debug: bool) -> TaskResult {
    let mut build = vec![
        "build", "-p", LAMBDA_CRATE, "--bin", LAMBDA_CRATE, "--target", target,
    ];
    if !debug {
        build.push("--release");
    }
    cargo(root, &build)?;

    let profile = if debug { "debug" } else { "release" };
    let binary = root
        .join("target")
        .join(target)
        .join(profile)
        .join(LAMBDA_CRATE);
    let executable = fs::read(&binary)
        .map_err(|error| format!("could not read {}: {error}", binary.display()))?;

    let artifact = root.join(ARTIFACT);
    write_bootstrap_zip(&artifact, &executable)?;
    eprintln!(
        "[xtask] packaged {} ({} byte bootstrap)",
        artifact.display(),
        executable.len()
    );
    Ok(())
}

/// The provided.al2 runtime executes the archive entry named `bootstrap`.
fn write_bootstrap_zip(artifact: &Path, executable: &[u8]) -> TaskResult {
    let io_error = |error: std::io::Error| format!("{}: {error}", artifact.display());

    if let Some(dir) = artifact.parent() {
        fs::create_dir_all(dir).map_err(io_error)?;
    }
    let mut archive = ZipWriter::new(File::create(artifact).map_err(io_error)?);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    archive
        .start_file("bootstrap", options)
        .map_err(|error| error.to_string())?;
    archive.write_all(executable).map_err(io_error)?;
    archive.finish().map_err(|error| error.to_string())?;
    Ok(())
}

fn main() -> ExitCode {
    let root = workspace_root();
    let outcome = match Cli::parse().task {
        Task::Ci { tests_only } => ci(&root, tests_only),
        Task::ServerlessPackage { target, debug } => serverless_package(&root, &target, debug),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("[xtask] error: {message}");
            ExitCode::FAILURE
        }
    }
}
