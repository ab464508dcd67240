//! CLI: declarations → model document, and model → validation of JSON inputs.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::debug;

use shapegen::oracle::Declaration;
use shapegen::{
    BuildOptions, ModelDocument, ModuleOracle, Validators, build_models, envelope, path_de,
};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile type declarations into structural models and validate JSON against them
#[derive(Parser, Debug)]
#[command(name = "shapegen", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// build a model document from a declarations module
    Model(ModelOut),
    /// validate JSON documents against a root type
    Check(CheckRun),
}

#[derive(Args, Debug, Clone)]
struct BuildSettings {
    /// maximum nesting of anonymous type syntax
    #[arg(long, default_value_t = BuildOptions::default().max_depth)]
    max_depth: usize,
}

#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
struct ModelSource {
    /// declarations module (.json) to build from
    #[arg(long)]
    module: Option<PathBuf>,

    /// previously built model document (.json)
    #[arg(long)]
    model: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct ModelOut {
    /// declarations module (.json)
    #[arg(long)]
    module: PathBuf,

    /// root declarations to build (every non-generic declaration if omitted)
    #[arg(long)]
    root: Vec<String>,

    #[command(flatten)]
    build: BuildSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CheckRun {
    #[command(flatten)]
    source: ModelSource,

    /// root type: a declaration name, or with --model any canonical name
    /// (e.g. `Page<string>`)
    #[arg(long)]
    root: String,

    #[command(flatten)]
    build: BuildSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// print one result envelope per document instead of a report
    #[arg(long)]
    json: bool,
}

/// One JSON document plus where it came from.
struct Document {
    label: String,
    value: serde_json::Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<ExitCode> {
        match &self.cmd {
            Command::Model(target) => target.run(),
            Command::Check(target) => target.run(),
        }
    }
}

impl BuildSettings {
    fn options(&self) -> BuildOptions {
        BuildOptions { max_depth: self.max_depth }
    }
}

impl ModelOut {
    fn run(&self) -> Result<ExitCode> {
        // 1) load declarations
        let oracle = load_module(&self.module)?;
        let roots = if self.root.is_empty() { default_roots(&oracle) } else { self.root.clone() };
        debug!(roots = roots.len(), "building model document");

        // 2) build
        let doc = build_models(&oracle, &roots, self.build.options())?;

        // 3) emit
        let src = serde_json::to_string_pretty(&doc)?;
        match self.out.as_ref() {
            Some(out) => {
                if let Some(parent) = out.parent() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
                std::fs::write(out, &src).with_context(|| format!("writing {}", out.display()))?;
            }
            None => println!("{src}"),
        }
        Ok(ExitCode::SUCCESS)
    }
}

impl CheckRun {
    fn run(&self) -> Result<ExitCode> {
        // 1) validators
        let doc = match (&self.source.module, &self.source.model) {
            (Some(module), _) => {
                let oracle = load_module(module)?;
                build_models(&oracle, std::slice::from_ref(&self.root), self.build.options())?
            }
            (None, Some(model)) => {
                let src = read(model)?;
                path_de::from_str_with_path::<ModelDocument>(&src)
                    .with_context(|| format!("loading model document {}", model.display()))?
            }
            (None, None) => bail!("either --module or --model is required"),
        };
        let validators = Validators::from_document(&doc)?;
        let validator = validators
            .validator(&self.root)
            .with_context(|| format!("no type named `{}` in the model document", self.root))?;

        // 2) validate every input
        let mut failed = 0usize;
        let mut total = 0usize;
        for document in self.input_settings.load()? {
            total += 1;
            let result = validator.parse(&document.value.into());
            if result.is_err() {
                failed += 1;
            }
            if self.json {
                println!("{}", envelope(&result));
                continue;
            }
            match &result {
                Ok(_) => println!("{} {}", "ok".green().bold(), document.label),
                Err(failure) => {
                    println!("{} {}", "FAIL".red().bold(), document.label);
                    for line in failure.to_string().lines() {
                        println!("    {line}");
                    }
                }
            }
        }

        // 3) summary
        if !self.json {
            let summary = format!("{failed} of {total} documents failed");
            if failed == 0 {
                eprintln!("{}", summary.green())
            } else {
                eprintln!("{}", summary.red())
            }
        }
        Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
    }
}

impl InputSettings {
    fn load(&self) -> Result<Vec<Document>> {
        let mut out = Vec::new();
        for source_path in resolve_file_path_patterns(&self.input)? {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = read(&source_path)?;
            if self.ndjson {
                for (line_no, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let value = serde_json::from_str(line)
                        .with_context(|| format!("parsing {source_path_str}:{}", line_no + 1))?;
                    let label = format!("{source_path_str}:{}", line_no + 1);
                    out.push(Document { label, value });
                }
            } else {
                let value = serde_json::from_str(&source)
                    .with_context(|| format!("parsing JSON source file {source_path_str}"))?;
                out.push(Document { label: source_path_str, value });
            }
        }
        Ok(out)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_module(path: &Path) -> Result<ModuleOracle> {
    let src = read(path)?;
    ModuleOracle::from_json_str(&src)
        .with_context(|| format!("loading declarations module {}", path.display()))
}

/// Declarations that can be built without type arguments.
fn default_roots(oracle: &ModuleOracle) -> Vec<String> {
    oracle
        .declarations()
        .filter(|decl| {
            matches!(decl, Declaration::Interface(_) | Declaration::Alias(_) | Declaration::Enum(_))
        })
        .filter(|decl| decl.type_params().is_empty())
        .map(|decl| decl.name().to_string())
        .collect()
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if !has_glob_chars(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }
        let mut matched_any = false;
        let entries =
            glob::glob(pattern).with_context(|| format!("invalid glob pattern {pattern}"))?;
        for entry in entries {
            out.push(entry?);
            matched_any = true;
        }
        if !matched_any {
            // an explicit glob that matches nothing is almost always a typo
            bail!("glob pattern matched no files: {pattern}");
        }
    }
    Ok(out)
}
