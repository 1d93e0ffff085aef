use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rebrand_patcher::config::{load_tables, rule_location};
use rebrand_patcher::edit::FileStore;
use rebrand_patcher::engine::{apply_all, check_all, resolve, RuleGroup, RunReport};
use rebrand_patcher::relocate::{generated_dir, relocate_assets};
use rebrand_patcher::report::{summary, ConsoleReporter};
use rebrand_patcher::{BrandConfig, Condition, SourceRoot};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rebrand-patcher")]
#[command(about = "White-label a source tree with count-verified find/replace rules", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply rule tables to a source tree
    Apply {
        #[command(flatten)]
        target: TargetArgs,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Run rule tables without writing anything, reporting match counts
    Check {
        #[command(flatten)]
        target: TargetArgs,

        /// Show unified diff of the changes that would be made
        #[arg(short, long)]
        diff: bool,
    },

    /// Print the rules in each rule table
    List {
        #[command(flatten)]
        rules: RulesArgs,
    },

    /// Copy generated image assets into the source tree
    Relocate {
        #[command(flatten)]
        brand: BrandArgs,

        /// Path to the source tree
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Directory holding `<images>/generated`
        #[arg(long, default_value = "customization/images")]
        assets_dir: PathBuf,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct BrandArgs {
    /// Brand configuration as a JSON object
    #[arg(long, value_name = "JSON")]
    brand: Option<String>,

    /// Path to a JSON file holding the brand configuration
    #[arg(long, value_name = "PATH")]
    brand_file: Option<PathBuf>,
}

impl BrandArgs {
    fn load(&self) -> Result<BrandConfig> {
        match (&self.brand, &self.brand_file) {
            (Some(json), _) => BrandConfig::from_json(json).context("invalid --brand"),
            (None, Some(path)) => Ok(BrandConfig::from_path(path)?),
            (None, None) => anyhow::bail!("one of --brand or --brand-file is required"),
        }
    }
}

#[derive(Args)]
struct RulesArgs {
    /// Rule table file, or a directory of tables (repeatable; defaults to the
    /// built-in tables)
    #[arg(long = "rules", value_name = "PATH")]
    rules: Vec<PathBuf>,
}

#[derive(Args)]
struct TargetArgs {
    #[command(flatten)]
    brand: BrandArgs,

    /// Path to the source tree
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    #[command(flatten)]
    rules: RulesArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("REBRAND_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Apply { target, diff } => cmd_apply(target, diff, false),
        Commands::Check { target, diff } => cmd_apply(target, diff, true),
        Commands::List { rules } => cmd_list(rules),
        Commands::Relocate {
            brand,
            root,
            assets_dir,
        } => cmd_relocate(brand, root, assets_dir),
    }
}

fn cmd_apply(args: TargetArgs, show_diff: bool, dry_run: bool) -> Result<()> {
    // 1. Load inputs
    let brand = args.brand.load()?;
    let root = SourceRoot::new(&args.root)
        .with_context(|| format!("invalid source root {}", args.root.display()))?;
    let tables = load_tables(&args.rules.rules)?;

    println!("Source root: {}", root.path().display());
    for (origin, _) in &tables {
        println!("Rule table: {}", origin);
    }
    if dry_run {
        println!("{}", "[CHECK - no files will be written]".cyan());
    }
    println!();

    // 2. Resolve every table before touching any file
    let mut groups: Vec<RuleGroup> = Vec::new();
    for (origin, rules) in &tables {
        let resolved =
            resolve(rules, &brand, &root).with_context(|| format!("cannot resolve {}", origin))?;
        groups.extend(resolved);
    }

    // 3. Apply
    let mut reporter = ConsoleReporter::new(show_diff);
    let report: RunReport = if dry_run {
        check_all(&groups, &mut reporter)?
    } else {
        apply_all(&mut FileStore, &groups, &mut reporter)?
    };

    // 4. Summary
    println!("{}", summary(&report, root.path()));

    if !report.is_clean() {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_list(args: RulesArgs) -> Result<()> {
    let tables = load_tables(&args.rules)?;

    for (origin, rules) in &tables {
        let title = if rules.meta.name.is_empty() {
            origin.to_string()
        } else {
            format!("{} ({})", rules.meta.name, origin)
        };
        println!("{}", title.bold());
        if let Some(description) = &rules.meta.description {
            println!("{}", description.dimmed());
        }

        for (group_idx, group) in rules.groups.iter().enumerate() {
            println!();
            match &group.description {
                Some(description) => println!("{} {}", group.file, description.dimmed()),
                None => println!("{}", group.file),
            }

            for (idx, rule) in group.rules.iter().enumerate() {
                let mut line = format!(
                    "  {}: {:?} => {:?} (times {})",
                    rule_location(group_idx, &group.file, idx),
                    rule.from,
                    rule.to,
                    rule.times
                );
                if rule.regex {
                    let flags = rule
                        .flags
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ");
                    line.push_str(&format!(" [regex: {}]", flags));
                }
                if rule.condition != Condition::default() {
                    line.push_str(&format!(" if {}", rule.condition));
                }
                println!("{}", line);
                if let Some(description) = &rule.description {
                    println!("    {}", description.dimmed());
                }
            }
        }

        println!();
        println!("{} groups, {} rules", rules.groups.len(), rules.rule_count());
        println!();
    }

    Ok(())
}

fn cmd_relocate(brand: BrandArgs, root: PathBuf, assets_dir: PathBuf) -> Result<()> {
    let brand = brand.load()?;
    let root = SourceRoot::new(&root)
        .with_context(|| format!("invalid source root {}", root.display()))?;
    let images = brand.render("{{images}}")?;
    let source = generated_dir(&assets_dir, &images);

    println!("Source root: {}", root.path().display());
    println!("Assets: {}", source.display());
    println!();

    let relocations = relocate_assets(&source, root.path())?;
    for relocation in &relocations {
        println!("{} {}", "✓".green(), relocation.relative.display());
    }

    println!();
    println!("{} assets copied", relocations.len().to_string().green());

    Ok(())
}
