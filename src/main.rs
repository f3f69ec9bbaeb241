//! Scout 命令行入口
//!
//! 初始化日志、加载配置，按子命令规划 / 执行并把报告写到 stdout（日志在 stderr）。

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use scout::client::AuggieClient;
use scout::commands::{create_custom_command, list_custom_commands};
use scout::config::{load_config, AppConfig};
use scout::core::Budget;
use scout::planner::{generate_editing_plan, generate_plan, Plan, Task};
use scout::runner::{RunMode, RunOptions, RunResult, Runner};

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "Deadline-budgeted task planner and executor for the auggie CLI")]
#[command(version)]
struct Cli {
    /// Extra config file layered over config/default.toml
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Target codebase (defaults to [app].workspace_root, then the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a question about the codebase
    Ask {
        request: String,
        /// Allow follow-up tasks, capped by --max-iterations
        #[arg(long)]
        adaptive: bool,
        #[arg(long, value_name = "N")]
        max_iterations: Option<usize>,
        #[arg(long, value_name = "SECS")]
        max_total_secs: Option<u64>,
        #[arg(long, value_name = "SECS")]
        per_task_secs: Option<u64>,
        /// Print the full run result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Plan and apply an editing request
    Edit {
        request: String,
        /// Preview only, no files are written
        #[arg(long)]
        dry_run: bool,
        #[arg(long, value_name = "SECS")]
        max_total_secs: Option<u64>,
        #[arg(long, value_name = "SECS")]
        per_task_secs: Option<u64>,
        #[arg(long)]
        json: bool,
    },
    /// Print the plan for a request without executing it
    Plan {
        request: String,
        #[arg(long)]
        editing: bool,
    },
    /// Run a slash command through auggie
    Command {
        name: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Manage custom slash commands in .augment/commands
    Commands {
        #[command(subcommand)]
        action: CommandsAction,
    },
}

#[derive(Subcommand)]
enum CommandsAction {
    List,
    Create {
        name: String,
        description: String,
        prompt: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    scout::observability::init();

    let cli = Cli::parse();
    let config = load_config(cli.config.clone()).context("Failed to load config")?;
    let workdir = resolve_workdir(cli.cwd.as_deref(), &config)?;

    match cli.command {
        Command::Ask {
            request,
            adaptive,
            max_iterations,
            max_total_secs,
            per_task_secs,
            json,
        } => {
            let budget = override_budget(config.budget_for(RunMode::Query), max_total_secs, per_task_secs);
            let mut options = RunOptions::query(budget);
            if adaptive || max_iterations.is_some() {
                options = options.adaptive(max_iterations.unwrap_or(config.budget.max_iterations));
            }
            let result = runner(&config).run(&request, Some(&workdir), &options).await;
            emit(&result, json)
        }
        Command::Edit {
            request,
            dry_run,
            max_total_secs,
            per_task_secs,
            json,
        } => {
            let budget = override_budget(config.budget_for(RunMode::Editing), max_total_secs, per_task_secs);
            let options = RunOptions::editing(budget, dry_run || config.editor.dry_run);
            let result = runner(&config).run(&request, Some(&workdir), &options).await;
            emit(&result, json)
        }
        Command::Plan { request, editing } => {
            let plan = if editing {
                generate_editing_plan(&request)
            } else {
                generate_plan(&request)
            }
            .context("Failed to generate plan")?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Command { name, args, json } => {
            let args = args.join(" ");
            let args = Some(args.as_str()).filter(|a| !a.trim().is_empty());
            let request = match args {
                Some(a) => format!("/{} {}", name, a),
                None => format!("/{}", name),
            };
            let plan = Plan::manual(request, vec![Task::command(&name, args)], "Run a single slash command");
            let options = RunOptions::query(config.budget_for(RunMode::Query));
            let result = runner(&config).execute_plan(plan, Some(&workdir), &options).await;
            emit(&result, json)
        }
        Command::Commands { action } => {
            match action {
                CommandsAction::List => println!("{}", list_custom_commands(&workdir)?),
                CommandsAction::Create {
                    name,
                    description,
                    prompt,
                } => {
                    let path = create_custom_command(&workdir, &name, &description, &prompt)?;
                    println!("Created custom command: {}\nFile: {}", name, path.display());
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn runner(config: &AppConfig) -> Runner {
    Runner::new(Arc::new(AuggieClient::from_config(&config.auggie)))
}

fn resolve_workdir(cli: Option<&Path>, config: &AppConfig) -> anyhow::Result<PathBuf> {
    match cli.or(config.app.workspace_root.as_deref()) {
        Some(dir) => Ok(dir.to_path_buf()),
        None => std::env::current_dir().context("Failed to read current directory"),
    }
}

fn override_budget(budget: Budget, max_total_secs: Option<u64>, per_task_secs: Option<u64>) -> Budget {
    Budget::from_secs(
        max_total_secs.unwrap_or(budget.max_total_time.as_secs()),
        per_task_secs.unwrap_or(budget.per_task_timeout.as_secs()),
    )
}

fn emit(result: &RunResult, json: bool) -> anyhow::Result<ExitCode> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else if result.success {
        println!("{}", result.report);
    } else {
        eprintln!(
            "Error: {}",
            result.error.as_deref().unwrap_or("run failed without an error message")
        );
    }
    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
