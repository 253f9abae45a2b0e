use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use depot::{
    CommitRequest, CreateDirectoryRequest, CreateRepositoryRequest, Depot, DepotConfig,
    DepotError, OwnerId, RepoId, RevertRequest, UploadFileRequest,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "depot",
    version = "0.1.0",
    about = "Multi-tenant repository hosting",
    long_about = "Hosts many repositories for many owners. Each repository is a working tree \
    with its own git-compatible object store and a metadata record kept in step with it.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[arg(long, global = true, help = "Path to a depot.toml configuration file")]
    config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = "DEPOT_ROOT",
        help = "Directory holding repositories and metadata when no config file is given"
    )]
    root: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "create", about = "Create an empty repository")]
    Create {
        #[arg(index = 1, help = "The owning user")]
        owner: String,
        #[arg(index = 2, help = "The repository name")]
        name: String,
    },
    #[command(
        name = "upload",
        about = "Upload a local file into a repository",
        long_about = "This command copies a local file into the working tree of a repository. \
        The file is read fully before the repository is touched."
    )]
    Upload {
        #[arg(index = 1)]
        owner: String,
        #[arg(index = 2)]
        repo: String,
        #[arg(index = 3, help = "The local file to upload")]
        file: PathBuf,
        #[arg(short, long, default_value = "", help = "Target directory inside the repository")]
        dir: String,
        #[arg(short, long, help = "File name inside the repository (defaults to the local name)")]
        name: Option<String>,
    },
    #[command(name = "mkdir", about = "Create a directory in a repository")]
    Mkdir {
        #[arg(index = 1)]
        owner: String,
        #[arg(index = 2)]
        repo: String,
        #[arg(index = 3)]
        path: String,
    },
    #[command(name = "commit", about = "Commit every change in a repository")]
    Commit {
        #[arg(index = 1)]
        repo: String,
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(
        name = "revert",
        about = "Hard reset a repository to a commit",
        long_about = "This command discards every change and every commit made after the given commit. \
        The commit may be abbreviated."
    )]
    Revert {
        #[arg(index = 1)]
        repo: String,
        #[arg(index = 2)]
        commit: String,
    },
    #[command(name = "show", about = "Print a repository record")]
    Show {
        #[arg(index = 1)]
        repo: String,
    },
    #[command(name = "list", about = "List the repositories of an owner")]
    List {
        #[arg(index = 1)]
        owner: String,
    },
    #[command(name = "log", about = "Print the commit history of a repository")]
    Log {
        #[arg(index = 1)]
        repo: String,
        #[arg(short = 'n', long, default_value_t = 20)]
        max_count: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    depot::telemetry::init();
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {error:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(Depot::new(config), cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {}", error.public_message());
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<DepotConfig> {
    match (&cli.config, &cli.root) {
        (Some(path), _) => DepotConfig::load(path),
        (None, Some(root)) => Ok(DepotConfig::rooted_at(root)),
        (None, None) => anyhow::bail!("either --config or --root (DEPOT_ROOT) is required"),
    }
}

async fn run(depot: Depot, command: Commands) -> Result<(), DepotError> {
    match command {
        Commands::Create { owner, name } => {
            let request = CreateRepositoryRequest::try_new(&owner, &name)?;
            print_json(&depot.create_repository(request).await?)
        }
        Commands::Upload {
            owner,
            repo,
            file,
            dir,
            name,
        } => {
            let file_name = match name {
                Some(name) => name,
                None => file
                    .file_name()
                    .and_then(|name| name.to_str())
                    .map(str::to_owned)
                    .ok_or_else(|| {
                        DepotError::InvalidRequest(format!(
                            "cannot derive a file name from {}",
                            file.display()
                        ))
                    })?,
            };
            let content = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Unable to read {}", file.display()))
                .map_err(|error| DepotError::InvalidRequest(format!("{error:#}")))?;

            let request =
                UploadFileRequest::try_new(&owner, &repo, &dir, &file_name, Bytes::from(content))?;
            print_json(&depot.upload_file(request).await?)
        }
        Commands::Mkdir { owner, repo, path } => {
            let request = CreateDirectoryRequest::try_new(&owner, &repo, &path)?;
            print_json(&depot.create_directory(request).await?)
        }
        Commands::Commit { repo, message } => {
            let request = CommitRequest::try_new(&repo, &message)?;
            print_json(&depot.commit_changes(request).await?)
        }
        Commands::Revert { repo, commit } => {
            let request = RevertRequest::try_new(&repo, &commit)?;
            print_json(&depot.revert_repository(request).await?)
        }
        Commands::Show { repo } => {
            print_json(&depot.repository(RepoId::try_parse(&repo)?).await?)
        }
        Commands::List { owner } => {
            print_json(&depot.repositories(OwnerId::try_parse(owner)?).await?)
        }
        Commands::Log { repo, max_count } => {
            print_json(&depot.history(RepoId::try_parse(&repo)?, max_count).await?)
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<(), DepotError> {
    let json = serde_json::to_string_pretty(value).context("Unable to render output")?;
    println!("{json}");
    Ok(())
}
