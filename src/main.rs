use anyhow::Result;
use clap::{Parser, Subcommand};
use is_terminal::IsTerminal;
use modsync::areas::github::GitHubClient;
use modsync::areas::repository::Repository;
use modsync::artifacts::core::{UsageError, init_logging, required_flags};
use modsync::artifacts::diff::report::Format;
use modsync::artifacts::tags::skip_tags::SkipTags;
use modsync::commands::porcelain::comment_pr::PullRequest;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

#[derive(Parser)]
#[command(
    name = "modsync",
    version = "0.1.0",
    about = "Sync, diff and release content-addressed protobuf modules",
    long_about = "This tool stores upstream module sources as content-addressed blobs, \
    compares module references file by file and drives the release pipeline \
    of the modules repository.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "casdiff",
        about = "Show the changes between two references of a module",
        long_about = "This command compares two references of the module in the current directory. \
        When no state.json is present, both arguments are manifest paths instead."
    )]
    Casdiff {
        #[arg(index = 1, help = "The reference to compare from")]
        from: String,
        #[arg(index = 2, help = "The reference to compare to")]
        to: String,
        #[arg(short, long, default_value = "text", help = "The output format (text or markdown)")]
        format: String,
    },
    #[command(
        name = "diff",
        about = "Show the changes between two distinct references as markdown",
        long_about = "This command behaves like casdiff with markdown output, \
        but rejects identical references."
    )]
    Diff {
        #[arg(index = 1, help = "The reference to compare from")]
        from: String,
        #[arg(index = 2, help = "The reference to compare to")]
        to: String,
    },
    #[command(
        name = "mod-process",
        about = "Store a module source directory in the CAS",
        long_about = "This command writes the manifest and file blobs of a source directory \
        under <root-sync-dir>/<owner>/<repo>/cas and records the reference in the state files."
    )]
    ModProcess {
        #[arg(long, help = "The sync root holding every module")]
        root_sync_dir: Option<String>,
        #[arg(long, help = "The module source directory")]
        src_dir: Option<String>,
        #[arg(long, help = "The module owner")]
        owner: Option<String>,
        #[arg(long, help = "The module repository")]
        repo: Option<String>,
        #[arg(long = "ref", help = "The reference being synced")]
        reference: Option<String>,
    },
    #[command(
        name = "release-tags",
        about = "List the release tags to sync after a reference",
        long_about = "This command prints the semver-sorted release tags of a GitHub repository \
        that come after the given reference, one per line."
    )]
    ReleaseTags {
        #[arg(long, help = "The repository owner")]
        owner: Option<String>,
        #[arg(long, help = "The repository name")]
        repo: Option<String>,
        #[arg(long, help = "The last synced reference")]
        reference: Option<String>,
        #[arg(long, help = "Also print the reference itself")]
        inclusive: bool,
        #[arg(long, help = "JSON file mapping owner/repo to tags never to sync")]
        skip_tags_file: Option<PathBuf>,
    },
    #[command(
        name = "release",
        about = "Release the modules changed since the latest release",
        long_about = "This command compares the sync root with the state of the latest GitHub release \
        and publishes a new release when any module is new, updated or removed."
    )]
    Release {
        #[arg(index = 1, default_value = "modules/sync", help = "The sync root")]
        directory: String,
        #[arg(long, help = "Write the release notes locally instead of releasing")]
        dry_run: bool,
        #[arg(long, default_value = "bufbuild", help = "The releasing repository owner")]
        owner: String,
        #[arg(long, default_value = "modules", help = "The releasing repository name")]
        repo: String,
    },
    #[command(
        name = "comment-pr-casdiff",
        about = "Comment casdiff reports on a pull request",
        long_about = "This command finds the digest transitions in the module state files a pull request \
        changes and posts the casdiff of each one as a review comment."
    )]
    CommentPrCasdiff {
        #[arg(long, env = "PR_NUMBER", help = "The pull request number")]
        pr_number: Option<String>,
        #[arg(long, env = "BASE_REF", help = "The pull request base commit")]
        base_ref: Option<String>,
        #[arg(long, env = "HEAD_REF", help = "The pull request head commit")]
        head_ref: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    if !std::io::stderr().is_terminal() {
        colored::control::set_override(false);
    }

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is::<UsageError>() => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let pwd = std::env::current_dir()?;
    let repository = Repository::new(&pwd, Box::new(std::io::stdout()))?;

    match cli.command {
        Commands::Casdiff { from, to, format } => {
            let format = Format::from_str(&format)?;

            repository.casdiff(&from, &to, format)?
        }
        Commands::Diff { from, to } => repository.diff(&from, &to)?,
        Commands::ModProcess {
            root_sync_dir,
            src_dir,
            owner,
            repo,
            reference,
        } => {
            let [root_sync_dir, src_dir, owner, repo, reference] = required_flags([
                ("root-sync-dir", root_sync_dir),
                ("src-dir", src_dir),
                ("owner", owner),
                ("repo", repo),
                ("ref", reference),
            ])?;

            repository.mod_process(&root_sync_dir, &src_dir, &owner, &repo, &reference)?
        }
        Commands::ReleaseTags {
            owner,
            repo,
            reference,
            inclusive,
            skip_tags_file,
        } => {
            let [owner, repo, reference] = required_flags([
                ("owner", owner),
                ("repo", repo),
                ("reference", reference),
            ])?;
            let skip_tags = match skip_tags_file {
                Some(path) => SkipTags::from_file(&path)?,
                None => SkipTags::default(),
            };
            let github = GitHubClient::from_env()?;

            repository
                .release_tags(&github, &owner, &repo, &reference, inclusive, skip_tags)
                .await?
        }
        Commands::Release {
            directory,
            dry_run,
            owner,
            repo,
        } => {
            let github = GitHubClient::from_env()?;

            repository
                .release(&github, &directory, &owner, &repo, dry_run)
                .await?
        }
        Commands::CommentPrCasdiff {
            pr_number,
            base_ref,
            head_ref,
        } => {
            let [pr_number, base_ref, head_ref] = required_flags([
                ("pr-number", pr_number),
                ("base-ref", base_ref),
                ("head-ref", head_ref),
            ])?;

            repository
                .comment_pr_casdiff(&PullRequest::new(pr_number, base_ref, head_ref))
                .await?
        }
    }

    Ok(())
}
