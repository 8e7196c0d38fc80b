#![warn(unused_extern_crates)]

use anyhow::{anyhow, Context};
use clap::Parser;

use verdict_core::config::ConfigStore;
use verdict_core::process::{display_command, spawn_command};
use verdict_core::review::{resolve_revision, Action, Review, Target};
use verdict_core::RemoteUrl;

#[derive(Debug, clap::Parser)]
#[command(name = "verdict", version, about = "Verdict: Gerrit review scores from the command line", long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Send scores, a message or an action for a commit to Gerrit
    Review(ReviewArgs),

    /// Show the connection details inferred from a remote
    Remote(RemoteArgs),
}

#[derive(Debug, clap::Parser)]
#[command(group(clap::ArgGroup::new("action").args(["submit", "abandon", "rebase"])))]
pub struct ReviewArgs {
    /// Commit to review, or a Gerrit <change>,<patchset> reference
    #[arg(default_value = "HEAD")]
    pub revision: String,

    /// Verified score
    #[arg(long = "verified", allow_negative_numbers = true)]
    pub verified: Option<i8>,

    /// Code-Review score
    #[arg(long = "code-review", allow_negative_numbers = true)]
    pub code_review: Option<i8>,

    /// Review message
    #[arg(short = 'm', long = "message")]
    pub message: Option<String>,

    /// Submit the change
    #[arg(long = "submit", action = clap::ArgAction::SetTrue)]
    pub submit: bool,

    /// Abandon the change
    #[arg(long = "abandon", action = clap::ArgAction::SetTrue)]
    pub abandon: bool,

    /// Rebase the change
    #[arg(long = "rebase", action = clap::ArgAction::SetTrue)]
    pub rebase: bool,

    /// Remote to take the server from (default: verdict.remote, then origin)
    #[arg(short = 'r', long = "remote")]
    pub remote: Option<String>,

    /// Gerrit project (default: derived from the remote url)
    #[arg(long = "project")]
    pub project: Option<String>,

    /// Login name on the Gerrit server
    #[arg(long = "user")]
    pub user: Option<String>,

    /// Gerrit ssh port
    #[arg(long = "port")]
    pub port: Option<String>,

    /// Print the command instead of running it
    #[arg(short = 'n', long = "dry-run", action = clap::ArgAction::SetTrue)]
    pub dry_run: bool,
}

impl ReviewArgs {
    fn action(&self) -> Option<Action> {
        if self.submit {
            Some(Action::Submit)
        } else if self.abandon {
            Some(Action::Abandon)
        } else if self.rebase {
            Some(Action::Rebase)
        } else {
            None
        }
    }
}

#[derive(Debug, clap::Parser)]
pub struct RemoteArgs {
    /// Remote name (default: verdict.remote, then origin)
    #[arg()]
    pub name: Option<String>,

    /// Print as JSON
    #[arg(long = "json", action = clap::ArgAction::SetTrue)]
    pub json: bool,

    /// List the configured remotes instead
    #[arg(long = "list", action = clap::ArgAction::SetTrue, conflicts_with_all = ["name", "json"])]
    pub list: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = run_command(&cli);

    if let Err(e) = result {
        eprintln!("Error: {e}");

        for e in e.chain().skip(1) {
            eprintln!("{e}");
        }

        std::process::exit(1);
    }
}

fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let repo = git2::Repository::open_from_env().context("Not in a git repository")?;
    let config = ConfigStore::from_repo(&repo)?;

    match &cli.command {
        Command::Review(args) => handle_review(args, &repo, &config),
        Command::Remote(args) => handle_remote(args, &config),
    }
}

fn handle_review(
    args: &ReviewArgs,
    repo: &git2::Repository,
    config: &ConfigStore,
) -> anyhow::Result<()> {
    let mut review = Review {
        verified: args.verified,
        code_review: args.code_review,
        message: args.message.clone(),
        action: args.action(),
        project: args.project.clone(),
        revision: args.revision.clone(),
    };

    if review.is_empty() {
        return Err(anyhow!(
            "Nothing to send: give a score, a message, or one of --submit, --abandon, --rebase"
        ));
    }

    review.revision = resolve_revision(repo, &args.revision)?;

    let remote_name = config.select_remote(args.remote.as_deref())?;
    let remote = config.remote(&remote_name)?;

    let target = Target {
        username: args.user.clone(),
        port: args.port.clone(),
        default_port: config.default_port()?,
    };

    let command = review.command(&remote, &target)?;

    if args.dry_run {
        println!("{}", display_command(&command));
        return Ok(());
    }

    log::info!(
        "reviewing {} on remote '{}'",
        review.revision,
        remote_name
    );

    spawn_command(&command).context("Failed to send review")
}

fn handle_remote(args: &RemoteArgs, config: &ConfigStore) -> anyhow::Result<()> {
    if args.list {
        for name in config.remote_names()? {
            println!("{}", name);
        }
        return Ok(());
    }

    let remote_name = config.select_remote(args.name.as_deref())?;
    let remote = config.remote(&remote_name)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&remote)?);
    } else {
        print!("{}", describe_remote(&remote_name, &remote));
    }

    Ok(())
}

fn describe_remote(remote_name: &str, remote: &RemoteUrl) -> String {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_owned());

    let mut out = String::new();
    out.push_str(&format!("remote:   {}\n", remote_name));
    out.push_str(&format!("scheme:   {}\n", remote.scheme));
    out.push_str(&format!("schemes:  {}\n", remote.schemes.join("+")));
    out.push_str(&format!("username: {}\n", field(&remote.username)));
    out.push_str(&format!("hostname: {}\n", field(&remote.hostname)));
    out.push_str(&format!("port:     {}\n", field(&remote.port)));
    out.push_str(&format!("path:     {}\n", field(&remote.path)));
    out.push_str(&format!("project:  {}\n", field(&remote.project())));
    out
}
