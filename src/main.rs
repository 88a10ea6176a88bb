//! gitplumb - Git Object Store Plumbing
//!
//! This is the command-line interface over the gitplumb library. Every
//! subcommand is a thin wrapper: parse arguments, call one library
//! operation, print the result.

use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use gitplumb::object::{GitObject, ObjectKind};
use gitplumb::storage::{ObjectStore, RefNode, RefTree, Repository, StoreResult};

/// gitplumb - content tracker plumbing
#[derive(Parser)]
#[command(name = "gitplumb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize a new, empty repository
    Init {
        /// Where to create the repository
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Print the content of a repository object
    CatFile {
        /// Expected object type (blob, tree, commit, tag)
        kind: String,
        /// The object to display
        object: String,
    },
    /// Compute the object id of a file, optionally storing it
    HashObject {
        /// Object type to frame the content as
        #[arg(short = 't', long = "type", default_value = "blob")]
        kind: String,
        /// Actually write the object into the database
        #[arg(short = 'w', long)]
        write: bool,
        /// Read object content from this file
        path: PathBuf,
    },
    /// Display the history of a commit
    Log {
        /// Commit to start at
        #[arg(default_value = "HEAD")]
        commit: String,
    },
    /// List the entries of a tree object
    LsTree {
        /// The tree (or commit) to list
        tree: String,
    },
    /// Materialize a commit inside an empty directory
    Checkout {
        /// The commit or tree to check out
        commit: String,
        /// The empty directory to check out into
        path: PathBuf,
    },
    /// List references
    ShowRef,
    /// List tags, or create one
    Tag {
        /// Create an annotated tag object
        #[arg(short = 'a')]
        annotated: bool,
        /// The new tag's name; with no name, list existing tags
        name: Option<String>,
        /// The object the new tag will point to
        #[arg(default_value = "HEAD")]
        object: String,
    },
    /// Resolve a name to an object id
    RevParse {
        /// Expected object type to peel toward
        #[arg(long = "type")]
        kind: Option<String>,
        /// The name to resolve
        name: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> StoreResult<()> {
    match command {
        Command::Init { path } => {
            let repo = Repository::init(&path)?;
            println!(
                "Initialized empty repository in {}",
                repo.gitdir().display()
            );
            Ok(())
        }
        Command::CatFile { kind, object } => cat_file(&kind, &object),
        Command::HashObject { kind, write, path } => hash_object(&kind, write, &path),
        Command::Log { commit } => log(&commit),
        Command::LsTree { tree } => ls_tree(&tree),
        Command::Checkout { commit, path } => repo()?.checkout(&commit, path),
        Command::ShowRef => show_ref(),
        Command::Tag {
            annotated,
            name,
            object,
        } => tag(annotated, name.as_deref(), &object),
        Command::RevParse { kind, name } => rev_parse(kind.as_deref(), &name),
    }
}

fn repo() -> StoreResult<Repository> {
    Repository::discover(".")
}

fn cat_file(kind: &str, object: &str) -> StoreResult<()> {
    let repo = repo()?;
    let kind: ObjectKind = kind.parse()?;
    let id = repo.find_object(object, Some(kind))?;
    let obj = repo.objects().read(&id)?;

    std::io::stdout().write_all(&obj.serialize())?;
    Ok(())
}

fn hash_object(kind: &str, write: bool, path: &PathBuf) -> StoreResult<()> {
    let kind: ObjectKind = kind.parse()?;
    let data = std::fs::read(path)?;
    let obj = GitObject::deserialize(kind, &data)?;

    let id = if write {
        repo()?.objects().write(&obj, true)?
    } else {
        // dry run: hash without a repository at all
        ObjectStore::hash_object(&obj).0
    };
    println!("{id}");
    Ok(())
}

fn log(commit: &str) -> StoreResult<()> {
    let repo = repo()?;
    let start = repo.find_object(commit, Some(ObjectKind::Commit))?;

    for id in repo.history(&start)? {
        if let GitObject::Commit(kvlm) = repo.objects().read(&id)? {
            let message = String::from_utf8_lossy(kvlm.message()).into_owned();
            let summary = message.lines().next().unwrap_or("").to_string();
            println!("{} {}", id.short(), summary);
        }
    }
    Ok(())
}

fn ls_tree(tree: &str) -> StoreResult<()> {
    let repo = repo()?;
    let id = repo.find_object(tree, Some(ObjectKind::Tree))?;
    let obj = repo.objects().read(&id)?;

    if let GitObject::Tree(entries) = obj {
        for entry in entries {
            let kind = repo.objects().read(&entry.id)?.kind();
            println!(
                "{} {} {}\t{}",
                String::from_utf8_lossy(&entry.mode),
                kind,
                entry.id,
                String::from_utf8_lossy(&entry.path)
            );
        }
    }
    Ok(())
}

fn show_ref() -> StoreResult<()> {
    let repo = repo()?;
    print_ref_tree(&repo.list_refs()?, "refs");
    Ok(())
}

fn print_ref_tree(tree: &RefTree, prefix: &str) {
    for (name, node) in tree {
        match node {
            RefNode::Id(id) => println!("{id} {prefix}/{name}"),
            RefNode::Dir(sub) => print_ref_tree(sub, &format!("{prefix}/{name}")),
        }
    }
}

fn tag(annotated: bool, name: Option<&str>, object: &str) -> StoreResult<()> {
    let repo = repo()?;
    match name {
        Some(name) => {
            repo.create_tag(name, object, annotated)?;
            Ok(())
        }
        None => {
            print_tag_names(&repo.refs().list(Some("refs/tags"))?, "");
            Ok(())
        }
    }
}

fn print_tag_names(tree: &RefTree, prefix: &str) {
    for (name, node) in tree {
        match node {
            RefNode::Id(_) => println!("{prefix}{name}"),
            RefNode::Dir(sub) => print_tag_names(sub, &format!("{prefix}{name}/")),
        }
    }
}

fn rev_parse(kind: Option<&str>, name: &str) -> StoreResult<()> {
    let repo = repo()?;
    let wanted = match kind {
        Some(kind) => Some(kind.parse::<ObjectKind>()?),
        None => None,
    };
    println!("{}", repo.find_object(name, wanted)?);
    Ok(())
}
