use std::path::PathBuf;

use crate::cli::commands::InitArgs;
use crate::io::config_io;
use crate::model::config::{Backend, DEFAULT_BASE_URL};
use crate::model::NewProject;
use crate::store::api::ProjectApi;
use crate::store::local::LocalApi;

use super::runtime;

/// Infer a project name from a directory name: replace hyphens and
/// underscores with spaces, title-case.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + chars.as_str()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Create `.taskboard/` in `dir` (default: the current directory).
///
/// A local board also gets its first project, which becomes the default.
/// An http board only records the API location; pick a project afterwards
/// with `tb use`.
pub fn cmd_init(args: InitArgs, dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let root = match dir {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };

    // Check for an enclosing board and warn
    if let Some(parent) = root.parent()
        && let Ok(parent_root) = config_io::discover_board(parent)
    {
        eprintln!(
            "Note: parent board found at {}/",
            parent_root.join(config_io::BOARD_DIR).display()
        );
        eprintln!("Creating new board in {}/", config_io::BOARD_DIR);
    }

    if let Some(url) = args.http {
        let text = config_io::render_config(Backend::Http, &url, None);
        let board_dir = config_io::create_board_dir(&root, &text)?;
        if let Some(token) = args.token {
            let (_, mut doc) = config_io::read_config(&board_dir)?;
            config_io::set_remote_token(&mut doc, &token);
            config_io::write_config(&board_dir, &doc)?;
        }
        println!("Initialized taskboard for {}", url);
        println!("Pick a project with `tb projects` and `tb use <project>`");
        return Ok(());
    }

    let name = args.name.unwrap_or_else(|| {
        root.file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Untitled".to_string())
    });

    let text = config_io::render_config(Backend::Local, DEFAULT_BASE_URL, None);
    let board_dir = config_io::create_board_dir(&root, &text)?;
    let api = LocalApi::new(&board_dir);
    let project = runtime()?.block_on(api.create_project(&NewProject {
        name,
        ..NewProject::default()
    }))?;

    let (_, mut doc) = config_io::read_config(&board_dir)?;
    config_io::set_board_project(&mut doc, &project.id);
    config_io::write_config(&board_dir, &doc)?;

    println!("Initialized taskboard: {} ({})", project.name, project.id);
    Ok(())
}
