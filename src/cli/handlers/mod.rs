mod init;
pub use init::cmd_init;

use std::path::PathBuf;
use std::sync::Arc;

use crate::board::{BoardController, BoardError, Notice, Silent};
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::{config_io, logging};
use crate::model::config::BoardConfig;
use crate::model::{NewProject, NewTask, Project, ProjectPatch, TaskFilter, TaskPatch};
use crate::ops::check;
use crate::ops::gesture::DropTarget;
use crate::store::{self, ApiError, ProjectStore, Remote, TaskStore};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Runtime for a single command. Commands run one request at a time, so a
/// current-thread runtime is enough.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread().enable_all().build()
}

pub fn dispatch(cli: Cli) -> CmdResult {
    let Some(command) = cli.command else {
        return Err("no command given (try `tb --help`)".into());
    };
    let ctx = Context::load(cli.board_dir.as_deref(), cli.project, cli.json)?;
    logging::init_stderr(ctx.config.log.level.as_deref());
    runtime()?.block_on(run(&ctx, command))
}

async fn run(ctx: &Context, command: Commands) -> CmdResult {
    match command {
        // Init is handled in main.rs before board discovery
        Commands::Init(_) => Err("board already initialized".into()),

        Commands::Projects => cmd_projects(ctx).await,
        Commands::Project(args) => cmd_project(ctx, args.action).await,
        Commands::Use(args) => cmd_use(ctx, &args.key).await,
        Commands::Whoami => cmd_whoami(ctx).await,

        // Read commands
        Commands::Board => cmd_board(ctx).await,
        Commands::List(args) => cmd_list(ctx, args).await,
        Commands::Show(args) => cmd_show(ctx, &args.id).await,

        // Write commands
        Commands::Add(args) => cmd_add(ctx, args).await,
        Commands::Edit(args) => cmd_edit(ctx, args).await,
        Commands::Rm(args) => cmd_rm(ctx, &args.id).await,
        Commands::Mv(args) => cmd_mv(ctx, args).await,

        // Maintenance
        Commands::Check(args) => cmd_check(ctx, args.fix).await,
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Everything a command needs: where the board lives, its config, and the
/// backend to talk to.
pub struct Context {
    pub root: PathBuf,
    pub board_dir: PathBuf,
    pub config: BoardConfig,
    pub api: Arc<dyn Remote>,
    pub json: bool,
    project: Option<String>,
}

impl Context {
    pub fn load(dir: Option<&str>, project: Option<String>, json: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let start = match dir {
            Some(dir) => std::fs::canonicalize(dir)
                .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
            None => std::env::current_dir()?,
        };
        let root = config_io::discover_board(&start)?;
        let board_dir = root.join(config_io::BOARD_DIR);
        let config = config_io::load_config(&board_dir)?;
        let api = store::open_remote(&config.remote, &board_dir)?;
        Ok(Context {
            root,
            board_dir,
            config,
            api,
            json,
            project,
        })
    }

    /// The project named by `--project`, else the configured default
    pub fn project_key(&self) -> Option<&str> {
        self.project.as_deref().or(self.config.board.project.as_deref())
    }

    /// Look a project up by id, falling back to a case-insensitive name match
    pub async fn find_project(&self, key: &str) -> Result<Project, Box<dyn std::error::Error>> {
        match self.api.get_project(key).await {
            Ok(project) => Ok(project),
            Err(ApiError::NotFound(_)) => {
                let mut projects = ProjectStore::new(self.api.clone());
                projects.fetch().await?;
                projects
                    .find(key)
                    .cloned()
                    .ok_or_else(|| format!("project not found: {}", key).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn current_project(&self) -> Result<Project, Box<dyn std::error::Error>> {
        let key = self.project_key().ok_or(BoardError::NoProject)?;
        self.find_project(key).await
    }

    /// Load a project's board. Notices go to the terminal unless `--json`.
    pub async fn open_board(&self, project_id: &str) -> Result<BoardController, Box<dyn std::error::Error>> {
        let store = TaskStore::new(self.api.clone());
        let mut board = if self.json {
            BoardController::new(store, project_id, Silent)
        } else {
            BoardController::new(store, project_id, print_notice)
        };
        board.load().await?;
        Ok(board)
    }
}

fn print_notice(notice: Notice) {
    if notice.is_failure() {
        eprintln!("{}", notice.message);
    } else {
        println!("{}", notice.message);
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Projects and session
// ---------------------------------------------------------------------------

async fn cmd_projects(ctx: &Context) -> CmdResult {
    let mut projects = ProjectStore::new(ctx.api.clone());
    projects.fetch().await?;
    if ctx.json {
        return print_json(projects.projects());
    }
    if projects.projects().is_empty() {
        println!("no projects (create one with `tb project add <name>`)");
    }
    let current = ctx.project_key();
    for project in projects.projects() {
        let is_current = current.is_some_and(|k| k == project.id || k.eq_ignore_ascii_case(&project.name));
        println!("{}", format_project_line(project, is_current));
    }
    Ok(())
}

async fn cmd_project(ctx: &Context, action: ProjectAction) -> CmdResult {
    let mut projects = ProjectStore::new(ctx.api.clone());
    match action {
        ProjectAction::Add {
            name,
            description,
            color,
        } => {
            let project = projects
                .create(&NewProject {
                    name,
                    description,
                    color,
                })
                .await?;
            if ctx.json {
                return print_json(&project);
            }
            println!("Created project {}: {}", project.id, project.name);
        }
        ProjectAction::Edit {
            key,
            name,
            description,
            color,
        } => {
            let patch = ProjectPatch {
                name,
                description,
                color,
            };
            if patch == ProjectPatch::default() {
                return Err("nothing to change (use --name, --description, or --color)".into());
            }
            let project = ctx.find_project(&key).await?;
            let project = projects.update(&project.id, &patch).await?;
            if ctx.json {
                return print_json(&project);
            }
            println!("Updated project {}: {}", project.id, project.name);
        }
        ProjectAction::Rm { key } => {
            let project = ctx.find_project(&key).await?;
            projects.delete(&project.id).await?;
            let (_, mut doc) = config_io::read_config(&ctx.board_dir)?;
            config_io::clear_board_project(&mut doc, &project.id);
            config_io::write_config(&ctx.board_dir, &doc)?;
            if !ctx.json {
                println!("Deleted project {}: {}", project.id, project.name);
            }
        }
    }
    Ok(())
}

async fn cmd_use(ctx: &Context, key: &str) -> CmdResult {
    let project = ctx.find_project(key).await?;
    let (_, mut doc) = config_io::read_config(&ctx.board_dir)?;
    config_io::set_board_project(&mut doc, &project.id);
    config_io::write_config(&ctx.board_dir, &doc)?;
    if ctx.json {
        return print_json(&project);
    }
    println!("Using project {}: {}", project.id, project.name);
    Ok(())
}

async fn cmd_whoami(ctx: &Context) -> CmdResult {
    let user = ctx.api.current_user().await?;
    if ctx.json {
        return print_json(&user);
    }
    println!("{}", format_user(&user));
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

async fn cmd_board(ctx: &Context) -> CmdResult {
    let project = ctx.current_project().await?;
    let board = ctx.open_board(&project.id).await?;
    let columns = board.columns();
    if ctx.json {
        return print_json(&board_to_json(&project, &columns));
    }
    for line in format_board(&project, &columns) {
        println!("{}", line);
    }
    Ok(())
}

async fn cmd_list(ctx: &Context, args: ListArgs) -> CmdResult {
    let mut filter = TaskFilter {
        status: args.status.as_deref().map(parse_status).transpose()?,
        priority: args.priority.as_deref().map(parse_priority).transpose()?,
        assignee_id: args.assignee,
        ..TaskFilter::default()
    };
    if ctx.project_key().is_some() {
        filter.project_id = Some(ctx.current_project().await?.id);
    }

    let mut store = TaskStore::new(ctx.api.clone());
    store.fetch(Some(&filter)).await?;
    if ctx.json {
        return print_json(store.tasks());
    }
    for column in store.columns() {
        for task in &column.tasks {
            println!("{:<12} {:>3} {}", column.status.label(), task.position, format_task_line(task));
        }
    }
    Ok(())
}

async fn cmd_show(ctx: &Context, id: &str) -> CmdResult {
    let mut store = TaskStore::new(ctx.api.clone());
    store.fetch_one(id).await?;
    let Some(task) = store.selected() else {
        return Err(format!("task not found: {}", id).into());
    };
    if ctx.json {
        return print_json(task);
    }
    for line in format_task_detail(task) {
        println!("{}", line);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

async fn cmd_add(ctx: &Context, args: AddArgs) -> CmdResult {
    let project = ctx.current_project().await?;
    let new = NewTask {
        title: args.title,
        project_id: project.id.clone(),
        description: args.description,
        status: args.status.as_deref().map(parse_status).transpose()?,
        priority: args.priority.as_deref().map(parse_priority).transpose()?,
        position: args.position,
        due_date: args.due.as_deref().map(parse_due).transpose()?,
        assignee_id: args.assignee,
    };
    let mut store = TaskStore::new(ctx.api.clone());
    let task = store.create(&new).await?;
    if ctx.json {
        return print_json(&task);
    }
    println!(
        "Added {} to {} at position {}",
        task.id,
        task.status.label(),
        task.position
    );
    Ok(())
}

async fn cmd_edit(ctx: &Context, args: EditArgs) -> CmdResult {
    let patch = TaskPatch {
        title: args.title,
        description: args.description,
        priority: args.priority.as_deref().map(parse_priority).transpose()?,
        due_date: args.due.as_deref().map(parse_due).transpose()?,
        assignee_id: args.assignee,
    };
    let status = args.status.as_deref().map(parse_status).transpose()?;
    if patch.is_empty() && status.is_none() {
        return Err("nothing to change".into());
    }

    let task = ctx.api.get_task(&args.id).await?;
    let mut board = ctx.open_board(&task.project_id).await?;
    if !patch.is_empty() {
        board.store_mut().update(&args.id, &patch).await?;
    }
    // A status change is a drop on the end of the other column
    if let Some(status) = status.filter(|s| *s != task.status) {
        board.drop_on(&args.id, DropTarget::Column(status)).await?;
    }

    let updated = board.store().get(&args.id).cloned().unwrap_or(task);
    if ctx.json {
        return print_json(&updated);
    }
    println!("Updated {}", updated.id);
    Ok(())
}

async fn cmd_rm(ctx: &Context, id: &str) -> CmdResult {
    let task = ctx.api.get_task(id).await?;
    let mut board = ctx.open_board(&task.project_id).await?;
    board.store_mut().delete(id).await?;
    if !ctx.json {
        println!("Deleted {}: {}", task.id, task.title);
    }
    Ok(())
}

async fn cmd_mv(ctx: &Context, args: MvArgs) -> CmdResult {
    let task = ctx.api.get_task(&args.id).await?;
    let mut board = ctx.open_board(&task.project_id).await?;
    let target = DropTarget::resolve(&args.target, &board.columns()).map_err(BoardError::from)?;
    let moved = board.drop_on(&args.id, target).await?;
    if ctx.json {
        return print_json(&MoveJson {
            task: board.store().get(&args.id),
            moved,
        });
    }
    if !moved {
        println!("{} is already there", args.id);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

async fn cmd_check(ctx: &Context, fix: bool) -> CmdResult {
    let mut filter = TaskFilter::default();
    if ctx.project_key().is_some() {
        filter.project_id = Some(ctx.current_project().await?.id);
    }
    let mut store = TaskStore::new(ctx.api.clone());
    store.fetch(Some(&filter)).await?;
    let mut result = check::check_tasks(store.tasks());

    let mut fixed = 0;
    if fix && !result.valid {
        let mut projects: Vec<String> = result
            .errors
            .iter()
            .filter_map(|e| match e {
                check::CheckError::DuplicatePosition { project_id, .. }
                | check::CheckError::PositionGap { project_id, .. } => Some(project_id.clone()),
                check::CheckError::DuplicateId { .. } => None,
            })
            .collect();
        projects.sort();
        projects.dedup();
        for project_id in &projects {
            fixed += store.repair(project_id).await?.len();
        }
        store.fetch(None).await?;
        result = check::check_tasks(store.tasks());
    }

    if ctx.json {
        print_json(&result)?;
    } else {
        if fixed > 0 {
            println!("Renumbered {} tasks", fixed);
        }
        if result.valid {
            println!("ok: {} tasks checked", result.tasks_checked);
        } else {
            println!("Errors:");
            for line in format_check(&result) {
                println!("{}", line);
            }
        }
    }

    if result.valid {
        Ok(())
    } else {
        Err(format!("{} ordering problems (run `tb check --fix`)", result.errors.len()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_board(name: &str) -> TempDir {
        let tmp = TempDir::new().unwrap();
        cmd_init(
            InitArgs {
                name: Some(name.into()),
                http: None,
                token: None,
            },
            tmp.path().to_str(),
        )
        .unwrap();
        tmp
    }

    #[test]
    fn test_context_uses_configured_project() {
        let tmp = init_board("Demo");
        let ctx = Context::load(tmp.path().to_str(), None, false).unwrap();
        assert_eq!(ctx.project_key(), Some("P-001"));
        let rt = runtime().unwrap();
        let project = rt.block_on(ctx.current_project()).unwrap();
        assert_eq!(project.name, "Demo");
        // lookup by name works too
        let by_name = rt.block_on(ctx.find_project("demo")).unwrap();
        assert_eq!(by_name.id, "P-001");
    }

    #[test]
    fn test_project_flag_overrides_config() {
        let tmp = init_board("Demo");
        let ctx = Context::load(tmp.path().to_str(), Some("Other".into()), false).unwrap();
        assert_eq!(ctx.project_key(), Some("Other"));
        let rt = runtime().unwrap();
        assert!(rt.block_on(ctx.current_project()).is_err());
    }

    #[test]
    fn test_add_and_move_through_handlers() {
        let tmp = init_board("Demo");
        let ctx = Context::load(tmp.path().to_str(), None, true).unwrap();
        let rt = runtime().unwrap();
        for title in ["A", "B"] {
            rt.block_on(cmd_add(
                &ctx,
                AddArgs {
                    title: title.into(),
                    status: None,
                    position: None,
                    priority: None,
                    description: None,
                    due: None,
                    assignee: None,
                },
            ))
            .unwrap();
        }
        rt.block_on(cmd_mv(
            &ctx,
            MvArgs {
                id: "T-001".into(),
                target: "done".into(),
            },
        ))
        .unwrap();

        let board = rt.block_on(ctx.open_board("P-001")).unwrap();
        let done = board.store().get("T-001").unwrap();
        assert_eq!(done.status, crate::model::TaskStatus::Done);
        assert_eq!(done.position, 0);
        assert_eq!(board.store().get("T-002").unwrap().position, 0);
        rt.block_on(cmd_check(&ctx, false)).unwrap();
    }

    #[test]
    fn test_show_reads_through_the_store() {
        let tmp = init_board("Demo");
        let ctx = Context::load(tmp.path().to_str(), None, true).unwrap();
        let rt = runtime().unwrap();
        let err = rt.block_on(cmd_show(&ctx, "T-404")).unwrap_err();
        assert!(err.to_string().contains("T-404"));

        let mut store = TaskStore::new(ctx.api.clone());
        let task = rt
            .block_on(store.create(&NewTask {
                title: "Write docs".into(),
                project_id: "P-001".into(),
                ..NewTask::default()
            }))
            .unwrap();
        rt.block_on(cmd_show(&ctx, &task.id)).unwrap();
    }
}
