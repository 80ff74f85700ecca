use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tb", about = concat!("[#] taskboard v", env!("CARGO_PKG_VERSION"), " - kanban boards in your terminal"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different board directory
    #[arg(short = 'C', long = "board-dir", global = true)]
    pub board_dir: Option<String>,

    /// Project to use instead of the configured default (id or name)
    #[arg(short = 'p', long, global = true)]
    pub project: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a board in the current directory
    Init(InitArgs),
    /// List projects
    Projects,
    /// Project management
    Project(ProjectCmd),
    /// Make a project the default board
    Use(UseArgs),
    /// Show the signed-in user
    Whoami,
    /// Show the board (one column per status)
    Board,
    /// List tasks
    List(ListArgs),
    /// Show task details
    Show(ShowArgs),
    /// Add a task (bottom of its column unless --position is given)
    Add(AddArgs),
    /// Edit a task
    Edit(EditArgs),
    /// Delete a task
    Rm(RmArgs),
    /// Drag a task onto a column or another task
    Mv(MvArgs),
    /// Validate task positions
    Check(CheckArgs),
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Name of the first project (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Use the REST API at this base URL instead of a local board file
    #[arg(long, value_name = "URL")]
    pub http: Option<String>,
    /// Bearer token for the REST API
    #[arg(long, requires = "http")]
    pub token: Option<String>,
}

// ---------------------------------------------------------------------------
// Project args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ProjectCmd {
    #[command(subcommand)]
    pub action: ProjectAction,
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a project
    Add {
        /// Project name
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Hex color, e.g. "#6366f1"
        #[arg(long)]
        color: Option<String>,
    },
    /// Change a project's name, description, or color
    Edit {
        /// Project id or name
        #[arg(value_name = "PROJECT")]
        key: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a project and all of its tasks
    Rm {
        /// Project id or name
        #[arg(value_name = "PROJECT")]
        key: String,
    },
}

#[derive(Args)]
pub struct UseArgs {
    /// Project id or name
    #[arg(value_name = "PROJECT")]
    pub key: String,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Filter by status (todo, in-progress, done)
    #[arg(long)]
    pub status: Option<String>,
    /// Filter by priority (low, medium, high)
    #[arg(long)]
    pub priority: Option<String>,
    /// Filter by assignee id
    #[arg(long)]
    pub assignee: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Task ID to show
    pub id: String,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// Column to add to (default: todo)
    #[arg(long)]
    pub status: Option<String>,
    /// Zero-based slot in the column (default: end)
    #[arg(long)]
    pub position: Option<usize>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long, short = 'd')]
    pub description: Option<String>,
    /// Due date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub due: Option<String>,
    /// Assignee user id
    #[arg(long)]
    pub assignee: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long, short = 'd')]
    pub description: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    /// Due date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub due: Option<String>,
    #[arg(long)]
    pub assignee: Option<String>,
    /// Move to the end of another column
    #[arg(long)]
    pub status: Option<String>,
}

#[derive(Args)]
pub struct RmArgs {
    /// Task ID
    pub id: String,
}

#[derive(Args)]
pub struct MvArgs {
    /// Task to drag
    pub id: String,
    /// Where to drop it: a status (append to that column) or a task id
    /// (take that task's slot)
    pub target: String,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Renumber columns that have gaps or duplicate positions
    #[arg(long)]
    pub fix: bool,
}
