//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::domain::{NodeType, RawFields};

/// Probabilistic decision trees: build, validate, evaluate expected cost and cumulative time
#[derive(Parser, Debug)]
#[command(name = "dtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Turn debugging information on (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Tree document (default: `tree_file` setting)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    /// Project directory holding `.dtree.toml` (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a fresh tree holding only the start node
    Init {
        /// Overwrite an existing tree file
        #[arg(long)]
        force: bool,
    },

    /// Print the tree with derived fields
    Show {
        /// Show node ids (overrides `display.show_ids`)
        #[arg(long)]
        ids: bool,
        /// Exit with code 2 if any probabilities must be fixed (for scripting)
        #[arg(long)]
        check: bool,
    },

    /// List child types that may be added under a node
    Allowed {
        /// Node id or unique id prefix
        id: String,
    },

    /// Append a child node
    Add {
        /// Parent node id or unique id prefix
        parent: String,
        /// decision, action, outcome or exit
        node_type: NodeType,
        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Change name, probability, cost or time of a node
    Edit {
        /// Node id or unique id prefix
        id: String,
        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Remove a node and its whole subtree
    Delete {
        /// Node id or unique id prefix
        id: String,
    },

    /// Replace the tree with a single start node
    Reset,

    /// Replace the tree with a built-in sample
    Sample {
        /// Sample name
        #[arg(required_unless_present = "list")]
        name: Option<String>,
        /// List available samples
        #[arg(short, long, conflicts_with = "name")]
        list: bool,
    },

    /// Replace the tree with a JSON document
    Import {
        /// Document to read
        #[arg(value_hint = ValueHint::FilePath)]
        source: PathBuf,
    },

    /// Write the tree, derived fields included, to another file
    Export {
        /// Target file
        #[arg(value_hint = ValueHint::FilePath)]
        dest: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Editable node fields. Values are parsed leniently; blank means unset.
#[derive(Args, Debug, Default, Clone)]
pub struct FieldArgs {
    /// Display name
    #[arg(long)]
    pub name: Option<String>,
    /// Probability in [0, 1]
    #[arg(short, long, allow_hyphen_values = true)]
    pub probability: Option<String>,
    /// Non-negative cost
    #[arg(short, long, allow_hyphen_values = true)]
    pub cost: Option<String>,
    /// Non-negative time
    #[arg(short, long, allow_hyphen_values = true)]
    pub time: Option<String>,
}

impl FieldArgs {
    pub fn to_raw(&self) -> RawFields {
        let mut raw = RawFields::new();
        if let Some(name) = &self.name {
            raw = raw.name(name.as_str());
        }
        if let Some(p) = &self.probability {
            raw = raw.probability(p.as_str());
        }
        if let Some(c) = &self.cost {
            raw = raw.cost(c.as_str());
        }
        if let Some(t) = &self.time {
            raw = raw.time(t.as_str());
        }
        raw
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
