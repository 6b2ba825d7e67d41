//! Command dispatch: every tree command runs import → mutate → export.

use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::samples;
use crate::application::services::MutationOutcome;
use crate::application::{ApplicationResult, EditorSession};
use crate::cli::args::{Cli, Commands, ConfigCommands, FieldArgs};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_dir, global_config_path, local_config_path, Settings};
use crate::domain::{can_edit, DomainError, NodeId, NodeType};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Execute the parsed CLI command.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let project_dir = match &cli.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()
            .map_err(|e| InfraError::io("get current directory", e))?,
    };
    let settings = Settings::load(Some(&project_dir))?;
    let tree_file = cli
        .file
        .clone()
        .unwrap_or_else(|| settings.tree_file.clone());
    debug!(tree_file = %tree_file.display(), "resolved tree file");

    let mut container = ServiceContainer::new(settings);

    match &cli.command {
        Commands::Init { force } => cmd_init(&container, &tree_file, *force),
        Commands::Show { ids, check } => cmd_show(&mut container, &tree_file, *ids, *check),
        Commands::Allowed { id } => cmd_allowed(&mut container, &tree_file, id),
        Commands::Add {
            parent,
            node_type,
            fields,
        } => cmd_add(&mut container, &tree_file, parent, *node_type, fields),
        Commands::Edit { id, fields } => cmd_edit(&mut container, &tree_file, id, fields),
        Commands::Delete { id } => cmd_delete(&mut container, &tree_file, id),
        Commands::Reset => cmd_reset(&mut container, &tree_file),
        Commands::Sample { name, list } => {
            cmd_sample(&mut container, &tree_file, name.as_deref(), *list)
        }
        Commands::Import { source } => cmd_import(&mut container, &tree_file, source),
        Commands::Export { dest } => cmd_export(&mut container, &tree_file, dest),
        Commands::Config { command } => cmd_config(&container, &project_dir, command),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "dtree", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn load(container: &mut ServiceContainer, tree_file: &Path) -> CliResult<()> {
    container.tree_service.import_file(tree_file)?;
    Ok(())
}

fn save(container: &ServiceContainer, tree_file: &Path) -> CliResult<()> {
    container.tree_service.export_file(tree_file)?;
    Ok(())
}

fn resolve(container: &ServiceContainer, prefix: &str) -> CliResult<NodeId> {
    Ok(container.tree_service.tree().resolve_id(prefix)?)
}

/// Fold a mutation result into the session and persist on success.
fn finish_mutation(
    container: &ServiceContainer,
    tree_file: &Path,
    session: &mut EditorSession,
    result: ApplicationResult<MutationOutcome>,
    describe: impl FnOnce(&MutationOutcome) -> String,
) -> CliResult<()> {
    session.record(&result);
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            for field_error in session.field_errors().iter() {
                output::failure(field_error);
            }
            return Err(e.into());
        }
    };

    save(container, tree_file)?;
    output::success(&format!("{} ({})", describe(&outcome), tree_file.display()));
    if session.take_advisory() {
        output::advisory(container.tree_service.tree(), &outcome.report);
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_init(container: &ServiceContainer, tree_file: &Path, force: bool) -> CliResult<()> {
    if container.fs.exists(tree_file) && !force {
        return Err(CliError::Usage(format!(
            "tree file already exists: {} (use --force to overwrite)",
            tree_file.display()
        )));
    }
    save(container, tree_file)?;
    output::action("Created", &tree_file.display());
    Ok(())
}

#[instrument(skip(container))]
fn cmd_show(
    container: &mut ServiceContainer,
    tree_file: &Path,
    ids: bool,
    check: bool,
) -> CliResult<()> {
    load(container, tree_file)?;
    let mut display = container.settings.display.clone();
    display.show_ids |= ids;

    let service = &container.tree_service;
    output::info(&output::render_tree(service.tree(), &display));
    let report = service.report();
    output::info(&format!(
        "expected cost: {:.*}  max cumulative time: {:.*}",
        display.precision, report.root_expected_cost, display.precision, report.max_cumulative_time
    ));
    output::advisory(service.tree(), report);

    if check && report.advisory() {
        return Err(CliError::InvalidProbabilities(report.invalid_groups.len()));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_allowed(container: &mut ServiceContainer, tree_file: &Path, id: &str) -> CliResult<()> {
    load(container, tree_file)?;
    let id = resolve(container, id)?;
    let mut session = EditorSession::new();
    container.tree_service.select_node(&mut session, &id)?;

    if session.can_add() {
        output::info(&session.allowed_children().iter().join(", "));
    } else {
        output::warning(&format!("no children may be added under {}", id.short()));
    }
    Ok(())
}

#[instrument(skip(container, fields))]
fn cmd_add(
    container: &mut ServiceContainer,
    tree_file: &Path,
    parent: &str,
    node_type: NodeType,
    fields: &FieldArgs,
) -> CliResult<()> {
    load(container, tree_file)?;
    let parent = resolve(container, parent)?;
    let mut session = EditorSession::new();
    container.tree_service.select_node(&mut session, &parent)?;

    let result = container
        .tree_service
        .add_node(&parent, node_type, &fields.to_raw());
    finish_mutation(container, tree_file, &mut session, result, |outcome| {
        format!("added {} {}", node_type, outcome.node_id)
    })
}

#[instrument(skip(container, fields))]
fn cmd_edit(
    container: &mut ServiceContainer,
    tree_file: &Path,
    id: &str,
    fields: &FieldArgs,
) -> CliResult<()> {
    load(container, tree_file)?;
    let id = resolve(container, id)?;
    let (_, node) = container.tree_service.tree().require(&id)?;
    if !can_edit(&node.data) {
        return Err(DomainError::NotEditable {
            id: id.clone(),
            node_type: node.data.node_type,
        }
        .into());
    }

    let mut session = EditorSession::new();
    container.tree_service.select_node(&mut session, &id)?;
    let result = container.tree_service.edit_node(&id, &fields.to_raw());
    finish_mutation(container, tree_file, &mut session, result, |outcome| {
        format!("edited {}", outcome.node_id.short())
    })
}

#[instrument(skip(container))]
fn cmd_delete(container: &mut ServiceContainer, tree_file: &Path, id: &str) -> CliResult<()> {
    load(container, tree_file)?;
    let id = resolve(container, id)?;
    let before = container.tree_service.tree().len();
    let parent = output::parent_label(container.tree_service.tree(), &id).unwrap_or_default();

    let mut session = EditorSession::new();
    let result = container.tree_service.delete_node(&id);
    let removed = before.saturating_sub(container.tree_service.tree().len());
    finish_mutation(container, tree_file, &mut session, result, |outcome| {
        format!(
            "deleted {} from {} ({} node(s))",
            outcome.node_id.short(),
            parent,
            removed
        )
    })
}

#[instrument(skip(container))]
fn cmd_reset(container: &mut ServiceContainer, tree_file: &Path) -> CliResult<()> {
    container.tree_service.reset_tree();
    save(container, tree_file)?;
    output::success(&format!("reset ({})", tree_file.display()));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_sample(
    container: &mut ServiceContainer,
    tree_file: &Path,
    name: Option<&str>,
    list: bool,
) -> CliResult<()> {
    if list {
        for sample in samples::all() {
            output::info(&format!("{:<8} {}", sample.name, sample.description));
        }
        return Ok(());
    }
    let name = name.ok_or_else(|| CliError::InvalidArgs("sample name required".into()))?;
    container.tree_service.load_builtin_sample(name)?;
    save(container, tree_file)?;
    output::success(&format!("loaded sample {} ({})", name, tree_file.display()));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_import(container: &mut ServiceContainer, tree_file: &Path, source: &Path) -> CliResult<()> {
    let nodes = {
        let service = &mut container.tree_service;
        service.import_file(source)?;
        service.tree().len()
    };
    save(container, tree_file)?;
    output::success(&format!(
        "imported {} node(s) from {} ({})",
        nodes,
        source.display(),
        tree_file.display()
    ));
    output::advisory(container.tree_service.tree(), container.tree_service.report());
    Ok(())
}

#[instrument(skip(container))]
fn cmd_export(container: &mut ServiceContainer, tree_file: &Path, dest: &Path) -> CliResult<()> {
    load(container, tree_file)?;
    container.tree_service.export_file(dest)?;
    output::action("Exported", &dest.display());
    Ok(())
}

fn cmd_config(
    container: &ServiceContainer,
    project_dir: &Path,
    command: &ConfigCommands,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(no config directory)".into());
            output::info(&format!("global: {}", global));
            output::info(&format!("local:  {}", local_config_path(project_dir).display()));
            Ok(())
        }
        ConfigCommands::Init { global } => {
            let path: PathBuf = if *global {
                let dir = global_config_dir()
                    .ok_or_else(|| CliError::Usage("no config directory available".into()))?;
                std::fs::create_dir_all(&dir)
                    .map_err(|e| InfraError::io(format!("create {}", dir.display()), e))?;
                dir.join("dtree.toml")
            } else {
                local_config_path(project_dir)
            };
            if container.fs.exists(&path) {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            container
                .fs
                .write(&path, &Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::action("Created", &path.display());
            Ok(())
        }
    }
}
