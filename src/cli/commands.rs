//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::application::services::{PickerService, PickerSession};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{filter_and_sort, DomainError, SelectedSet};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{FileSystem, RealFileSystem, SkimSelector, TaxonomySource};
use crate::infrastructure::InfraError;

pub async fn execute_command(cli: &Cli) -> CliResult<()> {
    let project_dir = match &cli.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|e| InfraError::io("current directory", e))?,
    };

    match &cli.command {
        Some(Commands::Pick { edit }) => cmd_pick(&project_dir, *edit).await,
        Some(Commands::Add { ids }) => cmd_add(&project_dir, ids).await,
        Some(Commands::Remove { ids }) => cmd_remove(&project_dir, ids).await,
        Some(Commands::Show) => cmd_show(&project_dir),
        Some(Commands::List { ids, filter }) => {
            cmd_list(&project_dir, ids, filter.as_deref().unwrap_or("")).await
        }
        Some(Commands::Tree) => cmd_tree(&project_dir),
        Some(Commands::Config { command }) => cmd_config(&project_dir, command),
        Some(Commands::Completion { shell }) => {
            cmd_completion(*shell);
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see `taxpick --help`".to_string(),
        )),
    }
}

fn container(project_dir: &Path) -> CliResult<ServiceContainer> {
    let settings = Settings::load(Some(project_dir))?;
    debug!("settings: {:?}", settings);
    Ok(ServiceContainer::new(settings))
}

fn print_selection(selected: &SelectedSet) {
    if selected.is_empty() {
        output::info("no subjects selected");
        return;
    }
    for path in selected {
        output::detail(path);
    }
}

#[instrument]
async fn cmd_pick(project_dir: &Path, edit: bool) -> CliResult<()> {
    let services = container(project_dir)?;
    let mut picker = services.picker(edit).await?;
    let applied = PickerSession::new(&mut picker, &SkimSelector).run().await?;

    output::action("Changes", &applied);
    output::header("Selected subjects");
    print_selection(picker.selected());
    Ok(())
}

async fn open_picker(project_dir: &Path) -> CliResult<(ServiceContainer, PickerService)> {
    let services = container(project_dir)?;
    let picker = services.picker(false).await?;
    Ok((services, picker))
}

#[instrument]
async fn cmd_add(project_dir: &Path, ids: &[String]) -> CliResult<()> {
    let (services, mut picker) = open_picker(project_dir).await?;
    let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
    picker.select_ids(&ids).await?;

    output::success(&format!(
        "saved to {}",
        services.settings.selection_file.display()
    ));
    print_selection(picker.selected());
    Ok(())
}

#[instrument]
async fn cmd_remove(project_dir: &Path, ids: &[String]) -> CliResult<()> {
    let (_services, mut picker) = open_picker(project_dir).await?;
    let ids: Vec<&str> = ids.iter().map(String::as_str).collect();

    match picker.deselect_ids(&ids)? {
        Some(deselection) => {
            debug!(?deselection, "removed");
            output::success(&format!("removed {}", ids.join(" > ")));
        }
        None => output::warning(&format!("not selected: {}", ids.join(" > "))),
    }
    print_selection(picker.selected());
    Ok(())
}

#[instrument]
fn cmd_show(project_dir: &Path) -> CliResult<()> {
    let services = container(project_dir)?;
    let selected = services.selection_store().load()?;
    print_selection(&selected);
    Ok(())
}

#[instrument]
async fn cmd_list(project_dir: &Path, ids: &[String], filter: &str) -> CliResult<()> {
    let services = container(project_dir)?;
    let source = services.file_source()?;

    // Walk down the id path, checking each id is a child of the previous one.
    let mut children = source
        .fetch_children(None, 0)
        .await
        .map_err(|e| InfraError::io("list subjects", e))?;
    for (tier, id) in ids.iter().enumerate() {
        if !children.iter().any(|n| &n.id == id) {
            return Err(InfraError::from(DomainError::NodeNotDisplayed {
                id: id.clone(),
                tier: tier + 1,
            })
            .into());
        }
        children = source
            .fetch_children(Some(id.as_str()), tier + 1)
            .await
            .map_err(|e| InfraError::io(format!("list children of {}", id), e))?;
    }

    for node in filter_and_sort(&children, filter) {
        output::info(&format!("{}\t{}", node.id, node.text));
    }
    Ok(())
}

#[instrument]
fn cmd_tree(project_dir: &Path) -> CliResult<()> {
    let services = container(project_dir)?;
    let source = services.file_source()?;
    let label = services.settings.taxonomy_file.display().to_string();
    output::info(&source.arena().to_tree(&label));
    Ok(())
}

fn cmd_config(project_dir: &Path, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(Some(project_dir))?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Init { global } => {
            let path: PathBuf = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".to_string())
                })?
            } else {
                local_config_path(project_dir)
            };
            write_template(&RealFileSystem, &path)?;
            output::success(&format!("created {}", path.display()));
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(p) => output::action("global", &p.display()),
                None => output::action("global", "<unavailable>"),
            }
            output::action("local", &local_config_path(project_dir).display());
        }
    }
    Ok(())
}

/// Write the config template to `path`, refusing to overwrite an existing file.
fn write_template(fs: &dyn FileSystem, path: &Path) -> CliResult<()> {
    if fs.exists(path) {
        return Err(CliError::Usage(format!(
            "config already exists: {}",
            path.display()
        )));
    }
    fs.ensure_parent(path)
        .map_err(|e| InfraError::io(format!("create parent of {}", path.display()), e))?;
    fs.write(path, &Settings::template())
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
    Ok(())
}

fn cmd_completion(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
