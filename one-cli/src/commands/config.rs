//! `one config list` and `one config show`

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use one_core::profiles;

use super::current_profile;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// List every configured project.
    List,
    /// Print the profile that applies to the working directory.
    Show,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "project")]
    name: String,
    #[tabled(rename = "provider")]
    provider: String,
    #[tabled(rename = "base")]
    base_branch: String,
    #[tabled(rename = "tickets")]
    tickets: String,
    #[tabled(rename = "paths")]
    paths: String,
}

pub fn run(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::List => list(),
        ConfigCommand::Show => show(),
    }
}

fn list() -> Result<()> {
    let profiles = profiles::list_profiles().context("failed to read project profiles")?;
    if profiles.is_empty() {
        println!("No projects configured.");
        println!("Run: one init --name <project>");
        return Ok(());
    }

    let rows: Vec<ProfileRow> = profiles
        .into_iter()
        .map(|(_, profile)| ProfileRow {
            provider: profile.git.provider.to_string(),
            base_branch: profile.base_branch().to_owned(),
            tickets: profile
                .ticket
                .as_ref()
                .map_or_else(|| "-".to_owned(), |t| t.system.clone()),
            paths: profile
                .project
                .paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join("\n"),
            name: profile.project.name.0,
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

fn show() -> Result<()> {
    let profile = current_profile()?;
    let yaml = serde_yaml::to_string(&profile).context("failed to serialize profile")?;
    println!("{} {}", "Project:".bold(), profile.name());
    println!();
    print!("{yaml}");
    Ok(())
}
