//! Personas command - Load and list the three personas.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use huddle_chat::PersonaLoader;

#[derive(Args)]
pub struct PersonasArgs {
    /// Directory holding BA/, SE/ and PO/ instructions
    #[arg(long)]
    pub skills_dir: Option<PathBuf>,
}

pub async fn execute(workspace: Option<PathBuf>, args: PersonasArgs) -> Result<()> {
    let mut config = super::load_config(workspace)?;
    if let Some(dir) = args.skills_dir {
        config.skills_dir = dir;
    }

    let loader = PersonaLoader::new(config.skills_path());
    let personas = loader
        .load_all()
        .context("Failed to load persona instructions")?;

    println!("👥 Personas ({})", loader.skills_dir().display());
    println!();
    for (turn, persona) in personas.iter().enumerate() {
        println!("  {}. {}", turn + 1, persona.name);
        println!("     {}", persona.description);
        println!(
            "     📄 {} ({} characters)",
            loader.prompt_path(persona.kind).display(),
            persona.instructions.chars().count()
        );
    }

    Ok(())
}
