//! `generate` subcommand.
use anyhow::{Context, Result};
use std::fs::File;
use std::path::PathBuf;

/// Render man pages for the main command and, recursively, every
/// subcommand into `output_dir` (defaults to the current directory).
///
/// Subcommand pages are written under hyphenated names (`clx-generate.1`)
/// so `man clx-generate` resolves them.
///
/// # Errors
///
/// Returns an [`anyhow::Error`] if the output directory cannot be created
/// or a page cannot be written.
pub fn generate_man_pages(
    cmd: clap::Command,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let output_dir: PathBuf = match output_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("resolve current directory")?,
    };
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("create {}", output_dir.display()))?;

    // Walk the command tree iteratively, carrying the hyphenated prefix.
    let mut pending: Vec<(clap::Command, String)> = Vec::new();
    let name = cmd.get_name().to_string();
    pending.push((cmd, name));

    while let Some((cmd, page_name)) = pending.pop() {
        for subcmd in cmd.get_subcommands() {
            let sub_page = format!("{page_name}-{}", subcmd.get_name());
            // clap_mangen takes the page title from the command name, so the
            // subcommand is renamed to its prefixed form. Leaking is fine for
            // a one-shot generation pass.
            let leaked: &'static str =
                Box::leak(sub_page.clone().into_boxed_str());
            pending.push((
                subcmd.clone().name(leaked).disable_help_subcommand(true),
                sub_page,
            ));
        }

        let path = output_dir.join(format!("{page_name}.1"));
        let mut file = File::create(&path)
            .with_context(|| format!("create {}", path.display()))?;
        clap_mangen::Man::new(cmd)
            .render(&mut file)
            .with_context(|| format!("render {}", path.display()))?;
        println!("Generated: {}", path.display());
    }

    Ok(())
}
