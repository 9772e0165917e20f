//! Output rendering and formatting

use serde::Serialize;
use sprout_config::OutputFormat;
use sprout_index::Index;
use sprout_resolver::{Failure, InstallPlan, PlanEntry};
use std::io;

/// Output renderer for CLI results
#[derive(Clone, Copy)]
pub struct OutputRenderer {
    format: OutputFormat,
}

impl OutputRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a successful resolution
    pub fn render_plan(&self, plan: &InstallPlan) -> io::Result<()> {
        if self.format == OutputFormat::Json {
            return render_json(plan);
        }

        if plan.is_empty() {
            println!("Nothing to install.");
            return Ok(());
        }

        println!("Install plan ({} units):", plan.len());
        for (number, batch) in plan.batches().iter().enumerate() {
            println!("  batch {}:", number + 1);
            for entry in batch {
                println!("    {}", describe(entry));
            }
        }
        Ok(())
    }

    /// Render a failed resolution
    pub fn render_failure(&self, failure: &Failure) -> io::Result<()> {
        if self.format == OutputFormat::Json {
            return render_json(failure);
        }
        println!("{failure}");
        Ok(())
    }

    /// Render the contents of an index
    pub fn render_index(&self, index: &Index) -> io::Result<()> {
        if self.format == OutputFormat::Json {
            let listing: Vec<IndexRow> = index
                .entries()
                .map(|(name, instance, info)| IndexRow {
                    name: name.to_string(),
                    instance: instance.to_string(),
                    disqualified: info.disqualified.as_ref().map(ToString::to_string),
                })
                .collect();
            return render_json(&listing);
        }

        println!(
            "{} packages, {} instances",
            index.len(),
            index.instance_count()
        );
        for (name, instance, info) in index.entries() {
            match &info.disqualified {
                Some(reason) => println!("  {name}-{instance} [{reason}]"),
                None => println!("  {name}-{instance}"),
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct IndexRow {
    name: String,
    instance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    disqualified: Option<String>,
}

fn render_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    println!("{json}");
    Ok(())
}

/// One plan entry on a single line: unit, flags, stanzas
fn describe(entry: &PlanEntry) -> String {
    let mut line = format!("{}-{}", entry.qpn, entry.instance);
    if !entry.flags.is_empty() {
        let flags: Vec<String> = entry
            .flags
            .iter()
            .map(|(flag, enabled)| format!("{}{flag}", if *enabled { '+' } else { '-' }))
            .collect();
        line.push_str(&format!(" [{}]", flags.join(" ")));
    }
    if !entry.stanzas.is_empty() {
        let stanzas: Vec<String> = entry.stanzas.iter().map(ToString::to_string).collect();
        line.push_str(&format!(" ({})", stanzas.join(", ")));
    }
    line
}
