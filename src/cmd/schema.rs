//! `statesandbox schema`

use anyhow::{Result, bail};

use statesandbox::config::SandboxConfig;

pub fn cmd_schema(config: &SandboxConfig, dimension: Option<&str>, template: bool) -> Result<()> {
    let schema = config.schema()?;

    if template {
        println!("{}", schema.render_template());
        return Ok(());
    }

    let Some(title) = dimension else {
        println!();
        println!("Document Schema ({} dimensions)", schema.len());
        println!("===============");
        println!();
        for (i, dimension) in schema.dimensions().iter().enumerate() {
            if dimension.depends_on.is_empty() {
                println!("{:>3}. {}", i + 1, dimension.title);
            } else {
                println!(
                    "{:>3}. {}  (uses {})",
                    i + 1,
                    dimension.title,
                    dimension.depends_on.join(", ")
                );
            }
        }
        println!();
        return Ok(());
    };

    let Some(dimension) = schema.get(title) else {
        bail!(
            "Unknown dimension '{}'. Known dimensions: {}",
            title,
            schema
                .dimensions()
                .iter()
                .map(|d| d.title.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    };

    println!("# {}", dimension.title);
    println!();
    println!("key: {}", dimension.key());
    if !dimension.depends_on.is_empty() {
        println!("depends on: {}", dimension.depends_on.join(", "));
    }
    let seed = dimension.seed_constraints();
    if !seed.is_empty() {
        println!();
        println!("Seed assumptions:");
        println!("{}", seed);
    }
    println!();
    println!("{}", dimension.template);
    Ok(())
}
