//! Offline document tools: `statesandbox parse | normalize | sample`.

use anyhow::{Context, Result, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;

use statesandbox::config::SandboxConfig;
use statesandbox::events::{self, EventCategory};
use statesandbox::parser::{DocumentParser, normalize_compositions};

fn read(file: &Path) -> Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

pub fn cmd_parse(
    config: &SandboxConfig,
    file: &Path,
    keys: Option<&str>,
    raw: bool,
    check: bool,
) -> Result<()> {
    let mut text = read(file)?;
    if !raw {
        text = normalize_compositions(&text);
    }

    let parser = DocumentParser::default();
    if check {
        let schema = config.schema()?;
        let missing = parser.parse(&text).missing_sections(&schema);
        if !missing.is_empty() {
            bail!("Document is missing sections: {}", missing.join(", "));
        }
    }

    let paths: Vec<&str> = keys
        .map(|k| k.split(',').map(str::trim).filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();
    let tree = if paths.is_empty() {
        parser.parse(&text)
    } else {
        parser.parse_filtered(&text, paths.as_slice())
    };
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}

pub fn cmd_normalize(file: &Path) -> Result<()> {
    print!("{}", normalize_compositions(&read(file)?));
    Ok(())
}

pub fn cmd_sample(file: &Path, seed: Option<u64>, draws: Option<usize>) -> Result<()> {
    let categories = events::parse_event_categories(&read(file)?);
    if categories.is_empty() {
        bail!("No event categories found in {}", file.display());
    }
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    match draws {
        None | Some(0) | Some(1) => {
            let results = events::sample_events(&categories, &mut rng);
            println!("{}", events::format_event_log(&results));
        }
        Some(draws) => {
            for category in &categories {
                print_frequencies(category, draws, &mut rng);
            }
        }
    }
    Ok(())
}

fn print_frequencies(category: &EventCategory, draws: usize, rng: &mut StdRng) {
    let mut counts = vec![0usize; category.events.len()];
    for _ in 0..draws {
        let chosen = category.sample(rng);
        if let Some(i) = category.events.iter().position(|(_, text)| text == chosen) {
            counts[i] += 1;
        }
    }

    let total = category.total_weight();
    println!("{} ({} draws)", category.name, draws);
    for ((weight, text), count) in category.events.iter().zip(&counts) {
        let observed = *count as f64 / draws as f64 * 100.0;
        let expected = if total > 0.0 { weight / total * 100.0 } else { 0.0 };
        println!("  {:>6.2}%  {}  (expected {:.2}%)", observed, text, expected);
    }
}
