//! Command-line interface for bsync

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use bsync::{ClassRegistry, Generator, SynthesizedClass};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "bsync")]
#[command(author, version, about = "BuildingSync object model generator", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the class metadata module from an XSD schema
    Generate {
        /// Path to the XSD schema file
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,

        /// Document root element
        #[arg(short, long, default_value = "BuildingSync")]
        root: String,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Inspect the classes synthesized from a schema or a metadata module
    Inspect {
        /// Path to an XSD schema or a generated .json module
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// Document root element, when reading a schema
        #[arg(short, long, default_value = "BuildingSync")]
        root: String,

        /// Show detailed information about a specific class
        #[arg(short, long)]
        class: Option<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            schema,
            root,
            output,
        } => cmd_generate(&schema, &root, output.as_deref()),
        Commands::Inspect {
            source,
            root,
            class,
            json,
        } => cmd_inspect(&source, &root, class.as_deref(), json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn cmd_generate(schema: &Path, root: &str, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let registry = Generator::new(root).generate_file(schema)?;
    let json = registry.to_json()?;

    match output {
        Some(path) => {
            fs::write(path, json)?;
            eprintln!("Wrote {} classes to {}", registry.len(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn load_registry(source: &Path, root: &str) -> Result<ClassRegistry, Box<dyn std::error::Error>> {
    let is_json = source
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(ClassRegistry::from_json(&fs::read_to_string(source)?)?)
    } else {
        Ok(Generator::new(root).generate_file(source)?)
    }
}

#[cfg(feature = "cli")]
fn cmd_inspect(source: &Path, root: &str, class: Option<&str>, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let registry = load_registry(source, root)?;

    if let Some(name) = class {
        let class = registry.get(name)?;
        if json_output {
            println!("{}", serde_json::to_string_pretty(&*class)?);
        } else {
            print_class_details(&class);
        }
        return Ok(());
    }

    if json_output {
        print_registry_json(&registry)?;
    } else {
        print_registry_summary(&registry);
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn print_registry_summary(registry: &ClassRegistry) {
    println!("bsync v{}", bsync::VERSION);
    println!();
    println!("Module Information:");
    println!("  Root Element: {}", registry.root());
    match registry.target_namespace() {
        Some(ns) => println!("  Target Namespace: {}", ns),
        None => println!("  Target Namespace: (none)"),
    }
    println!("  Classes: {}", registry.len());
    println!();
    println!("=== Classes ===");
    for class in registry.classes() {
        let marker = if class.is_abstract() { " [abstract]" } else { "" };
        match class.base() {
            Some(base) => println!("  {} : {}{}", class.name(), base, marker),
            None => println!("  {}{}", class.name(), marker),
        }
    }
}

#[cfg(feature = "cli")]
fn print_registry_json(registry: &ClassRegistry) -> Result<(), Box<dyn std::error::Error>> {
    use serde_json::{json, Value};

    let classes: Vec<Value> = registry
        .classes()
        .map(|class| {
            json!({
                "name": class.name(),
                "alias": class.alias(),
                "base": class.base(),
                "abstract": class.is_abstract(),
            })
        })
        .collect();

    let output = json!({
        "version": bsync::VERSION,
        "root": registry.root(),
        "targetNamespace": registry.target_namespace(),
        "statistics": { "classes": registry.len() },
        "classes": classes,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(feature = "cli")]
fn print_class_details(class: &SynthesizedClass) {
    let def = class.def();
    println!("Class: {}", class.name());
    println!("  Alias: {}", class.alias());
    println!("  Element: {}", class.element_name());
    println!("  Kind: {}", def.kind);
    println!("  Lineage: {}", class.lineage().join(" -> "));
    println!("  Abstract: {}", class.is_abstract());
    let content = if def.has_simple_content() {
        "simple"
    } else if def.mixed {
        "mixed"
    } else {
        "element-only"
    };
    println!("  Content: {}", content);
    if let Some(text) = &def.text {
        println!("  Text: {}", text);
    }
    if let Some(doc) = class.documentation() {
        println!("  Documentation: {}", doc);
    }

    if !def.attributes.is_empty() {
        println!("\n=== Attributes ===");
        for attr in &def.attributes {
            let required = if attr.required { " (required)" } else { "" };
            println!("  {} : {}{}", attr.name, attr.value_domain, required);
        }
    }

    if !def.children.is_empty() {
        println!("\n=== Children ===");
        for slot in &def.children {
            println!("  {} : {} [{}]", slot.name, slot.type_name, slot.occurs);
        }
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
