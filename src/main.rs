//! formbind CLI - check values against binding schemas

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;

use formbind::{logging, Binder, BinderError, FixSuggestion, Schema, TypeRef, Value};

#[derive(Parser)]
#[command(name = "formbind")]
#[command(about = "Hierarchical data binding and validation for structured values")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a JSON value against a schema model
    Check {
        /// Path to the schema YAML file
        schema: PathBuf,

        /// Root model name
        #[arg(short = 't', long = "type")]
        ty: String,

        /// JSON value to check (defaults to the model's empty value)
        #[arg(short, long)]
        value: Option<PathBuf>,
    },

    /// Show a model's fields and its empty value
    Describe {
        /// Path to the schema YAML file
        schema: PathBuf,

        /// Model name
        #[arg(short = 't', long = "type")]
        ty: String,
    },
}

#[tokio::main]
async fn main() {
    logging::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { schema, ty, value } => check(&schema, &ty, value.as_deref()).await,
        Commands::Describe { schema, ty } => describe(&schema, &ty).map(|_| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            if let Some(suggestion) = e.fix_suggestion() {
                eprintln!("  {} {}", "Fix:".yellow(), suggestion);
            }
            std::process::exit(1);
        }
    }
}

/// Returns whether the value passed validation
async fn check(schema_file: &Path, ty: &str, value_file: Option<&Path>) -> Result<bool, BinderError> {
    let schema = Schema::from_file(schema_file)?;
    let binder = Binder::new(schema, TypeRef::named(ty))?;

    if let Some(file) = value_file {
        let json = tokio::fs::read_to_string(file).await?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        binder.read(Value::from(value));
    }

    let errors = binder.validate().await;
    if errors.is_empty() {
        println!("{} {} is valid", "✓".green(), ty.cyan());
        return Ok(true);
    }

    println!(
        "{} {} has {} error(s)",
        "✗".red(),
        ty.cyan(),
        errors.len()
    );
    for error in &errors {
        let property = if error.property.is_empty() {
            "(root)"
        } else {
            error.property.as_str()
        };
        println!("  {} {}", property.yellow(), error.message);
    }
    Ok(false)
}

fn describe(schema_file: &Path, ty: &str) -> Result<(), BinderError> {
    let schema = Schema::from_file(schema_file)?;
    let root = TypeRef::named(ty);
    schema.check_type(&root, "<command line>")?;

    if let Some(model) = schema.model(ty) {
        println!("{} {}", "Model:".cyan().bold(), ty);
        for field in &model.fields {
            let optional = if field.optional { " (optional)" } else { "" };
            let validators: Vec<&str> = field.validators.iter().map(|v| v.message()).collect();
            println!("  {}: {}{}", field.name, field.ty, optional.dimmed());
            if !validators.is_empty() {
                println!("    {}", validators.join("; ").dimmed());
            }
        }
    }

    let empty = serde_json::to_string_pretty(&schema.empty_value(&root))?;
    println!("{}", "Empty value:".cyan().bold());
    println!("{}", empty);
    Ok(())
}
