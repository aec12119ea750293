//! Minimal CLI: parse literals, coerce them into a type, test membership.
use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::types::Type;
use crate::{parser, registry};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// coerce loosely-typed literals into canonical typed values
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// coerce literal values into a target type, one JSON line each
    Coerce(CoerceArgs),
    /// membership-test literal values against a type (no coercion)
    Check(CheckArgs),
    /// fold name=value assignments into a JSON object
    Parse(ParseArgs),
}

#[derive(Args, Debug, Clone)]
struct TypeSettings {
    /// target type expression, e.g. Integer, [Integer], {Symbol => Integer}
    #[arg(long = "type", short = 't')]
    type_expr: String,
}

#[derive(Args, Debug)]
struct CoerceArgs {
    #[command(flatten)]
    type_settings: TypeSettings,

    /// literal values, parsed with the name=value recognizers
    #[arg(required = true)]
    values: Vec<String>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    type_settings: TypeSettings,

    /// literal values, parsed with the name=value recognizers
    #[arg(required = true)]
    values: Vec<String>,
}

#[derive(Args, Debug)]
struct ParseArgs {
    /// one or more name=value assignments (a bare name assigns null)
    #[arg(required = true)]
    assignments: Vec<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl TypeSettings {
    fn resolve(&self) -> anyhow::Result<Type> {
        let desc = parser::parse_type(&self.type_expr)
            .with_context(|| format!("parsing type expression {:?}", self.type_expr))?;
        let ty = registry::lookup(&desc)
            .with_context(|| format!("resolving type expression {:?}", self.type_expr))?;
        Ok(ty)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Coerce(target) => {
                let ty = target.type_settings.resolve()?;
                for raw in &target.values {
                    let value = parser::parse_value(raw);
                    let coerced = ty
                        .coerce(value)
                        .with_context(|| format!("coercing {raw:?} into {ty}"))?;
                    println!("{}", coerced.to_json());
                }
                Ok(())
            }
            Command::Check(target) => {
                let ty = target.type_settings.resolve()?;
                let mut mismatched = 0usize;
                for raw in &target.values {
                    let value = parser::parse_value(raw);
                    let ok = ty.matches(&value);
                    if !ok {
                        mismatched += 1;
                    }
                    println!("{ok}");
                }
                if mismatched > 0 {
                    anyhow::bail!("{mismatched} value(s) did not match {ty}");
                }
                Ok(())
            }
            Command::Parse(target) => {
                let params = parser::parse(&target.assignments);
                let mut out = serde_json::Map::new();
                for (name, value) in params {
                    out.insert(name, value.to_json());
                }
                let doc = serde_json::Value::Object(out);
                println!("{}", serde_json::to_string_pretty(&doc)?);
                Ok(())
            }
        }
    }
}
