//! Eval command
//!
//! Usage: keyforge eval --template <T> [--args <JSON>] [--names a,b] [--target <JSON>] [--config <FILE>]
//!
//! Every parameter is declared untyped, so dotted paths resolve against the
//! runtime shape of the JSON arguments.

use clap::Args;
use keyforge_core::{EngineConfig, KeyEngine, MethodSignature, TypeRef, Value};
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct EvalArgs {
    /// Key template to compile
    #[arg(short, long)]
    pub template: String,

    /// Arguments as a JSON array
    #[arg(short, long, default_value = "[]")]
    pub args: String,

    /// Parameter names, in declaration order
    #[arg(short, long, value_delimiter = ',')]
    pub names: Vec<String>,

    /// Target object as JSON, visible to fallback expressions
    #[arg(long)]
    pub target: Option<String>,

    /// Engine configuration file (TOML, or JSON by extension)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Execute eval command
pub fn execute(args: EvalArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };

    let values = parse_args(&args.args)?;
    let target = args
        .target
        .as_deref()
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()?
        .map(Value::from);
    let method = signature(&args.names, values.len());

    let engine = KeyEngine::new(config);
    let evaluator = engine.compile(&method, &args.template)?;
    let key = evaluator.evaluate(&method, &values, target.as_ref())?;

    println!("{}", key);
    Ok(())
}

fn load_config(path: &Path) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => EngineConfig::from_json_str(&text)?,
        _ => EngineConfig::from_toml_str(&text)?,
    };
    Ok(config)
}

fn parse_args(json: &str) -> Result<Vec<Value>, Box<dyn std::error::Error>> {
    match serde_json::from_str::<serde_json::Value>(json)? {
        serde_json::Value::Array(items) => Ok(items.into_iter().map(Value::from).collect()),
        _ => Err("--args must be a JSON array".into()),
    }
}

/// Untyped signature with `arity` parameters; the first ones take `names`
fn signature(names: &[String], arity: usize) -> MethodSignature {
    let arity = arity.max(names.len());
    (0..arity).fold(MethodSignature::new("cli", "eval"), |method, i| {
        match names.get(i).map(|n| n.trim()).filter(|n| !n.is_empty()) {
            Some(name) => method.param(name, TypeRef::Any),
            None => method.unnamed_param(TypeRef::Any),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_names_prefix() {
        let method = signature(&["id".to_string()], 2);
        assert_eq!(method.param_count(), 2);
        assert_eq!(method.params()[0].name.as_deref(), Some("id"));
        assert!(method.params()[1].name.is_none());
    }

    #[test]
    fn test_parse_args_rejects_non_array() {
        assert!(parse_args(r#"{"a": 1}"#).is_err());
        assert_eq!(parse_args("[1, \"x\"]").unwrap().len(), 2);
    }
}
