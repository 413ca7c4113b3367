//! 命令行入口
//!
//! 每个子命令对应一个校验操作，结果以 JSON 打印到标准输出，日志写到标准错误。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::ValidatorConfig;
use crate::model::{DirectoryModelProvider, ModelContext};
use crate::validator::Validator;

#[derive(Parser)]
#[command(name = "s2p-validator")]
#[command(about = "Predict whether words and entity names are recognizable by a Speech-to-Phrase model")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model to activate (overrides `default_model`)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Models root directory (overrides `models_dir`)
    #[arg(long, global = true)]
    models_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List discovered models
    Models,

    /// Activate a model and print its lexicon statistics
    Select {
        model_id: String,
    },

    /// Validate a single word
    Word {
        word: String,
    },

    /// Validate an entity name such as `luce_cucina`
    Entity {
        entity_name: String,
    },

    /// Validate a batch of entity names
    Entities {
        entities: Vec<String>,
        /// Read additional entity names from a file, one per line
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Suggest similar known words
    Suggest {
        word: String,
        /// Maximum number of suggestions
        #[arg(long, short = 'n')]
        max: Option<usize>,
    },

    /// Print statistics of the active lexicon
    Stats,

    /// Write a configuration file with default values
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// 启动命令行
pub fn run() -> Result<()> {
    // 初始化日志（写到 stderr，stdout 只输出 JSON）
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    if let Command::InitConfig { force } = &cli.command {
        return init_config(cli.config.as_deref(), *force);
    }

    let mut config = match &cli.config {
        Some(path) => ValidatorConfig::load_from(path)?,
        None => ValidatorConfig::load()?,
    };
    if let Some(dir) = &cli.models_dir {
        config.models_dir = dir.clone();
    }

    let context = Arc::new(ModelContext::new(
        DirectoryModelProvider::new(&config.models_dir),
        config.context_settings(),
    ));
    let preferred = cli.model.as_deref().or(config.default_model.as_deref());

    match cli.command {
        Command::Models => {
            if let Some(model_id) = preferred {
                context
                    .select(model_id)
                    .with_context(|| format!("无法加载模型 {}", model_id))?;
            }
            print_json(&context.list_models()?)
        }
        Command::Select { model_id } => {
            let selection = context
                .select(&model_id)
                .with_context(|| format!("无法加载模型 {}", model_id))?;
            print_json(&selection)
        }
        command => {
            context
                .select_default(preferred)
                .context("没有可用的模型")?;
            let validator = Validator::new(context, config.validation_config());
            run_validation(&validator, &config, command)
        }
    }
}

fn run_validation(validator: &Validator, config: &ValidatorConfig, command: Command) -> Result<()> {
    match command {
        Command::Word { word } => print_json(&validator.validate_word(&word)),
        Command::Entity { entity_name } => print_json(&validator.validate_entity(&entity_name)),
        Command::Entities { mut entities, file } => {
            if let Some(path) = file {
                entities.extend(read_entity_file(&path)?);
            }
            print_json(&validator.validate_entities(&entities))
        }
        Command::Suggest { word, max } => {
            let max = max.unwrap_or(config.max_suggestions);
            print_json(&validator.suggest_alternatives(&word, max)?)
        }
        Command::Stats => print_json(&validator.stats()?),
        Command::Models | Command::Select { .. } | Command::InitConfig { .. } => Ok(()),
    }
}

fn read_entity_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("读取实体列表失败: {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn init_config(path: Option<&Path>, force: bool) -> Result<()> {
    let target = match path {
        Some(path) => path.to_path_buf(),
        None => ValidatorConfig::config_path()?,
    };
    if target.exists() && !force {
        anyhow::bail!("配置文件已存在: {}（使用 --force 覆盖）", target.display());
    }

    let config = ValidatorConfig::new();
    match path {
        Some(path) => config.save_to(path)?,
        None => config.save()?,
    }
    print_json(&config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "s2p-validator",
            "entities",
            "luce_cucina",
            "alexa_echo",
            "--model",
            "it_IT-rhasspy",
        ])
        .unwrap();
        assert_eq!(cli.model.as_deref(), Some("it_IT-rhasspy"));
        match cli.command {
            Command::Entities { entities, file } => {
                assert_eq!(entities, vec!["luce_cucina", "alexa_echo"]);
                assert!(file.is_none());
            }
            _ => panic!("应解析为 entities 子命令"),
        }
    }

    #[test]
    fn test_read_entity_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entities.txt");
        std::fs::write(&path, "# camera\nluce_cucina\n\n  alexa_echo  \n").unwrap();
        assert_eq!(read_entity_file(&path).unwrap(), vec!["luce_cucina", "alexa_echo"]);
    }

    #[test]
    fn test_end_to_end_word() {
        let dir = tempfile::tempdir().unwrap();
        let model_dir = dir.path().join("models").join("it_IT-test");
        std::fs::create_dir_all(&model_dir).unwrap();
        std::fs::write(model_dir.join("lexicon.txt"), "luce l u tS e\n").unwrap();

        let cli = Cli::try_parse_from([
            "s2p-validator",
            "--config",
            dir.path().join("config.json").to_str().unwrap(),
            "--models-dir",
            dir.path().join("models").to_str().unwrap(),
            "word",
            "luce",
        ])
        .unwrap();
        execute(cli).unwrap();
    }

    #[test]
    fn test_init_config_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        init_config(Some(&path), false).unwrap();
        assert!(init_config(Some(&path), false).is_err());
        init_config(Some(&path), true).unwrap();
        assert!(ValidatorConfig::load_from(&path).is_ok());
    }
}
