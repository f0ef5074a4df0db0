use anyhow::{Context, Result};
use calcforge_decoder::{DecoderConfig, PatchDecoder};
use calcforge_descriptor::{descriptor_schema, Descriptor};
use calcforge_engine::{CustomizeRequest, Engine, EngineConfig, ProtectionSpec};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("calcforge")
        .version(calcforge_engine::VERSION)
        .about("Merge AI-proposed calculator patches into existing descriptors")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("customize")
                .about("Apply a model reply to a descriptor and print the result")
                .arg(
                    Arg::new("patch")
                        .long("patch")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("File holding the raw model reply"),
                )
                .arg(
                    Arg::new("base")
                        .long("base")
                        .value_parser(value_parser!(PathBuf))
                        .help("Current descriptor; omit to create a new one"),
                )
                .arg(
                    Arg::new("protect")
                        .long("protect")
                        .action(ArgAction::Append)
                        .help("Protected path such as appBackground.backgroundImageUrl (repeatable)"),
                )
                .arg(
                    Arg::new("no-auto-detect")
                        .long("no-auto-detect")
                        .action(ArgAction::SetTrue)
                        .help("Do not protect embedded images automatically"),
                )
                .arg(
                    Arg::new("prompt")
                        .long("prompt")
                        .help("Prompt that produced the reply, recorded as authorPrompt"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Engine configuration file (toml, yaml or json)"),
                )
                .arg(
                    Arg::new("diagnostics")
                        .long("diagnostics")
                        .action(ArgAction::SetTrue)
                        .help("Print the full outcome including diagnostics"),
                ),
        )
        .subcommand(Command::new("schema").about("Print the descriptor JSON Schema"))
        .subcommand(
            Command::new("fingerprint")
                .about("Print the content hash of a descriptor")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Descriptor file"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let output = match matches.subcommand() {
        Some(("customize", args)) => customize(args)?,
        Some(("schema", _)) => serde_json::to_string_pretty(&descriptor_schema())?,
        Some(("fingerprint", args)) => {
            let path = args
                .get_one::<PathBuf>("file")
                .context("missing descriptor file")?;
            read_descriptor(path)?.fingerprint()?.to_string()
        }
        _ => return Ok(()),
    };

    println!("{output}");
    Ok(())
}

fn customize(args: &ArgMatches) -> Result<String> {
    let config = match args.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let patch_path = args
        .get_one::<PathBuf>("patch")
        .context("missing patch file")?;
    let reply = read(patch_path)?;
    let patch = PatchDecoder::new(DecoderConfig::default())
        .decode(&reply)
        .with_context(|| format!("decoding {}", patch_path.display()))?;

    let base = args
        .get_one::<PathBuf>("base")
        .map(|path| read_descriptor(path))
        .transpose()?;

    let protect: Vec<String> = args
        .get_many::<String>("protect")
        .map(|paths| paths.cloned().collect())
        .unwrap_or_default();
    let protection = protection_spec(protect, !args.get_flag("no-auto-detect"));

    let mut request =
        CustomizeRequest::new(base, Value::Object(patch)).with_protection(protection);
    if let Some(prompt) = args.get_one::<String>("prompt") {
        request = request.with_author_prompt(prompt.clone());
    }

    let outcome = Engine::new(config).customize(&request)?;
    for diagnostic in &outcome.diagnostics {
        tracing::info!("{}", diagnostic);
    }

    let rendered = if args.get_flag("diagnostics") {
        serde_json::to_string_pretty(&outcome)?
    } else {
        serde_json::to_string_pretty(&outcome.descriptor)?
    };
    Ok(rendered)
}

fn protection_spec(paths: Vec<String>, auto_detect: bool) -> ProtectionSpec {
    if !paths.is_empty() {
        ProtectionSpec::explicit(paths)
    } else if auto_detect {
        ProtectionSpec::auto()
    } else {
        ProtectionSpec::none()
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn read_descriptor(path: &Path) -> Result<Descriptor> {
    let raw = read(path)?;
    serde_json::from_str(&raw).with_context(|| format!("parsing descriptor {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use calcforge_test_utils::{image_base, image_data};
    use std::io::Write;

    fn temp_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn run(argv: &[&str]) -> Result<String> {
        let matches = cli().try_get_matches_from(argv)?;
        match matches.subcommand() {
            Some(("customize", args)) => customize(args),
            _ => unreachable!(),
        }
    }

    #[test]
    fn command_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn protection_flags() {
        assert_eq!(protection_spec(vec![], true), ProtectionSpec::auto());
        assert_eq!(protection_spec(vec![], false), ProtectionSpec::none());
        assert_eq!(
            protection_spec(vec!["theme.backgroundImage".into()], false),
            ProtectionSpec::explicit(["theme.backgroundImage"])
        );
    }

    #[test]
    fn customize_from_files() {
        let base = temp_file(".json", &serde_json::to_string(&image_base()).unwrap());
        let reply = format!(
            "Sure!\n```json\n{{\"appBackground\": {{\"backgroundImageUrl\": \"{}\"}}, \"name\": \"Night\"}}\n```",
            image_data("NEW")
        );
        let patch = temp_file(".txt", &reply);
        let config = temp_file(".toml", "[grid]\nmax_row = 10\n");

        let out = run(&[
            "calcforge",
            "customize",
            "--patch",
            patch.path().to_str().unwrap(),
            "--base",
            base.path().to_str().unwrap(),
            "--config",
            config.path().to_str().unwrap(),
            "--diagnostics",
        ])
        .unwrap();

        let outcome: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(outcome["descriptor"]["name"], "Night");
        assert_eq!(
            outcome["descriptor"]["appBackground"]["backgroundImageUrl"],
            Value::String(image_data("APP"))
        );
        assert_eq!(outcome["diagnostics"][0]["kind"], "protected_write_stripped");
        assert_eq!(outcome["changed"], true);
    }

    #[test]
    fn customize_reports_undecodable_reply() {
        let patch = temp_file(".txt", "I cannot do that.");
        let err = run(&["calcforge", "customize", "--patch", patch.path().to_str().unwrap()])
            .unwrap_err();
        assert!(format!("{err:#}").contains("no JSON object"));
    }
}
