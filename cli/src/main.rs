use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, anyhow, bail};
use brp_engine::content::{builtin_characters, builtin_registry};
use brp_engine::{
    Character, CharacterStore, Context, Dice, Engine, EngineConfig, Format, MemoryStore, RollHistory, RuleSource,
    TextSource, Value, apply_mitigation, parse_dice,
};
use clap::{Args, Parser, Subcommand};
use encoding_rs::Encoding;

#[derive(Subcommand)]
enum Cmd {
    /// Roll a dice expression such as 2d6+3 or 1d8+1+1d4
    Roll {
        expr: String,
        /// RNG seed for determinism
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Number of rolls
        #[arg(long, default_value_t = 1)]
        times: u32,
    },
    /// Resolve one rule against NAME=VALUE variables (or a character)
    Resolve {
        rule: String,
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, Value)>,
        #[command(flatten)]
        who: Who,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Print a character's derived stats
    Derive {
        #[command(flatten)]
        who: Who,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Roll a skill check and print the audit record
    Skill {
        skill_id: String,
        #[command(flatten)]
        who: Who,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Roll one hit from the attacker against the target
    Attack {
        #[command(flatten)]
        who: Who,
        /// Character receiving the hit
        #[arg(long, default_value = "char_002")]
        target: String,
        /// Armor points to use instead of the target's armor (nothing is written)
        #[arg(long)]
        armor: Option<i64>,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

#[derive(Args)]
struct Who {
    /// JSON file holding one character or a list of characters
    #[arg(long)]
    character: Option<PathBuf>,
    /// Character id (defaults to the first one loaded)
    #[arg(long)]
    id: Option<String>,
}

#[derive(Parser)]
#[command(name = "brp-cli")]
#[command(about = "BRP rule engine harness")]
struct Cli {
    /// Rule file (.json/.yaml); repeatable. Defaults to the bundled pack.
    #[arg(long = "rules", global = true)]
    rules: Vec<PathBuf>,
    /// Engine config file (.json/.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Cmd,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    brp_engine::logging::init(cli.verbose);

    match cli.cmd {
        Cmd::Roll { expr, seed, times } => {
            let parsed = parse_dice(&expr).with_context(|| format!("invalid dice expression '{}'", expr))?;
            let mut dice = Dice::from_seed(seed);
            for _ in 0..times {
                let (faces, total) = parsed.roll_with_faces(&mut dice);
                println!("{} = {} {:?}", parsed, total, faces);
            }
        }
        Cmd::Resolve { rule, vars, who, seed } => {
            let engine = load_engine(&cli.rules, cli.config.as_deref())?;
            let mut ctx = if who.character.is_some() || who.id.is_some() {
                pick(&load_store(&who)?, &who)?.context()
            } else {
                Context::new()
            };
            for (name, value) in vars {
                ctx.set(&name, value);
            }
            let res = engine.resolve(&rule, &ctx, &mut Dice::from_seed(seed));
            for d in &res.diagnostics {
                eprintln!("warning: {}", d);
            }
            match (&res.value, res.error()) {
                (_, Some(err)) => bail!("rule '{}' failed: {}", rule, err),
                (None, None) if !res.rule_found() => bail!("rule '{}' not found", rule),
                (Some(value), None) => println!("{}", value),
                (None, None) => println!("(no value)"),
            }
        }
        Cmd::Derive { who, json } => {
            let engine = load_engine(&cli.rules, cli.config.as_deref())?;
            let store = load_store(&who)?;
            let character = pick(&store, &who)?;
            let out = engine.derive(&character, &mut Dice::from_seed(0));
            for d in &out.diagnostics {
                eprintln!("warning: {}", d);
            }
            let s = out.stats;
            if json {
                println!("{}", serde_json::to_string_pretty(&s)?);
            } else {
                println!("[{}] {}", character.id, character.name);
                println!("max_hp={} max_mp={} damage_bonus={}", s.max_hp, s.max_mp, s.damage_bonus);
                println!("move={} action_points={} initiative={}", s.movement_rate, s.action_points, s.initiative_rank);
            }
        }
        Cmd::Skill { skill_id, who, seed } => {
            let engine = load_engine(&cli.rules, cli.config.as_deref())?;
            let store = load_store(&who)?;
            let character = pick(&store, &who)?;
            let mut history = RollHistory::new();
            let check =
                engine.roll_skill(&store, &character.id, &skill_id, &mut Dice::from_seed(seed), history.sink())?;
            println!("{}: total={} roll={} => {}", skill_id, check.total, check.roll, check.tier);
            for record in &history.records {
                println!("{}", record);
            }
        }
        Cmd::Attack { who, target, armor, seed } => {
            let engine = load_engine(&cli.rules, cli.config.as_deref())?;
            let mut store = load_store(&who)?;
            let attacker = pick(&store, &who)?;
            let mut dice = Dice::from_seed(seed);
            match armor {
                Some(ap) => {
                    let expr = engine.build_damage_expression(&attacker, &mut dice)?;
                    let rolled = engine.roll_damage(&expr, &mut dice);
                    let actual = apply_mitigation(rolled, ap);
                    println!("[DMG][{}] rolled {} = {}; armor {} => {}", attacker.id, expr, rolled, ap, actual);
                }
                None => {
                    engine.initialize_state(&mut store, &target, &mut dice)?;
                    let hit = engine.attack(&mut store, &attacker.id, &target, &mut dice)?;
                    let d = hit.damage;
                    println!(
                        "[DMG][{}] rolled {} = {}; {} armor {} => {}",
                        hit.attacker, hit.expression, d.rolled, hit.target, d.armor_points, d.actual
                    );
                    if let Some(hp) = d.hp_after {
                        println!("[HP][{}] now {}", hit.target, hp);
                    }
                }
            }
        }
    }
    Ok(())
}

fn parse_var(s: &str) -> Result<(String, Value), String> {
    let (name, raw) = s.split_once('=').ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let raw = raw.trim();
    let value = if let Ok(n) = raw.parse::<i64>() {
        Value::Int(n)
    } else if let Ok(f) = raw.parse::<f64>() {
        Value::Float(f)
    } else {
        Value::Str(raw.to_string())
    };
    Ok((name.trim().to_string(), value))
}

fn read_text_auto(path: &Path) -> anyhow::Result<String> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        Ok(String::from_utf8(bytes)?)
    }
}

fn load_engine(rules: &[PathBuf], config: Option<&Path>) -> anyhow::Result<Engine> {
    let config = match config {
        Some(path) => {
            let text = read_text_auto(path)?;
            match Format::from_path(path) {
                Some(Format::Json) => EngineConfig::from_json_str(&text)?,
                _ => EngineConfig::from_yaml_str(&text)?,
            }
        }
        None => EngineConfig::default(),
    };
    if rules.is_empty() {
        return Ok(Engine::with_config(builtin_registry()?, config));
    }

    let mut sources = Vec::with_capacity(rules.len());
    for path in rules {
        let format = Format::from_path(path)
            .ok_or_else(|| anyhow!("cannot tell rule format of {} (expected .json, .yaml or .yml)", path.display()))?;
        sources.push(TextSource::new(&path.display().to_string(), read_text_auto(path)?, format));
    }
    let refs: Vec<&dyn RuleSource> = sources.iter().map(|s| s as &dyn RuleSource).collect();
    Ok(Engine::from_sources(&refs, config)?)
}

fn load_store(who: &Who) -> anyhow::Result<MemoryStore> {
    let characters: Vec<Character> = match &who.character {
        Some(path) => {
            let text = read_text_auto(path)?;
            match serde_json::from_str::<serde_json::Value>(&text)? {
                list @ serde_json::Value::Array(_) => serde_json::from_value(list)?,
                one => vec![serde_json::from_value(one)?],
            }
        }
        None => builtin_characters()?,
    };
    Ok(characters.into_iter().collect())
}

fn pick(store: &MemoryStore, who: &Who) -> anyhow::Result<Character> {
    match &who.id {
        Some(id) => Ok(store.character(id)?),
        None => store.iter().next().cloned().ok_or_else(|| anyhow!("no characters loaded")),
    }
}
