//! Command-line parsing layered over `kepler.conf`.

use std::path::PathBuf;

use kepler_consensus::algo::Algo;
use kepler_consensus::deployments::DeploymentPos;
use kepler_consensus::params::Network;
use kepler_log::{Format, Level, LogConfig};

use crate::conf::{conf_value, load_kepler_conf, parse_conf_bool, ConfMap, DEFAULT_CONF_FILE};

pub const DEFAULT_MINE_COUNT: u32 = 10_000_000;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    Params,
    VerifyGenesis,
    MineGenesis,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MineOptions {
    pub algo: Algo,
    pub start: u32,
    pub count: u32,
}

impl Default for MineOptions {
    fn default() -> Self {
        Self {
            algo: Algo::NeoScrypt,
            start: 0,
            count: DEFAULT_MINE_COUNT,
        }
    }
}

/// A `--vbparams deployment:start:timeout` override.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VbParams {
    pub deployment: DeploymentPos,
    pub start_time: i64,
    pub timeout: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub command: Command,
    pub network: Network,
    pub devnet_suffix: Option<String>,
    pub log: LogConfig,
    pub vbparams: Vec<VbParams>,
    pub json: bool,
    pub mine: MineOptions,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CliAction {
    Run(Config),
    PrintHelp,
    PrintVersion,
}

/// Values taken from the command line; `None` falls through to the config file.
#[derive(Clone, Debug, Default)]
pub struct CliFlags {
    pub command: Option<Command>,
    pub network: Option<Network>,
    pub devnet_suffix: Option<String>,
    pub conf_path: Option<PathBuf>,
    pub log_level: Option<Level>,
    pub log_format: Option<Format>,
    pub log_timestamps: Option<bool>,
    pub vbparams: Vec<VbParams>,
    pub json: bool,
    pub algo: Option<Algo>,
    pub start: Option<u32>,
    pub count: Option<u32>,
}

pub fn parse_args() -> Result<CliAction, String> {
    parse_args_from(std::env::args().skip(1))
}

pub fn parse_args_from<I>(raw_args: I) -> Result<CliAction, String>
where
    I: IntoIterator<Item = String>,
{
    let flags = match parse_flags(raw_args)? {
        FlagsOrAction::Flags(flags) => flags,
        FlagsOrAction::Action(action) => return Ok(action),
    };
    let conf_path = flags
        .conf_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONF_FILE));
    let conf = load_kepler_conf(&conf_path)?;
    let source = conf_path.display().to_string();
    resolve_config(flags, conf.as_ref().map(|conf| (conf, source.as_str()))).map(CliAction::Run)
}

enum FlagsOrAction {
    Flags(CliFlags),
    Action(CliAction),
}

fn parse_flags<I>(raw_args: I) -> Result<FlagsOrAction, String>
where
    I: IntoIterator<Item = String>,
{
    let mut flags = CliFlags::default();
    let mut args = raw_args.into_iter().peekable();

    if let Some(first) = args.peek().map(|value| value.as_str()) {
        let command = match first {
            "help" => return Ok(FlagsOrAction::Action(CliAction::PrintHelp)),
            "version" => return Ok(FlagsOrAction::Action(CliAction::PrintVersion)),
            "params" => Some(Command::Params),
            "verify-genesis" => Some(Command::VerifyGenesis),
            "mine-genesis" => Some(Command::MineGenesis),
            _ => None,
        };
        if command.is_some() {
            flags.command = command;
            let _ = args.next();
        }
    }

    while let Some(arg) = args.next() {
        let mut value_for = |flag: &str| {
            args.next()
                .ok_or_else(|| format!("missing value for {flag}\n{}", usage()))
        };
        match arg.as_str() {
            "--help" | "-h" => return Ok(FlagsOrAction::Action(CliAction::PrintHelp)),
            "--version" | "-V" => return Ok(FlagsOrAction::Action(CliAction::PrintVersion)),
            "--network" => {
                let value = value_for("--network")?;
                let network = Network::parse(&value).map_err(|err| format!("{err}\n{}", usage()))?;
                flags.network = Some(network);
            }
            "--testnet" => flags.network = Some(Network::Testnet),
            "--regtest" => flags.network = Some(Network::Regtest),
            "--devnet" => {
                flags.devnet_suffix = Some(value_for("--devnet")?);
                flags.network = Some(Network::Devnet);
            }
            "--conf" => flags.conf_path = Some(PathBuf::from(value_for("--conf")?)),
            "--log-level" | "--loglevel" => {
                let value = value_for("--log-level")?;
                let level = value
                    .parse::<Level>()
                    .map_err(|err| format!("{err}\n{}", usage()))?;
                flags.log_level = Some(level);
            }
            "--log-format" | "--logformat" => {
                let value = value_for("--log-format")?;
                let format = value
                    .parse::<Format>()
                    .map_err(|err| format!("{err}\n{}", usage()))?;
                flags.log_format = Some(format);
            }
            "--log-timestamps" | "--logtimestamps" => flags.log_timestamps = Some(true),
            "--no-log-timestamps" | "--no-logtimestamps" => flags.log_timestamps = Some(false),
            "--vbparams" => {
                let value = value_for("--vbparams")?;
                flags.vbparams.push(parse_vbparams(&value)?);
            }
            "--json" => flags.json = true,
            "--algo" => {
                let value = value_for("--algo")?;
                let algo = Algo::parse(&value)
                    .ok_or_else(|| format!("invalid algorithm '{value}'\n{}", usage()))?;
                flags.algo = Some(algo);
            }
            "--start" => flags.start = Some(parse_u32("--start", &value_for("--start")?)?),
            "--count" => flags.count = Some(parse_u32("--count", &value_for("--count")?)?),
            other => return Err(format!("unknown argument '{other}'\n{}", usage())),
        }
    }

    Ok(FlagsOrAction::Flags(flags))
}

fn parse_u32(flag: &str, value: &str) -> Result<u32, String> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid value '{value}' for {flag}\n{}", usage()))
}

/// `deployment:start:timeout`, e.g. `testdummy:0:999999999999`.
pub fn parse_vbparams(value: &str) -> Result<VbParams, String> {
    let parts: Vec<&str> = value.split(':').collect();
    let [name, start, timeout] = parts.as_slice() else {
        return Err(format!(
            "invalid --vbparams '{value}' (expected deployment:start:timeout)"
        ));
    };
    let deployment = DeploymentPos::parse(name)
        .ok_or_else(|| format!("unknown deployment '{name}' in --vbparams"))?;
    let start_time = start
        .parse::<i64>()
        .map_err(|_| format!("invalid start time '{start}' in --vbparams"))?;
    let timeout = timeout
        .parse::<i64>()
        .map_err(|_| format!("invalid timeout '{timeout}' in --vbparams"))?;
    Ok(VbParams {
        deployment,
        start_time,
        timeout,
    })
}

/// Fills every setting the command line left open from `conf`, then from defaults.
pub fn resolve_config(flags: CliFlags, conf: Option<(&ConfMap, &str)>) -> Result<Config, String> {
    let mut network = flags.network;
    let mut devnet_suffix = flags.devnet_suffix;
    let mut log_level = flags.log_level;
    let mut log_format = flags.log_format;
    let mut log_timestamps = flags.log_timestamps;

    if let Some((conf, source)) = conf {
        if network.is_none() {
            let selected = conf_network(conf, source)?;
            if let Some((conf_network, suffix)) = selected {
                network = Some(conf_network);
                devnet_suffix = suffix;
            }
        }
        if log_level.is_none() {
            if let Some(raw) = conf_value(conf, "loglevel") {
                let level = raw
                    .parse::<Level>()
                    .map_err(|_| format!("invalid loglevel '{raw}' in {source}"))?;
                log_level = Some(level);
            }
        }
        if log_format.is_none() {
            if let Some(raw) = conf_value(conf, "logformat") {
                let format = raw
                    .parse::<Format>()
                    .map_err(|_| format!("invalid logformat '{raw}' in {source}"))?;
                log_format = Some(format);
            }
        }
        if log_timestamps.is_none() {
            if let Some(raw) = conf_value(conf, "logtimestamps") {
                let enabled = parse_conf_bool(raw).ok_or_else(|| {
                    format!("invalid logtimestamps value '{raw}' in {source}")
                })?;
                log_timestamps = Some(enabled);
            }
        }
    }

    let command = flags.command.unwrap_or(Command::VerifyGenesis);
    if command != Command::MineGenesis
        && (flags.algo.is_some() || flags.start.is_some() || flags.count.is_some())
    {
        return Err(format!(
            "--algo, --start and --count only apply to mine-genesis\n{}",
            usage()
        ));
    }

    let defaults = LogConfig::default();
    let mine_defaults = MineOptions::default();
    Ok(Config {
        command,
        network: network.unwrap_or(Network::Mainnet),
        devnet_suffix,
        log: LogConfig {
            level: log_level.unwrap_or(defaults.level),
            format: log_format.unwrap_or(defaults.format),
            timestamps: log_timestamps.unwrap_or(defaults.timestamps),
        },
        vbparams: flags.vbparams,
        json: flags.json,
        mine: MineOptions {
            algo: flags.algo.unwrap_or(mine_defaults.algo),
            start: flags.start.unwrap_or(mine_defaults.start),
            count: flags.count.unwrap_or(mine_defaults.count),
        },
    })
}

/// Network chosen by `network=`, `testnet=1`, `regtest=1` or `devnet=<name>`.
fn conf_network(
    conf: &ConfMap,
    source: &str,
) -> Result<Option<(Network, Option<String>)>, String> {
    let mut selected: Vec<(Network, Option<String>)> = Vec::new();

    if let Some(raw) = conf_value(conf, "network") {
        let network = Network::parse(raw).map_err(|err| format!("{err} in {source}"))?;
        selected.push((network, None));
    }
    for (key, network) in [("testnet", Network::Testnet), ("regtest", Network::Regtest)] {
        if let Some(raw) = conf_value(conf, key) {
            let enabled = parse_conf_bool(raw)
                .ok_or_else(|| format!("invalid {key} value '{raw}' in {source}"))?;
            if enabled {
                selected.push((network, None));
            }
        }
    }
    if let Some(raw) = conf_value(conf, "devnet") {
        selected.push((Network::Devnet, Some(raw.to_string())));
    }

    match selected.len() {
        0 => Ok(None),
        1 => Ok(selected.pop()),
        _ => Err(format!(
            "conflicting network selection in {source} (use only one of network, testnet, regtest, devnet)"
        )),
    }
}

pub fn usage() -> String {
    [
        "Usage:",
        "  keplerd [command] [options]",
        "",
        "Commands:",
        "  help            Print this help and exit",
        "  version         Print version and exit",
        "  params          Print the consensus parameters of the selected network",
        "  verify-genesis  Rebuild and check the genesis block(s) (default)",
        "  mine-genesis    Search a nonce for the genesis header under one algorithm",
        "",
        "Options:",
        "  --help, -h  Print this help and exit",
        "  --version, -V  Print version and exit",
        "  --network  Network to use (main|test|dev|regtest) (default: main)",
        "  --testnet  Alias for --network test",
        "  --regtest  Alias for --network regtest",
        "  --devnet  Use a named devnet (\"1\" for the unnamed one)",
        "  --conf  Config file path (default: ./kepler.conf)",
        "  --log-level  Log verbosity (error|warn|info|debug|trace) (default: info)",
        "  --log-format  Log output format (text|json) (default: text)",
        "  --log-timestamps  Enable timestamps in text logs (default: on)",
        "  --no-log-timestamps  Disable timestamps in text logs",
        "  --vbparams  Override a regtest deployment window (deployment:start:timeout)",
        "  --json  Print command output as JSON",
        "",
        "mine-genesis options:",
        "  --algo  Algorithm (neoscrypt|argon2d|rainforest) (default: neoscrypt)",
        "  --start  First nonce to try (default: 0)",
        "  --count  Number of nonces to try (default: 10000000)",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::parse_conf;

    fn flags(args: &[&str]) -> CliFlags {
        match parse_flags(args.iter().map(|arg| arg.to_string())).expect("parse") {
            FlagsOrAction::Flags(flags) => flags,
            FlagsOrAction::Action(action) => panic!("unexpected action {action:?}"),
        }
    }

    fn resolve(args: &[&str], conf: Option<&str>) -> Result<Config, String> {
        let conf = conf.map(parse_conf);
        resolve_config(flags(args), conf.as_ref().map(|conf| (conf, "kepler.conf")))
    }

    #[test]
    fn help_and_version_short_circuit() {
        for args in [vec!["help"], vec!["--regtest", "-h"]] {
            let parsed = parse_args_from(args.into_iter().map(String::from)).expect("parse");
            assert_eq!(parsed, CliAction::PrintHelp);
        }
        let parsed = parse_args_from(["version".to_string()]).expect("parse");
        assert_eq!(parsed, CliAction::PrintVersion);
    }

    #[test]
    fn defaults() {
        let config = resolve(&[], None).expect("config");
        assert_eq!(config.command, Command::VerifyGenesis);
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.log, LogConfig::default());
        assert!(!config.json);
        assert_eq!(config.mine, MineOptions::default());
    }

    #[test]
    fn mine_options() {
        let config = resolve(
            &["mine-genesis", "--regtest", "--algo", "argon2d", "--start", "5", "--count", "9"],
            None,
        )
        .expect("config");
        assert_eq!(config.command, Command::MineGenesis);
        assert_eq!(
            config.mine,
            MineOptions {
                algo: Algo::Argon2d,
                start: 5,
                count: 9
            }
        );
        assert!(resolve(&["params", "--algo", "argon2d"], None).is_err());
    }

    #[test]
    fn invalid_values_are_errors() {
        let bad = |args: &[&str]| parse_flags(args.iter().map(|arg| arg.to_string())).is_err();
        assert!(bad(&["--network", "moonnet"]));
        assert!(bad(&["--log-level", "loud"]));
        assert!(bad(&["--algo", "sha256"]));
        assert!(bad(&["--count", "-1"]));
        assert!(bad(&["--conf"]));
        assert!(bad(&["--frobnicate"]));
    }

    #[test]
    fn command_line_wins_over_conf() {
        let conf = "testnet=1\nloglevel=debug\nlogformat=json\nlogtimestamps=0\n";
        let config = resolve(&["--regtest", "--log-level", "warn"], Some(conf)).expect("config");
        assert_eq!(config.network, Network::Regtest);
        assert_eq!(config.log.level, Level::Warn);
        assert_eq!(config.log.format, Format::Json);
        assert!(!config.log.timestamps);

        let config = resolve(&[], Some(conf)).expect("config");
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.log.level, Level::Debug);
    }

    #[test]
    fn conf_devnet_and_conflicts() {
        let config = resolve(&["params"], Some("devnet=kepler\n")).expect("config");
        assert_eq!(config.network, Network::Devnet);
        assert_eq!(config.devnet_suffix.as_deref(), Some("kepler"));

        let config = resolve(&[], Some("devnet\n")).expect("config");
        assert_eq!(config.devnet_suffix.as_deref(), Some("1"));

        let err = resolve(&[], Some("testnet=1\nregtest=1\n")).expect_err("conflict");
        assert!(err.contains("conflicting network selection"), "{err}");
        assert!(resolve(&[], Some("testnet=0\nregtest=1\n")).is_ok());
        assert!(resolve(&[], Some("loglevel=chatty\n")).is_err());
    }

    #[test]
    fn vbparams_parsing() {
        assert_eq!(
            parse_vbparams("testdummy:0:999999999999"),
            Ok(VbParams {
                deployment: DeploymentPos::TestDummy,
                start_time: 0,
                timeout: 999_999_999_999,
            })
        );
        assert!(parse_vbparams("testdummy:0").is_err());
        assert!(parse_vbparams("segwit:0:1").is_err());
        assert!(parse_vbparams("testdummy:x:1").is_err());

        let config = resolve(&["--vbparams", "testdummy:10:20", "--json"], None).expect("config");
        assert_eq!(config.vbparams.len(), 1);
        assert!(config.json);
    }
}
