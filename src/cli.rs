//! Command line arguments
//!
//! `asus-numpad [OPTIONS] [MODEL] [PERCENTAGE_KEY] [MODES]`
//!
//! Positionals and `--dial-coords` override the config file.

use anyhow::{anyhow, bail, Result};

use crate::config::Config;
use crate::interpreter::Mode;

/// Parsed command line
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CliArgs {
    pub help: bool,
    pub version: bool,
    pub list_models: bool,
    /// `--init-config`; true for `--init-config=system`
    pub init_config: Option<bool>,
    pub force: bool,
    pub config_path: Option<String>,
    pub model: Option<String>,
    pub percentage_key: Option<String>,
    pub modes: Option<Vec<Mode>>,
    /// Dial pivot x, y and radius
    pub dial_coords: Option<(i32, i32, i32)>,
}

impl CliArgs {
    /// Parse arguments, excluding the program name
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut cli = CliArgs::default();
        let mut positionals = Vec::new();
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            // --opt=value or --opt value
            let (flag, inline) = match arg.split_once('=') {
                Some((f, v)) if f.starts_with("--") => (f, Some(v.to_string())),
                _ => (arg.as_str(), None),
            };
            let mut value = |name: &str| -> Result<String> {
                match inline.clone() {
                    Some(v) => Ok(v),
                    None => iter
                        .next()
                        .cloned()
                        .ok_or_else(|| anyhow!("{} needs a value", name)),
                }
            };

            match flag {
                "-h" | "--help" => cli.help = true,
                "-V" | "--version" => cli.version = true,
                "-f" | "--force" => cli.force = true,
                "--list-models" => cli.list_models = true,
                "--init-config" => match inline.as_deref() {
                    None | Some("user") => cli.init_config = Some(false),
                    Some("system") => cli.init_config = Some(true),
                    Some(other) => bail!("unknown --init-config target '{}'", other),
                },
                "-c" | "--config" => cli.config_path = Some(value(flag)?),
                "--dial-coords" | "--dial_coords" => {
                    cli.dial_coords = Some(parse_dial_coords(&value(flag)?)?)
                }
                _ if flag.starts_with('-') && flag.len() > 1 => {
                    bail!("unknown option '{}' (see --help)", arg)
                }
                _ => positionals.push(arg.clone()),
            }
        }

        let mut positionals = positionals.into_iter();
        cli.model = positionals.next();
        cli.percentage_key = positionals.next();
        cli.modes = positionals.next().map(|m| parse_modes(&m)).transpose()?;
        if let Some(extra) = positionals.next() {
            bail!("unexpected argument '{}'", extra);
        }
        Ok(cli)
    }

    /// Override config values given on the command line
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(model) = &self.model {
            cfg.model = model.clone();
        }
        if let Some(key) = &self.percentage_key {
            cfg.percentage_key = key.clone();
        }
        if let Some(modes) = &self.modes {
            cfg.modes = modes.clone();
        }
        if let Some((x, y, r)) = self.dial_coords {
            cfg.dial.x = x;
            cfg.dial.y = y;
            cfg.dial.radius = r;
        }
    }
}

/// "0 1 2", "1,2" or "numpad dial"
pub fn parse_modes(s: &str) -> Result<Vec<Mode>> {
    let modes = s
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(|t| Mode::parse(t).ok_or_else(|| anyhow!("unknown mode '{}' (use 0, 1 or 2)", t)))
        .collect::<Result<Vec<_>>>()?;
    if modes.is_empty() {
        bail!("no modes given");
    }
    Ok(modes)
}

/// "X Y R"
pub fn parse_dial_coords(s: &str) -> Result<(i32, i32, i32)> {
    let parts = s
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<i32>()
                .map_err(|_| anyhow!("invalid dial coordinate '{}'", t))
        })
        .collect::<Result<Vec<_>>>()?;
    match parts[..] {
        [x, y, r] if r > 0 => Ok((x, y, r)),
        [_, _, _] => bail!("dial radius must be positive"),
        _ => bail!("--dial-coords expects \"X Y R\", got '{}'", s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positionals() {
        let cli = CliArgs::parse(&args(&["ux581l", "40", "1 2"])).unwrap();
        assert_eq!(cli.model.as_deref(), Some("ux581l"));
        assert_eq!(cli.percentage_key.as_deref(), Some("40"));
        assert_eq!(cli.modes, Some(vec![Mode::Numpad, Mode::Dial]));
    }

    #[test]
    fn test_no_arguments() {
        assert_eq!(CliArgs::parse(&[]).unwrap(), CliArgs::default());
    }

    #[test]
    fn test_dial_coords_forms() {
        let a = CliArgs::parse(&args(&["--dial-coords", "700 800 400"])).unwrap();
        let b = CliArgs::parse(&args(&["--dial_coords=700,800,400"])).unwrap();
        assert_eq!(a.dial_coords, Some((700, 800, 400)));
        assert_eq!(a.dial_coords, b.dial_coords);
        assert!(CliArgs::parse(&args(&["--dial-coords", "700 800"])).is_err());
        assert!(CliArgs::parse(&args(&["--dial-coords"])).is_err());
    }

    #[test]
    fn test_flags() {
        let cli = CliArgs::parse(&args(&["--init-config=system", "-f", "--config", "/tmp/a.toml"]))
            .unwrap();
        assert_eq!(cli.init_config, Some(true));
        assert!(cli.force);
        assert_eq!(cli.config_path.as_deref(), Some("/tmp/a.toml"));
        assert!(CliArgs::parse(&args(&["--bogus"])).is_err());
    }

    #[test]
    fn test_bad_modes() {
        assert!(parse_modes("0 3").is_err());
        assert!(parse_modes("  ").is_err());
        assert_eq!(parse_modes("dial").unwrap(), vec![Mode::Dial]);
    }

    #[test]
    fn test_apply_overrides_config() {
        let cli = CliArgs::parse(&args(&["gx701", "6", "2 0", "--dial-coords", "1 2 3"])).unwrap();
        let mut cfg = Config::default();
        cli.apply(&mut cfg);
        assert_eq!(cfg.model, "gx701");
        assert_eq!(cfg.percentage_key, "6");
        assert_eq!(cfg.modes, vec![Mode::Dial, Mode::Disabled]);
        assert_eq!((cfg.dial.x, cfg.dial.y, cfg.dial.radius), (1, 2, 3));
    }
}
