//! Launch arguments passed by the host:
//! `-port <n> -pluginUUID <id> -registerEvent <name> -info <json>`.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgsError {
    #[error("missing argument -{0}")]
    Missing(&'static str),
    #[error("argument {0} has no value")]
    NoValue(String),
    #[error("invalid port: {0}")]
    InvalidPort(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostArgs {
    pub port: u16,
    pub plugin_uuid: String,
    pub register_event: String,
    /// Host and device description; kept for logging only.
    pub info: Option<Value>,
}

impl HostArgs {
    /// Parse the arguments after the program name. Unknown flags are skipped.
    pub fn parse<I>(args: I) -> Result<Self, ArgsError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut port = None;
        let mut plugin_uuid = None;
        let mut register_event = None;
        let mut info = None;

        let mut args = args.into_iter();
        while let Some(flag) = args.next() {
            let slot = match flag.as_str() {
                "-port" => &mut port,
                "-pluginUUID" => &mut plugin_uuid,
                "-registerEvent" => &mut register_event,
                "-info" => &mut info,
                _ => continue,
            };
            let value = args.next().ok_or_else(|| ArgsError::NoValue(flag.clone()))?;
            *slot = Some(value);
        }

        let port = port.ok_or(ArgsError::Missing("port"))?;
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| ArgsError::InvalidPort(port.clone()))?;

        Ok(Self {
            port,
            plugin_uuid: plugin_uuid.ok_or(ArgsError::Missing("pluginUUID"))?,
            register_event: register_event.ok_or(ArgsError::Missing("registerEvent"))?,
            info: info.and_then(|raw| serde_json::from_str(&raw).ok()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_full_launch_line() {
        let args = HostArgs::parse(argv(&[
            "-port",
            "28196",
            "-pluginUUID",
            "ABCD",
            "-registerEvent",
            "registerPlugin",
            "-info",
            r#"{"application":{"version":"6.5"}}"#,
        ]))
        .unwrap();
        assert_eq!(args.port, 28196);
        assert_eq!(args.plugin_uuid, "ABCD");
        assert_eq!(args.register_event, "registerPlugin");
        assert_eq!(args.info.unwrap()["application"]["version"], "6.5");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            HostArgs::parse(argv(&["-pluginUUID", "A", "-registerEvent", "r"])),
            Err(ArgsError::Missing("port"))
        );
        assert_eq!(
            HostArgs::parse(argv(&["-port", "x", "-pluginUUID", "A", "-registerEvent", "r"])),
            Err(ArgsError::InvalidPort("x".into()))
        );
        assert_eq!(
            HostArgs::parse(argv(&["-port"])),
            Err(ArgsError::NoValue("-port".into()))
        );
    }

    #[test]
    fn test_unknown_flags_and_bad_info_are_tolerated() {
        let args = HostArgs::parse(argv(&[
            "-verbose", "-port", "1", "-pluginUUID", "A", "-registerEvent", "r", "-info", "{not json",
        ]))
        .unwrap();
        assert_eq!(args.port, 1);
        assert!(args.info.is_none());
    }
}
