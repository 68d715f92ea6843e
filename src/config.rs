use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::shaders::ShaderSource;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Cli(#[from] clap::Error),

    #[error("--{given} needs --{missing} as well")]
    IncompleteShaderPair {
        given: &'static str,
        missing: &'static str,
    },

    #[error("invalid clear colour {0:?}, expected four comma separated floats")]
    ClearColor(String),
}

#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub shader: ShaderSource,
    pub texture: Option<PathBuf>,
    pub wireframe: bool,
    pub clear_color: [f32; 4],
    pub log_level: String,
}

fn command() -> Command {
    Command::new("gl_renderer")
        .about("Draws a textured quad with OpenGL 3.3")
        .arg(
            Arg::new("width")
                .long("width")
                .value_parser(value_parser!(u32).range(1..))
                .default_value("800"),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .value_parser(value_parser!(u32).range(1..))
                .default_value("600"),
        )
        .arg(
            Arg::new("title")
                .long("title")
                .default_value("OpenGL Renderer"),
        )
        .arg(
            Arg::new("vertex-shader")
                .long("vertex-shader")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("fragment-shader")
                .long("fragment-shader")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("texture")
                .long("texture")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("wireframe")
                .long("wireframe")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("clear-color")
                .long("clear-color")
                .value_name("R,G,B,A")
                .default_value("0.2,0.3,0.3,1.0"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .default_value("info"),
        )
}

impl RendererConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::parse_from(std::env::args_os())
    }

    pub fn parse_from<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = command().try_get_matches_from(args)?;
        Self::from_matches(&matches)
    }

    fn from_matches(matches: &ArgMatches) -> Result<Self, ConfigError> {
        let shader = match (
            matches.get_one::<PathBuf>("vertex-shader"),
            matches.get_one::<PathBuf>("fragment-shader"),
        ) {
            (Some(vertex), Some(fragment)) => ShaderSource::Files {
                vertex: vertex.clone(),
                fragment: fragment.clone(),
            },
            (None, None) => ShaderSource::textured(),
            (Some(_), None) => {
                return Err(ConfigError::IncompleteShaderPair {
                    given: "vertex-shader",
                    missing: "fragment-shader",
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::IncompleteShaderPair {
                    given: "fragment-shader",
                    missing: "vertex-shader",
                })
            }
        };

        // Defaults are always present, so these lookups can't miss.
        let clear_color = matches
            .get_one::<String>("clear-color")
            .map(|s| parse_color(s))
            .transpose()?
            .unwrap_or([0.2, 0.3, 0.3, 1.0]);

        Ok(Self {
            width: matches.get_one::<u32>("width").copied().unwrap_or(800),
            height: matches.get_one::<u32>("height").copied().unwrap_or(600),
            title: matches
                .get_one::<String>("title")
                .cloned()
                .unwrap_or_default(),
            shader,
            texture: matches.get_one::<PathBuf>("texture").cloned(),
            wireframe: matches.get_flag("wireframe"),
            clear_color,
            log_level: matches
                .get_one::<String>("log-level")
                .cloned()
                .unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_color(text: &str) -> Result<[f32; 4], ConfigError> {
    let parts: Vec<f32> = text
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|_| ConfigError::ClearColor(text.to_string()))?;

    parts
        .try_into()
        .map_err(|_| ConfigError::ClearColor(text.to_string()))
}
