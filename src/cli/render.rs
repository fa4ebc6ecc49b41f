//! Render expressions as text, HTML or LaTeX

use super::CliError;
use crate::render::{self, ImplicitMode, ParenthesisMode, RenderOptions};
use crate::{parse, pretty};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Html,
    Latex,
    /// Regex rewrite of the raw input; no parsing
    Tex,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "html" => Ok(OutputFormat::Html),
            "latex" => Ok(OutputFormat::Latex),
            "tex" => Ok(OutputFormat::Tex),
            other => Err(format!("Unknown output format: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderCommand {
    pub expression: String,
    pub format: OutputFormat,
    pub parenthesis: ParenthesisMode,
    pub implicit: ImplicitMode,
}

pub fn execute_render(command: &RenderCommand) -> Result<String, CliError> {
    if command.format == OutputFormat::Tex {
        return Ok(pretty::to_tex(&command.expression));
    }
    let node = parse(&command.expression).into_result().map_err(CliError::Parse)?;
    let options = RenderOptions::new()
        .with_parenthesis(command.parenthesis)
        .with_implicit(command.implicit);
    Ok(match command.format {
        OutputFormat::Html => render::to_html(&node, &options),
        OutputFormat::Latex => render::to_latex(&node, &options),
        _ => render::to_text(&node, &options),
    })
}
