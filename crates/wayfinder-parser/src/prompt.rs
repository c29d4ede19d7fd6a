//! Prompt line parsing.
//!
//! A prompt is the short status line the server sends after most actions,
//! e.g. `*# HP:Hurt Mana:Burning>`. Its leading single-character codes give
//! the room's light level, terrain, weather, and fog; the status tokens that
//! follow tell whether the player is riding or fighting.

use serde::{Deserialize, Serialize};

use crate::ansi::strip_ansi;
use crate::flags::PromptFlags;

/// Longest line still considered a prompt.
pub const MAX_PROMPT_LEN: usize = 120;

/// Status token names that never mean "fighting".
const STAT_TOKENS: [&str; 4] = ["HP", "Mana", "Move", "Buff"];

// ---------------------------------------------------------------------------
// Light / terrain
// ---------------------------------------------------------------------------

/// Light level of the current room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LightLevel {
    #[default]
    Unknown,
    Dark,
    /// Lit by the sun.
    Sun,
    /// Lit by the moon.
    Moon,
    /// Lit by an artificial source.
    Artificial,
}

impl LightLevel {
    fn from_code(c: char) -> Option<Self> {
        Some(match c {
            '*' => Self::Sun,
            ')' => Self::Moon,
            '!' => Self::Artificial,
            'o' => Self::Dark,
            _ => return None,
        })
    }

    #[must_use]
    pub fn code(self) -> Option<char> {
        match self {
            Self::Unknown => None,
            Self::Dark => Some('o'),
            Self::Sun => Some('*'),
            Self::Moon => Some(')'),
            Self::Artificial => Some('!'),
        }
    }
}

/// Terrain of the current room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Terrain {
    #[default]
    Undefined,
    Indoors,
    City,
    Field,
    Forest,
    Hills,
    Mountains,
    Shallow,
    Water,
    Rapids,
    Underwater,
    Road,
    Tunnel,
    Cavern,
    Brush,
}

impl Terrain {
    fn from_code(c: char) -> Option<Self> {
        Some(match c {
            '[' => Self::Indoors,
            '#' => Self::City,
            '.' => Self::Field,
            'f' => Self::Forest,
            '(' => Self::Hills,
            '<' => Self::Mountains,
            '%' => Self::Shallow,
            '~' => Self::Water,
            'W' => Self::Rapids,
            'U' => Self::Underwater,
            '+' => Self::Road,
            '=' => Self::Tunnel,
            'O' => Self::Cavern,
            ':' => Self::Brush,
            _ => return None,
        })
    }

    #[must_use]
    pub fn code(self) -> Option<char> {
        Some(match self {
            Self::Undefined => return None,
            Self::Indoors => '[',
            Self::City => '#',
            Self::Field => '.',
            Self::Forest => 'f',
            Self::Hills => '(',
            Self::Mountains => '<',
            Self::Shallow => '%',
            Self::Water => '~',
            Self::Rapids => 'W',
            Self::Underwater => 'U',
            Self::Road => '+',
            Self::Tunnel => '=',
            Self::Cavern => 'O',
            Self::Brush => ':',
        })
    }
}

fn weather_flag(c: char) -> Option<PromptFlags> {
    Some(match c {
        '~' => PromptFlags::CLOUDS,
        '\'' => PromptFlags::RAIN,
        '"' => PromptFlags::HEAVY_RAIN,
        '*' => PromptFlags::SNOW,
        '%' => PromptFlags::HEAVY_SNOW,
        _ => return None,
    })
}

fn fog_flag(c: char) -> Option<PromptFlags> {
    Some(match c {
        '-' => PromptFlags::LIGHT_FOG,
        '=' => PromptFlags::HEAVY_FOG,
        _ => return None,
    })
}

// ---------------------------------------------------------------------------
// PromptFields
// ---------------------------------------------------------------------------

/// Everything decoded from one prompt line. Replaced wholesale by the next
/// prompt.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PromptFields {
    pub light: LightLevel,
    pub terrain: Terrain,
    pub flags: PromptFlags,
    /// Status tokens after the codes, verbatim.
    pub trailing: Vec<String>,
    /// The prompt as received, ANSI stripped.
    pub text: String,
}

impl PromptFields {
    /// A prompt for a room whose light and terrain are known from the map,
    /// used when the server is not there to send one.
    #[must_use]
    pub fn synthesize(light: LightLevel, terrain: Terrain) -> Self {
        let mut text = String::new();
        text.extend(light.code());
        text.extend(terrain.code());
        text.push('>');
        Self {
            light,
            terrain,
            flags: PromptFlags::VALID,
            trailing: Vec::new(),
            text,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.flags.is_valid()
    }
}

/// True when `line` looks like a prompt: ends in `>`, is short, and starts
/// with a light or terrain code.
#[must_use]
pub fn is_prompt_line(line: &str) -> bool {
    let clean = strip_ansi(line);
    let trimmed = clean.trim();
    let Some(first) = trimmed.chars().next() else {
        return false;
    };
    trimmed.len() <= MAX_PROMPT_LEN
        && trimmed.ends_with('>')
        && (LightLevel::from_code(first).is_some() || Terrain::from_code(first).is_some())
}

/// Decodes a prompt line. Never fails: unknown codes leave the matching
/// field at its default and unknown tokens only land in `trailing`.
#[must_use]
pub fn parse_prompt(line: &str) -> PromptFields {
    let clean = strip_ansi(line);
    let text = clean.trim().to_string();
    let body = text.strip_suffix('>').unwrap_or(&text);

    let mut fields = PromptFields {
        flags: PromptFlags::VALID,
        ..Default::default()
    };

    let mut chars = body.char_indices().peekable();

    if let Some(light) = chars.peek().and_then(|&(_, c)| LightLevel::from_code(c)) {
        fields.light = light;
        chars.next();
    }
    if let Some(terrain) = chars.peek().and_then(|&(_, c)| Terrain::from_code(c)) {
        fields.terrain = terrain;
        chars.next();
    }
    if let Some(flag) = chars.peek().and_then(|&(_, c)| weather_flag(c)) {
        fields.flags.insert(flag);
        chars.next();
    }
    if let Some(flag) = chars.peek().and_then(|&(_, c)| fog_flag(c)) {
        fields.flags.insert(flag);
        chars.next();
    }

    let rest = chars.peek().map_or("", |&(i, _)| &body[i..]);
    for token in rest.split_whitespace() {
        match token.split_once(':') {
            _ if token == "R" => fields.flags.insert(PromptFlags::RIDING),
            Some(("Mount", _)) => fields.flags.insert(PromptFlags::RIDING),
            Some((name, cond)) if !name.is_empty() && !cond.is_empty() => {
                if !STAT_TOKENS.contains(&name) {
                    fields.flags.insert(PromptFlags::FIGHTING);
                }
            }
            _ => {}
        }
        fields.trailing.push(token.to_string());
    }

    fields.text = text;
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_and_terrain() {
        let p = parse_prompt("*#>");
        assert_eq!(p.light, LightLevel::Sun);
        assert_eq!(p.terrain, Terrain::City);
        assert!(p.is_valid());
        assert!(p.trailing.is_empty());
    }

    #[test]
    fn test_dark_forest_with_weather_and_fog() {
        let p = parse_prompt("of'= HP:Hurt>");
        assert_eq!(p.light, LightLevel::Dark);
        assert_eq!(p.terrain, Terrain::Forest);
        assert!(p.flags.contains(PromptFlags::RAIN));
        assert!(p.flags.contains(PromptFlags::HEAVY_FOG));
        assert!(!p.flags.is_fighting());
        assert_eq!(p.trailing, vec!["HP:Hurt".to_string()]);
    }

    #[test]
    fn test_missing_light_code() {
        let p = parse_prompt("[ Mana:Full>");
        assert_eq!(p.light, LightLevel::Unknown);
        assert_eq!(p.terrain, Terrain::Indoors);
    }

    #[test]
    fn test_riding_and_fighting() {
        let p = parse_prompt("!+ R HP:Fine Orc:Wounded>");
        assert!(p.flags.is_riding());
        assert!(p.flags.is_fighting());
        assert_eq!(p.trailing.len(), 3);

        let p = parse_prompt("*. Mount:Tired>");
        assert!(p.flags.is_riding());
        assert!(!p.flags.is_fighting());
    }

    #[test]
    fn test_unknown_tokens_preserved() {
        let p = parse_prompt(")~ hello world>");
        assert_eq!(p.terrain, Terrain::Water);
        assert_eq!(p.trailing, vec!["hello".to_string(), "world".to_string()]);
        assert_eq!(p.text, ")~ hello world>");
    }

    #[test]
    fn test_ansi_is_stripped() {
        let p = parse_prompt("\u{1b}[1m*<\u{1b}[0m>");
        assert_eq!(p.light, LightLevel::Sun);
        assert_eq!(p.terrain, Terrain::Mountains);
        assert_eq!(p.text, "*<>");
    }

    #[test]
    fn test_is_prompt_line() {
        assert!(is_prompt_line("*#>"));
        assert!(is_prompt_line("o( HP:Bad>  "));
        assert!(!is_prompt_line("You say 'hello>'"));
        assert!(!is_prompt_line("*# no terminator"));
        assert!(!is_prompt_line(""));
        let long = format!("*{}>", "x".repeat(MAX_PROMPT_LEN));
        assert!(!is_prompt_line(&long));
    }

    #[test]
    fn test_synthesized_prompt_reparses() {
        let p = PromptFields::synthesize(LightLevel::Moon, Terrain::Hills);
        assert_eq!(p.text, ")(>");
        let again = parse_prompt(&p.text);
        assert_eq!(again.light, LightLevel::Moon);
        assert_eq!(again.terrain, Terrain::Hills);
    }
}
