//! Parsers for the two controller database formats
//!
//! * Structured: a JSON array of `{name, guid, input: [{name, type, id, value}], source_tag}`
//! * Delimited: one `GUID,Name,token:value,...,platform:X` mapping per line
//!
//! Both produce [`ControllerDefinition`]s. A bad record or line is skipped and
//! counted, the rest of the file still loads.

use crate::mapping::definition::{
    ControllerDefinition, Direction, InputBinding, Platform, SourceTag,
};
use crate::mapping::symbols::{Target, Vocabulary};
use crate::mapping::MappingError;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Outcome counters for one load pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Definitions accepted
    pub loaded: usize,
    /// Records or lines rejected as malformed
    pub skipped: usize,
    /// Well-formed lines left out because they target another platform
    pub filtered: usize,
}

impl LoadReport {
    pub fn merge(&mut self, other: LoadReport) {
        self.loaded += other.loaded;
        self.skipped += other.skipped;
        self.filtered += other.filtered;
    }
}

// Database files spell numbers both as JSON numbers and as strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Lenient {
    Int(i64),
    Text(String),
}

impl Lenient {
    fn as_i64(&self) -> Option<i64> {
        match self {
            Lenient::Int(value) => Some(*value),
            Lenient::Text(text) => text.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StructuredInput {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    id: Lenient,
    #[serde(default)]
    value: Option<Lenient>,
}

#[derive(Debug, Deserialize)]
struct StructuredRecord {
    name: String,
    guid: String,
    #[serde(default)]
    input: Vec<StructuredInput>,
    #[serde(default)]
    source_tag: SourceTag,
}

/// Parses a structured (JSON) database.
///
/// Fails only when the document is not a JSON array.
pub fn parse_structured(json: &str) -> Result<(Vec<ControllerDefinition>, LoadReport), MappingError> {
    let records: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let mut report = LoadReport::default();
    let mut definitions = Vec::with_capacity(records.len());

    for (position, value) in records.into_iter().enumerate() {
        match serde_json::from_value::<StructuredRecord>(value) {
            Ok(record) => {
                definitions.push(structured_definition(record));
                report.loaded += 1;
            }
            Err(e) => {
                warn!("Skipping structured record #{}: {}", position, e);
                report.skipped += 1;
            }
        }
    }

    Ok((definitions, report))
}

/// Structured d-pad axes are sign gated too, so one shared axis cannot press both directions.
fn structured_definition(record: StructuredRecord) -> ControllerDefinition {
    let vocabulary = Vocabulary::Structured;
    let mut bindings = Vec::with_capacity(record.input.len());

    for input in record.input {
        let Some(target) = vocabulary.lookup(&input.name) else {
            debug!("Dropping unknown symbol '{}' in {}", input.name, record.guid);
            continue;
        };
        let Some(raw_index) = input.id.as_i64().and_then(|id| usize::try_from(id).ok()) else {
            debug!("Dropping '{}' in {}: bad raw index", input.name, record.guid);
            continue;
        };

        match input.kind.as_str() {
            "button" => bindings.push(InputBinding::button(input.name, raw_index)),
            "axis" => {
                let declared = input
                    .value
                    .as_ref()
                    .and_then(Lenient::as_i64)
                    .map(|v| v.signum() as i32)
                    .unwrap_or(0);
                let multiplier = structured_axis_multiplier(target, declared);
                let sign = match target {
                    Target::Button(button) if button.is_dpad() => Direction::from_signum(declared),
                    _ => None,
                };
                bindings.push(InputBinding::axis(input.name, raw_index, multiplier).with_sign(sign));
            }
            other => debug!(
                "Dropping '{}' in {}: unsupported input type '{}'",
                input.name, record.guid, other
            ),
        }
    }

    ControllerDefinition {
        name: record.name.trim().to_string(),
        guid: record.guid,
        source_tag: record.source_tag,
        vocabulary,
        bindings,
    }
}

/// Multiplier that brings a structured axis onto the standard polarity.
///
/// `declared` is the sign the record gives for the input's direction. Stick
/// records declare the up/left direction, which the standard layout makes
/// negative, so the raw value is scaled by `-declared`. Trigger and d-pad
/// records declare the pressed direction, which must come out positive, so the
/// raw value is scaled by `declared`. An undeclared direction keeps the raw value.
fn structured_axis_multiplier(target: Target, declared: i32) -> i32 {
    if declared == 0 {
        return 1;
    }
    match target {
        Target::Axis(_) => -declared,
        Target::Button(_) => declared,
    }
}

/// A delimited line split into its parts
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub guid: String,
    pub name: String,
    pub platform: Option<Platform>,
    pub bindings: Vec<InputBinding>,
}

impl ParsedLine {
    pub fn into_definition(self, source_tag: SourceTag) -> ControllerDefinition {
        ControllerDefinition {
            name: self.name,
            guid: self.guid,
            source_tag,
            vocabulary: Vocabulary::Delimited,
            bindings: self.bindings,
        }
    }
}

/// Splits one delimited mapping line.
///
/// Requires at least three comma-separated fields. The platform token is
/// optional here; [`parse_delimited`] is the one that insists on it.
pub fn parse_line(line: &str) -> Result<ParsedLine, MappingError> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() < 3 {
        return Err(MappingError::MalformedLine(format!(
            "expected at least 3 fields, found {}",
            fields.len()
        )));
    }

    let guid = fields[0].trim().to_string();
    let name = fields[1].trim().to_string();
    let mut platform = None;
    let mut bindings = Vec::new();

    for field in &fields[2..] {
        let field = field.trim();
        if field.is_empty() {
            continue;
        }
        let Some((symbol, value)) = field.split_once(':') else {
            debug!("Ignoring token without value '{}' in {}", field, guid);
            continue;
        };
        if symbol == "platform" {
            platform = Platform::from_token(value);
            continue;
        }
        if Vocabulary::Delimited.lookup(symbol).is_none() {
            debug!("Dropping unknown symbol '{}' in {}", symbol, guid);
            continue;
        }
        match parse_token_value(value) {
            Some(RawRef::Button(raw_index)) => bindings.push(InputBinding::button(symbol, raw_index)),
            Some(RawRef::Axis {
                raw_index,
                sign,
                inverted,
            }) => {
                let base = sign.map(Direction::as_i32).unwrap_or(1);
                let multiplier = if inverted { -base } else { base };
                bindings.push(InputBinding::axis(symbol, raw_index, multiplier).with_sign(sign));
            }
            None => debug!("Dropping unsupported value '{}' for '{}' in {}", value, symbol, guid),
        }
    }

    Ok(ParsedLine {
        guid,
        name,
        platform,
        bindings,
    })
}

enum RawRef {
    Button(usize),
    Axis {
        raw_index: usize,
        sign: Option<Direction>,
        inverted: bool,
    },
}

// `bN`, `aN`, `+aN`, `-aN`, with an optional trailing `~` on axes.
fn parse_token_value(value: &str) -> Option<RawRef> {
    if let Some(index) = value.strip_prefix('b') {
        return index.parse().ok().map(RawRef::Button);
    }

    let (sign, rest) = match value.as_bytes().first()? {
        b'+' => (Some(Direction::Positive), &value[1..]),
        b'-' => (Some(Direction::Negative), &value[1..]),
        _ => (None, value),
    };
    let rest = rest.strip_prefix('a')?;
    let (digits, inverted) = match rest.strip_suffix('~') {
        Some(digits) => (digits, true),
        None => (rest, false),
    };

    digits.parse().ok().map(|raw_index| RawRef::Axis {
        raw_index,
        sign,
        inverted,
    })
}

/// Parses a delimited database.
///
/// Lines without a recognized `platform:` token, or with fewer than three
/// fields, are skipped. When `platform` is set, lines for any other platform
/// are filtered out.
pub fn parse_delimited(
    text: &str,
    platform: Option<Platform>,
    source_tag: SourceTag,
) -> (Vec<ControllerDefinition>, LoadReport) {
    let mut report = LoadReport::default();
    let mut definitions = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parsed = match parse_line(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Skipping mapping line {}: {}", number + 1, e);
                report.skipped += 1;
                continue;
            }
        };

        let Some(line_platform) = parsed.platform else {
            warn!(
                "Skipping mapping line {} ({}): no recognized platform",
                number + 1,
                parsed.guid
            );
            report.skipped += 1;
            continue;
        };

        if platform.is_some_and(|wanted| wanted != line_platform) {
            report.filtered += 1;
            continue;
        }

        definitions.push(parsed.into_definition(source_tag));
        report.loaded += 1;
    }

    (definitions, report)
}

fn read_file(path: &Path) -> Result<String, MappingError> {
    std::fs::read_to_string(path).map_err(|source| MappingError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_structured_file(
    path: &Path,
) -> Result<(Vec<ControllerDefinition>, LoadReport), MappingError> {
    let text = read_file(path)?;
    let (definitions, report) = parse_structured(&text)?;
    info!(
        "Loaded {} structured definitions from {} ({} skipped)",
        report.loaded,
        path.display(),
        report.skipped
    );
    Ok((definitions, report))
}

pub fn load_delimited_file(
    path: &Path,
    platform: Option<Platform>,
) -> Result<(Vec<ControllerDefinition>, LoadReport), MappingError> {
    let text = read_file(path)?;
    let (definitions, report) = parse_delimited(&text, platform, SourceTag::CommunitySdl);
    info!(
        "Loaded {} delimited definitions from {} ({} skipped, {} for other platforms)",
        report.loaded,
        path.display(),
        report.skipped,
        report.filtered
    );
    Ok((definitions, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::definition::BindingKind;

    const XBOX_LINE: &str = "030000005e0400008e02000014010000,Xbox 360 Controller,a:b0,b:b1,x:b2,y:b3,back:b6,start:b7,guide:b8,leftshoulder:b4,rightshoulder:b5,leftstick:b9,rightstick:b10,leftx:a0,lefty:a1,lefttrigger:a2,rightx:a3,righty:a4,righttrigger:a5,dpup:h0.1,dpleft:-a6,dpright:+a6,platform:Linux,";

    #[test]
    fn parses_buttons_and_signed_axes() {
        let parsed = parse_line(XBOX_LINE).unwrap();
        assert_eq!(parsed.guid, "030000005e0400008e02000014010000");
        assert_eq!(parsed.name, "Xbox 360 Controller");
        assert_eq!(parsed.platform, Some(Platform::Linux));

        let a = parsed.bindings.iter().find(|b| b.symbolic_name == "a").unwrap();
        assert_eq!(a.kind, BindingKind::Button);
        assert_eq!(a.raw_index, 0);

        let leftx = parsed.bindings.iter().find(|b| b.symbolic_name == "leftx").unwrap();
        assert_eq!(leftx.kind, BindingKind::Axis);
        assert_eq!(leftx.sign, None);
        assert_eq!(leftx.multiplier, Some(1));

        let dpleft = parsed.bindings.iter().find(|b| b.symbolic_name == "dpleft").unwrap();
        assert_eq!(dpleft.sign, Some(Direction::Negative));
        assert_eq!(dpleft.multiplier, Some(-1));

        let dpright = parsed.bindings.iter().find(|b| b.symbolic_name == "dpright").unwrap();
        assert_eq!(dpright.sign, Some(Direction::Positive));
        assert_eq!(dpright.raw_index, 6);

        // Hat tokens are not representable in a raw sample.
        assert!(parsed.bindings.iter().all(|b| b.symbolic_name != "dpup"));
    }

    #[test]
    fn tilde_inverts_axis() {
        let parsed = parse_line("g,n,lefty:a1~,righty:-a4~,platform:Linux").unwrap();
        assert_eq!(parsed.bindings[0].multiplier, Some(-1));
        assert_eq!(parsed.bindings[1].multiplier, Some(1));
        assert_eq!(parsed.bindings[1].sign, Some(Direction::Negative));
    }

    #[test]
    fn short_lines_are_rejected() {
        assert!(matches!(parse_line("abc,def"), Err(MappingError::MalformedLine(_))));
    }

    #[test]
    fn delimited_skips_bad_lines_individually() {
        let text = format!(
            "# comment\n\n{}\nonlyguid,name\nguid2,No Platform,a:b0\nguid3,Other,a:b0,platform:Windows\nguid4,Weird,a:b0,platform:Amiga\n",
            XBOX_LINE
        );
        let (definitions, report) =
            parse_delimited(&text, Some(Platform::Linux), SourceTag::CommunitySdl);

        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].source_tag, SourceTag::CommunitySdl);
        assert_eq!(definitions[0].vocabulary, Vocabulary::Delimited);
        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped, 3);
        assert_eq!(report.filtered, 1);
    }

    #[test]
    fn delimited_without_platform_filter_keeps_all_platforms() {
        let text = "g1,A,a:b0,platform:Linux\ng2,B,a:b0,platform:Windows\n";
        let (definitions, report) = parse_delimited(text, None, SourceTag::Custom);
        assert_eq!(definitions.len(), 2);
        assert_eq!(report.filtered, 0);
        assert!(definitions.iter().all(|d| d.source_tag == SourceTag::Custom));
    }

    #[test]
    fn structured_records_decode_leniently() {
        let json = r#"[
            {"name": " Retro Pad ", "guid": "03000000aaaa0000bbbb000000000000", "source_tag": "retro_db_b",
             "input": [
                {"name": "b", "type": "button", "id": "1", "value": "1"},
                {"name": "joystick1up", "type": "axis", "id": 1, "value": -1},
                {"name": "l2", "type": "axis", "id": "2", "value": "1"},
                {"name": "left", "type": "axis", "id": 6, "value": -1},
                {"name": "up", "type": "hat", "id": 0, "value": 1},
                {"name": "turbo", "type": "button", "id": 9, "value": 1}
             ]},
            {"guid": "missing-name"},
            {"name": "Bare", "guid": "00000000000000000000000000000000"}
        ]"#;

        let (definitions, report) = parse_structured(json).unwrap();
        assert_eq!(report.loaded, 2);
        assert_eq!(report.skipped, 1);

        let retro = &definitions[0];
        assert_eq!(retro.name, "Retro Pad");
        assert_eq!(retro.source_tag, SourceTag::RetroDbB);
        assert_eq!(retro.bindings.len(), 4);

        let up = &retro.bindings[1];
        assert_eq!(up.multiplier, Some(1));
        assert_eq!(up.sign, None);

        let l2 = &retro.bindings[2];
        assert_eq!(l2.multiplier, Some(1));

        let left = &retro.bindings[3];
        assert_eq!(left.sign, Some(Direction::Negative));
        assert_eq!(left.multiplier, Some(-1));

        assert_eq!(definitions[1].source_tag, SourceTag::RetroDbA);
        assert!(definitions[1].bindings.is_empty());
    }

    #[test]
    fn structured_rejects_non_array_documents() {
        assert!(matches!(parse_structured("{}"), Err(MappingError::Json(_))));
    }
}
