use crate::types::Cue;

const ARROW: &str = "-->";

/// Parse a block-structured timed-text payload into ordered cues.
///
/// Blocks are separated by blank lines. Within a block the line containing
/// `-->` may sit at any position (some producers omit the sequence-number
/// line); everything after it is cue text, internal line breaks preserved.
/// Blocks with no arrow line or fewer than two lines are skipped and do not
/// consume an index. Malformed timestamps parse to `0.0` rather than
/// failing the block.
///
/// Total and deterministic: finite input, finite output, same output on
/// every call.
pub fn parse_cues(input: &str) -> Vec<Cue> {
    let mut cues = Vec::new();

    for block in blocks(input) {
        if let Some(cue) = parse_block(&block, cues.len()) {
            cues.push(cue);
        }
    }

    cues
}

/// Split into blocks on blank-line boundaries. A run of blank lines counts
/// as a single boundary.
fn blocks(input: &str) -> Vec<Vec<&str>> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in input.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }

    out
}

fn parse_block(lines: &[&str], index: usize) -> Option<Cue> {
    if lines.len() < 2 {
        return None;
    }

    let arrow_at = lines.iter().position(|l| l.contains(ARROW))?;
    let (left, right) = lines[arrow_at].split_once(ARROW)?;

    let start_seconds = parse_timestamp(left);
    let right = right.trim();
    let end_seconds = if right.is_empty() {
        None
    } else {
        Some(parse_timestamp(right))
    };

    let text = lines[arrow_at + 1..].join("\n");

    Some(Cue {
        index,
        start_seconds,
        end_seconds,
        text,
    })
}

/// `HH:MM:SS.mmm` (or `HH:MM:SS,mmm` — comma is a decimal separator) into
/// seconds. Any malformed stamp parses to `0.0`.
fn parse_timestamp(raw: &str) -> f64 {
    let cleaned = raw.trim().replace(',', ".");
    let mut parts = cleaned.split(':');

    let (Some(h), Some(m), Some(s)) = (parts.next(), parts.next(), parts.next()) else {
        return 0.0;
    };
    if parts.next().is_some() {
        return 0.0;
    }

    match (h.parse::<f64>(), m.parse::<f64>(), s.parse::<f64>()) {
        (Ok(h), Ok(m), Ok(s)) => h * 3600.0 + m * 60.0 + s,
        _ => 0.0,
    }
}
