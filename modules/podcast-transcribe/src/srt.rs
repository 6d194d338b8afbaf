//! SRT parsing and rendering. Cues are 1-indexed, millisecond precision
//! (spec §6).

use podcast_common::CoreError;

#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub start_ms: i64,
    pub end_ms: i64,
    pub text: String,
}

/// Parse an SRT document into cues. Malformed blocks are skipped with a
/// warning rather than failing the whole document — a handful of
/// providers emit trailing garbage blocks.
pub fn parse(srt: &str) -> Result<Vec<Cue>, CoreError> {
    let mut cues = Vec::new();
    for block in srt.replace("\r\n", "\n").split("\n\n") {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        let mut lines = block.lines();
        // First line is the 1-indexed cue number; skip it, re-numbering on
        // render instead of trusting provider-supplied indices.
        let Some(_index_line) = lines.next() else { continue };
        let Some(timing_line) = lines.next() else { continue };
        let Some((start_ms, end_ms)) = parse_timing_line(timing_line) else {
            continue;
        };
        let text = lines.collect::<Vec<_>>().join("\n");
        cues.push(Cue { start_ms, end_ms, text });
    }
    Ok(cues)
}

fn parse_timing_line(line: &str) -> Option<(i64, i64)> {
    let (start, end) = line.split_once(" --> ")?;
    Some((parse_timestamp(start.trim())?, parse_timestamp(end.trim())?))
}

fn parse_timestamp(ts: &str) -> Option<i64> {
    // HH:MM:SS,mmm
    let (hms, ms) = ts.split_once(',')?;
    let mut parts = hms.split(':');
    let h: i64 = parts.next()?.parse().ok()?;
    let m: i64 = parts.next()?.parse().ok()?;
    let s: i64 = parts.next()?.parse().ok()?;
    let ms: i64 = ms.parse().ok()?;
    Some(((h * 3600 + m * 60 + s) * 1000) + ms)
}

fn format_timestamp(ms: i64) -> String {
    let h = ms / 3_600_000;
    let m = (ms % 3_600_000) / 60_000;
    let s = (ms % 60_000) / 1000;
    let rem_ms = ms % 1000;
    format!("{h:02}:{m:02}:{s:02},{rem_ms:03}")
}

/// Render cues back into SRT text, 1-indexed and re-numbered sequentially.
pub fn render(cues: &[Cue]) -> String {
    let mut out = String::new();
    for (i, cue) in cues.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_timestamp(cue.start_ms),
            format_timestamp(cue.end_ms),
            cue.text
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_text_and_timestamps() {
        let cues = vec![
            Cue { start_ms: 0, end_ms: 1500, text: "Hello there".to_string() },
            Cue { start_ms: 1600, end_ms: 3200, text: "General Kenobi".to_string() },
        ];
        let rendered = render(&cues);
        let parsed = parse(&rendered).unwrap();
        assert_eq!(parsed, cues);
    }

    #[test]
    fn parses_standard_srt_block() {
        let srt = "1\n00:00:01,000 --> 00:00:02,500\nHello\n\n2\n00:00:02,600 --> 00:00:04,000\nWorld\n";
        let cues = parse(srt).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].start_ms, 1000);
        assert_eq!(cues[0].end_ms, 2500);
        assert_eq!(cues[0].text, "Hello");
    }

    #[test]
    fn skips_malformed_blocks() {
        let srt = "1\nnot a timing line\nHello\n\n2\n00:00:02,600 --> 00:00:04,000\nWorld\n";
        let cues = parse(srt).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "World");
    }
}
