//! Line-oriented numeric protocol: `[tag:]v0,v1,...` terminated by CR, LF or a CR/LF pair.
/// Lines starting with one of these (case-insensitive) carry no samples.
pub const RESERVED_PREFIXES: &[&str] = &["image"];
/// Longest partial line kept while waiting for a terminator.
pub const MAX_LINE_BYTES: usize = 100_000;
/// How much of an overflowing line survives truncation.
const OVERFLOW_KEEP_BYTES: usize = 1_024;
#[derive(Clone, Debug, PartialEq)]
pub enum LineEvent {
    Line(String),
    Overflow,
}
/// Outcome of interpreting one complete line.
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedLine {
    Values(Vec<f64>),
    Blank,
    Reserved,
    Malformed,
}
/// Splits an arbitrarily chunked byte stream into lines.
#[derive(Debug, Default)]
pub struct LineSplitter {
    scratch: Vec<u8>,
    last_terminator: Option<u8>,
}
impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn reset(&mut self) {
        self.scratch.clear();
        self.last_terminator = None;
    }
    pub fn buffered_len(&self) -> usize {
        self.scratch.len()
    }
    pub fn push(&mut self, byte: u8) -> Option<LineEvent> {
        match byte {
            b'\n' | b'\r' => {
                // "\r\n" and "\n\r" count as one terminator.
                if let Some(prev) = self.last_terminator.take() {
                    if prev != byte && self.scratch.is_empty() {
                        return None;
                    }
                }
                self.last_terminator = Some(byte);
                let line = String::from_utf8_lossy(&self.scratch).into_owned();
                self.scratch.clear();
                Some(LineEvent::Line(line))
            }
            _ => {
                self.last_terminator = None;
                self.scratch.push(byte);
                if self.scratch.len() > MAX_LINE_BYTES {
                    let keep_from = self.scratch.len() - OVERFLOW_KEEP_BYTES;
                    self.scratch.drain(..keep_from);
                    return Some(LineEvent::Overflow);
                }
                None
            }
        }
    }
}
/// All-or-nothing parse of one line; a single bad token discards the line.
pub fn parse_line(line: &str) -> ParsedLine {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ParsedLine::Blank;
    }
    let lowered = trimmed.to_ascii_lowercase();
    if RESERVED_PREFIXES.iter().any(|p| lowered.starts_with(p)) {
        return ParsedLine::Reserved;
    }
    let data = match trimmed.split_once(':') {
        Some((_tag, rest)) => rest,
        None => trimmed,
    };
    let mut values = Vec::new();
    for token in data.split(',') {
        match token.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => values.push(v),
            _ => return ParsedLine::Malformed,
        }
    }
    ParsedLine::Values(values)
}
#[cfg(test)]
mod tests {
    use super::*;
    fn lines(splitter: &mut LineSplitter, bytes: &[u8]) -> Vec<String> {
        bytes
            .iter()
            .filter_map(|&b| match splitter.push(b) {
                Some(LineEvent::Line(l)) => Some(l),
                _ => None,
            })
            .collect()
    }
    #[test]
    fn terminator_pairs_count_once() {
        let mut splitter = LineSplitter::new();
        let out = lines(&mut splitter, b"a\r\nb\n\rc\rd\n\ne\n");
        assert_eq!(out, vec!["a", "b", "c", "d", "", "e"]);
    }
    #[test]
    fn split_chunks_join() {
        let mut splitter = LineSplitter::new();
        assert!(lines(&mut splitter, b"1,2").is_empty());
        assert_eq!(lines(&mut splitter, b",3\r"), vec!["1,2,3"]);
        // The LF of a CR/LF pair may arrive in the next chunk.
        assert!(lines(&mut splitter, b"\n").is_empty());
    }
    #[test]
    fn parses_plain_and_tagged_lines() {
        assert_eq!(parse_line("1,2,3"), ParsedLine::Values(vec![1.0, 2.0, 3.0]));
        assert_eq!(
            parse_line("  accel: -1.5 , 2e3 "),
            ParsedLine::Values(vec![-1.5, 2000.0])
        );
        assert_eq!(parse_line("a:b:7"), ParsedLine::Malformed);
    }
    #[test]
    fn rejects_whole_line_on_bad_token() {
        assert_eq!(parse_line("tag:1,2,abc"), ParsedLine::Malformed);
        assert_eq!(parse_line("1,,2"), ParsedLine::Malformed);
        assert_eq!(parse_line("1,inf"), ParsedLine::Malformed);
        assert_eq!(parse_line("tag:"), ParsedLine::Malformed);
    }
    #[test]
    fn skips_blank_and_reserved() {
        assert_eq!(parse_line("   "), ParsedLine::Blank);
        assert_eq!(parse_line("image:1,2"), ParsedLine::Reserved);
        assert_eq!(parse_line("IMAGE 640x480"), ParsedLine::Reserved);
    }
    #[test]
    fn overflow_keeps_recent_tail() {
        let mut splitter = LineSplitter::new();
        let mut overflowed = 0;
        for _ in 0..=MAX_LINE_BYTES {
            if splitter.push(b'7') == Some(LineEvent::Overflow) {
                overflowed += 1;
            }
        }
        assert_eq!(overflowed, 1);
        assert_eq!(splitter.buffered_len(), OVERFLOW_KEEP_BYTES);
    }
}
